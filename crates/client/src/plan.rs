//! The study plan: scheduled review dates, independent of the active
//! session. The list is a cache of the backend's view; writes go through
//! the backend and the whole list is refetched, never patched locally.

use chrono::NaiveDate;
use gateway::Gateway;
use parking_lot::Mutex;
use shared::error::ApiError;
use shared::types::StudyPlanEntry;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct PlanState {
    pub entries: Vec<StudyPlanEntry>,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct PlanController {
    gateway: Arc<Gateway>,
    state: Arc<Mutex<PlanState>>,
}

impl PlanController {
    pub fn new(gateway: Arc<Gateway>) -> Arc<Self> {
        let state = Arc::new(Mutex::new(PlanState::default()));
        let hook_state = Arc::downgrade(&state);
        gateway.on_unauthorized(move || {
            if let Some(state) = hook_state.upgrade() {
                *state.lock() = PlanState::default();
            }
        });
        Arc::new(Self { gateway, state })
    }

    pub fn snapshot(&self) -> PlanState {
        self.state.lock().clone()
    }

    /// Drop the cached list, e.g. on sign-out.
    pub fn clear(&self) {
        *self.state.lock() = PlanState::default();
    }

    pub async fn refresh(&self) {
        {
            let mut state = self.state.lock();
            state.loading = true;
            state.error = None;
        }
        let result = self.gateway.study_plan().await;
        let mut state = self.state.lock();
        state.loading = false;
        match result {
            Ok(entries) => state.entries = entries,
            Err(err) => state.error = Some(err.message()),
        }
    }

    /// Schedule a review. Requires a topic; on success the list is
    /// refetched rather than patched.
    pub async fn add(&self, topic: &str, review_date: NaiveDate) -> Result<(), ApiError> {
        let topic = topic.trim();
        if topic.is_empty() {
            let err = ApiError::Validation(
                "Load a topic and pick a review date before adding a plan entry.".into(),
            );
            self.state.lock().error = Some(err.message());
            return Err(err);
        }
        if let Err(err) = self.gateway.add_study_plan(topic, review_date).await {
            self.state.lock().error = Some(err.message());
            return Err(err);
        }
        self.refresh().await;
        Ok(())
    }

    pub async fn remove(&self, id: i64) -> Result<(), ApiError> {
        if let Err(err) = self.gateway.delete_study_plan(id).await {
            self.state.lock().error = Some(err.message());
            return Err(err);
        }
        self.refresh().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{gateway_for, spawn_backend, Canned};

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn add_refetches_the_whole_list() {
        let backend = spawn_backend(vec![
            Canned::json(201, r#"{"message": "ok"}"#),
            Canned::json(
                200,
                r#"[{"id": 1, "topic": "Cells", "review_date": "2026-02-01"}]"#,
            ),
        ]);
        let (gw, _dir) = gateway_for(&backend);
        let plan = PlanController::new(gw);

        plan.add("Cells", date("2026-02-01")).await.unwrap();

        let state = plan.snapshot();
        assert_eq!(state.entries.len(), 1);
        assert_eq!(state.entries[0].review_date, date("2026-02-01"));
        assert!(!state.loading);
        assert_eq!(backend.requests(), 2);
    }

    #[tokio::test]
    async fn add_requires_a_topic() {
        let backend = spawn_backend(vec![]);
        let (gw, _dir) = gateway_for(&backend);
        let plan = PlanController::new(gw);

        let err = plan.add("  ", date("2026-02-01")).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(backend.requests(), 0);
    }

    #[tokio::test]
    async fn remove_refetches_and_failures_keep_the_list() {
        let backend = spawn_backend(vec![
            Canned::json(
                200,
                r#"[{"id": 1, "topic": "Cells", "review_date": "2026-02-01"}]"#,
            ),
            Canned::json(500, r#"{"error": "db locked"}"#),
        ]);
        let (gw, _dir) = gateway_for(&backend);
        let plan = PlanController::new(gw);

        plan.refresh().await;
        assert_eq!(plan.snapshot().entries.len(), 1);

        let err = plan.remove(1).await.unwrap_err();
        assert_eq!(err.message(), "db locked");

        let state = plan.snapshot();
        assert_eq!(state.entries.len(), 1);
        assert_eq!(state.error.as_deref(), Some("db locked"));
    }

    #[tokio::test]
    async fn authorization_loss_drops_the_cache() {
        let backend = spawn_backend(vec![
            Canned::json(
                200,
                r#"[{"id": 1, "topic": "Cells", "review_date": "2026-02-01"}]"#,
            ),
            Canned::json(401, r#"{"msg": "Token has expired"}"#),
        ]);
        let (gw, _dir) = gateway_for(&backend);
        let plan = PlanController::new(gw.clone());

        plan.refresh().await;
        assert_eq!(plan.snapshot().entries.len(), 1);

        let _ = gw.sessions().await.unwrap_err();
        assert!(plan.snapshot().entries.is_empty());
    }
}
