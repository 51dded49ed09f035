//! Authentication session: token acquisition, profile, forced logout.

use gateway::Gateway;
use parking_lot::Mutex;
use shared::error::ApiError;
use shared::types::User;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
struct AuthState {
    user: Option<User>,
    is_loading: bool,
}

/// Owns who is signed in. The bearer token itself lives in the gateway's
/// credential store; this controller is its only deliberate writer (the
/// gateway's authorization-failure handler is the other, involuntary one).
///
/// `is_authenticated` is defined as "a user profile is present". During
/// [`AuthController::bootstrap`] the `is_loading` flag is up, and consumers
/// must not treat "no user yet" as "signed out" until it drops.
pub struct AuthController {
    gateway: Arc<Gateway>,
    state: Arc<Mutex<AuthState>>,
}

impl AuthController {
    pub fn new(gateway: Arc<Gateway>) -> Arc<Self> {
        let state = Arc::new(Mutex::new(AuthState::default()));
        let hook_state = Arc::downgrade(&state);
        gateway.on_unauthorized(move || {
            if let Some(state) = hook_state.upgrade() {
                state.lock().user = None;
            }
        });
        Arc::new(Self { gateway, state })
    }

    /// Boot-time check: if a token survived the restart, try to fetch the
    /// profile it belongs to; a rejected token means signed out. The whole
    /// sequence runs under one `is_loading` flag.
    pub async fn bootstrap(&self) {
        self.state.lock().is_loading = true;
        if self.gateway.credentials().is_present() {
            match self.gateway.me().await {
                Ok(user) => {
                    tracing::info!("restored session for {}", user.username);
                    self.state.lock().user = Some(user);
                }
                Err(err) => {
                    tracing::info!("stored token rejected: {}", err.message());
                    self.logout();
                }
            }
        }
        self.state.lock().is_loading = false;
    }

    /// Log in and immediately fetch the user profile with the new token.
    /// Resolves only when both steps succeed. If the profile fetch fails
    /// the already-persisted token is left in place; the next authorization
    /// failure will clear it.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let token = self.gateway.login(username, password).await?;
        self.gateway.credentials().save(&token);
        let user = self.gateway.me().await?;
        self.state.lock().user = Some(user);
        Ok(())
    }

    /// Create an account. Does not authenticate; callers log in afterwards.
    pub async fn register(&self, username: &str, password: &str) -> Result<(), ApiError> {
        self.gateway.register(username, password).await
    }

    /// Purely local teardown: forget the token and the user. Idempotent.
    pub fn logout(&self) {
        self.gateway.credentials().clear();
        self.state.lock().user = None;
    }

    pub fn user(&self) -> Option<User> {
        self.state.lock().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.lock().user.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().is_loading
    }
}
