//! Typed wrappers for every backend route the client consumes.
//!
//! Request and response envelopes that exist only on the wire stay private
//! to this module; callers deal in the domain types from `shared`.

use crate::gateway::{Download, Gateway};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::error::ApiError;
use shared::types::{
    ContentBundle, Flashcard, QuizQuestion, SessionId, SessionSummary, StudyPlanEntry,
    StudySession, User,
};

#[derive(Serialize)]
struct CredentialsBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
}

#[derive(Serialize)]
struct TopicBody<'a> {
    topic: &'a str,
}

#[derive(Serialize)]
struct QuizBody<'a> {
    notes: &'a str,
    session_id: &'a SessionId,
}

#[derive(Serialize)]
struct FlashcardsBody<'a> {
    notes: &'a str,
    session_id: Option<&'a SessionId>,
}

#[derive(Serialize)]
struct ChatBody<'a> {
    message: &'a str,
    context: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    response: String,
}

#[derive(Serialize)]
struct PlanBody<'a> {
    topic: &'a str,
    review_date: NaiveDate,
}

#[derive(Serialize)]
struct PdfBody<'a> {
    topic: &'a str,
    notes: &'a str,
    #[serde(rename = "quizQuestions")]
    quiz_questions: &'a [QuizQuestion],
}

#[derive(Serialize)]
struct CsvBody<'a> {
    topic: &'a str,
    flashcards: &'a [Flashcard],
}

impl Gateway {
    /// Exchange credentials for a bearer token. The token is returned, not
    /// stored; persisting it is the auth controller's decision.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let resp: LoginResponse = self
            .post_json("login", &CredentialsBody { username, password })
            .await?;
        Ok(resp.access_token)
    }

    /// Create an account. Success does not authenticate; a separate login
    /// is required.
    pub async fn register(&self, username: &str, password: &str) -> Result<(), ApiError> {
        self.post_unit("register", &CredentialsBody { username, password })
            .await
    }

    /// Profile of whoever the current token belongs to.
    pub async fn me(&self) -> Result<User, ApiError> {
        self.get_json("user/me").await
    }

    pub async fn sessions(&self) -> Result<Vec<SessionSummary>, ApiError> {
        self.get_json("sessions").await
    }

    pub async fn session(&self, id: &SessionId) -> Result<StudySession, ApiError> {
        self.get_json(&format!("sessions/{id}")).await
    }

    pub async fn delete_session(&self, id: &SessionId) -> Result<(), ApiError> {
        self.delete(&format!("sessions/{id}")).await
    }

    /// Generate notes, summary, and related videos for a topic. The backend
    /// also creates the session record and returns its id.
    pub async fn get_content(&self, topic: &str) -> Result<ContentBundle, ApiError> {
        self.post_json("get-content", &TopicBody { topic }).await
    }

    /// Generate a quiz from notes, updating the given session record in
    /// place rather than creating a new one.
    pub async fn generate_quiz(
        &self,
        notes: &str,
        session_id: &SessionId,
    ) -> Result<Vec<QuizQuestion>, ApiError> {
        self.post_json("generate-quiz", &QuizBody { notes, session_id })
            .await
    }

    /// Generate flashcards from notes. An empty list is a valid outcome.
    pub async fn generate_flashcards(
        &self,
        notes: &str,
        session_id: Option<&SessionId>,
    ) -> Result<Vec<Flashcard>, ApiError> {
        self.post_json("generate-flashcards", &FlashcardsBody { notes, session_id })
            .await
    }

    /// One chat turn. `context` is the notes text the reply should be
    /// grounded in.
    pub async fn chat(&self, message: &str, context: &str) -> Result<String, ApiError> {
        let resp: ChatResponse = self.post_json("chat", &ChatBody { message, context }).await?;
        Ok(resp.response)
    }

    pub async fn study_plan(&self) -> Result<Vec<StudyPlanEntry>, ApiError> {
        self.get_json("study-plan").await
    }

    pub async fn add_study_plan(
        &self,
        topic: &str,
        review_date: NaiveDate,
    ) -> Result<(), ApiError> {
        self.post_unit("study-plan", &PlanBody { topic, review_date })
            .await
    }

    pub async fn delete_study_plan(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("study-plan/{id}")).await
    }

    /// Render notes (and any quiz) to a PDF on the backend and hand the
    /// bytes back untouched.
    pub async fn generate_pdf(
        &self,
        topic: &str,
        notes: &str,
        quiz_questions: &[QuizQuestion],
    ) -> Result<Download, ApiError> {
        self.post_download(
            "generate-pdf",
            &PdfBody {
                topic,
                notes,
                quiz_questions,
            },
        )
        .await
    }

    /// Export flashcards as CSV on the backend.
    pub async fn download_flashcards(
        &self,
        topic: &str,
        flashcards: &[Flashcard],
    ) -> Result<Download, ApiError> {
        self.post_download("download-flashcards", &CsvBody { topic, flashcards })
            .await
    }
}
