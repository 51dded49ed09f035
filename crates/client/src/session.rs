//! The active study session and everything derived from it.
//!
//! One controller owns the current topic's content bundle, the chat thread,
//! the layered quiz and flashcard state, and the saved-session history
//! cache. The quiz runner, flashcard browser, and chat thread never talk to
//! the backend themselves; they read their inputs from here and their
//! results are written back here.
//!
//! Nothing is cancelled when superseded. Every dispatched request captures
//! the state's generation counter, and a completion whose generation no
//! longer matches is discarded, so a slow response can never overwrite a
//! session that replaced the one it was fetched for.

use crate::chat::ChatThread;
use crate::flashcards::FlashcardBrowser;
use crate::quiz::QuizRunner;
use gateway::{Download, Gateway};
use parking_lot::Mutex;
use shared::error::{ApiError, RemoteError};
use shared::types::{SessionId, SessionSummary, StudySession};
use std::sync::Arc;

/// Everything a rendering layer needs to draw the study screen. Cloned out
/// by [`StudyController::snapshot`].
#[derive(Debug, Clone, Default)]
pub struct StudyState {
    pub session: StudySession,
    pub chat: ChatThread,
    pub quiz: QuizRunner,
    pub cards: FlashcardBrowser,
    pub history: Vec<SessionSummary>,
    /// Non-error outcome of a flashcard run that found no key terms.
    pub cards_notice: Option<String>,
    pub content_loading: bool,
    pub quiz_loading: bool,
    pub cards_loading: bool,
    pub history_loading: bool,
    pub export_loading: bool,
    pub content_error: Option<String>,
    pub quiz_error: Option<String>,
    pub cards_error: Option<String>,
    pub chat_error: Option<String>,
    pub history_error: Option<String>,
    pub export_error: Option<String>,
    generation: u64,
}

/// Reset to an empty, client-only session. Bumping the generation fences
/// out every request still in flight for the replaced session.
fn reset_session(state: &mut StudyState) {
    state.generation += 1;
    state.session = StudySession::default();
    state.chat.clear();
    state.quiz.reset();
    state.cards.reset();
    state.cards_notice = None;
    state.content_loading = false;
    state.quiz_loading = false;
    state.cards_loading = false;
    state.export_loading = false;
    state.content_error = None;
    state.quiz_error = None;
    state.cards_error = None;
    state.chat_error = None;
    state.export_error = None;
}

pub struct StudyController {
    gateway: Arc<Gateway>,
    state: Arc<Mutex<StudyState>>,
}

impl StudyController {
    pub fn new(gateway: Arc<Gateway>) -> Arc<Self> {
        let state = Arc::new(Mutex::new(StudyState::default()));
        let hook_state = Arc::downgrade(&state);
        gateway.on_unauthorized(move || {
            if let Some(state) = hook_state.upgrade() {
                let mut state = state.lock();
                reset_session(&mut state);
                state.history.clear();
            }
        });
        Arc::new(Self { gateway, state })
    }

    pub fn snapshot(&self) -> StudyState {
        self.state.lock().clone()
    }

    /// Drop the active session and start from a blank slate. Idempotent;
    /// the history cache is left alone.
    pub fn start_new_session(&self) {
        reset_session(&mut self.state.lock());
    }

    /// Full teardown on sign-out: the active session and the history cache
    /// both go. This is also what authorization loss triggers via the
    /// gateway hook.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        reset_session(&mut state);
        state.history.clear();
        state.history_error = None;
        state.history_loading = false;
    }

    /// Request generated content for a topic and make it the active
    /// session. Concurrent calls are not coalesced; whichever response
    /// still matches the state's generation when it lands wins.
    pub async fn fetch_and_enter_topic(&self, topic: &str) -> Result<(), ApiError> {
        let topic = topic.trim().to_string();
        if topic.is_empty() {
            let err = ApiError::Validation("Please enter a topic.".into());
            self.state.lock().content_error = Some(err.message());
            return Err(err);
        }

        let generation = {
            let mut state = self.state.lock();
            reset_session(&mut state);
            state.session.topic = topic.clone();
            state.content_loading = true;
            state.generation
        };

        let result = self.gateway.get_content(&topic).await;
        {
            let mut state = self.state.lock();
            if state.generation != generation {
                // The session moved on while we were fetching.
                return Ok(());
            }
            state.content_loading = false;
            match result {
                Ok(bundle) => {
                    state.session.id = bundle.session_id;
                    if !bundle.topic.is_empty() {
                        state.session.topic = bundle.topic;
                    }
                    state.session.notes = bundle.notes;
                    state.session.summary = bundle.summary;
                    state.session.videos = bundle.videos;
                }
                Err(err) => {
                    state.content_error = Some(err.message());
                    return Err(err);
                }
            }
        }

        self.refresh_history().await;
        Ok(())
    }

    /// Load a saved session into the active slot. All derived state is
    /// cleared before the fetch resolves, so a slow load never shows
    /// another session's content. On failure no partially-loaded session
    /// is retained.
    pub async fn load_session(&self, id: &SessionId) -> Result<(), ApiError> {
        let generation = {
            let mut state = self.state.lock();
            reset_session(&mut state);
            state.content_loading = true;
            state.generation
        };

        let result = self.gateway.session(id).await;
        let mut state = self.state.lock();
        if state.generation != generation {
            return Ok(());
        }
        state.content_loading = false;
        match result {
            Ok(loaded) => {
                state.quiz = QuizRunner::begin(loaded.quiz_questions.clone());
                state.cards = FlashcardBrowser::begin(loaded.flashcards.clone());
                state.session = loaded;
                Ok(())
            }
            Err(err) => {
                state.session.id = None;
                state.content_error = Some(err.message());
                Err(err)
            }
        }
    }

    /// Delete a saved session. Always refreshes the history cache; only if
    /// the deleted record backed the active session is the active session
    /// reset too.
    pub async fn delete_session(&self, id: &SessionId) -> Result<(), ApiError> {
        if let Err(err) = self.gateway.delete_session(id).await {
            self.state.lock().history_error = Some(err.message());
            return Err(err);
        }
        self.refresh_history().await;
        let was_active = self.state.lock().session.id.as_ref() == Some(id);
        if was_active {
            self.start_new_session();
        }
        Ok(())
    }

    /// Refetch the saved-session list. The cache is only ever replaced
    /// wholesale; failures leave the previous list standing.
    pub async fn refresh_history(&self) {
        {
            let mut state = self.state.lock();
            state.history_loading = true;
            state.history_error = None;
        }
        let result = self.gateway.sessions().await;
        let mut state = self.state.lock();
        state.history_loading = false;
        match result {
            Ok(list) => state.history = list,
            Err(err) => state.history_error = Some(err.message()),
        }
    }

    /// Generate a fresh quiz from the active notes, updating the same
    /// backend record. Requires notes and an active session id. An empty
    /// question list is an error; a quiz must have questions.
    pub async fn regenerate_quiz(&self) -> Result<(), ApiError> {
        let (notes, id, generation) = {
            let mut state = self.state.lock();
            if state.session.notes.is_empty() {
                let err = ApiError::Validation("Cannot generate a quiz without notes.".into());
                state.quiz_error = Some(err.message());
                return Err(err);
            }
            let Some(id) = state.session.id.clone() else {
                let err =
                    ApiError::Validation("Cannot generate a quiz without an active session.".into());
                state.quiz_error = Some(err.message());
                return Err(err);
            };
            state.quiz_loading = true;
            state.quiz_error = None;
            state.session.quiz_questions.clear();
            state.quiz.reset();
            (state.session.notes.clone(), id, state.generation)
        };

        let result = self.gateway.generate_quiz(&notes, &id).await;
        let mut state = self.state.lock();
        if state.generation != generation {
            return Ok(());
        }
        state.quiz_loading = false;
        match result {
            Ok(questions) if !questions.is_empty() => {
                state.session.quiz_questions = questions.clone();
                state.quiz = QuizRunner::begin(questions);
                Ok(())
            }
            Ok(_) => {
                let err: ApiError =
                    RemoteError::new("Received an empty quiz from the backend.").into();
                state.quiz_error = Some(err.message());
                Err(err)
            }
            Err(err) => {
                state.quiz_error = Some(err.message());
                Err(err)
            }
        }
    }

    /// Generate flashcards from the active notes. Requires notes; works
    /// with or without a backend session id. An empty list is a valid
    /// "no key terms found" outcome, surfaced as a notice, not an error.
    pub async fn regenerate_flashcards(&self) -> Result<(), ApiError> {
        let (notes, id, generation) = {
            let mut state = self.state.lock();
            if state.session.notes.is_empty() {
                let err = ApiError::Validation("Cannot generate flashcards without notes.".into());
                state.cards_error = Some(err.message());
                return Err(err);
            }
            state.cards_loading = true;
            state.cards_error = None;
            state.cards_notice = None;
            state.session.flashcards.clear();
            state.cards.reset();
            (
                state.session.notes.clone(),
                state.session.id.clone(),
                state.generation,
            )
        };

        let result = self.gateway.generate_flashcards(&notes, id.as_ref()).await;
        let mut state = self.state.lock();
        if state.generation != generation {
            return Ok(());
        }
        state.cards_loading = false;
        match result {
            Ok(cards) => {
                if cards.is_empty() {
                    state.cards_notice = Some("No key terms found for flashcards.".into());
                }
                state.session.flashcards = cards.clone();
                state.cards = FlashcardBrowser::begin(cards);
                Ok(())
            }
            Err(err) => {
                state.cards_error = Some(err.message());
                Err(err)
            }
        }
    }

    /// One chat turn against the active notes. Blank text or an already
    /// outstanding send is a silent no-op; at most one request is in
    /// flight. The user entry is appended optimistically, and a failed
    /// turn lands in the thread as a synthetic AI entry carrying the error.
    pub async fn send_chat(&self, text: &str) -> Result<(), ApiError> {
        let text = text.trim().to_string();
        let (context, generation) = {
            let mut state = self.state.lock();
            if text.is_empty() || state.chat.is_pending() {
                return Ok(());
            }
            if state.session.notes.is_empty() {
                let err = ApiError::Validation("Chat needs generated notes for context.".into());
                state.chat_error = Some(err.message());
                return Err(err);
            }
            state.chat_error = None;
            state.chat.push_user(text.clone());
            state.chat.set_pending(true);
            // Context is whatever the notes are *now*, not a snapshot from
            // when the thread started.
            (state.session.notes.clone(), state.generation)
        };

        let result = self.gateway.chat(&text, &context).await;
        let mut state = self.state.lock();
        if state.generation != generation {
            // The thread this turn belonged to is gone.
            return Ok(());
        }
        state.chat.set_pending(false);
        match result {
            Ok(reply) => {
                state.chat.push_ai(reply);
                Ok(())
            }
            Err(err) => {
                state.chat_error = Some(err.message());
                state.chat.push_failure(&err.message());
                Err(err)
            }
        }
    }

    /// Hand notes (and any quiz) to the backend's PDF renderer and return
    /// the bytes untouched.
    pub async fn export_pdf(&self) -> Result<Download, ApiError> {
        let (topic, notes, quiz_questions) = {
            let mut state = self.state.lock();
            if state.session.notes.is_empty() {
                let err =
                    ApiError::Validation("Notes must be generated before downloading a PDF.".into());
                state.export_error = Some(err.message());
                return Err(err);
            }
            state.export_loading = true;
            state.export_error = None;
            let topic = if state.session.topic.is_empty() {
                "Study Notes".to_string()
            } else {
                state.session.topic.clone()
            };
            (
                topic,
                state.session.notes.clone(),
                state.session.quiz_questions.clone(),
            )
        };

        let result = self
            .gateway
            .generate_pdf(&topic, &notes, &quiz_questions)
            .await;
        let mut state = self.state.lock();
        state.export_loading = false;
        match result {
            Ok(download) => Ok(download),
            Err(err) => {
                state.export_error = Some(err.message());
                Err(err)
            }
        }
    }

    /// Export the current flashcards as CSV via the backend.
    pub async fn export_flashcards_csv(&self) -> Result<Download, ApiError> {
        let (topic, cards) = {
            let mut state = self.state.lock();
            if state.session.flashcards.is_empty() {
                let err = ApiError::Validation("No flashcards available to download.".into());
                state.export_error = Some(err.message());
                return Err(err);
            }
            state.export_loading = true;
            state.export_error = None;
            let topic = if state.session.topic.is_empty() {
                "flashcards".to_string()
            } else {
                state.session.topic.clone()
            };
            (topic, state.session.flashcards.clone())
        };

        let result = self.gateway.download_flashcards(&topic, &cards).await;
        let mut state = self.state.lock();
        state.export_loading = false;
        match result {
            Ok(download) => Ok(download),
            Err(err) => {
                state.export_error = Some(err.message());
                Err(err)
            }
        }
    }

    // Quiz and flashcard interactions are local state transitions; they
    // delegate to the layered machines.

    pub fn select_answer(&self, answer: &str) {
        self.state.lock().quiz.select(answer);
    }

    pub fn submit_answer(&self) {
        self.state.lock().quiz.submit();
    }

    pub fn next_question(&self) {
        self.state.lock().quiz.advance();
    }

    /// Drop the quiz and return to the notes view. Notes are untouched.
    pub fn discard_quiz(&self) {
        let mut state = self.state.lock();
        state.quiz.discard();
        state.session.quiz_questions.clear();
    }

    pub fn flip_card(&self) {
        self.state.lock().cards.flip();
    }

    pub fn next_card(&self) {
        self.state.lock().cards.next();
    }

    pub fn prev_card(&self) {
        self.state.lock().cards.prev();
    }
}
