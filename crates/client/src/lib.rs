//! Controllers for the StudyDesk client.
//!
//! The auth controller gates everything else; the study controller owns the
//! active session and is the single authority the quiz runner, flashcard
//! browser, and chat thread read from and report back to. Controllers hold
//! their state behind a mutex and never keep it locked across an await, so
//! independent operations (a session load and a history refresh, say) can
//! be in flight at the same time.

pub mod auth;
pub mod chat;
pub mod flashcards;
pub mod plan;
pub mod quiz;
pub mod session;

#[cfg(test)]
pub(crate) mod testutil;
