//! Domain model for study sessions and their derived artifacts.
//!
//! These structs mirror the backend's wire shapes. Fields the backend may
//! omit or send as `null` deserialize to their empty form so a fetched
//! record can always be applied verbatim.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Basic profile of the signed-in user, fetched from `/user/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
}

/// Backend-assigned session identifier.
///
/// The backend emits these as JSON numbers on some routes and strings on
/// others, so deserialization accepts both and normalizes to a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(i64),
            Text(String),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Num(n) => SessionId(n.to_string()),
            Raw::Text(s) => SessionId(s),
        })
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        SessionId(value.to_string())
    }
}

/// A related video suggested alongside the generated notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoResult {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

/// One topic's full derived-content bundle.
///
/// Exactly one of these is "active" at a time. `id == None` means the
/// session exists only client-side: it was produced by "start new" and the
/// backend has not confirmed a record for it yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudySession {
    #[serde(default)]
    pub id: Option<SessionId>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub topic: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub notes: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub videos: Vec<VideoResult>,
    #[serde(
        default,
        rename = "quizQuestions",
        deserialize_with = "null_to_default"
    )]
    pub quiz_questions: Vec<QuizQuestion>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub flashcards: Vec<Flashcard>,
}

/// Response of `POST /get-content`: fresh notes plus the id of the record
/// the backend saved them under. `session_id` is null when persisting the
/// record failed server-side; the content is still usable.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentBundle {
    #[serde(default)]
    pub session_id: Option<SessionId>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub topic: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub notes: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub videos: Vec<VideoResult>,
}

/// Read-only summary of a saved session, as listed by `GET /sessions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub topic: String,
    #[serde(deserialize_with = "de_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// A single multiple-choice question. Immutable once fetched; the running
/// quiz state is layered on top by the quiz runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub explanation: String,
}

/// One term/definition pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub term: String,
    pub definition: String,
}

/// Who produced a chat entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

/// One entry in the per-session chat thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Ai,
            text: text.into(),
        }
    }
}

/// A scheduled review, independent of the active session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyPlanEntry {
    pub id: i64,
    pub topic: String,
    pub review_date: NaiveDate,
}

fn null_to_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The backend emits `created_at` either as RFC 3339 or as a naive
/// `isoformat()` timestamp without an offset; naive values are taken as UTC.
fn de_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}
