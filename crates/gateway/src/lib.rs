//! Authenticated access to the StudyDesk backend.
//!
//! All remote calls flow through one [`Gateway`]: it attaches the stored
//! bearer credential to every request, normalizes error bodies, and turns
//! any authorization failure into a forced logout that the rest of the
//! client observes through registered hooks. The [`CredentialStore`] keeps
//! the token durable across restarts.

pub mod credentials;
mod endpoints;
mod gateway;

pub use credentials::CredentialStore;
pub use gateway::{Download, Gateway};
