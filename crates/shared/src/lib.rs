//! Types shared across the StudyDesk client crates.
//!
//! Everything the gateway and the controllers exchange lives here: the
//! domain model for study sessions and their derived artifacts, the error
//! taxonomy every backend failure is normalized into, and the client
//! configuration.

pub mod config;
pub mod error;
pub mod types;
