//! Error types for context construction.
//!
//! Evaluation itself is total: an unsatisfiable pattern resolves to
//! "no resolution" (`None`), never to an error. The error channel exists
//! only for the string-based constructors that parse a reference instant
//! and an IANA timezone name.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KairosError {
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),
}

pub type Result<T> = std::result::Result<T, KairosError>;
