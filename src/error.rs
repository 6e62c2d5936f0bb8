//! Crate-wide error type.
//!
//! Fetch and extraction functions deliberately do NOT use this type for
//! per-item failures: a failed source or article degrades to an empty result
//! (see the pipeline's fallback rules). `Error` covers the boundaries where a
//! caller can meaningfully react: configuration loading, collaborator calls,
//! and startup wiring.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI processing error: {0}")]
    Ai(String),

    #[error("Publish error: {0}")]
    Publish(String),
}

pub type Result<T> = std::result::Result<T, Error>;
