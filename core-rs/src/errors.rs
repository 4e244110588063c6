//! Error types for Pathos Core
//!
//! Only process startup can fail. Actor phases are infallible: their failures
//! are the pathologies themselves and never surface as values.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Failed to bind diagnostic listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Affinity error: {0}")]
    Affinity(String),

    #[error("Logging error: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HarnessError>;
