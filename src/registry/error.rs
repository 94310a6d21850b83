//! Registry error types.

use super::SnapshotKind;
use thiserror::Error;

/// Errors raised by a style registry.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("{filename}: {message}")]
    Syntax { filename: String, message: String },

    #[error("invalid {0} snapshot")]
    Snapshot(SnapshotKind, #[source] serde_json::Error),

    #[error("invalid theme: {0}")]
    Theme(String),
}

impl ExtractError {
    pub fn syntax(filename: &str, message: impl Into<String>) -> Self {
        Self::Syntax {
            filename: filename.to_string(),
            message: message.into(),
        }
    }
}
