//! Client errors.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Nothing answered. Callers fall back to local extraction.
    #[error("coordinator unavailable: {0}")]
    Unavailable(String),

    #[error("coordinator returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("unexpected response from coordinator")]
    Protocol(#[source] io::Error),
}

impl ClientError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl From<ureq::Error> for ClientError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, response) => {
                let message = response
                    .into_string()
                    .ok()
                    .and_then(|body| {
                        serde_json::from_str::<crate::coordinator::ErrorBody>(&body)
                            .map(|b| b.error)
                            .ok()
                            .or_else(|| (!body.is_empty()).then_some(body))
                    })
                    .unwrap_or_else(|| format!("HTTP {status}"));
                Self::Server { status, message }
            }
            ureq::Error::Transport(transport) => Self::Unavailable(transport.to_string()),
        }
    }
}
