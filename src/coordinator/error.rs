//! Coordinator lifecycle errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::registry::ExtractError;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("failed to bind {addr}: {message}")]
    Bind { addr: String, message: String },

    #[error("failed to write port file `{}`", .0.display())]
    PortFile(PathBuf, #[source] io::Error),

    #[error("a coordinator is already running on port {0}")]
    AlreadyRunning(u16),

    #[error("failed to restore registry state")]
    WarmStart(#[from] ExtractError),

    #[error("failed to start request workers")]
    Workers(#[from] rayon::ThreadPoolBuildError),
}
