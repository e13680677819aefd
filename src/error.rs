//! Error types for the site-configuration mutator.

use std::path::PathBuf;
use thiserror::Error;

/// Hard failures of a config mutation. Anything that lands here means the
/// configuration document was not rewritten.
#[derive(Debug, Error)]
pub enum MutatorError {
    #[error("config file not found at: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("I/O error on `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config document: {message}")]
    Malformed { message: String },

    #[error("project title '{0}' does not produce a usable slug")]
    InvalidTitle(String),

    #[error("invalid project slug '{0}'")]
    InvalidSlug(String),
}

impl MutatorError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

pub type MutatorResult<T> = std::result::Result<T, MutatorError>;
