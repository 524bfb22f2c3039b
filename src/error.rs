use std::path::PathBuf;

use thiserror::Error;

/// Failures of the edit and browse workflows.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("editor `{command}` {reason}")]
    EditorLaunch { command: String, reason: String },

    #[error("{0}")]
    Remote(String),

    #[error("secure random source unavailable: {0}")]
    Entropy(#[source] rand::Error),
}

impl Error {
    pub(crate) fn io(
        action: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn remote(msg: impl Into<String>) -> Self {
        Self::Remote(msg.into())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
