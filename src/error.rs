//! Error taxonomy shared by the detection core and the HTTP glue.

use axum::http::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    /// A stored record violates the history invariants (label set, value ranges).
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Unknown emotion label: {0}")]
    UnknownLabel(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<CoreError> for StatusCode {
    fn from(err: CoreError) -> Self {
        tracing::error!("🔥 {}", err);
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Reasons a set of classifier artifacts could not be turned into a trained classifier.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("missing {0} artifact")]
    Missing(&'static str),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {kind} artifact {path}: {source}")]
    Malformed {
        kind: &'static str,
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("inconsistent artifacts: {0}")]
    Inconsistent(String),

    #[error("label decoder class {0:?} is outside the supported emotion set")]
    LabelMismatch(String),
}
