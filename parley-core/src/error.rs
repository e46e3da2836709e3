use thiserror::Error;

/// Errors raised while building or decoding model values.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid connection id '{input}': {source}")]
    InvalidId {
        input: String,
        #[source]
        source: uuid::Error,
    },

    #[error("malformed ice candidate '{candidate}': {reason}")]
    MalformedCandidate {
        candidate: String,
        reason: &'static str,
    },

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}
