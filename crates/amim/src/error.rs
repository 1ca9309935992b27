use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Key '{0}' does not follow the <type>_<id> convention")]
    MalformedKey(String),

    #[error("No {node_type} with id {id}")]
    IdNotFound { node_type: String, id: u64 },

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Key '{key}' is a {found}, expected a {expected}")]
    NodeTypeMismatch {
        key: String,
        expected: String,
        found: String,
    },

    #[error("Unknown dtype: {0}")]
    UnknownDtype(String),

    #[error("Expected dtype {expected}, found {found}")]
    UnexpectedDtype { expected: String, found: String },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
}
