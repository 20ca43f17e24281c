//! Engine error types

use pivot_types::{ErrorCode, ErrorInfo};
use thiserror::Error;

/// Errors raised at the engine boundary.
///
/// Data problems (unparsable metrics, missing keys, zero totals) never
/// produce an error; they degrade the output instead.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The pivot spec is structurally unusable
    #[error("invalid pivot spec: {0}")]
    InvalidSpec(String),

    /// A host message could not be decoded
    #[error("malformed message: {0}")]
    MalformedMessage(#[source] serde_json::Error),

    /// A response could not be encoded
    #[error("failed to serialize response: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl EngineError {
    /// Error code reported to the host
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::InvalidSpec(_) => ErrorCode::InvalidSpec,
            EngineError::MalformedMessage(_) => ErrorCode::ParseError,
            EngineError::Serialize(_) => ErrorCode::Unknown,
        }
    }
}

impl From<&EngineError> for ErrorInfo {
    fn from(err: &EngineError) -> Self {
        let details = match err {
            EngineError::MalformedMessage(e) | EngineError::Serialize(e) => {
                Some(format!("line {}, column {}", e.line(), e.column()))
            }
            EngineError::InvalidSpec(_) => None,
        };
        ErrorInfo {
            code: err.code(),
            message: err.to_string(),
            details,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
