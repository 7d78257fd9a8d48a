//! Error definitions shared by the wire codec, marshallers and router.

use thiserror::Error;

use crate::package::ReturnCode;

/// Errors that can occur while translating or dispatching a transaction.
#[derive(Debug, Error)]
pub enum WireError {
    /// Malformed request line, status line or header block.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Positional arguments cannot travel over HTTP.
    #[error("Positional arguments are not supported over this transport ({0} given)")]
    UnsupportedArgument(usize),

    /// No resources registered under this verb.
    #[error("Resource type {0} is not recognized")]
    ResourceTypeNotFound(String),

    /// The verb is known but the path is not.
    #[error("Resource {path} of type {verb} could not be found")]
    ResourceNotFound { verb: String, path: String },

    /// Dispatch was invoked without a `path` argument.
    #[error("No \"path\" argument provided")]
    MissingPath,

    /// The router cannot serve traffic with this setup.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The host has no command by this name.
    #[error("Command {0} could not be found")]
    CommandNotFound(String),

    /// A multipart part could not be interpreted.
    #[error("Malformed multipart body: {0}")]
    Multipart(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WireError {
    /// Status code reported to the client when this error ends a transaction.
    pub fn return_code(&self) -> ReturnCode {
        match self {
            WireError::ResourceNotFound { .. } | WireError::CommandNotFound(_) => ReturnCode::NotFound,
            WireError::MissingPath
            | WireError::Decode(_)
            | WireError::UnsupportedArgument(_)
            | WireError::Multipart(_)
            | WireError::Json(_) => ReturnCode::BadRequest,
            WireError::ResourceTypeNotFound(_)
            | WireError::Configuration(_)
            | WireError::Io(_) => ReturnCode::ServerError,
        }
    }
}

/// Result type for wire operations.
pub type WireResult<T> = Result<T, WireError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WireError::ResourceNotFound {
            verb: "GET".into(),
            path: "/missing".into(),
        };
        assert_eq!(err.to_string(), "Resource /missing of type GET could not be found");

        let err = WireError::UnsupportedArgument(2);
        assert!(err.to_string().contains("2 given"));
    }

    #[test]
    fn test_return_codes() {
        assert_eq!(WireError::MissingPath.return_code(), ReturnCode::BadRequest);
        assert_eq!(
            WireError::ResourceTypeNotFound("DELETE".into()).return_code(),
            ReturnCode::ServerError
        );
        assert_eq!(
            WireError::ResourceNotFound { verb: "GET".into(), path: "/x".into() }.return_code(),
            ReturnCode::NotFound
        );
    }
}
