//! Error types for the Promptly client

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced an HTTP response
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Request timeout")]
    Timeout,

    /// Non-success status. `message` is the server's `error` field when it sent one.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// 401 from the API; credentials were cleared before this was returned
    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Empty response from {0}")]
    EmptyResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Activity could not be attributed: no identifier or no email
    #[error("Missing user identity: {0}")]
    MissingIdentity(String),

    #[error(transparent)]
    Core(#[from] promptly_core::Error),
}

impl ClientError {
    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::AuthenticationRequired => Some(401),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_formatting() {
        let err = ClientError::Http {
            status: 409,
            message: "Persona already exists".to_string(),
        };
        assert_eq!(err.to_string(), "Persona already exists");
        assert_eq!(err.status(), Some(409));

        let err = ClientError::AuthenticationRequired;
        assert_eq!(err.to_string(), "Authentication required");
        assert_eq!(err.status(), Some(401));

        let err = ClientError::Transport("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(err.status(), None);

        let err = ClientError::from(promptly_core::Error::Storage("disk full".to_string()));
        assert_eq!(err.to_string(), "Storage error: disk full");
    }
}
