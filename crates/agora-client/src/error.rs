use agora_shared::ValidationError;
use thiserror::Error;

/// Message shown when the backend gives no usable explanation.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Errors produced by the forum client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Input rejected before any request was made.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Transport failure (connection refused, timeout, TLS).
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The backend answered 404.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The current user may not perform this action.
    #[error("Not permitted: {0}")]
    NotPermitted(&'static str),

    /// A 2xx body that did not match the expected shape.
    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// Text suitable for a transient notification.
    ///
    /// Backend messages are surfaced verbatim; transport and decoding
    /// failures fall back to a generic message.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Api { message, .. } if !message.trim().is_empty() => message.clone(),
            Self::NotFound(what) => format!("Not found: {what}"),
            Self::NotPermitted(what) => format!("You cannot {what}"),
            Self::Api { .. } | Self::Http(_) | Self::Decode(_) => GENERIC_FAILURE.to_string(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_message_is_verbatim() {
        let err = ClientError::Api {
            status: 422,
            message: "Title already used in this forum".into(),
        };
        assert_eq!(err.user_message(), "Title already used in this forum");
    }

    #[test]
    fn test_blank_backend_message_falls_back() {
        let err = ClientError::Api {
            status: 500,
            message: "  ".into(),
        };
        assert_eq!(err.user_message(), GENERIC_FAILURE);
    }

    #[test]
    fn test_validation_message() {
        let err = ClientError::from(ValidationError::Required { field: "title" });
        assert_eq!(err.user_message(), "title is required");
    }
}
