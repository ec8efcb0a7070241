//! Gateway errors.

use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The session has no token, or the backend answered 401/403.
    #[error("session expired, please sign in again")]
    Unauthorized,

    /// The backend refused the request. The message is the backend's own.
    #[error("{message}")]
    Rejected {
        /// HTTP status code
        status: u16,

        /// Message supplied by the backend
        message: String,
    },

    /// The response envelope carried no data.
    #[error("response contained no data")]
    MissingData,

    /// The response body could not be understood.
    #[error("unexpected response from backend: {0}")]
    UnexpectedResponse(String),
}

impl ApiError {
    /// The message to show the customer.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
