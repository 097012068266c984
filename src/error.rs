use thiserror::Error;

/// ApiError
///
/// Every failure the client can observe, from form validation through the
/// transport to the local token store. `Unauthorized` is consumed by the
/// session interceptor and is never shown to the user as a notice.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    ValidationFailure(String),

    #[error("Session expired, please log in again")]
    Unauthorized,

    #[error("You do not have permission to do that")]
    Forbidden,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Backend unreachable: {0}")]
    NetworkFailure(String),

    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Token store error: {0}")]
    Storage(String),
}

/// Name used by the session operations.
pub type AuthError = ApiError;

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::ValidationFailure(message.into())
    }

    /// Errors that belong in a user-visible notice.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, ApiError::Unauthorized)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::MalformedResponse(err.to_string())
        } else {
            ApiError::NetworkFailure(err.to_string())
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Storage(err.to_string())
    }
}
