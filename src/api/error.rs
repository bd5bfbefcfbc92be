use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Login rejected: {0}")]
    LoginRejected(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Fallback message when the login error body carries nothing usable
pub(crate) const LOGIN_FALLBACK_MESSAGE: &str = "Erro ao fazer login";

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..MAX_ERROR_BODY_LENGTH],
                body.len()
            )
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    /// Human-readable message for a failed login, suitable for display.
    ///
    /// `LoginRejected` carries the message extracted from the API body; any
    /// other failure collapses to the generic fallback.
    pub fn login_message(&self) -> String {
        match self {
            ApiError::LoginRejected(message) => message.clone(),
            _ => LOGIN_FALLBACK_MESSAGE.to_string(),
        }
    }
}

/// Extract the human-readable message from a login error body.
///
/// The backend reports serializer failures as `{"non_field_errors": [...]}`
/// and ad-hoc failures as `{"message": "..."}`. First available wins, then
/// the fallback literal.
pub(crate) fn login_failure_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return LOGIN_FALLBACK_MESSAGE.to_string();
    };

    if let Some(first) = value
        .get("non_field_errors")
        .and_then(|errors| errors.as_array())
        .and_then(|errors| errors.first())
        .and_then(|error| error.as_str())
    {
        if !first.is_empty() {
            return first.to_string();
        }
    }

    if let Some(message) = value.get("message").and_then(|message| message.as_str()) {
        if !message.is_empty() {
            return message.to_string();
        }
    }

    LOGIN_FALLBACK_MESSAGE.to_string()
}
