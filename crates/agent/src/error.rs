use thiserror::Error;

const GENERIC_HTTP_MESSAGE: &str = "An error occurred while communicating with the service.";
const GENERIC_MESSAGE: &str = "An unexpected error occurred. Please try again or check the logs.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Unauthorized,
    NotFound,
    RateLimited,
    ServiceUnavailable,
    Network,
    Timeout,
    Unknown,
}

const HTTP_ERROR_MAP: &[(u16, ErrorKind, &str)] = &[
    (400, ErrorKind::Validation, "Invalid request. Please check your input."),
    (401, ErrorKind::Unauthorized, "Authentication failed. Please check your API credentials."),
    (403, ErrorKind::Unauthorized, "Access denied. You may not have permission for this action."),
    (404, ErrorKind::NotFound, "Resource not found. The agent may have been deleted."),
    (429, ErrorKind::RateLimited, "Rate limited. Please wait a moment and try again."),
    (500, ErrorKind::ServiceUnavailable, "The service is experiencing issues. Please try again later."),
    (502, ErrorKind::ServiceUnavailable, "The service is temporarily unavailable. Please try again."),
    (503, ErrorKind::ServiceUnavailable, "The service is under maintenance. Please try again later."),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Error envelope carried from the point a failure is first observed up to
/// the reply boundary. `Display` shows the internal diagnostic and is meant
/// for logs; replies use [`AppError::user_message`].
#[derive(Debug, Clone, Error)]
#[error("{}", diagnostic(.internal, .user_message))]
pub struct AppError {
    kind: ErrorKind,
    user_message: String,
    internal: Option<String>,
    status: Option<u16>,
}

fn diagnostic<'a>(internal: &'a Option<String>, user_message: &'a str) -> &'a str {
    internal.as_deref().unwrap_or(user_message)
}

impl AppError {
    pub fn new(kind: ErrorKind, user_message: impl Into<String>) -> Self {
        Self {
            kind,
            user_message: user_message.into(),
            internal: None,
            status: None,
        }
    }

    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal = Some(internal.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Maps a non-2xx response to a classified error. `detail` is whatever
    /// the remote body said and is kept only as the internal diagnostic.
    pub fn from_status(status: u16, detail: Option<String>) -> Self {
        let internal = detail.unwrap_or_else(|| format!("HTTP {status}"));
        let mapped = match HTTP_ERROR_MAP.iter().find(|(code, _, _)| *code == status) {
            Some((_, kind, message)) => Self::new(*kind, *message),
            None => Self::new(ErrorKind::Unknown, GENERIC_HTTP_MESSAGE),
        };
        mapped.with_internal(internal).with_status(status)
    }

    /// Wraps a failure that never passed through the HTTP mapping, using the
    /// text fallback to pick a safe message.
    pub fn unexpected(error: impl std::fmt::Display) -> Self {
        let text = error.to_string();
        let (kind, message) = classify_message(&text);
        Self::new(kind, message).with_internal(text)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    pub fn internal_message(&self) -> Option<&str> {
        self.internal.as_deref()
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, ErrorKind::RateLimited | ErrorKind::Network)
            || matches!(self.status, Some(429) | Some(500..=599))
    }
}

impl From<ValidationError> for AppError {
    fn from(error: ValidationError) -> Self {
        Self::new(ErrorKind::Validation, error.message)
    }
}

fn classify_message(message: &str) -> (ErrorKind, String) {
    let lower = message.to_lowercase();

    if lower.contains("invalid agent id") || lower.contains("agent id is required") {
        return (ErrorKind::Validation, message.to_string());
    }
    if lower.contains("not found") || lower.contains("404") {
        return (
            ErrorKind::NotFound,
            "Agent not found. Please verify the agent ID exists.".to_string(),
        );
    }
    if lower.contains("unauthorized") || lower.contains("401") {
        return (
            ErrorKind::Unauthorized,
            "Authentication failed. Please verify your API credentials.".to_string(),
        );
    }
    if lower.contains("rate limit") || lower.contains("429") {
        return (
            ErrorKind::RateLimited,
            "Rate limited. Please wait before making more requests.".to_string(),
        );
    }
    if lower.contains("timeout") || lower.contains("timed out") {
        return (
            ErrorKind::Timeout,
            "Request timed out. The operation may still be processing.".to_string(),
        );
    }
    if lower.contains("network") || lower.contains("connection") {
        return (
            ErrorKind::Network,
            "Network error. Please check your connection and try again.".to_string(),
        );
    }
    if ["prompt", "repository", "missing", "branch name"]
        .iter()
        .any(|prefix| lower.starts_with(prefix))
    {
        return (ErrorKind::Validation, message.to_string());
    }

    (ErrorKind::Unknown, GENERIC_MESSAGE.to_string())
}
