use thiserror::Error;

/// Transport-level failure of a backend request.
///
/// There is no cancellation variant: a cancelled request produces no
/// outcome at all, so it can never reach the code that displays these.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("backend returned http {status}{}", body_suffix(.body))]
    Status { status: u16, body: String },
    #[error("invalid response payload: {0}")]
    Decode(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl FetchError {
    pub fn network(err: impl std::error::Error) -> Self {
        Self::Network(err.to_string())
    }

    pub fn status(status: reqwest::StatusCode, body: &str) -> Self {
        Self::Status {
            status: status.as_u16(),
            body: body.trim().to_string(),
        }
    }

    pub fn decode(err: impl std::error::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

fn body_suffix(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!("; body={body}")
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

impl ConfigError {
    pub fn invalid(name: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            name,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("no view for {0}")]
    NotFound(String),
    #[error("invalid {name}: {value}")]
    InvalidNumber { name: &'static str, value: String },
    #[error("month and day start at 1: {0}")]
    OutOfRange(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("clipboard write failed: {0}")]
pub struct ClipboardError(pub String);
