use core::fmt;
use std::sync::PoisonError;

#[derive(Debug)]
pub enum AppError {
    Config(String),
    Io(std::io::Error),
    Json(serde_json::Error),
    Lock(String),
    NotFound(String),
    ParseCommand(String),
    Regex(regex::Error),
    Request(reqwest::Error),
    Server { status: u16, message: String },
    Transfer(String),
    Validation(String),
}

impl AppError {
    /// Availability failures: 5xx responses, refused connections and timeouts.
    /// Anything else means the directory answered and rejected the request.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Server { status, .. } => *status >= 500,
            AppError::Request(e) => {
                e.is_connect()
                    || e.is_timeout()
                    || e.status().is_some_and(|s| s.is_server_error())
            }
            _ => false,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Json(err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Request(err)
    }
}

impl From<regex::Error> for AppError {
    fn from(err: regex::Error) -> Self {
        AppError::Regex(err)
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::Config(format!("invalid url: {}", err))
    }
}

impl<T> From<PoisonError<T>> for AppError {
    fn from(err: PoisonError<T>) -> Self {
        AppError::Lock(err.to_string())
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Config(msg) => {
                write!(f, "Configuration error: {}", msg)
            }
            AppError::Io(e) => {
                write!(f, "I/O error while accessing a file or resource: {}", e)
            }
            AppError::Json(e) => {
                write!(f, "Malformed JSON data: {}", e)
            }
            AppError::Lock(msg) => {
                write!(f, "Contact book state is unavailable: {}", msg)
            }
            AppError::NotFound(item) => {
                write!(f, "{} Not found", item)
            }
            AppError::ParseCommand(cmd) => {
                write!(f, "Unrecognized command: '{}'", cmd)
            }
            AppError::Regex(e) => {
                write!(f, "Invalid pattern: {}", e)
            }
            AppError::Request(e) => {
                write!(f, "Request failed: {}", e)
            }
            AppError::Server { status, message } => {
                write!(f, "Server responded with {}: {}", status, message)
            }
            AppError::Transfer(msg) => {
                write!(f, "Transfer failed: {}", msg)
            }
            AppError::Validation(msg) => {
                write!(f, "Validation failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for AppError {}
