//! Error types for the registry client

use thiserror::Error;

/// Registry client error type
#[derive(Error, Debug)]
pub enum Error {
    /// The registry holds no entry for the requested instance or application
    #[error("not found in registry: {}", describe_target(.app, .id))]
    NotFound {
        /// Application name
        app: String,
        /// Instance id, `None` when the whole application is missing
        id: Option<String>,
    },

    /// The registry answered with a non-success status
    #[error("registry returned status {code}: {message}")]
    Status {
        /// Status code as reported by the registry
        code: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// Connection-level failure talking to the registry
    #[error("transport error: {0}")]
    Transport(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization error
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Missing instance
    pub fn instance_not_found(app: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            app: app.into(),
            id: Some(id.into()),
        }
    }

    /// Missing application
    pub fn app_not_found(app: impl Into<String>) -> Self {
        Self::NotFound {
            app: app.into(),
            id: None,
        }
    }

    /// Whether the registry reported that the referenced entry does not exist.
    ///
    /// Backends that only surface raw status codes are covered too: a 404
    /// status counts as not-found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Status { code, .. } => *code == 404,
            _ => false,
        }
    }

    /// Status code carried by the error, if the registry produced one
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

fn describe_target(app: &str, id: &Option<String>) -> String {
    match id {
        Some(id) => format!("{app}/{id}"),
        None => app.to_string(),
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(Error::instance_not_found("orders", "i-1").is_not_found());
        assert!(Error::app_not_found("orders").is_not_found());
        assert!(
            Error::Status {
                code: 404,
                message: "Not Found".to_string(),
            }
            .is_not_found()
        );

        assert!(
            !Error::Status {
                code: 503,
                message: "Service Unavailable".to_string(),
            }
            .is_not_found()
        );
        assert!(!Error::Transport("connection reset".to_string()).is_not_found());
    }

    #[test]
    fn test_status_code() {
        let err = Error::Status {
            code: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.status_code(), Some(500));
        assert_eq!(Error::app_not_found("orders").status_code(), Some(404));
        assert_eq!(Error::Transport("eof".to_string()).status_code(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Error::instance_not_found("orders", "i-1").to_string(),
            "not found in registry: orders/i-1"
        );
        assert_eq!(
            Error::app_not_found("orders").to_string(),
            "not found in registry: orders"
        );
    }
}
