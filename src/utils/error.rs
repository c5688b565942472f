use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatusError {
    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

impl StatusError {
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            StatusError::ConfigError { .. }
                | StatusError::ConfigValidationError { .. }
                | StatusError::InvalidConfigValueError { .. }
                | StatusError::MissingConfigError { .. }
        )
    }

    /// 給終端使用者看的簡短訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            StatusError::HttpClientError(_) => "Could not initialise the HTTP client".to_string(),
            StatusError::IoError(e) => format!("Could not read a required file: {}", e),
            StatusError::SerializationError(_) => "Could not serialise the status payload".to_string(),
            StatusError::ConfigError { message } => format!("Configuration problem: {}", message),
            StatusError::ConfigValidationError { field, message } => {
                format!("Configuration field '{}' is invalid: {}", field, message)
            }
            StatusError::InvalidConfigValueError { field, value, reason } => {
                format!("'{}' is not a valid value for '{}' ({})", value, field, reason)
            }
            StatusError::MissingConfigError { field } => {
                format!("Configuration field '{}' is required", field)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            StatusError::HttpClientError(_) => "Check the TLS setup of the host and retry",
            StatusError::IoError(_) => "Make sure the configuration file exists and is readable",
            StatusError::SerializationError(_) => "Report this as a bug with the offending configuration",
            StatusError::ConfigError { .. } | StatusError::ConfigValidationError { .. } => {
                "Fix the TOML configuration file and restart"
            }
            StatusError::InvalidConfigValueError { .. } => {
                "Correct the value in the configuration file and restart"
            }
            StatusError::MissingConfigError { .. } => "Add the missing field to the configuration file",
        }
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_config_error() {
            2
        } else {
            1
        }
    }
}

/// 單一來源的抓取失敗。只會在 coordinator 內部出現，之後轉成 `ERROR` verdict。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, StatusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_exit_with_two() {
        let err = StatusError::MissingConfigError {
            field: "sources".to_string(),
        };
        assert!(err.is_config_error());
        assert_eq!(err.exit_code(), 2);
        assert!(err.user_friendly_message().contains("sources"));
    }

    #[test]
    fn test_fetch_error_display() {
        assert_eq!(
            FetchError::Timeout(Duration::from_millis(4000)).to_string(),
            "timed out after 4000ms"
        );
        assert_eq!(FetchError::Status(503).to_string(), "HTTP status 503");
    }
}
