use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Missing configuration: {key} is not set")]
    ConfigurationMissing { key: String },

    #[error("API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Upstream service error: {message}")]
    Upstream { message: String },

    #[error("Data unavailable: {message}")]
    DataUnavailable { message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML error: {message}")]
    TomlError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

/// 錯誤分類，對應掃描流程的失敗類型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    ConfigurationMissing,
    TransportFailure,
    UpstreamFailure,
    DataUnavailable,
    Storage,
    Configuration,
}

impl ScanError {
    pub fn upstream(message: impl Into<String>) -> Self {
        ScanError::Upstream {
            message: message.into(),
        }
    }

    pub fn missing(key: impl Into<String>) -> Self {
        ScanError::ConfigurationMissing { key: key.into() }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ScanError::ConfigurationMissing { .. } => ErrorCategory::ConfigurationMissing,
            ScanError::Transport(_) => ErrorCategory::TransportFailure,
            ScanError::Upstream { .. } => ErrorCategory::UpstreamFailure,
            ScanError::DataUnavailable { .. } => ErrorCategory::DataUnavailable,
            ScanError::CsvError(_) | ScanError::IoError(_) | ScanError::SerializationError(_) => {
                ErrorCategory::Storage
            }
            ScanError::TomlError { .. }
            | ScanError::ConfigError { .. }
            | ScanError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    /// 只有網路層錯誤（含逾時）值得重試
    pub fn is_transient(&self) -> bool {
        matches!(self, ScanError::Transport(_))
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ScanError::ConfigurationMissing { key } => {
                format!("{} is not configured. Run `contract-scanner keys set` first.", key)
            }
            ScanError::Transport(e) if e.is_timeout() => {
                "The remote service did not answer in time.".to_string()
            }
            ScanError::Transport(_) => "Could not reach the remote service.".to_string(),
            ScanError::Upstream { message } => format!("The remote service refused: {}", message),
            ScanError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting `{}`: {}", field, reason)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
