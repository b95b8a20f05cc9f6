use thiserror::Error;

#[derive(Error, Debug)]
pub enum LeadError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("CSV writing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Server responded with {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfig { field: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Nenhum lead para exportar.")]
    EmptyExport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Server,
    Validation,
    Configuration,
    Io,
}

impl LeadError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LeadError::Http(_) => ErrorCategory::Network,
            LeadError::Server { .. } | LeadError::Serialization(_) => ErrorCategory::Server,
            LeadError::Validation { .. } | LeadError::EmptyExport => ErrorCategory::Validation,
            LeadError::Config { .. }
            | LeadError::InvalidConfigValue { .. }
            | LeadError::MissingConfig { .. }
            | LeadError::Url(_) => ErrorCategory::Configuration,
            LeadError::Io(_) | LeadError::Csv(_) => ErrorCategory::Io,
        }
    }

    /// 給使用者看的單行訊息：伺服器有回 `erro` 就用它，否則用呼叫端的固定文字
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            LeadError::Server { message, .. } if !message.trim().is_empty() => message.clone(),
            LeadError::Validation { message } => message.clone(),
            LeadError::EmptyExport => self.to_string(),
            _ => fallback.to_string(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Validation => 1,
            ErrorCategory::Network | ErrorCategory::Server => 2,
            ErrorCategory::Configuration => 3,
            ErrorCategory::Io => 4,
        }
    }
}

pub type Result<T> = std::result::Result<T, LeadError>;
