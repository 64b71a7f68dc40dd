use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Shipping address is not available")]
    AddressUnavailable,

    #[error("Delivery services are only available for domestic shipping addresses")]
    NotDomestic,

    #[error("Persistence failure: {message}")]
    PersistenceFailure { message: String },

    #[error("Validation failed for {field}: {message}")]
    ValidationFailure { field: String, message: String },

    #[error("Unknown field '{field}' for option '{option}'")]
    UnknownField { option: String, field: String },

    #[error("Operation '{operation}' is not supported by option '{option}'")]
    UnsupportedOperation { option: String, operation: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Address,
    Persistence,
    Validation,
    Configuration,
    Usage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DeliveryError {
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::PersistenceFailure {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationFailure {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::AddressUnavailable | Self::NotDomestic => ErrorCategory::Address,
            Self::PersistenceFailure { .. } | Self::IoError(_) | Self::SerializationError(_) => {
                ErrorCategory::Persistence
            }
            Self::ValidationFailure { .. } => ErrorCategory::Validation,
            Self::UnknownField { .. } | Self::UnsupportedOperation { .. } => ErrorCategory::Usage,
            Self::TomlError(_)
            | Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Address => ErrorSeverity::Low,
            ErrorCategory::Validation => ErrorSeverity::Low,
            ErrorCategory::Persistence => ErrorSeverity::Medium,
            ErrorCategory::Usage => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    /// 持久化或驗證失敗不會中斷結帳流程
    pub fn is_fatal(&self) -> bool {
        self.severity() >= ErrorSeverity::High
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Address => "Save a complete domestic shipping address first",
            ErrorCategory::Persistence => "Retry the selection; the stored options may be stale",
            ErrorCategory::Validation => "Correct the highlighted field and try again",
            ErrorCategory::Usage => "Check the option and field codes used by the caller",
            ErrorCategory::Configuration => "Check the TOML configuration file",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::AddressUnavailable => {
                "Delivery options are unavailable until a shipping address is saved.".to_string()
            }
            Self::NotDomestic => {
                "Delivery options are only available for shipping addresses in Germany.".to_string()
            }
            Self::PersistenceFailure { .. } | Self::IoError(_) | Self::SerializationError(_) => {
                "Your delivery option could not be saved. Please try again.".to_string()
            }
            Self::ValidationFailure { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DeliveryError>;
