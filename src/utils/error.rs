use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlertError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Recipe parse error at line {line}: {message}")]
    RecipeParseError { line: usize, message: String },

    #[error("Server error: {message}")]
    ServerError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Recipe,
    Network,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AlertError::ConfigError { .. }
            | AlertError::InvalidConfigValueError { .. }
            | AlertError::MissingConfigError { .. }
            | AlertError::TomlError(_) => ErrorCategory::Configuration,
            AlertError::RecipeParseError { .. } => ErrorCategory::Recipe,
            AlertError::ServerError { .. } => ErrorCategory::Network,
            AlertError::IoError(_) | AlertError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration | ErrorCategory::Recipe => ErrorSeverity::High,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            AlertError::InvalidConfigValueError { field, value, .. } => {
                format!("Setting '{}' has an invalid value: '{}'", field, value)
            }
            AlertError::MissingConfigError { field } => {
                format!("Setting '{}' is required but was not provided", field)
            }
            AlertError::ServerError { message } => {
                format!("The HTTP server could not start: {}", message)
            }
            AlertError::RecipeParseError { line, .. } => {
                format!("The container recipe could not be read (line {})", line)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            AlertError::InvalidConfigValueError { field, .. } if field == "port" => {
                "Set PORT to a number between 0 and 65535"
            }
            AlertError::InvalidConfigValueError { .. } | AlertError::MissingConfigError { .. } => {
                "Check the CLI flags, environment variables and config file"
            }
            AlertError::ConfigError { .. } | AlertError::TomlError(_) => {
                "Check the config file syntax"
            }
            AlertError::RecipeParseError { .. } => "Check the Dockerfile syntax near the reported line",
            AlertError::ServerError { .. } => {
                "Make sure the address is free and the process may bind to it"
            }
            AlertError::IoError(_) => "Check that the file exists and is readable",
            AlertError::SerializationError(_) => "Report this as a bug",
        }
    }

    /// 依嚴重程度決定程序退出碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, AlertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_port_is_configuration_error() {
        let err = AlertError::InvalidConfigValueError {
            field: "port".to_string(),
            value: "abc".to_string(),
            reason: "not a number".to_string(),
        };

        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(err.exit_code(), 1);
        assert!(err.recovery_suggestion().contains("PORT"));
        assert!(err.user_friendly_message().contains("abc"));
    }

    #[test]
    fn test_io_error_is_critical() {
        let err: AlertError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_server_error_is_retryable() {
        let err = AlertError::ServerError {
            message: "address in use".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(err.exit_code(), 2);
    }
}
