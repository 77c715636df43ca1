use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("CliError: {0}")]
    Cli(#[from] CliError),
    #[error("ApiError: {0}")]
    Api(#[from] ApiError),
    #[error("ConfigError: {0}")]
    Config(#[from] ConfigError),
    #[error("AuthError: {0}")]
    Auth(#[from] AuthError),
    #[error("StorageError: {0}")]
    Storage(#[from] StorageError),
    #[error("DisplayError: {0}")]
    Display(#[from] DisplayError),
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Authentication required")]
    AuthRequired { message: String, hint: String },
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

/// Failures talking to the SQL runner service.
///
/// `Service` carries a structured `{error}` body returned by the service;
/// `Transport` and `Timeout` are connection-level failures with no body;
/// `Http` is a non-JSON failure body passed through as raw text.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64, endpoint: String },
    #[error("Connection error: {message}")]
    Transport { endpoint: String, message: String },
    #[error("HTTP error: {status} {message}")]
    Http {
        status: u16,
        endpoint: String,
        message: String,
    },
    #[error("Service error: {message}")]
    Service {
        status: u16,
        endpoint: String,
        message: String,
    },
    #[error("Authentication failed")]
    Unauthorized {
        status: u16,
        endpoint: String,
        server_message: String,
    },
}

impl ApiError {
    /// The `{error}` text the service attached to the failure, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Service { message, .. } => Some(message),
            ApiError::Unauthorized { server_message, .. } => Some(server_message),
            _ => None,
        }
    }

    /// Connection-level description for failures without a structured body.
    pub fn transport_message(&self) -> Option<String> {
        match self {
            ApiError::Transport { message, .. } => Some(message.clone()),
            ApiError::Timeout { timeout_secs, .. } => {
                Some(format!("Request timed out after {}s", timeout_secs))
            }
            ApiError::Http {
                status, message, ..
            } => {
                if message.is_empty() {
                    Some(format!("Request failed with status code {}", status))
                } else {
                    Some(format!("HTTP {}: {}", status, message))
                }
            }
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Login failed: Invalid credentials")]
    InvalidCredentials,
    #[error("Session expired or invalid")]
    SessionInvalid,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Keyring error: {0}")]
    KeyringError(String),
    #[error("File I/O error at {path}: {source}")]
    FileIo {
        path: String,
        source: std::io::Error,
    },
    #[error("Configuration save failed")]
    ConfigSaveFailed,
    #[error("Configuration parse error: {message}")]
    ConfigParseError { message: String },
    #[error("Configuration directory not found")]
    ConfigDirNotFound,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String, hint: String },
    #[error("Configuration field '{field}' is missing")]
    MissingField { field: String, field_type: String },
    #[error("Invalid configuration value for '{field}': {value}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("Table formatting failed: {0}")]
    TableFormat(String),
    #[error("Terminal output error: {0}")]
    TerminalOutput(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorSeverity {
    Critical,
    High,
    Medium,
    Low,
}

impl ErrorSeverity {
    pub fn emoji(&self) -> &'static str {
        match self {
            ErrorSeverity::Critical => "🚨",
            ErrorSeverity::High => "❌",
            ErrorSeverity::Medium => "⚠️",
            ErrorSeverity::Low => "ℹ️",
        }
    }
}

impl AppError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AppError::Cli(_) => ErrorSeverity::Medium,
            AppError::Api(api_error) => match api_error {
                ApiError::Unauthorized { .. } => ErrorSeverity::High,
                ApiError::Timeout { .. } => ErrorSeverity::Medium,
                ApiError::Http { status, .. } | ApiError::Service { status, .. }
                    if *status >= 500 =>
                {
                    ErrorSeverity::High
                }
                _ => ErrorSeverity::Medium,
            },
            AppError::Config(_) => ErrorSeverity::High,
            AppError::Auth(_) => ErrorSeverity::High,
            AppError::Storage(_) => ErrorSeverity::Medium,
            AppError::Display(_) => ErrorSeverity::Low,
        }
    }

    pub fn display_friendly(&self) -> String {
        match self {
            AppError::Cli(CliError::OperationFailed(message)) => message.clone(),
            AppError::Cli(CliError::AuthRequired { message, .. }) => {
                format!("Authentication required: {}", message)
            }
            AppError::Auth(AuthError::InvalidCredentials) => "Invalid credentials".to_string(),
            AppError::Auth(AuthError::SessionInvalid) => "Session expired or invalid".to_string(),
            AppError::Api(ApiError::Service { message, .. }) => message.clone(),
            AppError::Config(ConfigError::FileNotFound { path, .. }) => {
                format!("Configuration file not found: {}", path)
            }
            _ => format!("{}", self),
        }
    }

    pub fn troubleshooting_hint(&self) -> Option<String> {
        match self {
            AppError::Cli(CliError::AuthRequired { hint, .. }) => Some(hint.clone()),
            AppError::Auth(AuthError::InvalidCredentials | AuthError::SessionInvalid)
            | AppError::Api(ApiError::Unauthorized { .. }) => {
                Some("'sqlr-cli auth login' to start a new session".to_string())
            }
            AppError::Config(ConfigError::FileNotFound { .. }) => {
                Some("'sqlr-cli config set <field> <value>' to set a configuration value".to_string())
            }
            AppError::Api(ApiError::Timeout { .. } | ApiError::Transport { .. }) => {
                Some("Check your network or the SQL runner service URL and try again".to_string())
            }
            _ => None,
        }
    }
}
