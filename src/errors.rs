use thiserror::Error;

#[allow(unused)]
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid scan target: {0}")]
    Target(#[from] TargetError),
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error("I/O error while {0}: {1}")]
    IO(String, #[source] std::io::Error), // For reading uploads and config files
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Application error: {0}")]
    Generic(String),
}

/// Failures talking to an external detection service.
///
/// These never escape a provider adapter: the adapter turns them into a
/// failed `ProviderResult` so the rest of the scan keeps going.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("Authentication failed: API key rejected")]
    Authentication,

    #[error("API rate limit exceeded, please try again later")]
    RateLimitExceeded,

    #[error("Server error: {status_code}")]
    Server { status_code: u16 },

    #[error("Response data parsing failed: {0}")]
    Parse(String),

    #[error("Unexpected response structure from API: {0}")]
    UnexpectedResponseStructure(String),
}

impl ProviderError {
    /// Whether another attempt has a chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Timeout | ProviderError::RateLimitExceeded => true,
            ProviderError::Server { status_code } => *status_code >= 500,
            ProviderError::Network(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

#[allow(unused)]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read file '{0}': {1}")]
    FileRead(String, #[source] std::io::Error),
    #[error("Failed to parse TOML from file '{0}': {1}")]
    TomlParse(String, #[source] toml::de::Error),
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("Other Config Error: {0}")]
    Other(String),
}

/// Rejections raised before a target ever reaches the dispatcher.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("Content hash is missing")]
    MissingHash,
    #[error("Content hash '{0}' is not a hex MD5, SHA-1 or SHA-256 digest")]
    InvalidHash(String),
    #[error("URL is empty")]
    EmptyUrl,
    #[error("Malformed URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Unsupported URL scheme '{0}', only http and https can be scanned")]
    UnsupportedScheme(String),
    #[error("URL '{0}' has no host")]
    MissingHost(String),
}

// --- From implementations for AppError ---

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IO("I/O operation failed".to_string(), err)
    }
}

/// Creates a `ConfigError::InvalidValue` for the named field.
pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        reason: reason.into(),
    }
}

/// Creates an `AppError::Generic` from any displayable message.
pub fn generic_error(msg: impl Into<String>) -> AppError {
    AppError::Generic(msg.into())
}
