use thiserror::Error;

/// Common error types for the faucet workspace
#[derive(Error, Debug)]
pub enum CommonError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Malformed address input
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Malformed or out-of-range amount input
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, CommonError>;

/// Error conversion traits
impl From<serde_json::Error> for CommonError {
    fn from(err: serde_json::Error) -> Self {
        CommonError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for CommonError {
    fn from(err: toml::de::Error) -> Self {
        CommonError::Config(format!("TOML parsing error: {}", err))
    }
}

impl From<config::ConfigError> for CommonError {
    fn from(err: config::ConfigError) -> Self {
        CommonError::Config(format!("Configuration error: {}", err))
    }
}

/// Error context helper
pub trait ErrorContext<T> {
    fn with_context(self, context: &str) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<CommonError>,
{
    fn with_context(self, context: &str) -> Result<T> {
        self.map_err(|e| match e.into() {
            CommonError::Config(msg) => CommonError::Config(format!("{}: {}", context, msg)),
            CommonError::InvalidAmount(msg) => CommonError::InvalidAmount(format!("{}: {}", context, msg)),
            other => CommonError::Internal(format!("{}: {}", context, other)),
        })
    }
}
