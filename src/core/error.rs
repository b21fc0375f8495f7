use thiserror::Error;

/// Configuration errors detected at startup
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No token in any of the accepted environment variables
    #[error("bot token not found (set TELEGRAM_BOT_TOKEN)")]
    MissingToken,

    /// Token is implausibly short
    #[error("bot token looks invalid: {len} characters, expected at least {min}")]
    TokenTooShort { len: usize, min: usize },

    #[error("invalid PORT value: {0:?}")]
    InvalidPort(String),

    #[error("invalid URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Top-level errors surfaced by the binary's subcommands
///
/// Uses `thiserror` for automatic error conversion and display formatting.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// HTTP/Fetch errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;
