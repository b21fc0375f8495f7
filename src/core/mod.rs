//! Core utilities, configuration, and common functionality

pub mod config;
pub mod error;
pub mod keep_alive;
pub mod logging;
pub mod supervisor;
pub mod web_server;

// Re-exports for convenience
pub use config::Config;
pub use error::{AppError, AppResult, ConfigError};
pub use logging::{init_logging, LoggingConfig};
