//! Logging initialization
//!
//! The logger is configured from an explicit [`LoggingConfig`] handed to
//! [`init_logging`] at startup. `RUST_LOG`, when present, takes precedence.

use anyhow::Result;
use log::LevelFilter;

/// Log level configuration for the process
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default level for everything not listed in `quiet_modules`
    pub level: LevelFilter,
    /// Per-module overrides, used to silence chatty dependencies
    pub quiet_modules: Vec<(String, LevelFilter)>,
    /// Honour `RUST_LOG` if it is set
    pub respect_env: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            quiet_modules: ["teloxide", "teloxide_core", "reqwest", "hyper", "hyper_util", "axum"]
                .iter()
                .map(|m| (m.to_string(), LevelFilter::Error))
                .collect(),
            respect_env: true,
        }
    }
}

impl LoggingConfig {
    /// Sets the default level.
    #[must_use]
    pub fn level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// Adds a per-module override.
    #[must_use]
    pub fn quiet(mut self, module: &str, level: LevelFilter) -> Self {
        self.quiet_modules.push((module.to_string(), level));
        self
    }

    /// Ignore `RUST_LOG`.
    #[must_use]
    pub fn ignore_env(mut self) -> Self {
        self.respect_env = false;
        self
    }

    /// Filter directive equivalent to this config, in `RUST_LOG` syntax
    pub fn directives(&self) -> String {
        let mut parts = vec![self.level.to_string().to_lowercase()];
        parts.extend(
            self.quiet_modules
                .iter()
                .map(|(module, level)| format!("{}={}", module, level.to_string().to_lowercase())),
        );
        parts.join(",")
    }
}

/// Initialize the console logger
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - A logger was already installed
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let mut builder = pretty_env_logger::formatted_timed_builder();

    let from_env = if config.respect_env {
        std::env::var("RUST_LOG").ok().filter(|v| !v.trim().is_empty())
    } else {
        None
    };

    let filters = from_env.unwrap_or_else(|| config.directives());
    builder.parse_filters(&filters);

    builder
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}
