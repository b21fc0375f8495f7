use secrecy::{ExposeSecret, SecretString};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;
use url::Url;

use crate::core::error::ConfigError;

/// Environment variables consulted for the bot token, in priority order
pub const TOKEN_VARS: [&str; 3] = ["TELEGRAM_BOT_TOKEN", "BOT_TOKEN", "TELOXIDE_TOKEN"];

/// Either of these being set (non-empty) means we run as a production deployment
pub const DEPLOYMENT_VARS: [&str; 2] = ["REPLIT_DEPLOYMENT", "REPL_DEPLOYMENT"];

/// Minimum plausible token length. A sanity check, not a validity guarantee.
pub const MIN_TOKEN_LEN: usize = 40;

/// Default port for the health server
pub const DEFAULT_PORT: u16 = 5000;

/// Default web app opened by the launch button
pub const DEFAULT_WEBAPP_URL: &str = "https://code891.github.io/TAMBI/";

/// Supervisor (polling restart) configuration
pub mod supervisor {
    use super::Duration;

    /// Maximum number of consecutive restarts before the bot gives up
    pub const MAX_RESTARTS: u32 = 5;

    /// Delay between restart attempts (in seconds)
    pub const RESTART_DELAY_SECS: u64 = 10;

    /// Restart delay duration
    pub fn restart_delay() -> Duration {
        Duration::from_secs(RESTART_DELAY_SECS)
    }
}

/// Keep-alive (self health probe) configuration
pub mod keep_alive {
    use super::Duration;

    /// Wait before the first probe so the health server has time to bind
    pub const INITIAL_DELAY_SECS: u64 = 30;

    /// Interval between probes
    pub const INTERVAL_SECS: u64 = 300;

    /// Timeout of a single probe
    pub const PROBE_TIMEOUT_SECS: u64 = 5;

    pub fn initial_delay() -> Duration {
        Duration::from_secs(INITIAL_DELAY_SECS)
    }

    pub fn interval() -> Duration {
        Duration::from_secs(INTERVAL_SECS)
    }

    pub fn probe_timeout() -> Duration {
        Duration::from_secs(PROBE_TIMEOUT_SECS)
    }
}

/// Greeting cleanup configuration
pub mod greeting {
    /// How many preceding messages are deleted before a greeting is shown
    pub const CLEANUP_DEPTH: i32 = 5;
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Bot API calls (in seconds).
    /// Must stay above the long-poll timeout teloxide uses for getUpdates.
    pub const REQUEST_TIMEOUT_SECS: u64 = 60;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Runtime configuration assembled from the process environment
#[derive(Debug)]
pub struct Config {
    pub bot_token: SecretString,
    /// True when running as a production deployment (keep-alive disabled)
    pub is_deployment: bool,
    pub repl_slug: String,
    pub repl_owner: String,
    pub bind_addr: SocketAddr,
    pub webapp_url: Url,
}

impl Config {
    /// Reads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated the same as unset ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token = TOKEN_VARS
            .iter()
            .find_map(|key| get(key))
            .ok_or(ConfigError::MissingToken)?;
        validate_token(&token)?;

        let is_deployment = DEPLOYMENT_VARS.iter().any(|key| get(key).is_some());

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            None => DEFAULT_PORT,
        };

        let webapp_raw = get("WEBAPP_URL").unwrap_or_else(|| DEFAULT_WEBAPP_URL.to_string());
        let webapp_url = Url::parse(&webapp_raw).map_err(|e| ConfigError::InvalidUrl {
            url: webapp_raw.clone(),
            source: e,
        })?;

        Ok(Self {
            bot_token: SecretString::from(token),
            is_deployment,
            repl_slug: get("REPL_SLUG").unwrap_or_else(|| "localhost".to_string()),
            repl_owner: get("REPL_OWNER").unwrap_or_else(|| "replit".to_string()),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], port)),
            webapp_url,
        })
    }

    /// Public health URL of this service, used by the keep-alive loop
    pub fn self_health_url(&self) -> String {
        format!("https://{}.{}.repl.co/health", self.repl_slug, self.repl_owner)
    }

    pub fn token(&self) -> &str {
        self.bot_token.expose_secret()
    }
}

/// Checks that a token is non-empty and long enough to plausibly be real
pub fn validate_token(token: &str) -> Result<(), ConfigError> {
    let len = token.trim().chars().count();
    if len == 0 {
        return Err(ConfigError::MissingToken);
    }
    if len < MIN_TOKEN_LEN {
        return Err(ConfigError::TokenTooShort { len, min: MIN_TOKEN_LEN });
    }
    Ok(())
}
