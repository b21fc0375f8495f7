use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tambi-bot")]
#[command(author, version, about = "Telegram launcher bot for the TAMBI web app", long_about = None)]
pub struct Cli {
    /// Log level used when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info", value_parser = parse_level)]
    pub log_level: log::LevelFilter,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot with its health server (default)
    Run,

    /// Probe a health endpoint once and report the result
    Probe {
        /// URL to probe, e.g. http://127.0.0.1:5000/health
        url: String,
    },
}

fn parse_level(s: &str) -> Result<log::LevelFilter, String> {
    s.parse().map_err(|_| format!("unknown log level: {}", s))
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
