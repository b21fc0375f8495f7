use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;

use tambi_bot::cli::{Cli, Commands};
use tambi_bot::core::keep_alive::{self, KeepAlive, Schedule};
use tambi_bot::core::supervisor::{stop_signal, RestartPolicy, StopReason, Supervisor};
use tambi_bot::core::web_server::spawn_web_server;
use tambi_bot::core::{init_logging, AppError, AppResult, Config, LoggingConfig};
use tambi_bot::telegram::{Greeting, TelegramSession};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to the requested subcommand.
///
/// # Errors
/// Returns an error if the logger cannot be installed or a probe fails.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // .env is optional; it must be loaded before RUST_LOG is read.
    let _ = dotenv();

    init_logging(&LoggingConfig::default().level(cli.log_level))?;

    // Panics inside the dispatcher task are recovered by the supervisor; make sure they are logged.
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {}", panic_info);
    }));

    match cli.command {
        Some(Commands::Probe { url }) => {
            let status = keep_alive::probe(&url)
                .await
                .map_err(|e| anyhow::anyhow!("Health probe {} failed: {}", url, e))?;
            println!("✅ {} -> {}", url, status);
            Ok(())
        }
        Some(Commands::Run) | None => match run_bot().await {
            Ok(StopReason::Conflict) => {
                log::warn!("🛑 Bot stopped: another instance holds the connection");
                Ok(())
            }
            Ok(StopReason::RetriesExhausted) => {
                log::warn!("🛑 Bot stopped: restart limit reached");
                Ok(())
            }
            Ok(StopReason::Interrupted) => {
                log::info!("🛑 Bot stopped");
                Ok(())
            }
            Err(AppError::Config(e)) => {
                log::error!("❌ {}", e);
                log::error!("🛑 Bot stopped");
                Ok(())
            }
            Err(e) => Err(e.into()),
        },
    }
}

/// Run the bot: health server, optional keep-alive, supervised polling
async fn run_bot() -> AppResult<StopReason> {
    let config = Config::from_env()?;

    spawn_web_server(config.bind_addr);

    if config.is_deployment {
        log::info!("🚀 Running as a deployment, keep-alive is left to the platform");
    } else {
        let _keep_alive = KeepAlive::new(config.self_health_url(), Schedule::default()).spawn();
        log::info!("🛠️ Running in development mode");
    }

    // One Ctrl-C watcher for the whole run: restart pauses and session setup included.
    let (stop, stop_requested) = stop_signal();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("^C received, stopping the bot...");
            stop.stop();
        }
    });

    let greeting = Arc::new(Greeting::new(config.webapp_url.clone()));
    log::info!("Launch button opens {}", greeting.launch_url());

    let mut session = TelegramSession::new(config.bot_token, greeting, stop_requested.clone());
    let supervisor = Supervisor::new(RestartPolicy::default()).with_stop_signal(stop_requested);

    Ok(supervisor.run(&mut session).await)
}
