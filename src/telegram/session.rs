//! One long-polling run of the bot, as driven by the supervisor.
//!
//! Each run builds a fresh client and dispatcher. Transient update-listener
//! errors (timeouts, 5xx, network drops) are logged and left to the polling
//! backoff. Only errors that polling cannot recover from end the run and are
//! reported to the supervisor. A stop request ends the run as an interrupt.

use futures_util::future::BoxFuture;
use secrecy::{ExposeSecret, SecretString};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use teloxide::dispatching::ShutdownToken;
use teloxide::error_handlers::ErrorHandler;
use teloxide::prelude::*;
use teloxide::types::AllowedUpdate;
use teloxide::update_listeners::Polling;
use teloxide::{ApiError, RequestError};

use crate::core::supervisor::{PollingSession, SessionEnd, SessionError, StopSignal, CONFLICT_MARKER};
use crate::telegram::bot::{create_bot, setup_bot_commands};
use crate::telegram::greeting::Greeting;
use crate::telegram::handlers::{schema, HandlerDeps};

/// Retry period while the dispatcher has not started yet
const SHUTDOWN_RETRY: Duration = Duration::from_millis(100);

/// Update categories the bot subscribes to
pub fn allowed_updates() -> Vec<AllowedUpdate> {
    vec![AllowedUpdate::Message, AllowedUpdate::CallbackQuery]
}

/// True for listener errors that polling cannot recover from by retrying:
/// another instance polling with the same token, or a revoked/unknown token.
pub fn is_fatal_listener_error(error: &RequestError) -> bool {
    matches!(
        error,
        RequestError::Api(ApiError::TerminatedByOtherGetUpdates | ApiError::InvalidToken)
    ) || error.to_string().contains(CONFLICT_MARKER)
}

/// Polling session against the real Bot API
pub struct TelegramSession {
    token: SecretString,
    greeting: Arc<Greeting>,
    stop: StopSignal,
}

impl TelegramSession {
    pub fn new(token: SecretString, greeting: Arc<Greeting>, stop: StopSignal) -> Self {
        Self { token, greeting, stop }
    }
}

#[async_trait::async_trait]
impl PollingSession for TelegramSession {
    async fn run(&mut self, attempt: u32) -> Result<SessionEnd, SessionError> {
        let bot = create_bot(self.token.expose_secret())?;

        if let Err(e) = setup_bot_commands(&bot).await {
            log::warn!("Failed to register bot commands (attempt {}): {}", attempt, e);
        }

        if self.stop.is_requested() {
            return Ok(SessionEnd::Interrupted);
        }

        let handler = schema(HandlerDeps::new(Arc::new(bot.clone()), Arc::clone(&self.greeting)));

        // Drop anything queued while the bot was offline.
        let listener = Polling::builder(bot.clone())
            .drop_pending_updates()
            .allowed_updates(allowed_updates())
            .build();

        let mut dispatcher = Dispatcher::builder(bot, handler)
            .default_handler(|upd| async move {
                log::trace!("Ignoring unmatched update {:?}", upd.id);
            })
            .build();

        let shutdown = dispatcher.shutdown_token();
        let failure = ListenerFailure::new(shutdown.clone());
        let stop_watch = tokio::spawn(watch_stop(shutdown, self.stop.clone()));

        // Run the dispatcher in its own task so a panic inside it is caught via the JoinHandle.
        let error_handler = Arc::clone(&failure);
        let handle = tokio::spawn(async move {
            dispatcher.dispatch_with_listener(listener, error_handler).await;
        });
        let joined = handle.await;
        stop_watch.abort();

        if let Err(join_err) = joined {
            if join_err.is_panic() {
                return Err(SessionError::Panicked(join_err.to_string()));
            }
            return Err(SessionError::Cancelled(join_err.to_string()));
        }

        if let Some(err) = failure.take() {
            return Err(SessionError::Transport(err));
        }

        if self.stop.is_requested() {
            Ok(SessionEnd::Interrupted)
        } else {
            Ok(SessionEnd::Returned)
        }
    }
}

/// Update-listener error handler.
///
/// Transient errors are only logged. The first fatal error is recorded and
/// stops the dispatcher.
pub struct ListenerFailure {
    first_error: Mutex<Option<RequestError>>,
    shutdown: ShutdownToken,
}

impl ListenerFailure {
    pub fn new(shutdown: ShutdownToken) -> Arc<Self> {
        Arc::new(Self {
            first_error: Mutex::new(None),
            shutdown,
        })
    }

    /// Removes and returns the recorded error, if any
    pub fn take(&self) -> Option<RequestError> {
        self.first_error.lock().ok().and_then(|mut slot| slot.take())
    }

    fn record(&self, error: RequestError) {
        if let Ok(mut slot) = self.first_error.lock() {
            if slot.is_none() {
                *slot = Some(error);
            }
        }
    }
}

impl ErrorHandler<RequestError> for ListenerFailure {
    fn handle_error(self: Arc<Self>, error: RequestError) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            if !is_fatal_listener_error(&error) {
                log::warn!("Update listener error, polling will retry: {}", error);
                return;
            }

            log::error!("Update listener failed: {}", error);
            self.record(error);

            // Not awaited: shutdown completes only after this handler returns.
            if let Err(e) = self.shutdown.shutdown() {
                log::debug!("Dispatcher not running, shutdown skipped: {}", e);
            }
        })
    }
}

async fn watch_stop(shutdown: ShutdownToken, mut stop: StopSignal) {
    stop.requested().await;
    log::info!("Shutting down the dispatcher...");

    loop {
        match shutdown.shutdown() {
            Ok(done) => {
                done.await;
                log::info!("Dispatcher is shut down");
                return;
            }
            // The dispatcher has not started yet.
            Err(_) => tokio::time::sleep(SHUTDOWN_RETRY).await,
        }
    }
}
