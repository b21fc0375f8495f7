//! Bounded restart supervision for the polling session.
//!
//! The supervisor is a two-state machine (running / stopped). Every run of the
//! polling session ends in one of:
//! - a clean return: the restart counter is reset and polling starts again
//! - an operator interrupt (Ctrl-C): stop, also while pausing between restarts
//! - a conflict (another instance holds the getUpdates connection): stop, no retry
//! - any other error: counter += 1, pause, retry; stop once the counter hits the ceiling

use async_trait::async_trait;
use std::time::Duration;
use teloxide::{ApiError, RequestError};
use thiserror::Error;
use tokio::sync::watch;

use crate::core::config;

/// Substring the Bot API uses for duplicate-instance errors
pub const CONFLICT_MARKER: &str = "Conflict";

/// Restart ceiling and delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
    pub max_restarts: u32,
    pub delay: Duration,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            max_restarts: config::supervisor::MAX_RESTARTS,
            delay: config::supervisor::restart_delay(),
        }
    }
}

/// How a polling session finished without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The receive loop returned on its own
    Returned,
    /// The operator asked the process to stop
    Interrupted,
}

/// Failure of a polling session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Telegram error: {0}")]
    Transport(#[from] RequestError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Dispatcher panicked: {0}")]
    Panicked(String),

    #[error("Dispatcher task cancelled: {0}")]
    Cancelled(String),
}

impl SessionError {
    /// True when another process is already polling with the same token.
    ///
    /// Retrying cannot resolve this, so the supervisor treats it as fatal.
    pub fn is_conflict(&self) -> bool {
        matches!(self, SessionError::Transport(RequestError::Api(ApiError::TerminatedByOtherGetUpdates)))
            || self.to_string().contains(CONFLICT_MARKER)
    }
}

/// Why supervision ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Conflict,
    RetriesExhausted,
    Interrupted,
}

/// What the supervisor does after a session ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Start a new session right away
    Rerun,
    /// Start a new session after the given pause
    RetryAfter(Duration),
    /// Stop supervising
    Stop(StopReason),
}

/// Supervisor state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Running { restarts: u32 },
    Stopped(StopReason),
}

impl Default for SupervisorState {
    fn default() -> Self {
        SupervisorState::Running { restarts: 0 }
    }
}

impl SupervisorState {
    pub fn restarts(&self) -> Option<u32> {
        match self {
            SupervisorState::Running { restarts } => Some(*restarts),
            SupervisorState::Stopped(_) => None,
        }
    }

    /// Applies the outcome of one session run and returns the next step.
    ///
    /// A stopped supervisor stays stopped.
    pub fn advance(&mut self, outcome: &Result<SessionEnd, SessionError>, policy: &RestartPolicy) -> Transition {
        let restarts = match *self {
            SupervisorState::Running { restarts } => restarts,
            SupervisorState::Stopped(reason) => return Transition::Stop(reason),
        };

        let (next, transition) = match outcome {
            Ok(SessionEnd::Returned) => (SupervisorState::Running { restarts: 0 }, Transition::Rerun),
            Ok(SessionEnd::Interrupted) => (
                SupervisorState::Stopped(StopReason::Interrupted),
                Transition::Stop(StopReason::Interrupted),
            ),
            Err(e) if e.is_conflict() => (
                SupervisorState::Stopped(StopReason::Conflict),
                Transition::Stop(StopReason::Conflict),
            ),
            Err(_) => {
                let restarts = restarts.saturating_add(1).min(policy.max_restarts);
                if restarts < policy.max_restarts {
                    (SupervisorState::Running { restarts }, Transition::RetryAfter(policy.delay))
                } else {
                    (
                        SupervisorState::Stopped(StopReason::RetriesExhausted),
                        Transition::Stop(StopReason::RetriesExhausted),
                    )
                }
            }
        };

        *self = next;
        transition
    }
}

/// Sending half of the operator stop request
#[derive(Debug)]
pub struct StopHandle {
    tx: watch::Sender<bool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }
}

/// Receiving half of the operator stop request, shared by the supervisor and its sessions
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once a stop is requested. Never resolves if the handle is dropped first.
    pub async fn requested(&mut self) {
        if self.rx.wait_for(|stop| *stop).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Creates a linked stop handle and signal
pub fn stop_signal() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx }, StopSignal { rx })
}

async fn stop_requested(signal: &mut Option<StopSignal>) {
    match signal {
        Some(signal) => signal.requested().await,
        None => std::future::pending().await,
    }
}

/// One run of the bot's long-poll receive loop
#[async_trait]
pub trait PollingSession: Send {
    /// Runs the receive loop until it returns or fails. `attempt` starts at 1.
    async fn run(&mut self, attempt: u32) -> Result<SessionEnd, SessionError>;
}

/// Sleep between restart attempts
#[async_trait]
pub trait Pause: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Real-time pause backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPause;

#[async_trait]
impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Drives a [`PollingSession`] under a [`RestartPolicy`]
#[derive(Debug, Clone)]
pub struct Supervisor<P = TokioPause> {
    policy: RestartPolicy,
    pause: P,
    stop: Option<StopSignal>,
}

impl Supervisor<TokioPause> {
    pub fn new(policy: RestartPolicy) -> Self {
        Self::with_pause(policy, TokioPause)
    }
}

impl<P: Pause> Supervisor<P> {
    pub fn with_pause(policy: RestartPolicy, pause: P) -> Self {
        Self {
            policy,
            pause,
            stop: None,
        }
    }

    /// Stops supervision when `signal` fires, including mid-pause.
    #[must_use]
    pub fn with_stop_signal(mut self, signal: StopSignal) -> Self {
        self.stop = Some(signal);
        self
    }

    /// Runs sessions until the state machine stops, returning the reason.
    pub async fn run<S: PollingSession + ?Sized>(&self, session: &mut S) -> StopReason {
        let mut state = SupervisorState::default();
        let mut stop = self.stop.clone();

        loop {
            if stop.as_ref().is_some_and(StopSignal::is_requested) {
                log::info!("Shutdown requested, stopping polling");
                return StopReason::Interrupted;
            }

            let attempt = state.restarts().unwrap_or(0) + 1;
            log::info!("🤖 Bot started (attempt {})", attempt);

            let outcome = session.run(attempt).await;

            match state.advance(&outcome, &self.policy) {
                Transition::Rerun => {
                    log::info!("Polling loop returned cleanly, restart counter reset");
                }
                Transition::RetryAfter(delay) => {
                    let restarts = state.restarts().unwrap_or(0);
                    if let Err(e) = &outcome {
                        log::error!("❌ Error #{}: {}", restarts, e);
                    }
                    log::info!(
                        "🔄 Restarting in {:?}... ({}/{})",
                        delay,
                        restarts,
                        self.policy.max_restarts
                    );
                    tokio::select! {
                        () = self.pause.pause(delay) => {}
                        () = stop_requested(&mut stop) => {
                            log::info!("Shutdown requested during restart pause");
                            return StopReason::Interrupted;
                        }
                    }
                }
                Transition::Stop(reason) => {
                    match (reason, &outcome) {
                        (StopReason::Conflict, _) => {
                            log::error!("⚠️ CONFLICT: another bot instance is already running!");
                            log::error!("💡 Stop the development instance and keep only the deployment");
                        }
                        (StopReason::RetriesExhausted, Err(e)) => {
                            log::error!("❌ Error #{}: {}", self.policy.max_restarts, e);
                            log::error!("❌ Maximum number of restarts exceeded!");
                        }
                        (StopReason::RetriesExhausted, Ok(_)) => {
                            log::error!("❌ Maximum number of restarts exceeded!");
                        }
                        (StopReason::Interrupted, _) => {
                            log::info!("Shutdown requested, stopping polling");
                        }
                    }
                    return reason;
                }
            }
        }
    }
}
