//! Scripted polling session and a pause that only records

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tambi_bot::core::supervisor::{Pause, PollingSession, SessionEnd, SessionError};
use teloxide::{ApiError, RequestError};

/// Scripted outcome of one session run
#[derive(Debug, Clone, Copy)]
pub enum Step {
    Return,
    Interrupt,
    Transient,
    Conflict,
}

impl Step {
    fn outcome(self) -> Result<SessionEnd, SessionError> {
        match self {
            Step::Return => Ok(SessionEnd::Returned),
            Step::Interrupt => Ok(SessionEnd::Interrupted),
            Step::Transient => Err(SessionError::Transport(RequestError::Api(ApiError::Unknown(
                "Bad Gateway".to_string(),
            )))),
            Step::Conflict => Err(SessionError::Transport(RequestError::Api(
                ApiError::TerminatedByOtherGetUpdates,
            ))),
        }
    }
}

/// Session that replays a script; once exhausted it reports an interrupt
#[derive(Debug, Default)]
pub struct ScriptedSession {
    script: VecDeque<Step>,
    /// Attempt numbers the supervisor passed in, one per run
    pub attempts: Vec<u32>,
}

impl ScriptedSession {
    pub fn new(script: impl IntoIterator<Item = Step>) -> Self {
        Self {
            script: script.into_iter().collect(),
            attempts: Vec::new(),
        }
    }

    pub fn runs(&self) -> usize {
        self.attempts.len()
    }
}

#[async_trait]
impl PollingSession for ScriptedSession {
    async fn run(&mut self, attempt: u32) -> Result<SessionEnd, SessionError> {
        self.attempts.push(attempt);
        self.script.pop_front().unwrap_or(Step::Interrupt).outcome()
    }
}

/// Pause that returns immediately and remembers each requested duration.
///
/// Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct RecordingPause {
    pauses: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingPause {
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().unwrap().clone()
    }
}

#[async_trait]
impl Pause for RecordingPause {
    async fn pause(&self, duration: Duration) {
        self.pauses.lock().unwrap().push(duration);
    }
}
