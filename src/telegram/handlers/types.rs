//! Handler types and dependencies

use std::sync::Arc;

use crate::telegram::greeting::{ChatTransport, Greeting};

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    /// Outgoing Bot API calls; the live `Bot` in production
    pub transport: Arc<dyn ChatTransport>,
    pub greeting: Arc<Greeting>,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(transport: Arc<dyn ChatTransport>, greeting: Arc<Greeting>) -> Self {
        Self { transport, greeting }
    }
}
