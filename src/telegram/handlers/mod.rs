//! Telegram bot handler tree configuration
//!
//! The same handler tree is used by the polling session and by tests.

mod schema;
mod types;

pub use schema::{is_restart_callback, is_restart_text, schema};
pub use types::{HandlerDeps, HandlerError};
