//! TAMBI launcher bot
//!
//! A small Telegram bot that greets users with a button opening the TAMBI web
//! app, plus a companion health server and a bounded restart supervisor.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging, web server, keep-alive, supervision
//! - `telegram`: bot creation, greeting flows, handler tree, polling session
//! - `cli`: command-line interface

pub mod cli;
pub mod core;
pub mod telegram;

// Re-export commonly used types for convenience
pub use core::{config, AppError, Config};
pub use telegram::{Greeting, TelegramSession};
