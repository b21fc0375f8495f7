//! Telegram bot integration and handlers

pub mod bot;
pub mod greeting;
pub mod handlers;
pub mod session;

// Re-exports for convenience
pub use bot::{create_bot, Command};
pub use greeting::{replace_greeting, send_greeting, ChatTransport, Greeting, GreetingOutcome};
pub use handlers::{schema, HandlerDeps, HandlerError};
pub use session::TelegramSession;
