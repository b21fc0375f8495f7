//! Dispatcher schema and handler chain builders
//!
//! Three intents, all routed into the greeting flow:
//! - `/start` command → fresh send
//! - `🔄 СТАРТ` reply-keyboard text → fresh send
//! - callback query matching `restart` → edit in place

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::types::{HandlerDeps, HandlerError};
use crate::telegram::bot::Command;
use crate::telegram::greeting::{replace_greeting, send_greeting, GreetingOutcome, RESTART_LABEL};

/// Callback data prefix that triggers an in-place greeting refresh
pub const RESTART_CALLBACK: &str = "restart";

/// Creates the main dispatcher schema for the Telegram bot.
///
/// # Arguments
/// * `deps` - Handler dependencies (transport and greeting payload)
///
/// # Returns
/// The complete handler tree for the bot
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_text = deps.clone();
    let deps_callback = deps;

    dptree::entry()
        .branch(command_handler(deps_commands))
        .branch(restart_text_handler(deps_text))
        .branch(restart_callback_handler(deps_callback))
}

/// True for the exact text the restart reply button sends
pub fn is_restart_text(text: Option<&str>) -> bool {
    text == Some(RESTART_LABEL)
}

/// True for callback data starting with `restart`
pub fn is_restart_callback(data: Option<&str>) -> bool {
    data.is_some_and(|d| d.starts_with(RESTART_CALLBACK))
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                log::info!("🎯 Received command: {:?} from chat {}", cmd, msg.chat.id);

                match cmd {
                    Command::Start => {
                        let outcome = send_greeting(deps.transport.as_ref(), &deps.greeting, msg.chat.id, msg.id).await;
                        log_outcome(msg.chat.id, outcome);
                    }
                }
                Ok(())
            }
        },
    ))
}

/// Handler for the reply-keyboard restart button
fn restart_text_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| is_restart_text(msg.text()))
        .endpoint(move |msg: Message| {
            let deps = deps.clone();
            async move {
                let outcome = send_greeting(deps.transport.as_ref(), &deps.greeting, msg.chat.id, msg.id).await;
                log_outcome(msg.chat.id, outcome);
                Ok(())
            }
        })
}

/// Handler for the `restart` callback query
fn restart_callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query()
        .filter(|q: CallbackQuery| is_restart_callback(q.data.as_deref()))
        .endpoint(move |q: CallbackQuery| {
            let deps = deps.clone();
            async move {
                // Only clears the button's loading state; the edit below does not depend on it.
                if let Err(e) = deps.transport.answer_callback(&q).await {
                    log::debug!("Failed to answer callback query: {}", e);
                }

                let Some(message) = q.message.as_ref() else {
                    return Ok(());
                };
                let chat_id = message.chat().id;

                let outcome = replace_greeting(deps.transport.as_ref(), &deps.greeting, chat_id, message.id()).await;
                log_outcome(chat_id, outcome);
                Ok(())
            }
        })
}

fn log_outcome(chat_id: ChatId, outcome: GreetingOutcome) {
    match outcome {
        GreetingOutcome::Delivered { cleared } => {
            log::info!("Greeting shown in chat {} ({} old message(s) removed)", chat_id, cleared)
        }
        GreetingOutcome::FallbackSent => log::warn!("Greeting failed in chat {}, fallback sent", chat_id),
        GreetingOutcome::Failed => log::debug!("Greeting refresh failed in chat {}", chat_id),
    }
}
