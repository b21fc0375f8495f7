//! Greeting message: launch button, restart keyboard and history cleanup.
//!
//! Two entry modes share the same payload:
//! - fresh send (`/start`, the `🔄 СТАРТ` button): new greeting + keyboard message
//! - edit in place (`restart` callback): the pressed message is rewritten
//!
//! Both first try to delete up to [`config::greeting::CLEANUP_DEPTH`] messages
//! preceding the anchor message, stopping at the first failure.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, MessageId, ParseMode, ReplyMarkup,
    WebAppInfo,
};
use teloxide::RequestError;
use url::Url;

use crate::core::config;

/// Label of the inline button that opens the web app
pub const LAUNCH_LABEL: &str = "🚀 ЗАПУСК";

/// Label of the reply-keyboard button; pressing it sends this text back
pub const RESTART_LABEL: &str = "🔄 СТАРТ";

pub const GREETING_TEXT: &str = "Нажми кнопку \"ЗАПУСК\", чтобы получить всю нужную информацию😎";

pub const RESTART_PROMPT: &str = "👇 Используй кнопку ниже для быстрого перезапуска:";

/// Shown only when the fresh-send flow fails
pub const FALLBACK_TEXT: &str = "⚠️ Произошла ошибка, попробуйте ещё раз";

/// The subset of the Bot API the greeting flows need
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn delete(&self, chat: ChatId, message: MessageId) -> Result<(), RequestError>;

    async fn send(
        &self,
        chat: ChatId,
        text: &str,
        markup: Option<ReplyMarkup>,
        parse_mode: Option<ParseMode>,
    ) -> Result<(), RequestError>;

    async fn edit(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        markup: InlineKeyboardMarkup,
        parse_mode: Option<ParseMode>,
    ) -> Result<(), RequestError>;

    /// Clears the loading state of a pressed inline button
    async fn answer_callback(&self, query: &CallbackQuery) -> Result<(), RequestError>;
}

#[async_trait]
impl ChatTransport for Bot {
    async fn delete(&self, chat: ChatId, message: MessageId) -> Result<(), RequestError> {
        self.delete_message(chat, message).await.map(|_| ())
    }

    async fn send(
        &self,
        chat: ChatId,
        text: &str,
        markup: Option<ReplyMarkup>,
        parse_mode: Option<ParseMode>,
    ) -> Result<(), RequestError> {
        let mut request = self.send_message(chat, text.to_string());
        if let Some(mode) = parse_mode {
            request = request.parse_mode(mode);
        }
        if let Some(markup) = markup {
            request = request.reply_markup(markup);
        }
        request.await.map(|_| ())
    }

    async fn edit(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        markup: InlineKeyboardMarkup,
        parse_mode: Option<ParseMode>,
    ) -> Result<(), RequestError> {
        let mut request = self.edit_message_text(chat, message, text.to_string()).reply_markup(markup);
        if let Some(mode) = parse_mode {
            request = request.parse_mode(mode);
        }
        request.await.map(|_| ())
    }

    async fn answer_callback(&self, query: &CallbackQuery) -> Result<(), RequestError> {
        self.answer_callback_query(query.id.clone()).await.map(|_| ())
    }
}

/// Greeting payload. Markups are built fresh on every call.
#[derive(Debug, Clone)]
pub struct Greeting {
    launch_url: Url,
}

impl Greeting {
    pub fn new(launch_url: Url) -> Self {
        Self { launch_url }
    }

    pub fn launch_url(&self) -> &Url {
        &self.launch_url
    }

    pub fn text(&self) -> &'static str {
        GREETING_TEXT
    }

    pub fn restart_prompt(&self) -> &'static str {
        RESTART_PROMPT
    }

    /// One inline button opening the web app (not a callback button)
    pub fn launch_keyboard(&self) -> InlineKeyboardMarkup {
        InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::web_app(
            LAUNCH_LABEL,
            WebAppInfo {
                url: self.launch_url.clone(),
            },
        )]])
    }

    /// Persistent reply keyboard with the restart button: resized, not one-time
    pub fn restart_keyboard(&self) -> KeyboardMarkup {
        KeyboardMarkup::new(vec![vec![KeyboardButton::new(RESTART_LABEL)]]).resize_keyboard()
    }
}

/// What a greeting flow ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GreetingOutcome {
    /// Greeting and keyboard message delivered; `cleared` older messages deleted
    Delivered { cleared: usize },
    /// Fresh send failed and the fallback text was attempted
    FallbackSent,
    /// Edit in place failed; nothing shown to the user
    Failed,
}

/// Deletes the messages immediately preceding `anchor`, newest first.
///
/// Stops at the first failed delete: that usually means nothing older is
/// deletable. Returns how many messages were removed.
pub async fn clear_previous<T>(transport: &T, chat: ChatId, anchor: MessageId) -> usize
where
    T: ChatTransport + ?Sized,
{
    let mut cleared = 0;
    for offset in 1..=config::greeting::CLEANUP_DEPTH {
        let id = anchor.0 - offset;
        if id <= 0 {
            break;
        }
        match transport.delete(chat, MessageId(id)).await {
            Ok(()) => cleared += 1,
            Err(e) => {
                log::debug!("Stopped history cleanup in chat {} at message {}: {}", chat, id, e);
                break;
            }
        }
    }
    cleared
}

/// Fresh send: cleanup, new greeting message, then the keyboard message.
///
/// On failure a single fallback text is sent; its own failure is ignored.
pub async fn send_greeting<T>(transport: &T, greeting: &Greeting, chat: ChatId, anchor: MessageId) -> GreetingOutcome
where
    T: ChatTransport + ?Sized,
{
    let cleared = clear_previous(transport, chat, anchor).await;

    match deliver_fresh(transport, greeting, chat).await {
        Ok(()) => GreetingOutcome::Delivered { cleared },
        Err(e) => {
            log::warn!("Failed to send greeting to chat {}: {}", chat, e);
            if let Err(e) = transport.send(chat, FALLBACK_TEXT, None, None).await {
                // Nothing else can be shown to the user at this point.
                log::debug!("Fallback message to chat {} failed too: {}", chat, e);
            }
            GreetingOutcome::FallbackSent
        }
    }
}

/// Edit in place: cleanup, rewrite `message`, then send the keyboard message.
///
/// Failures are silent to the user: they already have a working button.
pub async fn replace_greeting<T>(transport: &T, greeting: &Greeting, chat: ChatId, message: MessageId) -> GreetingOutcome
where
    T: ChatTransport + ?Sized,
{
    let cleared = clear_previous(transport, chat, message).await;

    match deliver_edit(transport, greeting, chat, message).await {
        Ok(()) => GreetingOutcome::Delivered { cleared },
        Err(e) => {
            log::debug!("Failed to edit greeting {} in chat {}: {}", message.0, chat, e);
            GreetingOutcome::Failed
        }
    }
}

async fn deliver_fresh<T>(transport: &T, greeting: &Greeting, chat: ChatId) -> Result<(), RequestError>
where
    T: ChatTransport + ?Sized,
{
    transport
        .send(
            chat,
            greeting.text(),
            Some(greeting.launch_keyboard().into()),
            Some(ParseMode::Html),
        )
        .await?;
    send_restart_keyboard(transport, greeting, chat).await
}

async fn deliver_edit<T>(transport: &T, greeting: &Greeting, chat: ChatId, message: MessageId) -> Result<(), RequestError>
where
    T: ChatTransport + ?Sized,
{
    transport
        .edit(
            chat,
            message,
            greeting.text(),
            greeting.launch_keyboard(),
            Some(ParseMode::Html),
        )
        .await?;
    send_restart_keyboard(transport, greeting, chat).await
}

async fn send_restart_keyboard<T>(transport: &T, greeting: &Greeting, chat: ChatId) -> Result<(), RequestError>
where
    T: ChatTransport + ?Sized,
{
    transport
        .send(chat, greeting.restart_prompt(), Some(greeting.restart_keyboard().into()), None)
        .await
}
