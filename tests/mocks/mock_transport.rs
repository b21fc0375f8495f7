//! Recording implementation of `ChatTransport`

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use tambi_bot::telegram::greeting::{ChatTransport, GREETING_TEXT};
use teloxide::types::{CallbackQuery, ChatId, InlineKeyboardMarkup, MessageId, ParseMode, ReplyMarkup};
use teloxide::{ApiError, RequestError};

/// One transport call, with markups captured as Bot API JSON
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Delete(i32),
    Send {
        text: String,
        markup: Option<serde_json::Value>,
        parse_mode: Option<ParseMode>,
    },
    Edit {
        message: i32,
        text: String,
        markup: serde_json::Value,
        parse_mode: Option<ParseMode>,
    },
    /// Callback answered; carries the callback data
    Answer(Option<String>),
}

impl Call {
    pub fn text(&self) -> Option<&str> {
        match self {
            Call::Delete(_) | Call::Answer(_) => None,
            Call::Send { text, .. } | Call::Edit { text, .. } => Some(text),
        }
    }
}

/// Transport that records calls and fails on demand
#[derive(Debug, Default)]
pub struct RecordingTransport {
    /// Message ids whose deletion succeeds; everything else fails
    pub deletable: HashSet<i32>,
    /// Fail sends carrying the greeting text
    pub fail_greeting: bool,
    /// Fail every edit
    pub fail_edit: bool,
    calls: Mutex<Vec<Call>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deletable(ids: impl IntoIterator<Item = i32>) -> Self {
        Self {
            deletable: ids.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Every send of the greeting text fails
    pub fn failing_greeting() -> Self {
        Self {
            fail_greeting: true,
            ..Self::default()
        }
    }

    /// Every edit fails
    pub fn failing_edit() -> Self {
        Self {
            fail_edit: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<i32> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Delete(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Sends and edits only
    pub fn messages(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Send { .. } | Call::Edit { .. }))
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn delete(&self, _chat: ChatId, message: MessageId) -> Result<(), RequestError> {
        self.record(Call::Delete(message.0));
        if self.deletable.contains(&message.0) {
            Ok(())
        } else {
            Err(RequestError::Api(ApiError::MessageToDeleteNotFound))
        }
    }

    async fn send(
        &self,
        _chat: ChatId,
        text: &str,
        markup: Option<ReplyMarkup>,
        parse_mode: Option<ParseMode>,
    ) -> Result<(), RequestError> {
        self.record(Call::Send {
            text: text.to_string(),
            markup: markup.map(|m| serde_json::to_value(m).unwrap()),
            parse_mode,
        });
        if self.fail_greeting && text == GREETING_TEXT {
            return Err(RequestError::Api(ApiError::BotBlocked));
        }
        Ok(())
    }

    async fn edit(
        &self,
        _chat: ChatId,
        message: MessageId,
        text: &str,
        markup: InlineKeyboardMarkup,
        parse_mode: Option<ParseMode>,
    ) -> Result<(), RequestError> {
        self.record(Call::Edit {
            message: message.0,
            text: text.to_string(),
            markup: serde_json::to_value(markup).unwrap(),
            parse_mode,
        });
        if self.fail_edit {
            return Err(RequestError::Api(ApiError::MessageNotModified));
        }
        Ok(())
    }

    async fn answer_callback(&self, query: &CallbackQuery) -> Result<(), RequestError> {
        self.record(Call::Answer(query.data.clone()));
        Ok(())
    }
}
