//! Update routing through the dispatcher schema
//!
//! Synthetic updates are fed through `schema(deps)` with a recording transport
//! in place of the live bot.

mod mocks;

use mocks::{Call, RecordingTransport};
use pretty_assertions::assert_eq;
use std::ops::ControlFlow;
use std::sync::Arc;
use tambi_bot::config::DEFAULT_WEBAPP_URL;
use tambi_bot::telegram::greeting::{Greeting, GREETING_TEXT, RESTART_PROMPT};
use tambi_bot::telegram::handlers::{schema, HandlerDeps};
use teloxide::dptree;
use teloxide::types::{Me, ParseMode, Update};
use url::Url;

const CHAT_ID: i64 = 123456789;

fn me() -> Me {
    serde_json::from_value(serde_json::json!({
        "id": 987654321,
        "is_bot": true,
        "first_name": "TestBot",
        "username": "tambi_test_bot",
        "can_join_groups": true,
        "can_read_all_group_messages": false,
        "supports_inline_queries": false,
        "can_connect_to_business": false,
        "has_main_web_app": false
    }))
    .unwrap()
}

fn message_json(message_id: i32, text: &str) -> serde_json::Value {
    serde_json::json!({
        "message_id": message_id,
        "date": 1735992000,
        "chat": { "id": CHAT_ID, "type": "private", "first_name": "Test" },
        "from": { "id": CHAT_ID, "is_bot": false, "first_name": "Test", "username": "testuser" },
        "text": text
    })
}

fn text_update(message_id: i32, text: &str) -> Update {
    serde_json::from_str(
        &serde_json::json!({
            "update_id": 1,
            "message": message_json(message_id, text)
        })
        .to_string(),
    )
    .unwrap()
}

fn callback_update(message_id: i32, data: &str) -> Update {
    let mut message = message_json(message_id, GREETING_TEXT);
    message["from"] = serde_json::json!({ "id": 987654321, "is_bot": true, "first_name": "TestBot" });

    serde_json::from_str(
        &serde_json::json!({
            "update_id": 2,
            "callback_query": {
                "id": "4382bfdwdsb323b2d9",
                "from": { "id": CHAT_ID, "is_bot": false, "first_name": "Test" },
                "message": message,
                "chat_instance": "-7834500000000000000",
                "data": data
            }
        })
        .to_string(),
    )
    .unwrap()
}

async fn route(update: Update) -> (Arc<RecordingTransport>, bool) {
    let transport = Arc::new(RecordingTransport::new());
    let greeting = Arc::new(Greeting::new(Url::parse(DEFAULT_WEBAPP_URL).unwrap()));
    let handler = schema(HandlerDeps::new(transport.clone(), greeting));

    let handled = match handler.dispatch(dptree::deps![update, me()]).await {
        ControlFlow::Break(result) => {
            assert!(result.is_ok());
            true
        }
        ControlFlow::Continue(_) => false,
    };
    (transport, handled)
}

fn assert_fresh_send(transport: &RecordingTransport) {
    assert_eq!(transport.deletes(), vec![9]);

    let messages = transport.messages();
    assert_eq!(messages.len(), 2);
    assert!(matches!(
        &messages[0],
        Call::Send { text, parse_mode: Some(ParseMode::Html), markup: Some(_) } if text == GREETING_TEXT
    ));
    assert_eq!(messages[1].text(), Some(RESTART_PROMPT));
}

#[tokio::test]
async fn test_start_command_sends_fresh_greeting() {
    let (transport, handled) = route(text_update(10, "/start")).await;

    assert!(handled);
    assert_fresh_send(&transport);
}

#[tokio::test]
async fn test_start_command_addressed_to_bot() {
    let (transport, handled) = route(text_update(10, "/start@tambi_test_bot")).await;

    assert!(handled);
    assert_fresh_send(&transport);
}

#[tokio::test]
async fn test_restart_button_text_sends_fresh_greeting() {
    let (transport, handled) = route(text_update(10, "🔄 СТАРТ")).await;

    assert!(handled);
    assert_fresh_send(&transport);
    assert!(!transport.calls().iter().any(|c| matches!(c, Call::Edit { .. })));
}

#[tokio::test]
async fn test_restart_callback_edits_in_place() {
    let (transport, handled) = route(callback_update(20, "restart")).await;

    assert!(handled);
    let calls = transport.calls();
    assert_eq!(calls[0], Call::Answer(Some("restart".to_string())));
    assert_eq!(transport.deletes(), vec![19]);

    let messages = transport.messages();
    assert_eq!(messages.len(), 2);
    assert!(matches!(&messages[0], Call::Edit { message: 20, text, .. } if text == GREETING_TEXT));
    assert_eq!(messages[1].text(), Some(RESTART_PROMPT));
}

#[tokio::test]
async fn test_unrelated_text_is_ignored() {
    for text in ["hello", "🔄 старт", "/help"] {
        let (transport, handled) = route(text_update(10, text)).await;

        assert!(!handled, "{:?} should not be handled", text);
        assert!(transport.calls().is_empty());
    }
}

#[tokio::test]
async fn test_unrelated_callback_is_ignored() {
    let (transport, handled) = route(callback_update(20, "menu:restart")).await;

    assert!(!handled);
    assert!(transport.calls().is_empty());
}
