pub mod survey;

use crate::db::Database;
use crate::models::Answer;
use crate::telegram::TelegramClient;
use lazy_static::lazy_static;
use log::{error, warn};
use regex::Regex;
use serde::Deserialize;

pub(crate) type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

// The slice of a Telegram update this bot cares about. Unknown fields are
// ignored by serde, so API additions do not break deserialization.
#[derive(Debug, Deserialize)]
pub struct Update {
    pub message: Option<Message>,
    pub edited_message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub data: Option<String>,
    pub message: Option<Message>,
}

lazy_static! {
    // Direct ID entry: nationality prefix followed by the numeric ID.
    static ref ID_ENTRY: Regex = Regex::new(r"^([VEve])(\d{6,10})$").unwrap();
}

const WELCOME_TEXT: &str = "\u{1f44b} Welcome to *Parish Pulse*\n\n\
To take part, send your national ID with its prefix, for example:\n\
`V12345678` or `E84456789`";

// Entry point for each webhook update. Errors are logged here so no failure
// path is silently swallowed, while the webhook response stays a plain 200.
pub async fn handle_update(db: &Database, tg: &TelegramClient, update: Update) {
    let result = if let Some(message) = update.message.or(update.edited_message) {
        handle_message(db, tg, &message).await
    } else if let Some(callback) = update.callback_query {
        handle_callback(db, tg, &callback).await
    } else {
        warn!("Unhandled update type");
        Ok(())
    };

    if let Err(why) = result {
        error!("Update handler error: {:?}", why);
    }
}

async fn handle_message(db: &Database, tg: &TelegramClient, message: &Message) -> HandlerResult {
    let chat_id = message.chat.id;
    let Some(text) = message.text.as_deref().map(str::trim) else {
        warn!("Message without text from chat {chat_id}");
        return Ok(());
    };

    if text.starts_with("/start") {
        // "/start 12345678" deep links straight into the survey.
        match text.split_whitespace().nth(1).and_then(|p| p.parse::<i64>().ok()) {
            Some(voter_id) => survey::process_voter_id(db, tg, chat_id, "V", voter_id).await?,
            None => tg.send_message(chat_id, WELCOME_TEXT, true, None).await?,
        }
        return Ok(());
    }

    if let Some(caps) = ID_ENTRY.captures(text) {
        let prefix = caps[1].to_uppercase();
        let voter_id: i64 = caps[2].parse()?;
        survey::process_voter_id(db, tg, chat_id, &prefix, voter_id).await?;
        return Ok(());
    }

    match text.to_lowercase().as_str() {
        "/report" => crate::commands::report::send_participation_report(db, tg, chat_id).await?,
        "/summary" => crate::commands::summary::send_summary(db, tg, chat_id).await?,
        _ => {}
    }

    Ok(())
}

async fn handle_callback(
    db: &Database,
    tg: &TelegramClient,
    callback: &CallbackQuery,
) -> HandlerResult {
    let Some(message) = &callback.message else {
        warn!("Callback without an originating message");
        return Ok(());
    };
    let chat_id = message.chat.id;
    let message_id = message.message_id;

    let Some(data) = callback.data.as_deref() else {
        warn!("Callback without data from chat {chat_id}");
        return Ok(());
    };

    // Button payloads look like "yes:12345678".
    let Some((raw_answer, raw_id)) = data.split_once(':') else {
        warn!("Malformed callback data: {data}");
        return Ok(());
    };
    let Some(answer) = Answer::parse(raw_answer) else {
        warn!("Unrecognized answer in callback data: {data}");
        return Ok(());
    };
    let voter_id: i64 = raw_id.parse()?;

    let status = db
        .register_response(voter_id, answer, &chat_id.to_string())
        .await?;
    tg.clear_buttons(chat_id, message_id).await?;
    survey::confirm_registration(db, tg, chat_id, voter_id, status, answer).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_entry_regex_accepts_prefixed_numeric_ids() {
        for text in ["V12345678", "E84456789", "v123456", "E1234567890"] {
            assert!(ID_ENTRY.is_match(text), "should match: {text}");
        }
    }

    #[test]
    fn id_entry_regex_rejects_everything_else() {
        for text in ["12345678", "V12345", "X12345678", "V1234567890123", "V12a45678"] {
            assert!(!ID_ENTRY.is_match(text), "should not match: {text}");
        }
    }

    #[test]
    fn update_deserializes_from_webhook_payload() {
        let update: Update = serde_json::from_str(
            r#"{
                "update_id": 10,
                "callback_query": {
                    "id": "55",
                    "data": "yes:12345678",
                    "message": { "message_id": 7, "chat": { "id": 99 }, "text": "card" }
                }
            }"#,
        )
        .unwrap();

        let callback = update.callback_query.unwrap();
        assert_eq!(callback.data.as_deref(), Some("yes:12345678"));
        assert_eq!(callback.message.unwrap().chat.id, 99);
    }
}
