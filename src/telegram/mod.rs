use log::error;
use serde_json::{json, Value};

// Thin Bot API client. Send failures that Telegram reports in-band (ok: false)
// are logged and not retried; transport errors bubble up to the caller.
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    base: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: format!("https://api.telegram.org/bot{token}"),
        }
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        markdown: bool,
        reply_markup: Option<Value>,
    ) -> Result<(), reqwest::Error> {
        let mut payload = json!({ "chat_id": chat_id, "text": text });
        if markdown {
            payload["parse_mode"] = json!("Markdown");
        }
        if let Some(markup) = reply_markup {
            payload["reply_markup"] = markup;
        }

        let body: Value = self
            .http
            .post(format!("{}/sendMessage", self.base))
            .json(&payload)
            .send()
            .await?
            .json()
            .await?;

        if body["ok"] != json!(true) {
            error!("Telegram rejected sendMessage: {}", body["description"]);
        }
        Ok(())
    }

    // Remove the inline keyboard once an answer has been recorded, so the
    // buttons cannot be tapped twice.
    pub async fn clear_buttons(&self, chat_id: i64, message_id: i64) -> Result<(), reqwest::Error> {
        let payload = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "reply_markup": { "inline_keyboard": [] }
        });

        let body: Value = self
            .http
            .post(format!("{}/editMessageReplyMarkup", self.base))
            .json(&payload)
            .send()
            .await?
            .json()
            .await?;

        if body["ok"] != json!(true) {
            error!("Telegram rejected editMessageReplyMarkup: {}", body["description"]);
        }
        Ok(())
    }

    // Upload a generated spreadsheet or PDF as a document.
    pub async fn send_document(
        &self,
        chat_id: i64,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<(), reqwest::Error> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", part);

        let body: Value = self
            .http
            .post(format!("{}/sendDocument", self.base))
            .multipart(form)
            .send()
            .await?
            .json()
            .await?;

        if body["ok"] != json!(true) {
            error!("Telegram rejected sendDocument: {}", body["description"]);
        }
        Ok(())
    }
}

// Strip characters that break Telegram Markdown out of user-controlled text
// (voter and center names come straight from the roll).
pub fn strip_markdown(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '*' | '_' | '`' | '[' | ']'))
        .map(|c| match c {
            '<' => '\u{2039}',
            '>' => '\u{203a}',
            other => other,
        })
        .collect()
}
