use super::{ApiResponse, Publisher};
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Serialize, PartialEq)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

/// Bot API の sendMessage で送る（本文は MarkdownV2 でエスケープ済みであること）
pub struct TelegramPublisher {
    client: reqwest::Client,
    token: String,
    chat_id: i64,
    link_preview: bool,
}

impl TelegramPublisher {
    pub fn new(token: String, chat_id: i64) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            chat_id,
            link_preview: false,
        }
    }

    /// リンクのプレビューを表示する（TelegraphのURL送信用）
    pub fn with_link_preview(mut self, enabled: bool) -> Self {
        self.link_preview = enabled;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", TELEGRAM_API_BASE, self.token)
    }

    fn request<'a>(&self, text: &'a str) -> SendMessage<'a> {
        SendMessage {
            chat_id: self.chat_id,
            text,
            parse_mode: "MarkdownV2",
            disable_web_page_preview: !self.link_preview,
        }
    }
}

#[async_trait]
impl Publisher for TelegramPublisher {
    async fn publish(&self, title: &str, body: &str) -> Result<Option<String>> {
        let response: ApiResponse<serde_json::Value> = self
            .client
            .post(self.endpoint())
            .json(&self.request(body))
            .send()
            .await?
            .json()
            .await?;
        response.into_result("sendMessage")?;

        info!("Telegramへ送信しました: {}", title);
        Ok(None)
    }
}
