//! ダイジェストの配信先
//!
//! - telegraph: HTMLページを作成してURLを返す
//! - telegram: チャットへ MarkdownV2 メッセージを送る
//! - stdout: 送信せずに表示（ドライラン）

pub mod telegram;
pub mod telegraph;

use crate::config::Config;
use crate::error::{DigestError, Result};
use async_trait::async_trait;
use clap::ValueEnum;
use serde::Deserialize;
use tracing::{error, info, warn};
use wine_digest_common::digest::escape_markdown_v2;
use wine_digest_common::{render_telegram_messages, render_telegraph_html, EnrichedMatch};

pub use telegram::TelegramPublisher;
pub use telegraph::TelegraphPublisher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PublishTarget {
    /// Telegraphページを作成し、URLをTelegramへ送る
    Telegraph,
    /// スタイル別メッセージを直接Telegramへ送る
    Telegram,
    /// 標準出力に表示のみ
    Stdout,
}

#[async_trait]
pub trait Publisher: Send + Sync {
    /// 配信して、公開URLがあれば返す
    async fn publish(&self, title: &str, body: &str) -> Result<Option<String>>;
}

pub struct StdoutPublisher;

#[async_trait]
impl Publisher for StdoutPublisher {
    async fn publish(&self, title: &str, body: &str) -> Result<Option<String>> {
        println!("── {} ──", title);
        println!("{}", body);
        Ok(None)
    }
}

/// 配信先の組み合わせ
///
/// 配信の失敗はログに残すだけで、再送はしない。
pub enum Delivery {
    Telegraph {
        page: Box<dyn Publisher>,
        /// 作成したページのURLを送る先（未設定なら送らない）
        notify: Option<Box<dyn Publisher>>,
    },
    Telegram(Box<dyn Publisher>),
    Stdout(Box<dyn Publisher>),
}

impl Delivery {
    /// 設定から配信先を組み立てる（必要なトークンがなければエラー）
    pub fn from_config(target: PublishTarget, config: &Config) -> Result<Self> {
        match target {
            PublishTarget::Telegraph => {
                let page = TelegraphPublisher::new(config.telegraph_token()?);
                let notify = match config.telegram_credentials() {
                    Ok((token, chat_id)) => Some(Box::new(
                        TelegramPublisher::new(token, chat_id).with_link_preview(true),
                    ) as Box<dyn Publisher>),
                    Err(e) => {
                        warn!("TelegraphのURLはTelegramへ送りません: {}", e);
                        None
                    }
                };
                Ok(Delivery::Telegraph {
                    page: Box::new(page),
                    notify,
                })
            }
            PublishTarget::Telegram => {
                let (token, chat_id) = config.telegram_credentials()?;
                Ok(Delivery::Telegram(Box::new(TelegramPublisher::new(token, chat_id))))
            }
            PublishTarget::Stdout => Ok(Delivery::Stdout(Box::new(StdoutPublisher))),
        }
    }

    /// 1リスト分の一致結果を配信
    pub async fn deliver(&self, title: &str, matches: &[EnrichedMatch]) {
        match self {
            Delivery::Telegraph { page, notify } => {
                let html = render_telegraph_html(matches);
                let url = match page.publish(title, &html).await {
                    Ok(Some(url)) => url,
                    Ok(None) => return,
                    Err(e) => {
                        error!("Telegraphへの配信に失敗 ({}): {}", title, e);
                        return;
                    }
                };
                println!("✔ {}: {}", title, url);
                if let Some(notify) = notify {
                    if let Err(e) = notify.publish(title, &escape_markdown_v2(&url)).await {
                        error!("URLの送信に失敗 ({}): {}", title, e);
                    }
                }
            }
            Delivery::Telegram(publisher) | Delivery::Stdout(publisher) => {
                let messages = render_telegram_messages(title, matches);
                for message in &messages {
                    if let Err(e) = publisher.publish(title, &message.text).await {
                        error!("配信に失敗 ({} {}): {}", title, message.style, e);
                    }
                }
                info!("{}件のメッセージを配信: {}", messages.len(), title);
            }
        }
    }
}

/// Telegram / Telegraph 共通のAPIレスポンス
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(alias = "error")]
    pub description: Option<String>,
}

impl<T> ApiResponse<T> {
    pub(crate) fn into_result(self, api: &str) -> Result<Option<T>> {
        if self.ok {
            Ok(self.result)
        } else {
            Err(DigestError::Publish(format!(
                "{}: {}",
                api,
                self.description.unwrap_or_else(|| "不明なエラー".into())
            )))
        }
    }
}
