//! 評価サイトのトップリスト取得

use crate::error::{DigestError, Result};
use async_trait::async_trait;
use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};
use wine_digest_common::ExternalRatingEntry;

/// ブラウザ相当のUser-Agent（付けないとトップリストが返らない）
pub const DESKTOP_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:66.0) Gecko/20100101 Firefox/66.0";

lazy_static! {
    static ref CARD: Selector = Selector::parse("div.card.card-lg").unwrap();
    static ref NAME: Selector = Selector::parse("span.bold").unwrap();
    static ref RATING: Selector = Selector::parse(".average__number").unwrap();
}

#[async_trait]
pub trait ToplistSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<ExternalRatingEntry>>;
}

/// HTTPでトップリストページを取得する実装
pub struct HttpToplistSource {
    client: reqwest::Client,
}

impl HttpToplistSource {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(DESKTOP_USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ToplistSource for HttpToplistSource {
    async fn fetch(&self, url: &str) -> Result<Vec<ExternalRatingEntry>> {
        debug!("トップリスト取得: {}", url);
        let html = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let entries = parse_toplist_html(&html);
        if entries.is_empty() {
            return Err(DigestError::FatalInterface {
                url: url.to_string(),
                reason: "ワインのカードが見つかりません".into(),
            });
        }
        info!("{}件のワインを取得: {}", entries.len(), url);
        Ok(entries)
    }
}

fn first_text(card: &ElementRef, selector: &Selector) -> Option<String> {
    card.select(selector)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
}

/// トップリストHTMLからワイン名と評価を取り出す（ページ上の順序を保つ）
pub fn parse_toplist_html(html: &str) -> Vec<ExternalRatingEntry> {
    let document = Html::parse_document(html);

    document
        .select(&CARD)
        .filter_map(|card| {
            let name = first_text(&card, &NAME)?;
            let rating = first_text(&card, &RATING)?;
            match ExternalRatingEntry::from_page_text(&name, &rating) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("カードを読み飛ばします ({}): {}", name, e);
                    None
                }
            }
        })
        .collect()
}
