//! 検索コアの型定義
//!
//! - ExternalRatingEntry: トップリストの1行（ワイン名と評価）
//! - RawCandidate: カタログ検索結果の1行
//! - ConfirmedMatch: 類似度の閾値を超えた候補
//! - WineDetails / EnrichedMatch: 詳細ページから取得したメタデータ付きの一致

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// トップリストのワイン
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalRatingEntry {
    pub name: String,
    pub rating: f64,
}

impl ExternalRatingEntry {
    pub fn new(name: impl Into<String>, rating: f64) -> Self {
        Self {
            name: name.into(),
            rating,
        }
    }

    /// ページ上の表記（"4,2" / "4.2"）から生成
    pub fn from_page_text(name: &str, rating_text: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Parse("ワイン名が空です".into()));
        }
        Ok(Self::new(name, parse_rating(rating_text)?))
    }
}

/// 評価値をパース（小数点はカンマ・ピリオド両対応）
pub fn parse_rating(text: &str) -> Result<f64> {
    let normalized = text.trim().replace(',', ".");
    normalized
        .parse::<f64>()
        .map_err(|_| Error::Parse(format!("評価値が不正: {}", text.trim())))
}

/// カタログ検索結果の1行
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawCandidate {
    pub display_name: String,
    /// 商品ページへのリンク（サイト相対パスのことが多い）
    pub href: String,
    pub price_text: String,
    pub style_text: String,
}

/// 閾値を超えた候補
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedMatch {
    pub source_name: String,
    pub source_rating: f64,
    pub candidate: RawCandidate,
    pub match_score: f64,
}

/// 詳細ページのメタデータ（取れなかった項目はNone）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WineDetails {
    pub price: Option<String>,
    pub volume_litres: Option<f64>,
    pub style: Option<String>,
    pub grape: Option<String>,
    pub image_url: Option<String>,
}

/// 配信用: 一致結果 + 詳細
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedMatch {
    pub matched: ConfirmedMatch,
    #[serde(default)]
    pub details: Option<WineDetails>,
}

impl EnrichedMatch {
    /// 詳細のスタイル、なければ検索結果のスタイル表記
    pub fn style(&self) -> &str {
        self.details
            .as_ref()
            .and_then(|d| d.style.as_deref())
            .unwrap_or(&self.matched.candidate.style_text)
    }

    /// 詳細の価格、なければ検索結果の価格表記
    pub fn price(&self) -> &str {
        self.details
            .as_ref()
            .and_then(|d| d.price.as_deref())
            .unwrap_or(&self.matched.candidate.price_text)
    }
}
