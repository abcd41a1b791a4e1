//! 商品詳細ページからのメタデータ取得
//!
//! 詳細ページには `data-react-component="ProductDetailPageContainer"` 要素があり、
//! その `data-props` 属性に商品情報のJSONが埋め込まれている。

use crate::error::{DigestError, Result};
use crate::toplist::DESKTOP_USER_AGENT;
use async_trait::async_trait;
use lazy_static::lazy_static;
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::debug;
use wine_digest_common::digest::product_link;
use wine_digest_common::WineDetails;

lazy_static! {
    static ref PRODUCT_CONTAINER: Selector =
        Selector::parse(r#"[data-react-component="ProductDetailPageContainer"]"#).unwrap();
}

#[async_trait]
pub trait DetailSource: Send + Sync {
    /// `href` はサイト相対パスでも絶対URLでもよい
    async fn fetch_details(&self, href: &str) -> Result<WineDetails>;
}

pub struct HttpDetailSource {
    client: reqwest::Client,
}

impl HttpDetailSource {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(DESKTOP_USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DetailSource for HttpDetailSource {
    async fn fetch_details(&self, href: &str) -> Result<WineDetails> {
        let url = product_link(href);
        debug!("詳細ページ取得: {}", url);
        let html = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_product_page(&html).map_err(|reason| DigestError::FatalInterface { url, reason })
    }
}

#[derive(Debug, Deserialize)]
struct ProductProps {
    product: Product,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Product {
    price: Option<f64>,
    volume: Option<f64>,
    volume_text: Option<String>,
    category_level2: Option<String>,
    grapes: Vec<String>,
    images: Vec<ProductImage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ProductImage {
    image_url: Option<String>,
}

/// 詳細ページHTMLから WineDetails を作る（失敗時は理由を返す）
pub fn parse_product_page(html: &str) -> std::result::Result<WineDetails, String> {
    let document = Html::parse_document(html);
    let container = document
        .select(&PRODUCT_CONTAINER)
        .next()
        .ok_or("商品情報の要素が見つかりません")?;
    let props = container
        .value()
        .attr("data-props")
        .ok_or("data-props 属性がありません")?;
    let props: ProductProps =
        serde_json::from_str(props).map_err(|e| format!("data-props を解析できません: {}", e))?;

    let product = props.product;
    let volume_litres = product
        .volume
        .or_else(|| product.volume_text.as_deref().and_then(parse_volume_ml))
        .map(|ml| ml / 1000.0);

    Ok(WineDetails {
        price: product.price.map(format_price_value),
        volume_litres,
        style: product.category_level2,
        grape: (!product.grapes.is_empty()).then(|| product.grapes.join(", ")),
        image_url: product.images.into_iter().find_map(|image| image.image_url),
    })
}

/// "750 ml" → 750.0
fn parse_volume_ml(text: &str) -> Option<f64> {
    text.trim()
        .trim_end_matches("ml")
        .trim()
        .replace(' ', "")
        .replace(',', ".")
        .parse()
        .ok()
}

/// 139.0 → "139 kr", 99.9 → "99,90 kr"
fn format_price_value(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("{} kr", price as i64)
    } else {
        format!("{:.2} kr", price).replace('.', ",")
    }
}
