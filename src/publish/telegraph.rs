//! Telegraph へのページ作成
//!
//! createPage の content はHTMLではなくNode配列（文字列 or {tag, attrs, children}）。
//! 手元で組み立てたHTMLを scraper で読み、Node配列に変換して送る。

use super::{ApiResponse, Publisher};
use crate::error::{DigestError, Result};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Node};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;

pub const TELEGRAPH_API_BASE: &str = "https://api.telegra.ph";

/// Telegraph が受け付ける属性
const ALLOWED_ATTRS: &[&str] = &["href", "src"];

#[derive(Debug, Serialize)]
struct CreatePage<'a> {
    access_token: &'a str,
    title: &'a str,
    content: Vec<Value>,
    return_content: bool,
}

#[derive(Debug, Deserialize)]
struct Page {
    url: String,
}

pub struct TelegraphPublisher {
    client: reqwest::Client,
    access_token: String,
}

impl TelegraphPublisher {
    pub fn new(access_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token,
        }
    }
}

#[async_trait]
impl Publisher for TelegraphPublisher {
    async fn publish(&self, title: &str, body: &str) -> Result<Option<String>> {
        let request = CreatePage {
            access_token: &self.access_token,
            title,
            content: html_to_nodes(body),
            return_content: false,
        };

        let response: ApiResponse<Page> = self
            .client
            .post(format!("{}/createPage", TELEGRAPH_API_BASE))
            .json(&request)
            .send()
            .await?
            .json()
            .await?;

        let page = response
            .into_result("createPage")?
            .ok_or_else(|| DigestError::Publish("createPage: URLが返りませんでした".into()))?;

        info!("Telegraphページを作成しました: {}", page.url);
        Ok(Some(page.url))
    }
}

/// HTML断片を Telegraph の Node 配列に変換
pub fn html_to_nodes(html: &str) -> Vec<Value> {
    let fragment = Html::parse_fragment(html);
    children_to_nodes(fragment.root_element())
}

fn children_to_nodes(element: ElementRef) -> Vec<Value> {
    element
        .children()
        .filter_map(|child| match child.value() {
            Node::Text(text) => {
                let text: &str = text;
                Some(Value::String(text.to_string()))
            }
            Node::Element(_) => ElementRef::wrap(child).map(element_to_node),
            _ => None,
        })
        .collect()
}

fn element_to_node(element: ElementRef) -> Value {
    let mut node = Map::new();
    node.insert("tag".into(), json!(element.value().name()));

    let attrs: Map<String, Value> = element
        .value()
        .attrs()
        .filter(|(name, _)| ALLOWED_ATTRS.contains(name))
        .map(|(name, value)| (name.to_string(), json!(value)))
        .collect();
    if !attrs.is_empty() {
        node.insert("attrs".into(), Value::Object(attrs));
    }

    let children = children_to_nodes(element);
    if !children.is_empty() {
        node.insert("children".into(), Value::Array(children));
    }

    Value::Object(node)
}
