//! 配信用ダイジェストの整形
//!
//! - Telegraph: 1件1段落のHTML
//! - Telegram: スタイル（赤・白・泡）ごとにまとめた MarkdownV2 メッセージ

use crate::types::EnrichedMatch;

pub const CATALOG_BASE_URL: &str = "https://www.systembolaget.se";

/// スタイル表記を絵文字に変換（該当なしはそのまま）
pub fn wine_style_to_emoji(style: &str) -> String {
    if style.contains("Rött") {
        return "🍷".to_string();
    }
    if style.contains("Vitt") {
        return "🥂".to_string();
    }
    if style.contains("Mousserande") {
        return "🍾".to_string();
    }
    style.to_string()
}

/// トップリストURLの末尾からタイトルを作る
///
/// `.../best-wines-under-100-kr-right-now-sweden` → `best wines under 100 kr 🇸🇪`
pub fn toplist_title(list_url: &str) -> String {
    let slug = list_url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(list_url);
    slug.replace("sweden", "🇸🇪")
        .replace('-', " ")
        .replace(" right now", "")
}

/// 商品リンクを絶対URLにする
pub fn product_link(href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{}{}", CATALOG_BASE_URL, href)
    } else {
        format!("{}/{}", CATALOG_BASE_URL, href)
    }
}

/// 評価値の表示（小数点はカンマ）
pub fn format_rating(rating: f64) -> String {
    format!("{:.1}", rating).replace('.', ",")
}

/// 価格表記 "139:-" → "139 kr"
pub fn format_price(price_text: &str) -> String {
    price_text.trim().replace(":-", " kr").trim().to_string()
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\'', "&#39;")
}

/// MarkdownV2 の予約文字をエスケープ
pub fn escape_markdown_v2(text: &str) -> String {
    const RESERVED: &[char] = &[
        '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!', '\\',
    ];
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if RESERVED.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// MarkdownV2 のリンクURL部分（`)` と `\` のみエスケープ）
fn escape_markdown_url(url: &str) -> String {
    url.replace('\\', "\\\\").replace(')', "\\)")
}

/// Telegraph ページ本文（1件1段落）
pub fn render_telegraph_html(matches: &[EnrichedMatch]) -> String {
    matches
        .iter()
        .map(|m| {
            format!(
                "<p>{} ⭐ {} <a href='{}'>{}</a> {}</p>",
                format_rating(m.matched.source_rating),
                escape_html(&wine_style_to_emoji(m.style())),
                escape_html(&product_link(&m.matched.candidate.href)),
                escape_html(&m.matched.candidate.display_name),
                escape_html(&format_price(m.price())),
            )
        })
        .collect()
}

/// スタイル別メッセージ
#[derive(Debug, Clone, PartialEq)]
pub struct StyleMessage {
    /// スタイル絵文字（グループのキー）
    pub style: String,
    pub text: String,
}

/// Telegram 用にスタイルごとにまとめる（出現順を保つ）
pub fn render_telegram_messages(title: &str, matches: &[EnrichedMatch]) -> Vec<StyleMessage> {
    let mut messages: Vec<StyleMessage> = Vec::new();

    for m in matches {
        let style = wine_style_to_emoji(m.style());
        let entry = render_telegram_entry(m, &style);

        match messages.iter_mut().find(|msg| msg.style == style) {
            Some(msg) => msg.text.push_str(&entry),
            None => {
                let header = title.replacen("best", &format!("🔝 {}", style), 1);
                messages.push(StyleMessage {
                    style: style.clone(),
                    text: format!("\n{}\n{}", escape_markdown_v2(&header), entry),
                });
            }
        }
    }

    messages
}

fn render_telegram_entry(m: &EnrichedMatch, style: &str) -> String {
    let details = m.details.as_ref();
    let grape = details.and_then(|d| d.grape.as_deref()).unwrap_or("");
    let volume = details
        .and_then(|d| d.volume_litres)
        .map(|v| format!(" {}L", v))
        .unwrap_or_default();

    let heading = format!(
        "{} ⭐ {}",
        format_rating(m.matched.source_rating),
        m.matched.source_name
    );
    let link = format!(
        "[{}]({})",
        escape_markdown_v2(&m.matched.candidate.display_name),
        escape_markdown_url(&product_link(&m.matched.candidate.href))
    );
    let tail = format!("{} {}", volume, format_price(m.price()));

    format!(
        "\n*{}* {} {}\n{}{}\n",
        escape_markdown_v2(&heading),
        escape_markdown_v2(style),
        escape_markdown_v2(grape),
        link,
        escape_markdown_v2(&tail),
    )
}
