//! ヘッドレスChromiumによるカタログ検索
//!
//! セッションを開くたびにブラウザを起動し、年齢確認とCookie同意を一度だけ済ませる。
//! 検索1回の待ち時間は呼び出し側（ladder_search）が区切る。
//! `Browser` はDrop時に子プロセスを終了させるので、Futureごと打ち切られても残らない。

use super::parse::{parse_search_results, ROW_SELECTOR};
use super::{CatalogSearch, SearchError, SessionFactory};
use async_trait::async_trait;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;
use wine_digest_common::RawCandidate;

pub const HOME_URL: &str = "https://www.systembolaget.se";
pub const SEARCH_URL: &str = "https://www.systembolaget.se/sortiment/";

const AGE_GATE_XPATH: &str = "//a[contains(., 'Jag har fyllt 20 år')]";
const COOKIE_CONSENT_XPATH: &str = "//button[contains(., 'acceptera alla kakor')]";
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// 検索URL（750ml瓶・定番品の赤白泡に絞る）
pub fn search_url(query: &str) -> Result<Url, SearchError> {
    Url::parse_with_params(
        SEARCH_URL,
        &[
            ("textQuery", query),
            ("categoryLevel1", "Vin"),
            ("assortmentText", "Fast sortiment"),
            ("volumeFrom", "750"),
            ("packaging", "Flaska"),
        ],
    )
    .map_err(|e| SearchError::Fatal(format!("検索URLを組み立てられません: {}", e)))
}

/// CDPエラーを検索エラーに分類
fn classify(err: CdpError, timeout: Duration) -> SearchError {
    match err {
        CdpError::Timeout => SearchError::Timeout(timeout),
        CdpError::Ws(_)
        | CdpError::ChannelSendError(_)
        | CdpError::NoResponse
        | CdpError::LaunchExit(..)
        | CdpError::LaunchTimeout(..)
        | CdpError::LaunchIo(..) => SearchError::Session(err.to_string()),
        other => SearchError::Navigation(other.to_string()),
    }
}

/// 結果行の確認1回分（true なら描画済み）
///
/// ブラウザの切断・クラッシュは Session として返す。描画途中のDOMエラーは待機を続ける。
fn rows_ready(found: Result<usize, CdpError>, timeout: Duration) -> Result<bool, SearchError> {
    match found {
        Ok(count) => Ok(count > 0),
        Err(e) => match classify(e, timeout) {
            SearchError::Session(reason) => Err(SearchError::Session(reason)),
            other => {
                debug!("結果行の確認に失敗（待機を続行）: {}", other);
                Ok(false)
            }
        },
    }
}

pub struct BrowserSessionFactory {
    pub headless: bool,
    /// 年齢確認ボタン等を待つ上限
    pub attempt_timeout: Duration,
    /// 画面操作の間の待ち時間
    pub action_pause: Duration,
}

impl BrowserSessionFactory {
    pub fn new(headless: bool, attempt_timeout: Duration, action_pause: Duration) -> Self {
        Self {
            headless,
            attempt_timeout,
            action_pause,
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig, SearchError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions");
        if !self.headless {
            builder = builder.with_head();
        }
        builder.build().map_err(SearchError::Session)
    }
}

#[async_trait]
impl SessionFactory for BrowserSessionFactory {
    async fn open(&self) -> Result<Box<dyn CatalogSearch>, SearchError> {
        let config = self.browser_config()?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| classify(e, self.attempt_timeout))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDPハンドラ終了: {}", e);
                    break;
                }
            }
        });

        let mut session = BrowserSession {
            browser,
            handler_task,
            page: None,
            attempt_timeout: self.attempt_timeout,
            action_pause: self.action_pause,
            closed: false,
        };

        if let Err(e) = session.pass_gates().await {
            if let Err(close_err) = session.close().await {
                warn!("起動失敗後のクローズに失敗: {}", close_err);
            }
            return Err(e);
        }

        info!("ブラウザセッションを開始しました");
        Ok(Box::new(session))
    }
}

pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    page: Option<Page>,
    attempt_timeout: Duration,
    action_pause: Duration,
    closed: bool,
}

impl BrowserSession {
    /// トップページを開き、年齢確認とCookie同意を通す
    async fn pass_gates(&mut self) -> Result<(), SearchError> {
        let page = self
            .browser
            .new_page(HOME_URL)
            .await
            .map_err(|e| classify(e, self.attempt_timeout))?;
        tokio::time::sleep(self.action_pause).await;

        if !self.click_when_present(&page, AGE_GATE_XPATH).await? {
            return Err(SearchError::Navigation(
                "年齢確認ボタンが見つかりません".into(),
            ));
        }
        tokio::time::sleep(self.action_pause).await;

        if !self.click_when_present(&page, COOKIE_CONSENT_XPATH).await? {
            warn!("Cookie同意ボタンが見つかりません（続行）");
        }
        tokio::time::sleep(self.action_pause).await;

        self.page = Some(page);
        Ok(())
    }

    /// 要素が現れるまで待ってクリック（時間内に現れなければ false）
    async fn click_when_present(&self, page: &Page, xpath: &str) -> Result<bool, SearchError> {
        let deadline = Instant::now() + self.attempt_timeout;
        loop {
            if let Ok(element) = page.find_xpath(xpath).await {
                element
                    .click()
                    .await
                    .map_err(|e| classify(e, self.attempt_timeout))?;
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl CatalogSearch for BrowserSession {
    async fn search(&mut self, query: &str) -> Result<Vec<RawCandidate>, SearchError> {
        let page = self
            .page
            .as_ref()
            .ok_or_else(|| SearchError::Session("ページが開かれていません".into()))?;
        let url = search_url(query)?;
        debug!("検索: {}", url);

        page.goto(url.as_str())
            .await
            .map_err(|e| classify(e, self.attempt_timeout))?;

        // 結果行が描画されるまで待つ（ヒットなしは呼び出し側のタイムアウトになる）
        loop {
            let found = page.find_elements(ROW_SELECTOR).await.map(|rows| rows.len());
            if rows_ready(found, self.attempt_timeout)? {
                break;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }

        let html = page
            .content()
            .await
            .map_err(|e| classify(e, self.attempt_timeout))?;
        Ok(parse_search_results(&html))
    }

    async fn close(&mut self) -> Result<(), SearchError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.page = None;

        let result = match self.browser.close().await {
            Ok(_) => self
                .browser
                .wait()
                .await
                .map(|_| ())
                .map_err(|e| SearchError::Session(e.to_string())),
            Err(e) => Err(classify(e, self.attempt_timeout)),
        };
        self.handler_task.abort();
        result
    }
}
