//! カタログ検索インターフェース
//!
//! - CatalogSearch: 1セッションでの検索（クエリ → 結果行）
//! - SessionFactory: 年齢確認・Cookie同意を済ませたセッションを開く
//! - with_session: セッションを開いて処理し、どの経路でも必ず閉じる

pub mod browser;
pub mod parse;

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, warn};
use wine_digest_common::RawCandidate;

pub use browser::{BrowserSession, BrowserSessionFactory};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    /// 結果の表示待ちがタイムアウト（ヒットなしもここに入る）
    #[error("検索がタイムアウトしました ({0:?})")]
    Timeout(Duration),

    #[error("ナビゲーションエラー: {0}")]
    Navigation(String),

    /// ブラウザの起動失敗・クラッシュ・切断
    #[error("ブラウザセッションエラー: {0}")]
    Session(String),

    /// URL不正など、再試行しても直らないもの
    #[error("検索インターフェースが利用できません: {0}")]
    Fatal(String),

    #[error("検索名が不正です: {0}")]
    InvalidQuery(String),

    #[error("1銘柄あたりの時間予算を超過しました")]
    BudgetExceeded,
}

impl SearchError {
    /// ラダー検索でクエリを短縮して続行できる失敗か
    pub fn is_transient(&self) -> bool {
        matches!(self, SearchError::Timeout(_) | SearchError::Navigation(_))
    }

    /// セッションを作り直して再試行できる失敗か
    pub fn is_retryable(&self) -> bool {
        self.is_transient() || matches!(self, SearchError::Session(_))
    }
}

impl From<wine_digest_common::Error> for SearchError {
    fn from(err: wine_digest_common::Error) -> Self {
        match err {
            wine_digest_common::Error::InvalidQuery(msg) => SearchError::InvalidQuery(msg),
            other => SearchError::Fatal(other.to_string()),
        }
    }
}

/// 開いた検索セッション
#[async_trait]
pub trait CatalogSearch: Send {
    async fn search(&mut self, query: &str) -> Result<Vec<RawCandidate>, SearchError>;

    async fn close(&mut self) -> Result<(), SearchError>;
}

#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn CatalogSearch>, SearchError>;
}

/// セッションを開いて `f` を実行し、結果に関わらず閉じる
///
/// `deadline` を過ぎたら `f` を打ち切って BudgetExceeded を返す（その場合も閉じる）。
pub async fn with_session<T, F>(
    factory: &dyn SessionFactory,
    deadline: Instant,
    f: F,
) -> Result<T, SearchError>
where
    F: for<'a> FnOnce(&'a mut dyn CatalogSearch) -> BoxFuture<'a, Result<T, SearchError>>,
{
    let mut session = match tokio::time::timeout_at(deadline, factory.open()).await {
        Ok(opened) => opened?,
        Err(_) => return Err(SearchError::BudgetExceeded),
    };
    debug!("検索セッションを開きました");

    let result = match tokio::time::timeout_at(deadline, f(session.as_mut())).await {
        Ok(result) => result,
        Err(_) => Err(SearchError::BudgetExceeded),
    };

    if let Err(e) = session.close().await {
        warn!("セッションのクローズに失敗: {}", e);
    } else {
        debug!("検索セッションを閉じました");
    }

    result
}
