//! 結合テスト用のモック

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wine_digest::catalog::{CatalogSearch, SearchError, SessionFactory};
use wine_digest::config::Config;
use wine_digest_common::RawCandidate;

pub fn row(name: &str, href: &str) -> RawCandidate {
    RawCandidate {
        display_name: name.to_string(),
        href: href.to_string(),
        price_text: "139:-".to_string(),
        style_text: "Rött vin".to_string(),
    }
}

/// テスト用の設定（リトライ3回・10秒間隔）
pub fn test_config() -> Config {
    Config {
        attempt_timeout_ms: 3_000,
        name_budget_seconds: 600,
        retry_max_attempts: 3,
        retry_delay_ms: 10_000,
        action_pause_ms: 0,
        ..Config::default()
    }
}

/// 開閉回数と発行クエリの記録
#[derive(Clone, Default)]
pub struct Counters {
    pub opened: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
    pub queries: Arc<Mutex<Vec<String>>>,
}

impl Counters {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

/// クエリ → 結果行の表で応答するセッションを開く
///
/// 表にないクエリはタイムアウト扱い。
#[derive(Default)]
pub struct MockFactory {
    pub counters: Counters,
    answers: Arc<HashMap<String, Vec<RawCandidate>>>,
    /// 起動を失敗させる残り回数
    fail_open: AtomicUsize,
    /// 全検索をこのエラーにする
    fail_search: Option<SearchError>,
    /// 検索が返らない
    hang: bool,
}

impl MockFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, query: &str, rows: Vec<RawCandidate>) -> Self {
        Arc::make_mut(&mut self.answers).insert(query.to_string(), rows);
        self
    }

    pub fn fail_open(self, times: usize) -> Self {
        self.fail_open.store(times, Ordering::SeqCst);
        self
    }

    pub fn fail_search(mut self, error: SearchError) -> Self {
        self.fail_search = Some(error);
        self
    }

    pub fn hang(mut self) -> Self {
        self.hang = true;
        self
    }
}

#[async_trait]
impl SessionFactory for MockFactory {
    async fn open(&self) -> Result<Box<dyn CatalogSearch>, SearchError> {
        let remaining = self.fail_open.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_open.store(remaining - 1, Ordering::SeqCst);
            return Err(SearchError::Session("ブラウザが起動しません".into()));
        }

        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            counters: self.counters.clone(),
            answers: Arc::clone(&self.answers),
            fail_search: self.fail_search.clone(),
            hang: self.hang,
        }))
    }
}

pub struct MockSession {
    counters: Counters,
    answers: Arc<HashMap<String, Vec<RawCandidate>>>,
    fail_search: Option<SearchError>,
    hang: bool,
}

#[async_trait]
impl CatalogSearch for MockSession {
    async fn search(&mut self, query: &str) -> Result<Vec<RawCandidate>, SearchError> {
        self.counters.queries.lock().unwrap().push(query.to_string());
        if self.hang {
            futures::future::pending::<()>().await;
        }
        if let Some(error) = &self.fail_search {
            return Err(error.clone());
        }
        self.answers
            .get(query)
            .cloned()
            .ok_or(SearchError::Timeout(Duration::from_secs(3)))
    }

    async fn close(&mut self) -> Result<(), SearchError> {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
