//! 一括処理
//!
//! トップリストごと・ワインごとに
//! 時間予算 → リトライ → セッション → ラダー検索 → 照合 → 詳細取得 を行い、
//! リスト単位で配信する。1件の失敗はログに残して次へ進む。

use crate::catalog::{with_session, SearchError, SessionFactory};
use crate::config::Config;
use crate::details::DetailSource;
use crate::error::Result;
use crate::publish::Delivery;
use crate::retry::RetryPolicy;
use crate::search::ladder_search;
use crate::toplist::ToplistSource;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, warn};
use wine_digest_common::{
    confirm, toplist_title, EnrichedMatch, ExternalRatingEntry, SearchOutcome, SearchQuery,
};

/// セッションのクローズを待つ猶予（時間予算の外側）
const CLOSE_GRACE: Duration = Duration::from_secs(5);

/// 実行結果の集計
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub lists: usize,
    pub entries: usize,
    pub matched: usize,
    pub not_found: usize,
    pub failed: usize,
}

/// ワイン1件の処理結果
#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Matched(Vec<EnrichedMatch>),
    NotFound,
}

pub struct Pipeline<'a> {
    pub config: &'a Config,
    pub toplists: &'a dyn ToplistSource,
    pub sessions: &'a dyn SessionFactory,
    pub details: &'a dyn DetailSource,
    pub show_progress: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a Config,
        toplists: &'a dyn ToplistSource,
        sessions: &'a dyn SessionFactory,
        details: &'a dyn DetailSource,
    ) -> Self {
        Self {
            config,
            toplists,
            sessions,
            details,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.config.retry_max_attempts, self.config.retry_delay())
    }

    /// 1つの名前を時間予算内でラダー検索する（セッションの開閉・リトライ込み）
    ///
    /// 空の名前はセッションを開く前に InvalidQuery で返す。
    /// 予算超過とリトライ切れは見つからなかった扱いで、`attempts` はセッションの試行回数。
    pub async fn search_name(&self, name: &str) -> std::result::Result<SearchOutcome, SearchError> {
        SearchQuery::parse(name)?;

        let deadline = Instant::now() + self.config.name_budget();
        let attempt_timeout = self.config.attempt_timeout();
        let policy = self.retry_policy();

        let sessions = self.sessions;
        let tried = AtomicUsize::new(0);
        let tried_ref = &tried;

        let retried = policy.run(
            move |attempt| {
                tried_ref.store(attempt, Ordering::SeqCst);
                let name = name.to_string();
                async move {
                    if attempt > 1 {
                        info!("再試行 {}: {}", attempt, name);
                    }
                    with_session(sessions, deadline, move |session| {
                        Box::pin(async move { ladder_search(session, &name, attempt_timeout).await })
                    })
                    .await
                }
            },
            |result| matches!(result, Err(e) if e.is_retryable()),
        );

        let result = match tokio::time::timeout_at(deadline + CLOSE_GRACE, retried).await {
            Ok(result) => result,
            Err(_) => Err(SearchError::BudgetExceeded),
        };

        match result {
            Ok(outcome) => Ok(outcome),
            Err(e) if e.is_retryable() || e == SearchError::BudgetExceeded => {
                let attempts = tried.load(Ordering::SeqCst);
                warn!("見つかりませんでした ({}, {}回試行): {}", name, attempts, e);
                Ok(SearchOutcome::not_found(attempts))
            }
            Err(e) => Err(e),
        }
    }

    /// 検索 → 照合 → 詳細取得
    pub async fn process_entry(&self, entry: &ExternalRatingEntry) -> Result<EntryResult> {
        let outcome = self.search_name(&entry.name).await?;
        if !outcome.is_found() {
            return Ok(EntryResult::NotFound);
        }

        let confirmed = confirm(
            &entry.name,
            entry.rating,
            &outcome.candidates,
            self.config.match_threshold,
        );
        if confirmed.is_empty() {
            info!("一致する候補がありません: {}", entry.name);
            return Ok(EntryResult::NotFound);
        }

        let mut enriched = Vec::with_capacity(confirmed.len());
        for matched in confirmed {
            let details = self.details.fetch_details(&matched.candidate.href).await?;
            enriched.push(EnrichedMatch {
                matched,
                details: Some(details),
            });
        }
        Ok(EntryResult::Matched(enriched))
    }

    /// トップリスト1つを処理して一致結果を返す
    pub async fn process_toplist(
        &self,
        url: &str,
        summary: &mut RunSummary,
    ) -> Result<Vec<EnrichedMatch>> {
        let entries = self.toplists.fetch(url).await?;
        summary.lists += 1;
        summary.entries += entries.len();

        let progress = if self.show_progress {
            let bar = ProgressBar::new(entries.len() as u64);
            bar.set_style(
                ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        let mut matches = Vec::new();
        for entry in &entries {
            progress.set_message(entry.name.clone());
            match self.process_entry(entry).await {
                Ok(EntryResult::Matched(found)) => {
                    summary.matched += 1;
                    matches.extend(found);
                }
                Ok(EntryResult::NotFound) => summary.not_found += 1,
                Err(e) => {
                    summary.failed += 1;
                    error!("処理に失敗しました ({}): {}", entry.name, e);
                }
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        Ok(matches)
    }

    /// 全トップリストを処理して配信する
    pub async fn run(&self, urls: &[String], delivery: &Delivery) -> RunSummary {
        let mut summary = RunSummary::default();

        for url in urls {
            info!("トップリスト処理開始: {}", url);
            let matches = match self.process_toplist(url, &mut summary).await {
                Ok(matches) => matches,
                Err(e) => {
                    error!("トップリストを処理できません ({}): {}", url, e);
                    continue;
                }
            };

            if matches.is_empty() {
                warn!("配信する一致がありません: {}", url);
                continue;
            }
            delivery.deliver(&toplist_title(url), &matches).await;
        }

        summary
    }
}
