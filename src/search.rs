//! ラダー検索の非同期ドライバ
//!
//! common の `LadderState` を、開いたセッションに対して1試行ずつ進める。

use crate::catalog::{CatalogSearch, SearchError};
use std::time::Duration;
use tracing::{debug, info};
use wine_digest_common::{AttemptOutcome, LadderState, SearchOutcome, Step};

/// 1つの名前をラダー検索する
///
/// 各試行は `attempt_timeout` で打ち切る。タイムアウトとナビゲーションエラーは
/// クエリ短縮で吸収し、それ以外のエラーはそのまま返す。
pub async fn ladder_search(
    session: &mut dyn CatalogSearch,
    name: &str,
    attempt_timeout: Duration,
) -> Result<SearchOutcome, SearchError> {
    let mut state = LadderState::start(name)?;
    let mut attempts = 0;

    info!("検索開始: {}", name);

    while let Some(query) = state.query_text() {
        attempts += 1;
        let outcome = match tokio::time::timeout(attempt_timeout, session.search(&query)).await {
            Ok(Ok(rows)) => AttemptOutcome::Rows(rows),
            Ok(Err(e)) if e.is_transient() => {
                debug!("試行失敗 ({}): {}", query, e);
                AttemptOutcome::TransientFailure
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                debug!("試行タイムアウト ({}): {:?}", query, attempt_timeout);
                AttemptOutcome::TransientFailure
            }
        };

        match state.transition(outcome) {
            Step::Found { candidates, query_used } => {
                return Ok(SearchOutcome {
                    candidates,
                    query_used: Some(query_used),
                    attempts,
                });
            }
            Step::Continue(next) => state = next,
        }
    }

    Ok(SearchOutcome::not_found(attempts))
}
