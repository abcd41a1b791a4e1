//! ラダー検索（クエリの段階的緩和）
//!
//! 検索名を空白で分割し、結果が出るまで末尾の語を1つずつ落としていく。
//!
//! ## 状態遷移
//! - `Searching(q)` + 結果あり → 終了（見つかった）
//! - `Searching(q)` + 一時的失敗（2語以上）→ `Searching(q から末尾を除いたもの)`
//! - `Searching(q)` + 一時的失敗（1語）→ `Exhausted`（見つからない）
//!
//! 語数は毎回必ず減るので、試行回数は最初の語数を超えない。

use crate::error::{Error, Result};
use crate::types::RawCandidate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// 空白区切りの検索語列（1語以上）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    tokens: Vec<String>,
}

impl SearchQuery {
    /// 検索名を分割（空・空白のみは InvalidQuery）
    pub fn parse(name: &str) -> Result<Self> {
        let tokens: Vec<String> = name.split_whitespace().map(str::to_string).collect();
        if tokens.is_empty() {
            return Err(Error::InvalidQuery(format!("検索名が空です: {:?}", name)));
        }
        Ok(Self { tokens })
    }

    pub fn text(&self) -> String {
        self.tokens.join(" ")
    }

    /// 末尾の語を落とした次のクエリ（1語なら None）
    pub fn relax(&self) -> Option<Self> {
        if self.tokens.len() <= 1 {
            return None;
        }
        Some(Self {
            tokens: self.tokens[..self.tokens.len() - 1].to_vec(),
        })
    }
}

/// 1回の検索試行の結果
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// 結果行あり（空のVecは TransientFailure と同じ扱い）
    Rows(Vec<RawCandidate>),
    /// タイムアウト・ナビゲーションエラー
    TransientFailure,
}

/// ラダー検索の状態
#[derive(Debug, Clone, PartialEq)]
pub enum LadderState {
    Searching(SearchQuery),
    Exhausted,
}

/// 状態遷移の結果
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Found {
        candidates: Vec<RawCandidate>,
        query_used: String,
    },
    Continue(LadderState),
}

impl LadderState {
    pub fn start(name: &str) -> Result<Self> {
        Ok(Self::Searching(SearchQuery::parse(name)?))
    }

    /// 現在のクエリ文字列（Exhausted なら None）
    pub fn query_text(&self) -> Option<String> {
        match self {
            Self::Searching(query) => Some(query.text()),
            Self::Exhausted => None,
        }
    }

    pub fn transition(self, outcome: AttemptOutcome) -> Step {
        let query = match self {
            Self::Searching(query) => query,
            Self::Exhausted => return Step::Continue(Self::Exhausted),
        };

        match outcome {
            AttemptOutcome::Rows(rows) if !rows.is_empty() => {
                info!("{}件ヒット: {}", rows.len(), query.text());
                Step::Found {
                    candidates: rows,
                    query_used: query.text(),
                }
            }
            _ => match query.relax() {
                Some(next) => {
                    warn!("ヒットなし: {} → {} で再検索", query.text(), next.text());
                    Step::Continue(Self::Searching(next))
                }
                None => {
                    warn!("ヒットなし: {}（これ以上短縮できません）", query.text());
                    Step::Continue(Self::Exhausted)
                }
            },
        }
    }
}

/// ラダー検索の最終結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub candidates: Vec<RawCandidate>,
    /// ヒットしたクエリ（見つからなければ None）
    pub query_used: Option<String>,
    pub attempts: usize,
}

impl SearchOutcome {
    pub fn not_found(attempts: usize) -> Self {
        Self {
            candidates: Vec::new(),
            query_used: None,
            attempts,
        }
    }

    pub fn is_found(&self) -> bool {
        !self.candidates.is_empty()
    }
}
