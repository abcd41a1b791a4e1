//! 候補の確定（類似度フィルタ）
//!
//! 検索結果の各行について元の名前との照合スコアを計算し、
//! 閾値を超えたものだけを残す。上位1件の選択ではなくフィルタなので、
//! 同じワインの別容量・別ヴィンテージが複数残ることがある。

use crate::similarity::match_score;
use crate::types::{ConfirmedMatch, RawCandidate};
use tracing::debug;

/// 既定の閾値（これより大きいスコアで一致とみなす）
pub const DEFAULT_THRESHOLD: f64 = 70.0;

/// 閾値を超えた候補を返す（順序は入力のまま）
pub fn confirm(
    source_name: &str,
    source_rating: f64,
    candidates: &[RawCandidate],
    threshold: f64,
) -> Vec<ConfirmedMatch> {
    candidates
        .iter()
        .filter_map(|candidate| {
            let score = match_score(source_name, &candidate.display_name);
            if score > threshold {
                Some(ConfirmedMatch {
                    source_name: source_name.to_string(),
                    source_rating,
                    candidate: candidate.clone(),
                    match_score: score,
                })
            } else {
                debug!(
                    "一致度が低いため除外: {} / {} ({}%)",
                    source_name, candidate.display_name, score
                );
                None
            }
        })
        .collect()
}
