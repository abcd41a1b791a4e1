//! 固定間隔リトライ
//!
//! 例外の種類ではなく「使える結果が得られたか」で判定する。
//! 判定は呼び出し側が `is_failure` で渡す。

use std::future::Future;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最大試行回数（0は1として扱う）
    pub max_attempts: usize,
    /// 試行間の待ち時間
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }

    /// `op` を最大 `max_attempts` 回実行し、最後の結果を返す
    ///
    /// `op` には1始まりの試行番号が渡される。
    pub async fn run<T, F, Fut, P>(&self, mut op: F, is_failure: P) -> T
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = T>,
        P: Fn(&T) -> bool,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let result = op(attempt).await;
            if !is_failure(&result) {
                return result;
            }
            if attempt >= max_attempts {
                warn!("{}回試行しても結果が得られませんでした", attempt);
                return result;
            }

            warn!(
                "試行 {}/{} 失敗、{:?}後に再試行",
                attempt, max_attempts, self.delay
            );
            tokio::time::sleep(self.delay).await;
            attempt += 1;
        }
    }
}
