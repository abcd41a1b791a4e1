use crate::error::{DigestError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use wine_digest_common::DEFAULT_THRESHOLD;

pub const DEFAULT_TOPLISTS: &[&str] = &[
    "https://www.vivino.com/toplists/best-wines-under-100-kr-right-now-sweden",
    "https://www.vivino.com/toplists/best-wines-between-100-kr-and-200-kr-right-now-sweden",
    "https://www.vivino.com/toplists/top-25-australian-shiraz-wines-sweden-right-now-sweden",
    "https://www.vivino.com/toplists/top-25-south-african-syrah-wines-sweden-right-now-sweden",
];

/// 実行設定
///
/// 起動時に一度だけ組み立て、パイプラインへ明示的に渡す。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub toplist_urls: Vec<String>,
    pub match_threshold: f64,
    /// 検索1回あたりのタイムアウト
    pub attempt_timeout_ms: u64,
    /// 1銘柄あたりの時間予算（リトライ込み）
    pub name_budget_seconds: u64,
    pub retry_max_attempts: usize,
    pub retry_delay_ms: u64,
    /// ブラウザ操作の間に入れる待ち時間
    pub action_pause_ms: u64,
    pub headless: bool,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<i64>,
    pub telegraph_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            toplist_urls: DEFAULT_TOPLISTS.iter().map(|s| s.to_string()).collect(),
            match_threshold: DEFAULT_THRESHOLD,
            attempt_timeout_ms: 3000,
            name_budget_seconds: 600,
            retry_max_attempts: 5,
            retry_delay_ms: 10_000,
            action_pause_ms: 1000,
            headless: true,
            telegram_bot_token: None,
            telegram_chat_id: None,
            telegraph_token: None,
        }
    }
}

impl Config {
    /// 設定ファイル + 環境変数から読み込み
    pub fn load() -> Result<Self> {
        let config = Self::load_from(&Self::config_path()?)?;
        config.with_env(|key| std::env::var(key).ok())
    }

    /// 指定パスから読み込み（ファイルがなければ既定値）
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| DigestError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("wine-digest").join("config.json"))
    }

    /// 環境変数で上書き（ファイルより優先）
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("TELEGRAM_BOT_TOKEN").filter(|v| !v.trim().is_empty()) {
            self.telegram_bot_token = Some(token);
        }
        if let Some(chat_id) = lookup("TELEGRAM_CHAT_ID").filter(|v| !v.trim().is_empty()) {
            let chat_id = chat_id.trim().parse::<i64>().map_err(|_| {
                DigestError::Config(format!("TELEGRAM_CHAT_ID が数値ではありません: {}", chat_id))
            })?;
            self.telegram_chat_id = Some(chat_id);
        }
        if let Some(token) = lookup("TELEGRAPH_TOKEN").filter(|v| !v.trim().is_empty()) {
            self.telegraph_token = Some(token);
        }
        if let Some(timeout) = lookup("CHROME_TIMEOUT").filter(|v| !v.trim().is_empty()) {
            self.attempt_timeout_ms = timeout.trim().parse::<u64>().map_err(|_| {
                DigestError::Config(format!("CHROME_TIMEOUT が数値ではありません: {}", timeout))
            })?;
        }
        Ok(self)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    pub fn name_budget(&self) -> Duration {
        Duration::from_secs(self.name_budget_seconds)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn action_pause(&self) -> Duration {
        Duration::from_millis(self.action_pause_ms)
    }

    pub fn telegram_credentials(&self) -> Result<(String, i64)> {
        let token = self
            .telegram_bot_token
            .clone()
            .ok_or(DigestError::MissingToken("TELEGRAM_BOT_TOKEN"))?;
        let chat_id = self
            .telegram_chat_id
            .ok_or(DigestError::MissingToken("TELEGRAM_CHAT_ID"))?;
        Ok((token, chat_id))
    }

    pub fn telegraph_token(&self) -> Result<String> {
        self.telegraph_token
            .clone()
            .ok_or(DigestError::MissingToken("TELEGRAPH_TOKEN"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.toplist_urls.len(), 4);
        assert_eq!(config.match_threshold, 70.0);
        assert_eq!(config.attempt_timeout(), Duration::from_secs(3));
        assert_eq!(config.retry_max_attempts, 5);
        assert_eq!(config.retry_delay(), Duration::from_secs(10));
        assert_eq!(config.name_budget(), Duration::from_secs(600));
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::default()
            .with_env(env(&[
                ("TELEGRAM_BOT_TOKEN", "123:abc"),
                ("TELEGRAM_CHAT_ID", "-100200"),
                ("CHROME_TIMEOUT", "5000"),
            ]))
            .unwrap();
        assert_eq!(config.telegram_credentials().unwrap(), ("123:abc".to_string(), -100200));
        assert_eq!(config.attempt_timeout_ms, 5000);
        assert!(config.telegraph_token().is_err());
    }

    #[test]
    fn test_env_invalid_chat_id() {
        let result = Config::default().with_env(env(&[("TELEGRAM_CHAT_ID", "channel")]));
        assert!(matches!(result, Err(DigestError::Config(_))));
    }

    #[test]
    fn test_env_blank_values_ignored() {
        let mut config = Config::default();
        config.telegram_bot_token = Some("from-file".into());
        let config = config.with_env(env(&[("TELEGRAM_BOT_TOKEN", "  ")])).unwrap();
        assert_eq!(config.telegram_bot_token.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_missing_token_message() {
        let err = Config::default().telegram_credentials().unwrap_err();
        assert!(format!("{}", err).contains("TELEGRAM_BOT_TOKEN"));
    }
}
