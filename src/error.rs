use crate::catalog::SearchError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DigestError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("{0} が設定されていません。環境変数か `wine-digest config` で設定してください")]
    MissingToken(&'static str),

    #[error("HTTPエラー: {0}")]
    Http(#[from] reqwest::Error),

    #[error("検索エラー: {0}")]
    Search(#[from] SearchError),

    #[error("ページ構造を解析できません ({url}): {reason}")]
    FatalInterface { url: String, reason: String },

    #[error("配信エラー: {0}")]
    Publish(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] wine_digest_common::Error),
}

pub type Result<T> = std::result::Result<T, DigestError>;
