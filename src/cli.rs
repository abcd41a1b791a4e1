use clap::{Parser, Subcommand};
use crate::publish::PublishTarget;

#[derive(Parser)]
#[command(name = "wine-digest")]
#[command(about = "Vivinoトップリストのワインを Systembolaget で探して配信するツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// トップリストを一括処理して配信
    Run {
        /// 処理するトップリストURL（省略時は設定ファイルの一覧）
        #[arg(short, long = "list")]
        lists: Vec<String>,

        /// 配信先
        #[arg(short, long, value_enum, default_value = "telegraph")]
        publish: PublishTarget,

        /// 一致と判定するスコアの閾値（0-100、これより大きいもの）
        #[arg(short, long)]
        threshold: Option<f64>,
    },

    /// ワイン名1件をカタログで検索
    Search {
        /// ワイン名
        #[arg(required = true)]
        name: String,

        /// 表示用の評価値
        #[arg(short, long, default_value = "0")]
        rating: f64,

        /// 一致と判定するスコアの閾値
        #[arg(short, long)]
        threshold: Option<f64>,

        /// 詳細ページを取得しない
        #[arg(long)]
        no_details: bool,
    },

    /// トップリストを取得して表示
    Toplist {
        /// トップリストURL
        #[arg(required = true)]
        url: String,
    },

    /// 2つの名前の一致スコアを表示（年号は除いて比較）
    Score {
        a: String,
        b: String,
    },

    /// 設定を管理
    Config {
        /// Telegram Botトークンを設定
        #[arg(long)]
        set_telegram_token: Option<String>,

        /// TelegramチャットIDを設定
        #[arg(long, allow_hyphen_values = true)]
        set_chat_id: Option<i64>,

        /// Telegraphアクセストークンを設定
        #[arg(long)]
        set_telegraph_token: Option<String>,

        /// 現在の設定を表示
        #[arg(long)]
        show: bool,
    },
}
