use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use wine_digest::catalog::BrowserSessionFactory;
use wine_digest::details::{DetailSource, HttpDetailSource};
use wine_digest::pipeline::Pipeline;
use wine_digest::publish::Delivery;
use wine_digest::toplist::{HttpToplistSource, ToplistSource};
use wine_digest::{cli, config};
use wine_digest_common::{confirm, match_score, ExternalRatingEntry};
use cli::{Cli, Commands};
use config::Config;

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "info,wine_digest=debug,wine_digest_common=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn session_factory(config: &Config) -> BrowserSessionFactory {
    BrowserSessionFactory::new(config.headless, config.attempt_timeout(), config.action_pause())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let mut config = Config::load().context("設定を読み込めません")?;

    match cli.command {
        Commands::Run { lists, publish, threshold } => {
            println!(
                "🍷 wine-digest - 一括処理 ({})\n",
                chrono::Local::now().format("%Y-%m-%d %H:%M")
            );

            if let Some(threshold) = threshold {
                config.match_threshold = threshold;
            }
            let urls = if lists.is_empty() { config.toplist_urls.clone() } else { lists };
            let delivery = Delivery::from_config(publish, &config)?;

            let toplists = HttpToplistSource::new()?;
            let sessions = session_factory(&config);
            let details = HttpDetailSource::new()?;
            let pipeline = Pipeline::new(&config, &toplists, &sessions, &details).with_progress(true);

            println!("[1/1] {}件のトップリストを処理中...", urls.len());
            let summary = pipeline.run(&urls, &delivery).await;

            println!(
                "✔ {}リスト / {}件: 一致 {} / 見つからず {} / 失敗 {}",
                summary.lists, summary.entries, summary.matched, summary.not_found, summary.failed
            );
            println!("\n✅ 完了");
        }

        Commands::Search { name, rating, threshold, no_details } => {
            println!("🔍 wine-digest - 検索: {}\n", name);

            let threshold = threshold.unwrap_or(config.match_threshold);
            let toplists = HttpToplistSource::new()?;
            let sessions = session_factory(&config);
            let details = HttpDetailSource::new()?;
            let pipeline = Pipeline::new(&config, &toplists, &sessions, &details);

            let outcome = pipeline.search_name(&name).await?;
            match &outcome.query_used {
                Some(query) => println!("✔ {}件ヒット（検索語: {}）", outcome.candidates.len(), query),
                None => {
                    println!("見つかりませんでした");
                    return Ok(());
                }
            }

            let entry = ExternalRatingEntry::new(name.as_str(), rating);
            let confirmed = confirm(&entry.name, entry.rating, &outcome.candidates, threshold);
            for candidate in &outcome.candidates {
                let accepted = confirmed.iter().any(|m| m.candidate == *candidate);
                println!(
                    "  {} {:5.1}  {}  {}",
                    if accepted { "✔" } else { " " },
                    match_score(&name, &candidate.display_name),
                    candidate.display_name,
                    candidate.href
                );
            }

            if !no_details {
                for matched in &confirmed {
                    let wine = details.fetch_details(&matched.candidate.href).await?;
                    println!("\n{}", matched.candidate.display_name);
                    println!("{}", serde_json::to_string_pretty(&wine)?);
                }
            }
        }

        Commands::Toplist { url } => {
            let toplists = HttpToplistSource::new()?;
            let entries = toplists.fetch(&url).await?;
            println!("✔ {}件のワイン\n", entries.len());
            for entry in &entries {
                println!("  {:.1} ⭐ {}", entry.rating, entry.name);
            }
        }

        Commands::Score { a, b } => {
            let score = match_score(&a, &b);
            let verdict = if score > config.match_threshold { "一致" } else { "不一致" };
            println!("{:.1} ({}、閾値 {:.1})", score, verdict, config.match_threshold);
        }

        Commands::Config { set_telegram_token, set_chat_id, set_telegraph_token, show } => {
            let changed = set_telegram_token.is_some() || set_chat_id.is_some() || set_telegraph_token.is_some();
            if changed {
                // 環境変数の値をファイルへ書き込まないよう、ファイルだけから読み直す
                config = Config::load_from(&Config::config_path()?)?;
            }

            if let Some(token) = set_telegram_token {
                config.telegram_bot_token = Some(token);
                println!("✔ Telegram Botトークンを設定しました");
            }
            if let Some(chat_id) = set_chat_id {
                config.telegram_chat_id = Some(chat_id);
                println!("✔ TelegramチャットIDを設定しました");
            }
            if let Some(token) = set_telegraph_token {
                config.telegraph_token = Some(token);
                println!("✔ Telegraphトークンを設定しました");
            }
            if changed {
                config.save()?;
            }

            if show || !changed {
                let set = |v: bool| if v { "設定済み" } else { "未設定" };
                println!("設定: {}", Config::config_path()?.display());
                println!("  トップリスト: {}件", config.toplist_urls.len());
                for url in &config.toplist_urls {
                    println!("    {}", url);
                }
                println!("  一致閾値: {}", config.match_threshold);
                println!("  検索タイムアウト: {}ms", config.attempt_timeout_ms);
                println!("  1件あたりの時間予算: {}秒", config.name_budget_seconds);
                println!("  リトライ: {}回 / {}ms間隔", config.retry_max_attempts, config.retry_delay_ms);
                println!("  Telegram Botトークン: {}", set(config.telegram_bot_token.is_some()));
                println!("  TelegramチャットID: {}", set(config.telegram_chat_id.is_some()));
                println!("  Telegraphトークン: {}", set(config.telegraph_token.is_some()));
            }
        }
    }

    Ok(())
}
