//! 一括処理の結合テスト
//!
//! トップリスト → 検索 → 照合 → 詳細取得 → 配信 までをモックで通す

mod support;

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use support::{row, test_config, MockFactory};
use wine_digest::details::DetailSource;
use wine_digest::error::{DigestError, Result};
use wine_digest::pipeline::{EntryResult, Pipeline, RunSummary};
use wine_digest::publish::{Delivery, Publisher};
use wine_digest::toplist::ToplistSource;
use wine_digest_common::{ExternalRatingEntry, WineDetails};

const LIST_URL: &str = "https://www.vivino.com/toplists/best-wines-between-100-kr-and-200-kr-right-now-sweden";

struct MockToplist;

#[async_trait]
impl ToplistSource for MockToplist {
    async fn fetch(&self, url: &str) -> Result<Vec<ExternalRatingEntry>> {
        if url != LIST_URL {
            return Err(DigestError::FatalInterface {
                url: url.to_string(),
                reason: "ワインのカードが見つかりません".into(),
            });
        }
        Ok(vec![
            ExternalRatingEntry::new("Zenato Valpolicella Classico Superiore", 4.2),
            ExternalRatingEntry::new("Doppio Passo Primitivo", 4.1),
            ExternalRatingEntry::new("Okänt Vin", 3.9),
            ExternalRatingEntry::new("   ", 3.8),
        ])
    }
}

#[derive(Default)]
struct MockDetails {
    calls: AtomicUsize,
    broken_href: Option<&'static str>,
}

#[async_trait]
impl DetailSource for MockDetails {
    async fn fetch_details(&self, href: &str) -> Result<WineDetails> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.broken_href == Some(href) {
            return Err(DigestError::FatalInterface {
                url: href.to_string(),
                reason: "商品情報の要素が見つかりません".into(),
            });
        }
        Ok(WineDetails {
            price: Some("139 kr".into()),
            volume_litres: Some(0.75),
            style: Some("Rött vin".into()),
            grape: Some("Primitivo".into()),
            image_url: None,
        })
    }
}

struct Recorder(Arc<Mutex<Vec<(String, String)>>>);

#[async_trait]
impl Publisher for Recorder {
    async fn publish(&self, title: &str, body: &str) -> Result<Option<String>> {
        self.0.lock().unwrap().push((title.to_string(), body.to_string()));
        Ok(None)
    }
}

fn catalog() -> MockFactory {
    MockFactory::new()
        .answer(
            "Zenato Valpolicella Classico Superiore",
            vec![row("Zenato Valpolicella Classico Superiore, 2019", "/produkt/vin/zenato-1238501/")],
        )
        .answer(
            "Doppio Passo",
            vec![
                row("Doppio Passo Primitivo, 2021", "/produkt/vin/doppio-passo-320408/"),
                row("Doppio Passo Organic Primitivo, 2020", "/produkt/vin/doppio-passo-320401/"),
                row("Doppio Passo Salento Negroamaro Rosato", "/produkt/vin/doppio-passo-320499/"),
            ],
        )
}

/// 一致・見つからず・失敗が混在しても最後まで処理して配信する
#[tokio::test(start_paused = true)]
async fn test_run_publishes_matches_and_continues_after_failures() {
    let config = test_config();
    let factory = catalog();
    let details = MockDetails::default();
    let sent = Arc::new(Mutex::new(Vec::new()));
    let delivery = Delivery::Telegram(Box::new(Recorder(Arc::clone(&sent))));

    let pipeline = Pipeline::new(&config, &MockToplist, &factory, &details);
    let summary = pipeline
        .run(&[LIST_URL.to_string(), "https://www.vivino.com/toplists/broken".to_string()], &delivery)
        .await;

    assert_eq!(
        summary,
        RunSummary {
            lists: 1,
            entries: 4,
            matched: 2,
            not_found: 1,
            failed: 1,
        }
    );
    // Zenato 1件 + Doppio Passo 2件（Rosato は閾値以下）
    assert_eq!(details.calls.load(Ordering::SeqCst), 3);
    assert_eq!(factory.counters.opened(), factory.counters.closed());

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1, "赤ワインだけなのでメッセージは1通");
    let (title, body) = &sent[0];
    assert_eq!(title, "best wines between 100 kr and 200 kr 🇸🇪");
    assert!(body.contains("🔝 🍷 wines between 100 kr and 200 kr 🇸🇪"));
    assert!(body.contains("Zenato Valpolicella Classico Superiore, 2019"));
    assert!(body.contains("Doppio Passo Organic Primitivo, 2020"));
    assert!(!body.contains("Rosato"));
}

/// 詳細ページが壊れていたらその1件は失敗（他は続行）
#[tokio::test(start_paused = true)]
async fn test_broken_detail_page_fails_only_that_entry() {
    let config = test_config();
    let factory = catalog();
    let details = MockDetails {
        broken_href: Some("/produkt/vin/zenato-1238501/"),
        ..Default::default()
    };
    let pipeline = Pipeline::new(&config, &MockToplist, &factory, &details);

    let zenato = ExternalRatingEntry::new("Zenato Valpolicella Classico Superiore", 4.2);
    let result = pipeline.process_entry(&zenato).await;
    assert!(matches!(result, Err(DigestError::FatalInterface { .. })));

    let doppio = ExternalRatingEntry::new("Doppio Passo Primitivo", 4.1);
    match pipeline.process_entry(&doppio).await.unwrap() {
        EntryResult::Matched(matches) => {
            assert_eq!(matches.len(), 2);
            assert!(matches.iter().all(|m| m.matched.match_score > 70.0));
            assert_eq!(matches[0].details.as_ref().unwrap().grape.as_deref(), Some("Primitivo"));
        }
        EntryResult::NotFound => panic!("Doppio Passo は見つかるべき"),
    }
}

/// 閾値を上げると候補が確定しない
#[tokio::test(start_paused = true)]
async fn test_threshold_filters_candidates() {
    let mut config = test_config();
    config.match_threshold = 99.0;
    let factory = catalog();
    let details = MockDetails::default();
    let pipeline = Pipeline::new(&config, &MockToplist, &factory, &details);

    let entry = ExternalRatingEntry::new("Doppio Passo Primitivo", 4.1);
    assert_eq!(pipeline.process_entry(&entry).await.unwrap(), EntryResult::NotFound);
    assert_eq!(details.calls.load(Ordering::SeqCst), 0);
}

/// 一致がなければ配信しない
#[tokio::test(start_paused = true)]
async fn test_run_without_matches_publishes_nothing() {
    let config = test_config();
    let factory = MockFactory::new();
    let details = MockDetails::default();
    let sent = Arc::new(Mutex::new(Vec::new()));
    let delivery = Delivery::Telegram(Box::new(Recorder(Arc::clone(&sent))));

    let pipeline = Pipeline::new(&config, &MockToplist, &factory, &details);
    let summary = pipeline.run(&[LIST_URL.to_string()], &delivery).await;

    assert_eq!(summary.matched, 0);
    assert_eq!(summary.not_found, 3);
    assert_eq!(summary.failed, 1);
    assert!(sent.lock().unwrap().is_empty());
}
