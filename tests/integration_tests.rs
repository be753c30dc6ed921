//! Integration tests for the market-data host.
//! These tests drive the real worker lanes against a canned quote provider
//! and verify the lane -> bus -> host -> plugin path end to end.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use stockdeck::bus::EventBus;
use stockdeck::data::store::{Bar, Watchlist};
use stockdeck::data::yahoo::{BatchQuote, DailyMeta, IntradayBar, QuoteApi};
use stockdeck::error::{PluginError, QuoteError};
use stockdeck::events::Event;
use stockdeck::host::{Host, RefreshGate};
use stockdeck::news::aggregator::{FeedAggregator, Headline};
use stockdeck::plugins::api::{PluginFactory, StockPlugin};
use stockdeck::plugins::registry::PluginRegistry;
use stockdeck::services::refresh::{QuoteCommand, QuoteWorker};
use stockdeck::settings::SettingsStore;

/// Canned provider: daily bars for known symbols, an error for "BOGUS".
struct CannedApi;

fn bar(day: u32, open: f64, close: f64) -> Bar {
    Bar {
        date: NaiveDate::from_ymd_opt(2025, 6, day).unwrap(),
        open,
        close,
    }
}

#[async_trait]
impl QuoteApi for CannedApi {
    async fn daily_bars(&self, symbol: &str, _lookback_days: u32) -> Result<Vec<Bar>, QuoteError> {
        match symbol {
            "BOGUS" => Err(QuoteError::NoData {
                symbol: symbol.to_string(),
            }),
            _ => Ok(vec![bar(2, 100.0, 101.0), bar(3, 101.0, 99.0)]),
        }
    }

    async fn intraday_bars(
        &self,
        _symbol: &str,
        _since: DateTime<Utc>,
        _until: DateTime<Utc>,
    ) -> Result<Vec<IntradayBar>, QuoteError> {
        Ok(Vec::new())
    }

    async fn daily_meta(&self, symbol: &str) -> Result<DailyMeta, QuoteError> {
        Ok(DailyMeta {
            symbol: symbol.to_string(),
            instrument_type: "EQUITY".to_string(),
            currency: "USD".to_string(),
            price: Some(150.0),
            prev_close: Some(100.0),
            high: Some(151.0),
            low: Some(149.0),
            volume: Some(1_000_000),
            market_time: None,
        })
    }

    async fn batch_quotes(&self, symbols: &[String]) -> Result<HashMap<String, BatchQuote>, QuoteError> {
        Ok(symbols
            .iter()
            .map(|s| {
                (
                    s.clone(),
                    BatchQuote {
                        symbol: s.clone(),
                        price: 102.0,
                        open: 100.0,
                        change: 2.0,
                        change_percent: 2.0,
                        currency: "USD".to_string(),
                    },
                )
            })
            .collect())
    }
}

struct Recorder {
    log: Arc<Mutex<Vec<String>>>,
}

impl StockPlugin for Recorder {
    fn id(&self) -> &str {
        "recorder"
    }

    fn display_name(&self) -> &str {
        "Recorder"
    }

    fn on_data(
        &mut self,
        _series: &HashMap<String, Vec<Bar>>,
        tickers: &[String],
    ) -> Result<(), PluginError> {
        self.log.lock().unwrap().push(tickers.join(","));
        Ok(())
    }
}

fn registry_with_recorder(dir: &tempfile::TempDir) -> (PluginRegistry, Arc<Mutex<Vec<String>>>) {
    let settings = SettingsStore::open(dir.path().join("settings.json"));
    let log = Arc::new(Mutex::new(Vec::new()));
    let factory_log = Arc::clone(&log);

    let mut registry = PluginRegistry::discover(
        settings,
        vec![PluginFactory::new("recorder", move || {
            Ok(Box::new(Recorder {
                log: Arc::clone(&factory_log),
            }) as Box<dyn StockPlugin>)
        })],
    );
    registry.set_enabled("recorder", true);
    (registry, log)
}

/// Test the complete flow from a fetch request to a plugin delivery.
#[tokio::test]
async fn test_history_fetch_to_plugin_delivery() {
    let dir = tempfile::tempdir().unwrap();
    let (registry, log) = registry_with_recorder(&dir);

    let api: Arc<dyn QuoteApi> = Arc::new(CannedApi);
    let bus = EventBus::new(16);
    let watchlist = Watchlist::new(Vec::new());
    let (quote_tx, quote_rx) = mpsc::channel(8);

    let mut bus_rx = bus.subscribe();
    QuoteWorker::new(Arc::clone(&api), bus.clone(), watchlist.clone(), quote_rx).spawn();

    let mut host = Host::new(
        registry,
        bus.clone(),
        quote_tx,
        watchlist.clone(),
        RefreshGate::new(true),
    );

    host.request_fetch("aapl, bogus, msft", "30").await.unwrap();

    // The worker publishes one complete batch once every symbol finished
    let event = bus_rx.recv().await.unwrap();
    let Event::History(ref batch) = event else {
        panic!("Expected History event");
    };
    assert_eq!(batch.tickers, vec!["AAPL", "MSFT"]);
    assert_eq!(batch.failures.len(), 1);
    assert_eq!(batch.failures[0].symbol, "BOGUS");

    host.handle_event(event);

    // Merged store, updated watchlist, exactly one plugin delivery
    assert_eq!(host.store().tickers(), ["AAPL", "MSFT"]);
    assert_eq!(host.store().series("AAPL").unwrap().len(), 2);
    assert_eq!(watchlist.get(), ["AAPL", "MSFT"]);
    assert_eq!(*log.lock().unwrap(), vec!["AAPL,MSFT"]);
}

/// Test a live-quote tick against the current watchlist.
#[tokio::test]
async fn test_quote_tick_to_snapshot_merge() {
    let dir = tempfile::tempdir().unwrap();
    let (registry, _log) = registry_with_recorder(&dir);

    let api: Arc<dyn QuoteApi> = Arc::new(CannedApi);
    let bus = EventBus::new(16);
    let watchlist = Watchlist::new(vec!["AAPL".to_string()]);
    let (quote_tx, quote_rx) = mpsc::channel(8);

    let mut bus_rx = bus.subscribe();
    QuoteWorker::new(Arc::clone(&api), bus.clone(), watchlist.clone(), quote_rx).spawn();

    let mut host = Host::new(
        registry,
        bus.clone(),
        quote_tx.clone(),
        watchlist,
        RefreshGate::new(true),
    );

    quote_tx.send(QuoteCommand::Tick).await.unwrap();

    let event = bus_rx.recv().await.unwrap();
    let Event::Quotes(ref batch) = event else {
        panic!("Expected Quotes event");
    };
    assert_eq!(batch.snapshots.len(), 1);

    host.handle_event(event);

    let snap = host.store().latest_snapshot("AAPL").unwrap();
    assert_eq!(snap.price, Some(150.0));
    assert_eq!(snap.change, Some(50.0));
}

/// Test that a news cycle's admitted items land in the host store with
/// their price decoration.
#[tokio::test]
async fn test_news_cycle_to_store() {
    let dir = tempfile::tempdir().unwrap();
    let (registry, _log) = registry_with_recorder(&dir);

    let api: Arc<dyn QuoteApi> = Arc::new(CannedApi);
    let (quote_tx, _quote_rx) = mpsc::channel(8);

    let mut aggregator = FeedAggregator::new(Arc::clone(&api)).unwrap();
    let outcome = aggregator
        .ingest(vec![
            Headline {
                title: "$AAPL rallies into the close".to_string(),
                link: "https://a/1".to_string(),
            },
            Headline {
                title: "Markets drift sideways".to_string(),
                link: "https://a/2".to_string(),
            },
        ])
        .await;

    let mut host = Host::new(
        registry,
        EventBus::new(16),
        quote_tx,
        Watchlist::new(Vec::new()),
        RefreshGate::new(true),
    );

    host.handle_event(Event::News(stockdeck::events::NewsBatch {
        items: outcome.admitted,
        scanned: outcome.scanned,
        feed_failures: Vec::new(),
    }));

    let news = host.store().news();
    assert_eq!(news.len(), 2);
    assert_eq!(news[0].symbol.as_deref(), Some("AAPL"));
    assert_eq!(news[0].quote.as_ref().unwrap().price, 102.0);
    assert!(news[1].symbol.is_none());
}

/// Test that closing the refresh gate makes in-flight results arrive dead.
#[tokio::test]
async fn test_gate_discards_in_flight_results() {
    let dir = tempfile::tempdir().unwrap();
    let (registry, log) = registry_with_recorder(&dir);

    let api: Arc<dyn QuoteApi> = Arc::new(CannedApi);
    let bus = EventBus::new(16);
    let watchlist = Watchlist::new(Vec::new());
    let (quote_tx, quote_rx) = mpsc::channel(8);

    let mut bus_rx = bus.subscribe();
    QuoteWorker::new(Arc::clone(&api), bus.clone(), watchlist.clone(), quote_rx).spawn();

    let gate = RefreshGate::new(true);
    let mut host = Host::new(registry, bus.clone(), quote_tx, watchlist, gate.clone());

    host.request_history(vec!["AAPL".to_string()], 30).await;

    // The gate closes while the fetch is in flight
    gate.set_enabled(false);

    let event = bus_rx.recv().await.unwrap();
    host.handle_event(event);

    // The stale result was discarded unmerged
    assert!(host.store().tickers().is_empty());
    assert!(log.lock().unwrap().is_empty());
}
