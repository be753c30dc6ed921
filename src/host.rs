//! The owner task. Holds the only mutable handle to the market store, is
//! the single consumer of the event bus, performs every merge, and drives
//! the plugin broadcast. Worker lanes never touch anything in here.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::bus::EventBus;
use crate::data::store::{MarketStore, Watchlist};
use crate::error::InputError;
use crate::events::{Event, HistoryBatch, NewsBatch, QuoteBatch};
use crate::plugins::registry::PluginRegistry;
use crate::services::refresh::QuoteCommand;

/// Shared on/off switch for the refresh feature. Turning it off stops new
/// cycles from being requested and makes the host discard any in-flight
/// results that still arrive; it does not cancel running tasks.
#[derive(Clone, Default)]
pub struct RefreshGate {
    enabled: Arc<AtomicBool>,
}

impl RefreshGate {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(enabled)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }
}

pub struct Host {
    store: MarketStore,
    registry: PluginRegistry,
    bus: EventBus,
    quote_tx: mpsc::Sender<QuoteCommand>,
    watchlist: Watchlist,
    gate: RefreshGate,
}

impl Host {
    pub fn new(
        registry: PluginRegistry,
        bus: EventBus,
        quote_tx: mpsc::Sender<QuoteCommand>,
        watchlist: Watchlist,
        gate: RefreshGate,
    ) -> Self {
        Self {
            store: MarketStore::new(),
            registry,
            bus,
            quote_tx,
            watchlist,
            gate,
        }
    }

    /// Parses a comma-separated ticker list: trim, uppercase, dedupe
    /// keeping first occurrence. Rejected before any fetch starts.
    pub fn parse_tickers(raw: &str) -> Result<Vec<String>, InputError> {
        let mut seen = std::collections::HashSet::new();
        let ordered: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_uppercase)
            .filter(|t| seen.insert(t.clone()))
            .collect();

        if ordered.is_empty() {
            return Err(InputError::NoTickers);
        }
        Ok(ordered)
    }

    pub fn parse_days(raw: &str) -> Result<u32, InputError> {
        match raw.trim().parse::<u32>() {
            Ok(days) if days > 0 => Ok(days),
            _ => Err(InputError::InvalidDays(raw.trim().to_string())),
        }
    }

    /// Validates user input synchronously, then requests a history cycle.
    /// No partial fetch is attempted on invalid input.
    pub async fn request_fetch(&self, raw_tickers: &str, raw_days: &str) -> Result<(), InputError> {
        let tickers = Self::parse_tickers(raw_tickers)?;
        let days = Self::parse_days(raw_days)?;
        self.request_history(tickers, days).await;
        Ok(())
    }

    pub async fn request_history(&self, tickers: Vec<String>, days: u32) {
        if !self.gate.is_enabled() {
            debug!("[HOST] Refresh disabled, fetch request ignored");
            return;
        }
        if self
            .quote_tx
            .send(QuoteCommand::FetchHistory { tickers, days })
            .await
            .is_err()
        {
            warn!("[HOST] Quote lane gone, cannot request history");
        }
    }

    /// Consumes bus deliveries until every publisher is gone. Stale
    /// deliveries arriving after the gate closed are discarded unmerged.
    pub async fn run(mut self) {
        let mut rx = self.bus.subscribe();
        info!("[HOST] Merge loop started");

        loop {
            match rx.recv().await {
                Ok(event) => self.handle_event(event),
                Err(RecvError::Lagged(n)) => {
                    warn!("[HOST] Merge loop lagged, {} deliveries lost", n);
                }
                Err(RecvError::Closed) => break,
            }
        }

        info!("[HOST] Merge loop stopped");
    }

    /// Applies one delivery. Results merge in arrival order; a later
    /// arrival for the same symbol wins regardless of request order.
    /// Deliveries arriving after the gate closed are discarded unmerged.
    pub fn handle_event(&mut self, event: Event) {
        if !self.gate.is_enabled() {
            debug!("[HOST] Stale delivery discarded (refresh disabled)");
            return;
        }
        match event {
            Event::History(batch) => self.merge_history(batch),
            Event::Quotes(batch) => self.merge_quotes(batch),
            Event::News(batch) => self.merge_news(batch),
        }
    }

    pub fn store(&self) -> &MarketStore {
        &self.store
    }

    pub fn registry_mut(&mut self) -> &mut PluginRegistry {
        &mut self.registry
    }

    fn merge_history(&mut self, batch: HistoryBatch) {
        let mut parts = Vec::new();
        if !batch.tickers.is_empty() {
            parts.push(format!("Loaded {}", batch.tickers.join(", ")));
        }
        for failure in &batch.failures {
            parts.push(format!("{} failed ({})", failure.symbol, failure.reason));
        }
        if parts.is_empty() {
            warn!("[HOST] History cycle returned no data");
        } else {
            info!("[HOST] {}", parts.join(" | "));
        }

        self.watchlist.set(batch.tickers.clone());
        self.store.replace_history(batch.series_by_symbol, batch.tickers);
        self.registry.broadcast(Arc::new(self.store.dataset()));
    }

    fn merge_quotes(&mut self, batch: QuoteBatch) {
        debug!(
            "[HOST] Merged {} snapshot(s), {} failure(s)",
            batch.snapshots.len(),
            batch.failures.len()
        );
        self.store.merge_snapshots(batch.snapshots);
    }

    fn merge_news(&mut self, batch: NewsBatch) {
        for item in &batch.items {
            info!("[HOST] {}", item.ticker_line());
        }
        debug!(
            "[HOST] News cycle: {} scanned, {} admitted, {} feed failure(s)",
            batch.scanned,
            batch.items.len(),
            batch.feed_failures.len()
        );
        self.store.append_news(batch.items);
    }
}
