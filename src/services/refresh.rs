//! The quote lane: per tick, a change snapshot for every watched symbol;
//! on demand, a full daily-bar history fetch. All network I/O happens here
//! in the background task; results go to the host as complete batches.

use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::bus::EventBus;
use crate::data::store::Watchlist;
use crate::data::yahoo::QuoteApi;
use crate::events::{Event, HistoryBatch, QuoteBatch, SymbolFailure};
use crate::quotes::change::ChangeComputer;

/// Commands consumed by the quote lane, in order. One task processes them
/// sequentially, so two cycles of this lane never overlap.
#[derive(Clone, Debug)]
pub enum QuoteCommand {
    /// Refresh live snapshots for the current watchlist.
    Tick,
    /// Fetch the daily-bar history that backs the plugin dataset.
    FetchHistory { tickers: Vec<String>, days: u32 },
}

pub struct QuoteWorker {
    api: Arc<dyn QuoteApi>,
    bus: EventBus,
    watchlist: Watchlist,
    rx: mpsc::Receiver<QuoteCommand>,
}

impl QuoteWorker {
    pub fn new(
        api: Arc<dyn QuoteApi>,
        bus: EventBus,
        watchlist: Watchlist,
        rx: mpsc::Receiver<QuoteCommand>,
    ) -> Self {
        Self {
            api,
            bus,
            watchlist,
            rx,
        }
    }

    pub fn spawn(mut self) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("[REFRESH] Quote lane started");
            while let Some(cmd) = self.rx.recv().await {
                match cmd {
                    QuoteCommand::Tick => self.run_quote_cycle().await,
                    QuoteCommand::FetchHistory { tickers, days } => {
                        self.run_history_cycle(tickers, days).await
                    }
                }
            }
            info!("[REFRESH] Quote lane stopped");
        })
    }

    /// One live-quote cycle: every symbol fetched independently and in
    /// parallel; the batch is assembled once all of them have finished,
    /// successes and failures side by side.
    async fn run_quote_cycle(&self) {
        let symbols = self.watchlist.get();
        if symbols.is_empty() {
            return;
        }

        let computer = ChangeComputer::new(Arc::clone(&self.api));
        let fetches = symbols.iter().map(|sym| {
            let computer = &computer;
            async move { (sym.clone(), computer.snapshot(sym).await) }
        });

        let mut snapshots = Vec::new();
        let mut failures = Vec::new();
        for (symbol, result) in join_all(fetches).await {
            match result {
                Ok(snap) => snapshots.push(snap),
                Err(e) => {
                    warn!("[REFRESH] Snapshot failed for {}: {}", symbol, e);
                    failures.push(SymbolFailure {
                        symbol,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let batch = QuoteBatch {
            snapshots,
            failures,
        };
        if self.bus.publish(Event::Quotes(batch)).is_err() {
            warn!("[REFRESH] No consumer for quote batch, dropping");
        }
    }

    async fn run_history_cycle(&self, tickers: Vec<String>, days: u32) {
        info!("[REFRESH] Fetching {} day(s) of history for {} symbol(s)", days, tickers.len());

        let fetches = tickers.iter().map(|sym| {
            let api = Arc::clone(&self.api);
            let sym = sym.clone();
            async move {
                let result = api.daily_bars(&sym, days).await;
                (sym, result)
            }
        });

        let mut series_by_symbol = HashMap::new();
        let mut ordered = Vec::new();
        let mut failures = Vec::new();
        for (symbol, result) in join_all(fetches).await {
            match result {
                Ok(bars) if !bars.is_empty() => {
                    ordered.push(symbol.clone());
                    series_by_symbol.insert(symbol, bars);
                }
                Ok(_) => failures.push(SymbolFailure {
                    symbol,
                    reason: "no rows returned".to_string(),
                }),
                Err(e) => failures.push(SymbolFailure {
                    symbol,
                    reason: e.to_string(),
                }),
            }
        }

        let batch = HistoryBatch {
            series_by_symbol,
            tickers: ordered,
            failures,
        };
        if self.bus.publish(Event::History(batch)).is_err() {
            warn!("[REFRESH] No consumer for history batch, dropping");
        }
    }
}
