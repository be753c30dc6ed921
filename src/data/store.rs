use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::constants::news::NEWS_STORE_LIMIT;
use crate::news::aggregator::NewsItem;
use crate::quotes::change::QuoteSnapshot;

/// One daily bar. Rows with a missing open or close are dropped at fetch
/// time, so both fields are always present here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub close: f64,
}

/// The full plugin-visible dataset: daily series per symbol plus the ordered
/// ticker list the user requested (successes only). Plugins treat every
/// delivery as a full replacement.
#[derive(Clone, Debug, Default)]
pub struct MarketDataset {
    pub series_by_symbol: HashMap<String, Vec<Bar>>,
    pub tickers: Vec<String>,
}

/// The ticker set the quote lane refreshes each tick. Written by the host
/// after a history merge, read by the worker; never carries fetch results.
#[derive(Clone, Default)]
pub struct Watchlist {
    symbols: Arc<RwLock<Vec<String>>>,
}

impl Watchlist {
    pub fn new(symbols: Vec<String>) -> Self {
        Self {
            symbols: Arc::new(RwLock::new(symbols)),
        }
    }

    pub fn get(&self) -> Vec<String> {
        self.symbols.read().unwrap().clone()
    }

    pub fn set(&self, symbols: Vec<String>) {
        *self.symbols.write().unwrap() = symbols;
    }
}

/// Single source of truth for fetched market data. Owned exclusively by the
/// host task; worker lanes hand results over as messages and never see this.
#[derive(Debug, Default)]
pub struct MarketStore {
    series_by_symbol: HashMap<String, Vec<Bar>>,
    tickers: Vec<String>,
    quotes: HashMap<String, QuoteSnapshot>,
    news: Vec<NewsItem>,
}

impl MarketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the historical dataset wholesale; there are no incremental
    /// bar updates by design.
    pub fn replace_history(&mut self, series_by_symbol: HashMap<String, Vec<Bar>>, tickers: Vec<String>) {
        self.series_by_symbol = series_by_symbol;
        self.tickers = tickers;
    }

    /// Merges fresh snapshots per symbol. Symbols without a fresh snapshot
    /// keep their previous one; a later arrival for the same symbol wins.
    pub fn merge_snapshots(&mut self, snapshots: Vec<QuoteSnapshot>) {
        for snap in snapshots {
            self.quotes.insert(snap.symbol.clone(), snap);
        }
    }

    /// Appends admitted news items, oldest dropped past the cap.
    pub fn append_news(&mut self, items: Vec<NewsItem>) {
        self.news.extend(items);
        if self.news.len() > NEWS_STORE_LIMIT {
            let excess = self.news.len() - NEWS_STORE_LIMIT;
            self.news.drain(..excess);
        }
    }

    pub fn dataset(&self) -> MarketDataset {
        MarketDataset {
            series_by_symbol: self.series_by_symbol.clone(),
            tickers: self.tickers.clone(),
        }
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn series(&self, symbol: &str) -> Option<&[Bar]> {
        self.series_by_symbol.get(symbol).map(Vec::as_slice)
    }

    pub fn latest_snapshot(&self, symbol: &str) -> Option<&QuoteSnapshot> {
        self.quotes.get(symbol)
    }

    pub fn news(&self) -> &[NewsItem] {
        &self.news
    }
}
