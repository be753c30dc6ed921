use std::collections::HashMap;

use crate::data::store::Bar;
use crate::news::aggregator::NewsItem;
use crate::quotes::change::QuoteSnapshot;

/// A per-symbol fetch failure, carried alongside the cycle's successes so
/// the host can report it; one failing symbol never cancels its siblings.
#[derive(Clone, Debug)]
pub struct SymbolFailure {
    pub symbol: String,
    pub reason: String,
}

/// Complete result of one history fetch cycle. `tickers` preserves the
/// request order, successes only.
#[derive(Clone, Debug)]
pub struct HistoryBatch {
    pub series_by_symbol: HashMap<String, Vec<Bar>>,
    pub tickers: Vec<String>,
    pub failures: Vec<SymbolFailure>,
}

/// Complete result of one live-quote cycle.
#[derive(Clone, Debug)]
pub struct QuoteBatch {
    pub snapshots: Vec<QuoteSnapshot>,
    pub failures: Vec<SymbolFailure>,
}

/// Complete result of one news cycle.
#[derive(Clone, Debug)]
pub struct NewsBatch {
    pub items: Vec<NewsItem>,
    pub scanned: usize,
    pub feed_failures: Vec<(String, String)>,
}

/// Worker-lane deliveries to the host. Each variant is a lane's complete
/// cycle result; lanes never hand over partial in-flight state.
#[derive(Clone, Debug)]
pub enum Event {
    History(HistoryBatch),
    Quotes(QuoteBatch),
    News(NewsBatch),
}
