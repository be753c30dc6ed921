//! Headline feed aggregation: fetch, dedup, ticker detection, price
//! attachment. Owned by the news lane's single task, which serializes
//! cycles so the seen-set and the price cache have exactly one writer.

use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

use crate::constants::news as nc;
use crate::constants::quotes as qc;
use crate::data::yahoo::{BatchQuote, QuoteApi};
use crate::error::FeedError;
use crate::news::symbols::SymbolDetector;

/// A headline as it comes off a feed, before detection and dedup.
#[derive(Clone, Debug, PartialEq)]
pub struct Headline {
    pub title: String,
    pub link: String,
}

/// An admitted news item. Identity key is (title, link, symbol); once an
/// item is in the seen-set it is never re-emitted or updated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    pub symbol: Option<String>,
    pub quote: Option<BatchQuoteSnapshot>,
}

/// The price decoration attached to a news item at admission time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchQuoteSnapshot {
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub currency: String,
}

impl From<&BatchQuote> for BatchQuoteSnapshot {
    fn from(q: &BatchQuote) -> Self {
        Self {
            price: q.price,
            change: q.change,
            change_percent: q.change_percent,
            currency: q.currency.clone(),
        }
    }
}

impl NewsItem {
    /// One-line rendering for log output: `[AAPL] Title · ▲ +1.25%`.
    pub fn ticker_line(&self) -> String {
        let mut line = String::new();
        if let Some(sym) = &self.symbol {
            line.push_str(&format!("[{sym}] "));
        }
        line.push_str(&self.title);
        if let Some(q) = &self.quote {
            let arrow = if q.change >= 0.0 { '▲' } else { '▼' };
            line.push_str(&format!(" · {:.2} {} {:+.2}%", q.price, arrow, q.change_percent));
        }
        line
    }
}

pub struct CycleOutcome {
    /// Items newly admitted past the seen-set this cycle.
    pub admitted: Vec<NewsItem>,
    /// Unique headlines scanned across all feeds.
    pub scanned: usize,
    /// Feeds that failed this cycle, with the reason.
    pub feed_failures: Vec<(String, String)>,
}

pub struct FeedAggregator {
    client: Client,
    api: Arc<dyn QuoteApi>,
    detector: SymbolDetector,
    item_block: Regex,
    title_tag: Regex,
    link_tag: Regex,
    seen: HashSet<(String, String, String)>,
    price_cache: HashMap<String, BatchQuote>,
    price_cache_at: Option<Instant>,
}

impl FeedAggregator {
    pub fn new(api: Arc<dyn QuoteApi>) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(qc::REQUEST_TIMEOUT)
            .user_agent(qc::USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            api,
            detector: SymbolDetector::new(),
            item_block: Regex::new(r"(?s)<(?:item|entry)\b[^>]*>(.*?)</(?:item|entry)>").unwrap(),
            title_tag: Regex::new(r"(?s)<title[^>]*>(.*?)</title>").unwrap(),
            link_tag: Regex::new(r#"(?s)<link[^>]*?(?:href="([^"]*)"[^>]*/?>|>(.*?)</link>)"#).unwrap(),
            seen: HashSet::new(),
            price_cache: HashMap::new(),
            price_cache_at: None,
        })
    }

    /// One full cycle: fetch every configured feed, dedup, detect, attach
    /// prices, gate through the seen-set. Feed errors are recorded and
    /// skipped; this never fails as a whole.
    pub async fn run_cycle(&mut self, feeds: &[String]) -> CycleOutcome {
        let mut headlines = Vec::new();
        let mut feed_failures = Vec::new();

        for url in feeds {
            match self.fetch_feed(url).await {
                Ok(items) => headlines.extend(items),
                Err(e) => {
                    warn!("[NEWS] Feed error: {} ({})", url, e);
                    feed_failures.push((url.clone(), e.to_string()));
                }
            }
        }

        let mut outcome = self.ingest(headlines).await;
        outcome.feed_failures = feed_failures;
        outcome
    }

    /// The network-free half of a cycle, driven directly by tests.
    pub async fn ingest(&mut self, headlines: Vec<Headline>) -> CycleOutcome {
        // First dedup: (title, link) across feeds, before detection.
        let mut unique = Vec::new();
        let mut batch_seen = HashSet::new();
        for h in headlines {
            let key = (h.title.clone(), h.link.clone());
            if batch_seen.insert(key) {
                unique.push(h);
            }
        }
        let scanned = unique.len();

        let detected: Vec<(Headline, Option<String>)> = unique
            .into_iter()
            .map(|h| {
                let symbol = self.detector.detect(&h.title);
                (h, symbol)
            })
            .collect();

        self.refresh_price_cache(&detected).await;

        // Second dedup: the permanent seen-set keyed by (title, link, symbol)
        // gates admission; seen items are dropped, never updated.
        let mut admitted = Vec::new();
        for (h, symbol) in detected {
            let key = (
                h.title.clone(),
                h.link.clone(),
                symbol.clone().unwrap_or_default(),
            );
            if !self.seen.insert(key) {
                continue;
            }

            let quote = symbol
                .as_deref()
                .and_then(|s| self.price_cache.get(s))
                .map(BatchQuoteSnapshot::from);

            admitted.push(NewsItem {
                title: h.title,
                link: h.link,
                symbol,
                quote,
            });
        }

        CycleOutcome {
            admitted,
            scanned,
            feed_failures: Vec::new(),
        }
    }

    /// One batch-quote lookup per cycle at most; within the TTL, repeated
    /// detections of the same symbol reuse the cached snapshot.
    async fn refresh_price_cache(&mut self, detected: &[(Headline, Option<String>)]) {
        let mut symbols: Vec<String> = detected
            .iter()
            .filter_map(|(_, s)| s.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        symbols.sort();

        if symbols.is_empty() {
            return;
        }

        let stale = self
            .price_cache_at
            .map_or(true, |at| at.elapsed() > nc::PRICE_CACHE_TTL);
        if !stale {
            return;
        }

        match self.api.batch_quotes(&symbols).await {
            Ok(got) if !got.is_empty() => {
                self.price_cache.extend(got);
                self.price_cache_at = Some(Instant::now());
            }
            Ok(_) => {}
            Err(e) => warn!("[NEWS] Batch quote lookup failed: {}", e),
        }
    }

    async fn fetch_feed(&self, url: &str) -> Result<Vec<Headline>, FeedError> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FeedError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = resp.text().await?;
        let items = self.parse_feed(&body);
        if items.is_empty() && !body.contains("<item") && !body.contains("<entry") {
            return Err(FeedError::Malformed("no item or entry elements".to_string()));
        }
        Ok(items)
    }

    /// Pulls title/link pairs out of RSS `<item>` or Atom `<entry>` blocks.
    pub fn parse_feed(&self, body: &str) -> Vec<Headline> {
        let mut out = Vec::new();

        for block in self.item_block.captures_iter(body).take(nc::MAX_ITEMS_PER_FEED) {
            let inner = &block[1];

            let title = self
                .title_tag
                .captures(inner)
                .map(|c| clean_xml_text(&c[1]))
                .unwrap_or_default();
            if title.is_empty() {
                continue;
            }

            let link = self
                .link_tag
                .captures(inner)
                .and_then(|c| c.get(1).or_else(|| c.get(2)))
                .map(|m| clean_xml_text(m.as_str()))
                .unwrap_or_default();

            out.push(Headline { title, link });
        }

        out
    }
}

/// Strips CDATA wrappers, unescapes the five XML entities, trims.
fn clean_xml_text(raw: &str) -> String {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix("<![CDATA[")
        .and_then(|s| s.strip_suffix("]]>"))
        .unwrap_or(trimmed);

    inner
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .trim()
        .to_string()
}
