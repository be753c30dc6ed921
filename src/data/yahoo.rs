use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::warn;

use crate::config::EndpointsConfig;
use crate::constants::quotes as qc;
use crate::data::store::Bar;
use crate::error::QuoteError;

/// One 1-minute bar; only used to locate a reference price near an instant.
#[derive(Clone, Debug, PartialEq)]
pub struct IntradayBar {
    pub ts: i64,
    pub close: f64,
}

/// Per-symbol metadata from the daily chart, with the last bar's extras.
/// Every numeric is optional; absence means "unavailable", never zero.
#[derive(Clone, Debug, Default)]
pub struct DailyMeta {
    pub symbol: String,
    pub instrument_type: String,
    pub currency: String,
    pub price: Option<f64>,
    pub prev_close: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub volume: Option<u64>,
    pub market_time: Option<DateTime<Utc>>,
}

/// Result row of the multi-symbol quote endpoint, used by the news pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchQuote {
    pub symbol: String,
    pub price: f64,
    pub open: f64,
    pub change: f64,
    pub change_percent: f64,
    pub currency: String,
}

/// The remote quote provider seam. Workers and computers depend on this
/// trait so tests can substitute canned data.
#[async_trait]
pub trait QuoteApi: Send + Sync {
    /// Daily bars over a fixed lookback window, date ascending, rows with a
    /// missing open or close dropped.
    async fn daily_bars(&self, symbol: &str, lookback_days: u32) -> Result<Vec<Bar>, QuoteError>;

    /// 1-minute bars over [since, until], nulls dropped.
    async fn intraday_bars(
        &self,
        symbol: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<IntradayBar>, QuoteError>;

    /// Latest price, previous close and instrument classification for one
    /// symbol, from a 14-day daily window.
    async fn daily_meta(&self, symbol: &str) -> Result<DailyMeta, QuoteError>;

    /// Snapshot prices for up to many symbols; chunked internally. A failed
    /// chunk is logged and skipped, so the map may be partial.
    async fn batch_quotes(&self, symbols: &[String]) -> Result<HashMap<String, BatchQuote>, QuoteError>;
}

// ---- chart endpoint response, only the fields we read ----

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartNode,
}

#[derive(Debug, Deserialize)]
struct ChartNode {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    meta: ChartMeta,
    indicators: ChartIndicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    instrument_type: Option<String>,
    currency: Option<String>,
    regular_market_price: Option<f64>,
    previous_close: Option<f64>,
    regular_market_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

// ---- batch quote endpoint response ----

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(rename = "quoteResponse")]
    quote_response: QuoteResponseNode,
}

#[derive(Debug, Deserialize)]
struct QuoteResponseNode {
    #[serde(default)]
    result: Vec<QuoteRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteRow {
    symbol: Option<String>,
    regular_market_price: Option<f64>,
    regular_market_open: Option<f64>,
    regular_market_change: Option<f64>,
    regular_market_change_percent: Option<f64>,
    currency: Option<String>,
}

#[derive(Clone)]
pub struct YahooClient {
    client: Client,
    chart_base: String,
    quote_base: String,
}

impl YahooClient {
    pub fn new(endpoints: &EndpointsConfig) -> Result<Self, QuoteError> {
        let client = Client::builder()
            .timeout(qc::REQUEST_TIMEOUT)
            .user_agent(qc::USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            chart_base: endpoints.chart_base.trim_end_matches('/').to_string(),
            quote_base: endpoints.quote_base.trim_end_matches('/').to_string(),
        })
    }

    /// GET with one retry after a short delay. The provider issues 401s
    /// intermittently; those and plain network errors get the retry,
    /// anything else fails immediately.
    async fn get_with_retry(&self, url: &str, query: &[(&str, String)]) -> Result<reqwest::Response, QuoteError> {
        let mut last: Option<QuoteError> = None;

        for attempt in 0..2 {
            if attempt > 0 {
                tokio::time::sleep(qc::RETRY_DELAY).await;
            }

            match self.client.get(url).query(query).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return Ok(resp);
                    }
                    let err = QuoteError::Http {
                        status: status.as_u16(),
                        body: resp.text().await.unwrap_or_default(),
                    };
                    if status.as_u16() != 401 {
                        return Err(err);
                    }
                    last = Some(err);
                }
                Err(e) => last = Some(QuoteError::Network(e)),
            }
        }

        Err(last.unwrap_or(QuoteError::Malformed("retry loop exhausted".to_string())))
    }

    async fn fetch_chart(
        &self,
        symbol: &str,
        interval: &str,
        p1: i64,
        p2: i64,
    ) -> Result<ChartResult, QuoteError> {
        let url = format!("{}/{}", self.chart_base, symbol);
        let query = [
            ("period1", p1.to_string()),
            ("period2", p2.to_string()),
            ("interval", interval.to_string()),
            ("includePrePost", "false".to_string()),
            ("events", "history".to_string()),
        ];

        let resp = self.get_with_retry(&url, &query).await?;
        let body: ChartResponse = resp.json().await.map_err(QuoteError::Network)?;

        if let Some(err) = body.chart.error {
            return Err(QuoteError::Provider {
                code: err.code.unwrap_or_default(),
                description: err.description.unwrap_or_default(),
            });
        }

        body.chart
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
            .ok_or(QuoteError::NoData {
                symbol: symbol.to_string(),
            })
    }
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

#[async_trait]
impl QuoteApi for YahooClient {
    async fn daily_bars(&self, symbol: &str, lookback_days: u32) -> Result<Vec<Bar>, QuoteError> {
        let now = Utc::now().timestamp();
        let p1 = now - i64::from(lookback_days) * 86_400;
        let result = self.fetch_chart(symbol, "1d", p1, now).await?;

        let quote = result.indicators.quote.first().ok_or_else(|| {
            QuoteError::Malformed(format!("missing quote indicators for {symbol}"))
        })?;

        let n = result
            .timestamp
            .len()
            .min(quote.open.len())
            .min(quote.close.len());

        let mut bars = Vec::with_capacity(n);
        for i in 0..n {
            let (Some(open), Some(close)) = (quote.open[i], quote.close[i]) else {
                continue;
            };
            let Some(dt) = Utc.timestamp_opt(result.timestamp[i], 0).single() else {
                continue;
            };
            bars.push(Bar {
                date: dt.date_naive(),
                open: round4(open),
                close: round4(close),
            });
        }
        Ok(bars)
    }

    async fn intraday_bars(
        &self,
        symbol: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<IntradayBar>, QuoteError> {
        let result = self
            .fetch_chart(symbol, "1m", since.timestamp(), until.timestamp())
            .await?;

        let closes = result
            .indicators
            .quote
            .first()
            .map(|q| q.close.as_slice())
            .unwrap_or_default();

        Ok(result
            .timestamp
            .iter()
            .zip(closes)
            .filter_map(|(&ts, close)| close.map(|close| IntradayBar { ts, close }))
            .collect())
    }

    async fn daily_meta(&self, symbol: &str) -> Result<DailyMeta, QuoteError> {
        let now = Utc::now().timestamp();
        let p1 = now - i64::from(qc::META_LOOKBACK_DAYS) * 86_400;
        let result = self.fetch_chart(symbol, "1d", p1, now).await?;

        let quote = result.indicators.quote.first();
        let closes: &[Option<f64>] = quote.map(|q| q.close.as_slice()).unwrap_or_default();

        // Price falls back to the last non-null close, previous close to the
        // one before it; the provider omits both fields outside market hours.
        let price = result
            .meta
            .regular_market_price
            .or_else(|| closes.iter().rev().find_map(|c| *c));

        let prev_close = result.meta.previous_close.or_else(|| {
            if closes.len() >= 2 {
                closes[closes.len() - 2]
            } else {
                None
            }
        });

        let last_of = |values: &[Option<f64>]| values.last().copied().flatten();

        Ok(DailyMeta {
            symbol: symbol.to_string(),
            instrument_type: result
                .meta
                .instrument_type
                .unwrap_or_default()
                .to_uppercase(),
            currency: result.meta.currency.unwrap_or_default(),
            price,
            prev_close,
            high: quote.map(|q| last_of(&q.high)).unwrap_or(None),
            low: quote.map(|q| last_of(&q.low)).unwrap_or(None),
            volume: quote.and_then(|q| q.volume.last().copied().flatten()),
            market_time: result
                .meta
                .regular_market_time
                .and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
        })
    }

    async fn batch_quotes(&self, symbols: &[String]) -> Result<HashMap<String, BatchQuote>, QuoteError> {
        let mut out = HashMap::new();

        for chunk in symbols.chunks(qc::BATCH_CHUNK) {
            let query = [("symbols", chunk.join(","))];
            let rows = match self.get_with_retry(&self.quote_base, &query).await {
                Ok(resp) => match resp.json::<QuoteResponse>().await {
                    Ok(body) => body.quote_response.result,
                    Err(e) => {
                        warn!("[QUOTES] Malformed batch response: {}", e);
                        continue;
                    }
                },
                Err(e) => {
                    warn!("[QUOTES] Batch chunk of {} symbols failed: {}", chunk.len(), e);
                    continue;
                }
            };

            for row in rows {
                let symbol = match row.symbol {
                    Some(s) if !s.is_empty() => s.to_uppercase(),
                    _ => continue,
                };
                let (Some(price), Some(open)) =
                    (row.regular_market_price, row.regular_market_open)
                else {
                    continue;
                };

                // Derive change fields when the provider omits them.
                let change = row.regular_market_change.unwrap_or(price - open);
                let change_percent = match row.regular_market_change_percent {
                    Some(pct) => pct,
                    None if open != 0.0 => (price - open) / open * 100.0,
                    None => 0.0,
                };

                out.insert(
                    symbol.clone(),
                    BatchQuote {
                        symbol,
                        price,
                        open,
                        change,
                        change_percent,
                        currency: row.currency.unwrap_or_default(),
                    },
                );
            }
        }

        Ok(out)
    }
}
