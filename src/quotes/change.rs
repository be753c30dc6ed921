//! Turns raw bars and daily meta into a directional change snapshot.
//!
//! Equities measure change against the previous close. Crypto trades around
//! the clock, so "day change" needs a convention: the viewer's local
//! midnight, converted to UTC, anchors the reference price.

use chrono::{DateTime, Duration, Local, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::constants::quotes as qc;
use crate::data::yahoo::{IntradayBar, QuoteApi};
use crate::error::QuoteError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeBasis {
    PrevClose,
    SinceLocalMidnight,
}

/// Immutable per-symbol snapshot; superseded whole by the next cycle's
/// snapshot for the same symbol, never mutated in place. `None` fields are
/// "unavailable", which renders as no data rather than a false flat signal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub symbol: String,
    pub price: Option<f64>,
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
    pub basis: ChangeBasis,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub volume: Option<u64>,
    pub currency: String,
    pub as_of: Option<DateTime<Utc>>,
}

/// A symbol is crypto if the provider tags it so or it carries the -USD
/// pair suffix; everything else is treated as an equity.
pub fn is_crypto(instrument_type: &str, symbol: &str) -> bool {
    instrument_type == "CRYPTOCURRENCY" || symbol.ends_with("-USD")
}

/// change and change-percent of `latest` against `reference`. Undefined when
/// either side is missing or the reference is zero.
pub fn change_against(latest: Option<f64>, reference: Option<f64>) -> (Option<f64>, Option<f64>) {
    match (latest, reference) {
        (Some(latest), Some(reference)) if reference != 0.0 => {
            let change = latest - reference;
            (Some(change), Some(change / reference * 100.0))
        }
        _ => (None, None),
    }
}

/// The viewer's local midnight of today, in UTC.
pub fn local_midnight_utc() -> DateTime<Utc> {
    let midnight = Local::now().date_naive().and_time(NaiveTime::MIN);
    match midnight.and_local_timezone(Local).earliest() {
        Some(dt) => dt.with_timezone(&Utc),
        // A DST gap swallowing midnight itself; fall back to the raw naive
        // instant read as UTC rather than failing the cycle.
        None => DateTime::from_naive_utc_and_offset(midnight, Utc),
    }
}

/// First close at or after the reference instant.
pub fn reference_close(bars: &[IntradayBar], not_before: DateTime<Utc>) -> Option<f64> {
    bars.iter()
        .find(|bar| bar.ts >= not_before.timestamp())
        .map(|bar| bar.close)
}

pub struct ChangeComputer {
    api: Arc<dyn QuoteApi>,
}

impl ChangeComputer {
    pub fn new(api: Arc<dyn QuoteApi>) -> Self {
        Self { api }
    }

    /// One snapshot for one symbol. Errors only when the daily meta fetch
    /// itself fails; every downstream gap becomes a `None` field instead.
    pub async fn snapshot(&self, symbol: &str) -> Result<QuoteSnapshot, QuoteError> {
        self.snapshot_at(symbol, local_midnight_utc(), Utc::now()).await
    }

    /// Same as [`snapshot`](Self::snapshot) with explicit instants, so the
    /// crypto path is testable without a wall clock.
    pub async fn snapshot_at(
        &self,
        symbol: &str,
        midnight_utc: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<QuoteSnapshot, QuoteError> {
        let meta = self.api.daily_meta(symbol).await?;

        if is_crypto(&meta.instrument_type, symbol) {
            // 1-minute bars with a lookback buffer; sparse series may have
            // no bar exactly at midnight.
            let buffer = Duration::from_std(qc::INTRADAY_BUFFER).unwrap_or(Duration::zero());
            let (latest, reference) = match self
                .api
                .intraday_bars(symbol, midnight_utc - buffer, now)
                .await
            {
                Ok(bars) => {
                    let latest = meta.price.or_else(|| bars.last().map(|b| b.close));
                    (latest, reference_close(&bars, midnight_utc))
                }
                Err(e) => {
                    tracing::warn!("[QUOTES] Intraday fetch failed for {}: {}", symbol, e);
                    (meta.price, None)
                }
            };

            let (change, change_percent) = change_against(latest, reference);
            return Ok(QuoteSnapshot {
                symbol: symbol.to_string(),
                price: latest,
                change,
                change_percent,
                basis: ChangeBasis::SinceLocalMidnight,
                high: meta.high,
                low: meta.low,
                volume: meta.volume,
                currency: meta.currency,
                as_of: meta.market_time,
            });
        }

        let (change, change_percent) = change_against(meta.price, meta.prev_close);
        Ok(QuoteSnapshot {
            symbol: symbol.to_string(),
            price: meta.price,
            change,
            change_percent,
            basis: ChangeBasis::PrevClose,
            high: meta.high,
            low: meta.low,
            volume: meta.volume,
            currency: meta.currency,
            as_of: meta.market_time,
        })
    }
}
