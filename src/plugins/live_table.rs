//! Built-in plugin: a compact latest-price table derived from the daily
//! series, logged on every dataset delivery.

use std::collections::HashMap;
use tracing::info;

use crate::data::store::Bar;
use crate::error::PluginError;
use crate::plugins::api::StockPlugin;
use crate::settings::PluginSettings;

const KEY_REFRESH_SECONDS: &str = "refresh_seconds";

/// "—" for unavailable values; sub-1 prices get four decimals.
pub fn fmt_price(v: Option<f64>) -> String {
    match v {
        Some(v) if v >= 1.0 => format!("{v:.2}"),
        Some(v) => format!("{v:.4}"),
        None => "—".to_string(),
    }
}

pub fn fmt_change(v: Option<f64>, percent: bool) -> String {
    match v {
        Some(v) => {
            let arrow = if v >= 0.0 { '▲' } else { '▼' };
            if percent {
                format!("{arrow} {:.2}%", v.abs())
            } else {
                format!("{arrow} {:.2}", v.abs())
            }
        }
        None => "—".to_string(),
    }
}

/// One rendered row: symbol, latest close, change vs the previous bar.
#[derive(Clone, Debug, PartialEq)]
pub struct TableRow {
    pub symbol: String,
    pub close: Option<f64>,
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
}

#[derive(Default)]
pub struct LiveTablePlugin {
    rows: Vec<TableRow>,
}

impl LiveTablePlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    fn row_for(symbol: &str, bars: &[Bar]) -> TableRow {
        let close = bars.last().map(|b| b.close);
        let prev = bars.len().checked_sub(2).map(|i| bars[i].close);

        let (change, change_percent) = match (close, prev) {
            (Some(c), Some(p)) if p != 0.0 => (Some(c - p), Some((c - p) / p * 100.0)),
            _ => (None, None),
        };

        TableRow {
            symbol: symbol.to_string(),
            close,
            change,
            change_percent,
        }
    }
}

impl StockPlugin for LiveTablePlugin {
    fn id(&self) -> &str {
        "live_table"
    }

    fn display_name(&self) -> &str {
        "Live Price Table"
    }

    fn description(&self) -> &str {
        "Latest close and day-over-day change for each tracked symbol."
    }

    fn on_enable(&mut self, settings: &PluginSettings) -> Result<(), PluginError> {
        // Persist a default so the key is discoverable in the settings file.
        if settings.get_u64(KEY_REFRESH_SECONDS).is_none() {
            settings.set(KEY_REFRESH_SECONDS, 5u64.into());
        }
        Ok(())
    }

    fn on_data(
        &mut self,
        series_by_symbol: &HashMap<String, Vec<Bar>>,
        tickers: &[String],
    ) -> Result<(), PluginError> {
        self.rows = tickers
            .iter()
            .map(|sym| {
                let bars = series_by_symbol
                    .get(sym)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                Self::row_for(sym, bars)
            })
            .collect();

        info!("[LIVETABLE] {} symbols", self.rows.len());
        for row in &self.rows {
            info!(
                "[LIVETABLE] {:<8} {:>10} {:>10} {:>10}",
                row.symbol,
                fmt_price(row.close),
                fmt_change(row.change, false),
                fmt_change(row.change_percent, true),
            );
        }
        Ok(())
    }
}
