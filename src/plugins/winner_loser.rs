//! Built-in plugin: counts days that closed above, below, or at the open
//! for each fetched symbol, plus grand totals.

use std::collections::HashMap;
use tracing::info;

use crate::data::store::Bar;
use crate::error::PluginError;
use crate::plugins::api::StockPlugin;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DayTally {
    pub total: usize,
    pub winners: usize,
    pub losers: usize,
    pub unchanged: usize,
}

impl DayTally {
    fn add(&mut self, other: DayTally) {
        self.total += other.total;
        self.winners += other.winners;
        self.losers += other.losers;
        self.unchanged += other.unchanged;
    }
}

pub fn tally_series(bars: &[Bar]) -> DayTally {
    let mut t = DayTally::default();
    for bar in bars {
        if bar.close > bar.open {
            t.winners += 1;
        } else if bar.close < bar.open {
            t.losers += 1;
        } else {
            t.unchanged += 1;
        }
    }
    t.total = t.winners + t.losers + t.unchanged;
    t
}

#[derive(Default)]
pub struct WinnerLoserPlugin {
    per_symbol: Vec<(String, DayTally)>,
    totals: DayTally,
}

impl WinnerLoserPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn per_symbol(&self) -> &[(String, DayTally)] {
        &self.per_symbol
    }

    pub fn totals(&self) -> DayTally {
        self.totals
    }
}

impl StockPlugin for WinnerLoserPlugin {
    fn id(&self) -> &str {
        "winnerloser"
    }

    fn display_name(&self) -> &str {
        "Winner / Loser Counter"
    }

    fn description(&self) -> &str {
        "Counts days that closed above/below open for each fetched asset and totals."
    }

    fn on_data(
        &mut self,
        series_by_symbol: &HashMap<String, Vec<Bar>>,
        tickers: &[String],
    ) -> Result<(), PluginError> {
        self.per_symbol.clear();
        self.totals = DayTally::default();

        for sym in tickers {
            let tally = series_by_symbol
                .get(sym)
                .map(|bars| tally_series(bars))
                .unwrap_or_default();
            self.totals.add(tally);
            self.per_symbol.push((sym.clone(), tally));
        }

        info!(
            "[WINNERLOSER] Totals — Total: {} | Winners: {} | Losers: {} | Unchanged: {}",
            self.totals.total, self.totals.winners, self.totals.losers, self.totals.unchanged
        );
        Ok(())
    }
}
