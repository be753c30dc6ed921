//! The plugin capability contract.
//!
//! Plugin units are statically linked and registered through factories; the
//! registry probes each factory in isolation, so one misbehaving unit never
//! takes discovery down with it.

use std::collections::HashMap;

use crate::data::store::Bar;
use crate::error::PluginError;
use crate::settings::PluginSettings;

/// Identity and metadata of a discovered unit, independent of whether an
/// instance currently exists. `id` is the stable key across restarts.
#[derive(Clone, Debug, PartialEq)]
pub struct PluginDescriptor {
    pub id: String,
    pub display_name: String,
    pub description: String,
    pub enabled: bool,
}

/// The capability set every plugin unit must expose. Lifecycle hooks are
/// optional; data delivery is a full replacement every time, never a delta.
pub trait StockPlugin: Send {
    fn id(&self) -> &str;
    fn display_name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Called once when the plugin becomes active. `settings` is the
    /// plugin's own persisted namespace; the host never reads it.
    fn on_enable(&mut self, _settings: &PluginSettings) -> Result<(), PluginError> {
        Ok(())
    }

    /// Called before the instance is dropped.
    fn on_disable(&mut self) -> Result<(), PluginError> {
        Ok(())
    }

    /// The current dataset: daily series per symbol and the ordered ticker
    /// list (successes only, request order).
    fn on_data(
        &mut self,
        _series_by_symbol: &HashMap<String, Vec<Bar>>,
        _tickers: &[String],
    ) -> Result<(), PluginError> {
        Ok(())
    }
}

pub type PluginCtor = Box<dyn Fn() -> Result<Box<dyn StockPlugin>, PluginError> + Send + Sync>;

/// One registrable unit: a label for diagnostics plus a constructor.
pub struct PluginFactory {
    pub unit: &'static str,
    pub build: PluginCtor,
}

impl PluginFactory {
    pub fn new<F>(unit: &'static str, build: F) -> Self
    where
        F: Fn() -> Result<Box<dyn StockPlugin>, PluginError> + Send + Sync + 'static,
    {
        Self {
            unit,
            build: Box::new(build),
        }
    }
}
