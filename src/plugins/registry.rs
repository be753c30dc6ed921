//! Plugin discovery, lifecycle, persistence and broadcast.
//!
//! Discovery never aborts on one bad unit, lifecycle errors stay contained
//! to their instance, and nothing here returns an error to the host.

use std::sync::Arc;
use tracing::{info, warn};

use crate::data::store::MarketDataset;
use crate::error::PluginError;
use crate::plugins::api::{PluginCtor, PluginDescriptor, PluginFactory, StockPlugin};
use crate::settings::SettingsStore;

struct PluginSpec {
    id: String,
    display_name: String,
    description: String,
    build: PluginCtor,
}

struct ActivePlugin {
    id: String,
    instance: Box<dyn StockPlugin>,
}

pub struct PluginRegistry {
    specs: Vec<PluginSpec>,
    /// Registration order; broadcast walks this front to back.
    active: Vec<ActivePlugin>,
    settings: SettingsStore,
    last_dataset: Option<Arc<MarketDataset>>,
}

impl PluginRegistry {
    /// Probes every factory: builds a throwaway instance, reads its
    /// identity, validates it. A factory that errors or reports an empty
    /// id or display name is skipped with a logged reason. Descriptors end
    /// up sorted by display name, case-insensitively.
    pub fn discover(settings: SettingsStore, factories: Vec<PluginFactory>) -> Self {
        let mut specs = Vec::new();

        for factory in factories {
            let probe = match (factory.build)() {
                Ok(instance) => instance,
                Err(e) => {
                    warn!("[PLUGINS] Unit '{}' failed to load: {}", factory.unit, e);
                    continue;
                }
            };

            let id = probe.id().to_string();
            let display_name = probe.display_name().to_string();
            if id.is_empty() || display_name.is_empty() {
                warn!(
                    "[PLUGINS] Skipped: {}",
                    PluginError::Identity {
                        unit: factory.unit.to_string()
                    }
                );
                continue;
            }
            if specs.iter().any(|s: &PluginSpec| s.id == id) {
                warn!("[PLUGINS] Unit '{}' skipped: duplicate id '{}'", factory.unit, id);
                continue;
            }

            specs.push(PluginSpec {
                id,
                display_name,
                description: probe.description().to_string(),
                build: factory.build,
            });
        }

        specs.sort_by(|a, b| {
            a.display_name
                .to_lowercase()
                .cmp(&b.display_name.to_lowercase())
        });
        info!("[PLUGINS] Discovered {} plugin unit(s)", specs.len());

        Self {
            specs,
            active: Vec::new(),
            settings,
            last_dataset: None,
        }
    }

    pub fn descriptors(&self) -> Vec<PluginDescriptor> {
        self.specs
            .iter()
            .map(|s| PluginDescriptor {
                id: s.id.clone(),
                display_name: s.display_name.clone(),
                description: s.description.clone(),
                enabled: self.is_enabled(&s.id),
            })
            .collect()
    }

    pub fn is_enabled(&self, id: &str) -> bool {
        self.active.iter().any(|a| a.id == id)
    }

    /// Enables or disables one plugin. Enabling is idempotent, constructs
    /// the instance, runs `on_enable`, and replays the last dataset if one
    /// exists so a re-enabled plugin does not wait for the next cycle.
    /// The enabled set is persisted after every toggle.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) {
        if enabled {
            self.enable(id);
        } else {
            self.disable(id);
        }
        self.persist_enabled();
    }

    /// Re-applies the persisted enabled set. The set is stored sorted, so
    /// cross-restart instantiation order is the sorted id order; callers
    /// must not rely on it.
    pub fn apply_persisted(&mut self) {
        for id in self.settings.enabled_modules() {
            self.enable(&id);
        }
    }

    /// Delivers the dataset to every active instance in registration order.
    /// A failing instance is logged and skipped; the rest still get theirs.
    pub fn broadcast(&mut self, dataset: Arc<MarketDataset>) {
        self.last_dataset = Some(Arc::clone(&dataset));

        for plugin in &mut self.active {
            if let Err(e) = plugin
                .instance
                .on_data(&dataset.series_by_symbol, &dataset.tickers)
            {
                warn!("[PLUGINS] on_data failed for '{}': {}", plugin.id, e);
            }
        }
    }

    fn enable(&mut self, id: &str) {
        if self.is_enabled(id) {
            return;
        }
        let Some(spec) = self.specs.iter().find(|s| s.id == id) else {
            warn!("[PLUGINS] Cannot enable unknown plugin '{}'", id);
            return;
        };

        let mut instance = match (spec.build)() {
            Ok(instance) => instance,
            Err(e) => {
                warn!("[PLUGINS] Failed to instantiate '{}': {}", id, e);
                return;
            }
        };

        let scope = self.settings.scoped(id);
        if let Err(e) = instance.on_enable(&scope) {
            warn!("[PLUGINS] on_enable failed for '{}': {}", id, e);
        }

        if let Some(dataset) = &self.last_dataset {
            if let Err(e) = instance.on_data(&dataset.series_by_symbol, &dataset.tickers) {
                warn!("[PLUGINS] on_data replay failed for '{}': {}", id, e);
            }
        }

        info!("[PLUGINS] Enabled '{}'", id);
        self.active.push(ActivePlugin {
            id: id.to_string(),
            instance,
        });
    }

    fn disable(&mut self, id: &str) {
        let Some(pos) = self.active.iter().position(|a| a.id == id) else {
            return;
        };
        let mut plugin = self.active.remove(pos);
        if let Err(e) = plugin.instance.on_disable() {
            warn!("[PLUGINS] on_disable failed for '{}': {}", id, e);
        }
        info!("[PLUGINS] Disabled '{}'", id);
    }

    fn persist_enabled(&self) {
        let mut ids: Vec<String> = self.active.iter().map(|a| a.id.clone()).collect();
        ids.sort();
        self.settings.set_enabled_modules(&ids);
    }
}
