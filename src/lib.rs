//! stockdeck - headless market-data host with a plugin runtime
//!
//! This library provides the core functionality for the dashboard host:
//! background quote/news refresh lanes, single-owner merge of fetched data,
//! and lifecycle management for statically-linked plugins.

pub mod bus;
pub mod config;
pub mod constants;
pub mod data;
pub mod error;
pub mod events;
pub mod host;
pub mod news;
pub mod plugins;
pub mod quotes;
pub mod services;
pub mod settings;

// Re-export commonly used types
pub use bus::EventBus;
pub use config::AppConfig;
pub use events::{Event, HistoryBatch, NewsBatch, QuoteBatch, SymbolFailure};
pub use host::{Host, RefreshGate};
pub use settings::SettingsStore;

#[cfg(test)]
mod bus_tests;
#[cfg(test)]
mod config_tests;
