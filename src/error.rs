//! Custom error types for the market-data host
//!
//! Provides structured, typed errors instead of generic Box<dyn Error>

use thiserror::Error;

/// Errors from the remote quote endpoints, always scoped to one symbol fetch
#[derive(Error, Debug)]
pub enum QuoteError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Provider error {code}: {description}")]
    Provider { code: String, description: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("No data returned for {symbol}")]
    NoData { symbol: String },
}

/// Errors from one headline feed, never fatal to the cycle
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unparseable feed document: {0}")]
    Malformed(String),
}

/// Plugin unit and instance errors, isolated per plugin
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Construction failed: {0}")]
    Construct(String),

    #[error("Unit '{unit}' has an incomplete identity (id and display name required)")]
    Identity { unit: String },

    #[error("Callback failed: {0}")]
    Callback(String),
}

/// User input errors, surfaced synchronously before any fetch starts
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Please enter at least one ticker")]
    NoTickers,

    #[error("Invalid number of days '{0}': must be a positive integer")]
    InvalidDays(String),
}

/// Configuration file errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Settings document errors; callers log these rather than propagate them
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
