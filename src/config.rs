use serde::Deserialize;
use std::fs;

use crate::constants::quotes as qc;
use crate::error::ConfigError;

#[derive(Clone, Debug, Deserialize)]
pub struct QuotesConfig {
    /// Seconds between live-quote refresh cycles
    #[serde(default = "default_quote_refresh")]
    pub refresh_seconds: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewsConfig {
    /// Seconds between news refresh cycles
    #[serde(default = "default_news_refresh")]
    pub refresh_seconds: u32,

    /// RSS/Atom feed URLs, one cycle fetches all of them
    #[serde(default = "default_feeds")]
    pub feeds: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_chart_base")]
    pub chart_base: String,

    #[serde(default = "default_quote_base")]
    pub quote_base: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    /// Initial watchlist; replaced by whatever the user fetches later
    pub symbols: Vec<String>,

    /// Daily-bar history window for the plugin dataset
    #[serde(default = "default_history_days")]
    pub history_days: u32,

    /// Path of the persisted settings document
    #[serde(default = "default_settings_file")]
    pub settings_file: String,

    #[serde(default)]
    pub quotes: QuotesConfig,

    #[serde(default)]
    pub news: NewsConfig,

    #[serde(default)]
    pub endpoints: EndpointsConfig,
}

fn default_quote_refresh() -> u32 {
    5
}

fn default_news_refresh() -> u32 {
    8
}

fn default_history_days() -> u32 {
    365
}

fn default_settings_file() -> String {
    "settings.json".to_string()
}

fn default_chart_base() -> String {
    qc::CHART_BASE.to_string()
}

fn default_quote_base() -> String {
    qc::QUOTE_BASE.to_string()
}

fn default_feeds() -> Vec<String> {
    vec![
        "https://feeds.a.dj.com/rss/RSSMarketsMain.xml".to_string(),
        "https://www.investing.com/rss/news.rss".to_string(),
        "https://www.marketwatch.com/feeds/topstories".to_string(),
        "https://www.cnbc.com/id/100003114/device/rss/rss.html".to_string(),
    ]
}

impl Default for QuotesConfig {
    fn default() -> Self {
        Self {
            refresh_seconds: default_quote_refresh(),
        }
    }
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            refresh_seconds: default_news_refresh(),
            feeds: default_feeds(),
        }
    }
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            chart_base: default_chart_base(),
            quote_base: default_quote_base(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var("STOCKDECK_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());
        Self::load_from(&path)
    }

    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;

        // Strip BOM if present
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

        serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }
}
