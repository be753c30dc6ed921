mod bus;
mod config;
mod constants;
mod data;
mod error;
mod events;
mod host;
mod news;
mod plugins;
mod quotes;
mod services;
mod settings;

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use bus::EventBus;
use config::AppConfig;
use constants::lanes;
use data::store::Watchlist;
use data::yahoo::{QuoteApi, YahooClient};
use host::{Host, RefreshGate};
use news::aggregator::FeedAggregator;
use plugins::registry::PluginRegistry;
use services::news::NewsWorker;
use services::refresh::QuoteWorker;
use services::scheduler::RefreshScheduler;
use settings::SettingsStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Setup Logging
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // .env is optional; used for STOCKDECK_CONFIG overrides locally
    let _ = dotenvy::dotenv();

    info!("Starting stockdeck...");

    let config = AppConfig::load()?;
    info!(
        "Tracking {} symbol(s), {} day(s) of history",
        config.symbols.len(),
        config.history_days
    );

    let settings = SettingsStore::open(&config.settings_file);
    let api: Arc<dyn QuoteApi> = Arc::new(YahooClient::new(&config.endpoints)?);

    let initial_symbols: Vec<String> = config.symbols.iter().map(|s| s.to_uppercase()).collect();
    let watchlist = Watchlist::new(initial_symbols.clone());

    let bus = EventBus::new(lanes::BUS_CAPACITY);
    let (quote_tx, quote_rx) = mpsc::channel(lanes::COMMAND_QUEUE_CAPACITY);
    let (news_tx, news_rx) = mpsc::channel(lanes::COMMAND_QUEUE_CAPACITY);

    // Worker lanes
    QuoteWorker::new(Arc::clone(&api), bus.clone(), watchlist.clone(), quote_rx).spawn();
    let aggregator = FeedAggregator::new(Arc::clone(&api))?;
    NewsWorker::new(aggregator, config.news.feeds.clone(), bus.clone(), news_rx).spawn();

    // Plugins: discover the built-in set, then re-apply the persisted
    // enabled selection from the last run.
    let mut registry = PluginRegistry::discover(settings.clone(), plugins::builtin_factories());
    registry.apply_persisted();

    let _scheduler = RefreshScheduler::start(
        quote_tx.clone(),
        news_tx,
        config.quotes.refresh_seconds,
        config.news.refresh_seconds,
    )
    .await?;

    let gate = RefreshGate::new(true);
    let host = Host::new(registry, bus, quote_tx, watchlist, gate);

    // First history cycle straight away; ticks take over afterwards.
    host.request_history(initial_symbols, config.history_days).await;

    host.run().await;
    Ok(())
}
