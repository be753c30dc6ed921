//! The news lane. One task owns the aggregator (and with it the seen-set
//! and the price cache), so cycles of this feature are naturally serialized.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::bus::EventBus;
use crate::events::{Event, NewsBatch};
use crate::news::aggregator::FeedAggregator;

#[derive(Clone, Debug)]
pub enum NewsCommand {
    Tick,
}

pub struct NewsWorker {
    aggregator: FeedAggregator,
    feeds: Vec<String>,
    bus: EventBus,
    rx: mpsc::Receiver<NewsCommand>,
}

impl NewsWorker {
    pub fn new(
        aggregator: FeedAggregator,
        feeds: Vec<String>,
        bus: EventBus,
        rx: mpsc::Receiver<NewsCommand>,
    ) -> Self {
        Self {
            aggregator,
            feeds,
            bus,
            rx,
        }
    }

    pub fn spawn(mut self) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("[NEWS] News lane started ({} feed(s))", self.feeds.len());
            if self.feeds.is_empty() {
                warn!("[NEWS] No feeds configured");
            }

            while let Some(NewsCommand::Tick) = self.rx.recv().await {
                if self.feeds.is_empty() {
                    continue;
                }

                let outcome = self.aggregator.run_cycle(&self.feeds).await;
                let batch = NewsBatch {
                    items: outcome.admitted,
                    scanned: outcome.scanned,
                    feed_failures: outcome.feed_failures,
                };
                if self.bus.publish(Event::News(batch)).is_err() {
                    warn!("[NEWS] No consumer for news batch, dropping");
                }
            }
            info!("[NEWS] News lane stopped");
        })
    }
}
