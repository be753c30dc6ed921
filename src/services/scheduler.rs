//! Periodic tick source for both worker lanes.
//!
//! Cron jobs push tick commands into each lane's bounded queue. A full
//! queue means the lane has not caught up; the tick is dropped so cycles
//! coalesce instead of piling up.

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, info, warn};

use crate::services::news::NewsCommand;
use crate::services::refresh::QuoteCommand;

pub struct RefreshScheduler {
    scheduler: JobScheduler,
}

impl RefreshScheduler {
    pub async fn start(
        quote_tx: mpsc::Sender<QuoteCommand>,
        news_tx: mpsc::Sender<NewsCommand>,
        quote_seconds: u32,
        news_seconds: u32,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let scheduler = JobScheduler::new().await?;

        let quote_cron = cron_every_seconds(quote_seconds);
        let job_tx = quote_tx.clone();
        let quote_job = Job::new_async(quote_cron.as_str(), move |_uuid, _l| {
            let tx = job_tx.clone();
            Box::pin(async move {
                match tx.try_send(QuoteCommand::Tick) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        debug!("[SCHEDULER] Quote lane busy, tick coalesced")
                    }
                    Err(TrySendError::Closed(_)) => warn!("[SCHEDULER] Quote lane gone"),
                }
            })
        })?;
        scheduler.add(quote_job).await?;

        let news_cron = cron_every_seconds(news_seconds);
        let news_job = Job::new_async(news_cron.as_str(), move |_uuid, _l| {
            let tx = news_tx.clone();
            Box::pin(async move {
                match tx.try_send(NewsCommand::Tick) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        debug!("[SCHEDULER] News lane busy, tick coalesced")
                    }
                    Err(TrySendError::Closed(_)) => warn!("[SCHEDULER] News lane gone"),
                }
            })
        })?;
        scheduler.add(news_job).await?;

        scheduler.start().await?;
        info!(
            "[SCHEDULER] Started (quotes every {}s, news every {}s)",
            quote_seconds, news_seconds
        );

        Ok(Self { scheduler })
    }

    pub async fn shutdown(mut self) {
        if let Err(e) = self.scheduler.shutdown().await {
            warn!("[SCHEDULER] Shutdown error: {}", e);
        }
    }
}

/// Cron expression for a fixed refresh interval. Sub-minute intervals use
/// the seconds field; anything from a minute up runs on minute boundaries,
/// rounded to the nearest whole minute (the cron grammar caps each field
/// at 59).
pub(crate) fn cron_every_seconds(seconds: u32) -> String {
    if (1..=59).contains(&seconds) {
        return format!("*/{seconds} * * * * *");
    }
    if seconds == 0 {
        warn!("[SCHEDULER] Zero interval, ticking every 1s");
        return "*/1 * * * * *".to_string();
    }

    let rounded = (seconds + 30) / 60;
    let minutes = rounded.clamp(1, 59);
    if seconds % 60 != 0 || rounded != minutes {
        warn!("[SCHEDULER] Interval {}s adjusted to every {}m", seconds, minutes);
    }
    format!("0 */{minutes} * * * *")
}
