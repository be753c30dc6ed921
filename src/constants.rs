//! Application-wide constants and magic numbers
//!
//! Endpoint contracts, timeouts and capacities live here so the tunable
//! values sit in one place instead of being scattered across modules.

use std::time::Duration;

/// Remote quote endpoint constants
pub mod quotes {
    use super::*;

    /// Browser user agent; the chart endpoint rejects default client agents.
    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
         AppleWebKit/537.36 (KHTML, like Gecko) Chrome Safari";

    /// Default base URL for the per-symbol chart endpoint
    pub const CHART_BASE: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

    /// Default base URL for the multi-symbol quote endpoint
    pub const QUOTE_BASE: &str = "https://query1.finance.yahoo.com/v7/finance/quote";

    /// Per-request timeout
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(12);

    /// Delay before the single retry on a transient failure
    pub const RETRY_DELAY: Duration = Duration::from_millis(200);

    /// Daily window used for the meta fetch; 14 days guarantees a previous
    /// bar exists across weekends and market holidays.
    pub const META_LOOKBACK_DAYS: u32 = 14;

    /// Lookback buffer before the target instant for 1-minute bars,
    /// tolerates sparse intraday data right at the boundary.
    pub const INTRADAY_BUFFER: Duration = Duration::from_secs(300);

    /// Maximum symbols per batch-quote request (provider limit)
    pub const BATCH_CHUNK: usize = 45;
}

/// News pipeline constants
pub mod news {
    use super::*;

    /// TTL for the batch-quote price cache shared across one cycle
    pub const PRICE_CACHE_TTL: Duration = Duration::from_secs(15);

    /// Headlines taken from each feed per cycle
    pub const MAX_ITEMS_PER_FEED: usize = 60;

    /// Admitted items kept in the store before the oldest are dropped
    pub const NEWS_STORE_LIMIT: usize = 500;
}

/// Worker lane constants
pub mod lanes {
    /// Capacity of each lane's command queue; a full queue means the lane
    /// is still busy with earlier cycles and extra ticks are coalesced.
    pub const COMMAND_QUEUE_CAPACITY: usize = 8;

    /// Capacity of the event bus between worker lanes and the host
    pub const BUS_CAPACITY: usize = 256;
}
