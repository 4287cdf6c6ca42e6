use std::time::Duration;

/// Typed configuration for a [`BlockService`](crate::service::BlockService).
#[derive(Debug, Clone)]
pub struct Config {
    /// Fixed-duration block width. Required.
    pub block_duration: Duration,
    /// When `true`, price resolution always consults historical lookups
    /// instead of the live [`QuoteCache`](crate::cache::QuoteCache).
    pub historical: bool,
    /// Tolerance for the stablecoin sanity bound (default `0.1`).
    pub stablecoin_tolerance: f64,
    /// Capacity of the bounded inbound trade channel.
    pub trade_channel_capacity: usize,
    /// Capacity of the bounded outbound block channel.
    pub block_channel_capacity: usize,
}

impl Config {
    pub fn new(block_duration: Duration) -> Self {
        Self {
            block_duration,
            historical: false,
            stablecoin_tolerance: 0.1,
            trade_channel_capacity: 1_024,
            block_channel_capacity: 16,
        }
    }

    pub fn with_historical(mut self, historical: bool) -> Self {
        self.historical = historical;
        self
    }

    pub fn with_stablecoin_tolerance(mut self, tolerance: f64) -> Self {
        self.stablecoin_tolerance = tolerance;
        self
    }

    pub fn with_trade_channel_capacity(mut self, capacity: usize) -> Self {
        self.trade_channel_capacity = capacity;
        self
    }

    pub fn with_block_channel_capacity(mut self, capacity: usize) -> Self {
        self.block_channel_capacity = capacity;
        self
    }

    /// `block_duration` must be a positive, whole number of seconds — the
    /// grid the aligner operates over is defined in integer-second buckets.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.block_duration.as_secs() == 0 {
            return Err("block_duration must be at least one second");
        }
        Ok(())
    }

    pub(crate) fn block_duration_secs(&self) -> i64 {
        self.block_duration.as_secs() as i64
    }
}
