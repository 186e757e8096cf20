//! Meter configuration supplied by the host.

use crate::transport::Duration;

/// Factory default unit address.
pub const DEFAULT_ADDRESS: u8 = 0xF8;

/// Default time between poll cycles.
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct MeterConfig {
    /// Unit address of the meter on the bus.
    pub address: u8,
    /// Minimum time between the starts of two poll cycles.
    pub poll_interval_ms: u32,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl MeterConfig {
    pub const fn new(address: u8, poll_interval_ms: u32) -> Self {
        Self {
            address,
            poll_interval_ms,
        }
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_ticks(self.poll_interval_ms)
    }
}
