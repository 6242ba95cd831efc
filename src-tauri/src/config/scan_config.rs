use serde::{Deserialize, Serialize};

use crate::core::bluetooth::{DEFAULT_EVENT_BUFFER, DEFAULT_RESTART_DELAY_MS};

/// BLE scanning and sighting bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Forget a sighting that has not been refreshed for this many seconds.
    /// `None` keeps every sighting until the tracking session ends.
    pub sighting_ttl_secs: Option<u64>,
    /// Pause before a failed or ended scan is restarted.
    pub restart_delay_ms: u64,
    /// Advertisements weaker than this (dBm) are ignored.
    pub min_rssi: Option<i16>,
    /// Capacity of the session event queue.
    pub event_buffer: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            sighting_ttl_secs: None,
            restart_delay_ms: DEFAULT_RESTART_DELAY_MS,
            min_rssi: None,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}
