//! Scanning defaults.

/// Pause before a failed or ended scan is restarted, in milliseconds.
pub const DEFAULT_RESTART_DELAY_MS: u64 = 1000;

/// Capacity of the session event queue. Sightings arrive in bursts while
/// the registry poller only adds one event per period.
pub const DEFAULT_EVENT_BUFFER: usize = 256;
