use anyhow::Result;
use async_trait::async_trait;

use crate::core::session::SessionSender;

/// Producer of BLE sightings.
///
/// Implementations push sightings and radio state into `sink` from their
/// own task, restart themselves after scan errors and must be startable
/// again after `stop`.
#[async_trait]
pub trait ScanSource: Send {
    async fn start(&mut self, sink: SessionSender) -> Result<()>;
    async fn stop(&mut self) -> Result<()>;
}
