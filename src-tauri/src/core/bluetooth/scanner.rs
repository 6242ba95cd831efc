use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use bluest::Adapter;
use futures_util::StreamExt;
use log::{debug, error, info, warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::scan_config::ScanConfig;
use crate::core::bluetooth::source::ScanSource;
use crate::core::bluetooth::types::sighting_from_advertisement;
use crate::core::session::SessionSender;

/// Scan source backed by the platform adapter through `bluest`.
///
/// Scans without a service filter, since trackers do not advertise one.
/// A scan that fails or whose stream ends is restarted after
/// `restart_delay`.
pub struct BluestScanner {
    restart_delay: Duration,
    min_rssi: Option<i16>,
    cancel_token: CancellationToken,
    scan_task_handle: Option<JoinHandle<()>>,
}

impl BluestScanner {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            restart_delay: Duration::from_millis(config.restart_delay_ms),
            min_rssi: config.min_rssi,
            cancel_token: CancellationToken::new(),
            scan_task_handle: None,
        }
    }

    async fn internal_scan_task(
        sink: SessionSender,
        cancel_token: CancellationToken,
        restart_delay: Duration,
        min_rssi: Option<i16>,
    ) {
        let Some(adapter) = Self::find_adapter(&sink, &cancel_token, restart_delay).await else {
            return;
        };

        loop {
            if !Self::wait_powered_on(&adapter, &sink, &cancel_token).await {
                return;
            }

            info!("Starting bluetooth scan");
            match adapter.scan(&[]).await {
                Ok(mut scan_stream) => loop {
                    tokio::select! {
                        result = scan_stream.next() => {
                            match result {
                                Some(discovered_device) => {
                                    let id = discovered_device.device.id().to_string();
                                    debug!("Found device - ID: {}, RSSI: {:?}", id, discovered_device.rssi);
                                    let sighting = sighting_from_advertisement(
                                        &id,
                                        discovered_device.adv_data.local_name,
                                        discovered_device.device.name().ok(),
                                        discovered_device.rssi,
                                        min_rssi,
                                    );
                                    if let Some(sighting) = sighting {
                                        if !sink.sighting(sighting).await {
                                            info!("Session closed, ending scan.");
                                            return;
                                        }
                                    }
                                }
                                None => {
                                    info!("Bluetooth scan stream has ended.");
                                    break;
                                }
                            }
                        }
                        _ = cancel_token.cancelled() => return,
                    }
                },
                Err(e) => warn!("Bluetooth scan failed: {}", e),
            }

            debug!("Restarting scan in {:?}", restart_delay);
            tokio::select! {
                _ = cancel_token.cancelled() => return,
                _ = tokio::time::sleep(restart_delay) => {}
            }
        }
    }

    async fn find_adapter(
        sink: &SessionSender,
        cancel_token: &CancellationToken,
        retry_delay: Duration,
    ) -> Option<Adapter> {
        loop {
            if let Some(adapter) = Adapter::default().await {
                return Some(adapter);
            }
            warn!("No Bluetooth adapter found, retrying in {:?}", retry_delay);
            if !sink.radio(false).await {
                return None;
            }
            tokio::select! {
                _ = cancel_token.cancelled() => return None,
                _ = tokio::time::sleep(retry_delay) => {}
            }
        }
    }

    /// Reports the radio state and blocks until the adapter is usable.
    /// Returns `false` when the task should end.
    async fn wait_powered_on(
        adapter: &Adapter,
        sink: &SessionSender,
        cancel_token: &CancellationToken,
    ) -> bool {
        if !matches!(adapter.is_available().await, Ok(true)) {
            info!("Waiting for Bluetooth to be powered on");
            if !sink.radio(false).await {
                return false;
            }
            tokio::select! {
                _ = cancel_token.cancelled() => return false,
                result = adapter.wait_available() => {
                    if let Err(e) = result {
                        error!("Failed waiting for the Bluetooth adapter: {}", e);
                    }
                }
            }
        }
        sink.radio(true).await
    }
}

#[async_trait]
impl ScanSource for BluestScanner {
    async fn start(&mut self, sink: SessionSender) -> Result<()> {
        if self.scan_task_handle.is_some() {
            self.stop().await?;
        }

        self.cancel_token = CancellationToken::new();
        let handle = tokio::spawn(Self::internal_scan_task(
            sink,
            self.cancel_token.clone(),
            self.restart_delay,
            self.min_rssi,
        ));
        self.scan_task_handle = Some(handle);

        info!("Device scan task started.");
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        info!("Stopping Bluetooth scan.");
        self.cancel_token.cancel();

        if let Some(handle) = self.scan_task_handle.take() {
            match handle.await {
                Ok(()) => info!("Scan task finished after cancellation."),
                Err(e) if e.is_cancelled() => info!("Scan task was cancelled."),
                Err(e) => error!("Scan task finished with an unexpected join error: {:?}", e),
            }
        }
        Ok(())
    }
}

impl Drop for BluestScanner {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
