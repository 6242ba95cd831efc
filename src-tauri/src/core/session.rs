//! The tracking session: one event loop owning the registry list and the
//! sighting table, publishing a reconciled snapshot on every change.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::auth::TokenStore;
use crate::config::AppConfig;
use crate::core::bluetooth::{PermissionGate, ScanSource};
use crate::core::model::{DisplayEntry, RegistryEntry, ScanSighting};
use crate::core::reconcile::{SightingTable, reconcile};
use crate::core::registry::{RegistryPoller, RegistrySource};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A fresh registry list, replacing the previous one.
    Registry(Vec<RegistryEntry>),
    /// A registry refresh failed; the previous list stays.
    RegistryFailed(String),
    Sighting(ScanSighting),
    /// Bluetooth radio powered on or off.
    Radio(bool),
    /// The token is gone or was rejected.
    AuthLost,
}

/// Handle producers use to feed events into a session.
#[derive(Debug, Clone)]
pub struct SessionSender {
    tx: mpsc::Sender<SessionEvent>,
}

impl SessionSender {
    /// Delivers `event`. Returns `false` once the session loop is gone.
    pub async fn send(&self, event: SessionEvent) -> bool {
        self.tx.send(event).await.is_ok()
    }

    pub async fn sighting(&self, sighting: ScanSighting) -> bool {
        self.send(SessionEvent::Sighting(sighting)).await
    }

    pub async fn radio(&self, powered_on: bool) -> bool {
        self.send(SessionEvent::Radio(powered_on)).await
    }
}

/// What the frontend renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySnapshot {
    pub entries: Vec<DisplayEntry>,
    pub radio_powered_on: bool,
    /// False until the first successful registry fetch.
    pub registry_loaded: bool,
    pub last_refresh: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub authenticated: bool,
}

impl Default for DisplaySnapshot {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            radio_powered_on: true,
            registry_loaded: false,
            last_refresh: None,
            last_error: None,
            authenticated: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Not logged in")]
    NotAuthenticated,
}

/// Collaborators a session drives.
pub struct SessionDeps {
    pub registry: Arc<dyn RegistrySource>,
    pub tokens: Arc<dyn TokenStore>,
    pub scanner: Box<dyn ScanSource>,
    pub permissions: Arc<dyn PermissionGate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    pub poll_interval: Duration,
    pub sighting_ttl: Option<Duration>,
    pub event_buffer: usize,
}

impl From<&AppConfig> for SessionOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            sighting_ttl: config.sighting_ttl(),
            event_buffer: config.scan.event_buffer,
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// State owned by the session loop.
#[derive(Debug)]
struct SessionState {
    registry: Vec<RegistryEntry>,
    registry_loaded: bool,
    sightings: SightingTable,
    radio_powered_on: bool,
    last_refresh: Option<DateTime<Utc>>,
    last_error: Option<String>,
    authenticated: bool,
}

impl SessionState {
    fn new(sighting_ttl: Option<Duration>) -> Self {
        Self {
            registry: Vec::new(),
            registry_loaded: false,
            sightings: SightingTable::new(sighting_ttl),
            radio_powered_on: true,
            last_refresh: None,
            last_error: None,
            authenticated: true,
        }
    }

    /// Folds one event in. Returns whether the snapshot changed.
    fn apply(&mut self, event: SessionEvent, now: Instant) -> bool {
        match event {
            SessionEvent::Registry(entries) => {
                self.registry = entries;
                self.registry_loaded = true;
                self.last_refresh = Some(Utc::now());
                self.last_error = None;
                true
            }
            SessionEvent::RegistryFailed(message) => {
                let changed = self.last_error.as_deref() != Some(message.as_str());
                self.last_error = Some(message);
                changed
            }
            SessionEvent::Sighting(sighting) => {
                self.sightings.record(sighting, now);
                true
            }
            SessionEvent::Radio(powered_on) => {
                let changed = self.radio_powered_on != powered_on;
                self.radio_powered_on = powered_on;
                changed
            }
            SessionEvent::AuthLost => {
                let changed = self.authenticated || !self.registry.is_empty();
                self.authenticated = false;
                self.registry.clear();
                changed
            }
        }
    }

    fn prune(&mut self, now: Instant) -> bool {
        let removed = self.sightings.prune(now);
        if removed > 0 {
            debug!("Dropped {removed} stale sightings.");
        }
        removed > 0
    }

    fn snapshot(&self) -> DisplaySnapshot {
        DisplaySnapshot {
            entries: reconcile(&self.registry, &self.sightings.to_vec()),
            radio_powered_on: self.radio_powered_on,
            registry_loaded: self.registry_loaded,
            last_refresh: self.last_refresh,
            last_error: self.last_error.clone(),
            authenticated: self.authenticated,
        }
    }
}

/// A running tracking session.
///
/// Created when the device list screen is entered and stopped when it is
/// left. Dropping it without [`TrackingSession::stop`] cancels its tasks
/// without waiting for them.
pub struct TrackingSession {
    sender: SessionSender,
    snapshot_rx: watch::Receiver<DisplaySnapshot>,
    cancel_token: CancellationToken,
    loop_handle: Option<JoinHandle<()>>,
    poller: RegistryPoller,
    scanner: Box<dyn ScanSource>,
    scanning: bool,
}

impl TrackingSession {
    pub async fn start(deps: SessionDeps, options: SessionOptions) -> Result<Self, SessionError> {
        let SessionDeps {
            registry,
            tokens,
            mut scanner,
            permissions,
        } = deps;

        if tokens.get().await.is_none() {
            warn!("Tracking requested without a token.");
            return Err(SessionError::NotAuthenticated);
        }

        let (tx, rx) = mpsc::channel(options.event_buffer.max(1));
        let sender = SessionSender { tx };

        let state = SessionState::new(options.sighting_ttl);
        let (snapshot_tx, snapshot_rx) = watch::channel(state.snapshot());
        let cancel_token = CancellationToken::new();
        let loop_handle = tokio::spawn(run_session_loop(
            state,
            rx,
            snapshot_tx,
            cancel_token.clone(),
        ));

        let poller = RegistryPoller::start(registry, tokens, sender.clone(), options.poll_interval);

        let mut scanning = false;
        if permissions.request().await {
            match scanner.start(sender.clone()).await {
                Ok(()) => scanning = true,
                Err(e) => error!("Failed to start scanning: {e:?}"),
            }
        } else {
            warn!("Bluetooth permission denied, nearby devices will not be shown.");
        }

        info!("Tracking session started (scanning: {scanning}).");
        Ok(Self {
            sender,
            snapshot_rx,
            cancel_token,
            loop_handle: Some(loop_handle),
            poller,
            scanner,
            scanning,
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<DisplaySnapshot> {
        self.snapshot_rx.clone()
    }

    pub fn snapshot(&self) -> DisplaySnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn sender(&self) -> SessionSender {
        self.sender.clone()
    }

    /// Whether the scan source was started for this session.
    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    /// Stops scanning and polling, then shuts the event loop down.
    pub async fn stop(mut self) {
        if self.scanning {
            if let Err(e) = self.scanner.stop().await {
                warn!("Failed to stop scanning: {e:?}");
            }
            self.scanning = false;
        }
        self.poller.stop().await;
        self.cancel_token.cancel();
        if let Some(handle) = self.loop_handle.take() {
            if let Err(e) = handle.await {
                error!("Session loop ended with a join error: {e:?}");
            }
        }
        info!("Tracking session stopped.");
    }
}

impl Drop for TrackingSession {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

async fn run_session_loop(
    mut state: SessionState,
    mut rx: mpsc::Receiver<SessionEvent>,
    snapshot_tx: watch::Sender<DisplaySnapshot>,
    cancel_token: CancellationToken,
) {
    let mut prune_interval = state.sightings.ttl().map(|ttl| {
        let mut interval = tokio::time::interval(prune_period(ttl));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    });

    loop {
        let changed = tokio::select! {
            _ = cancel_token.cancelled() => break,
            event = rx.recv() => match event {
                Some(event) => state.apply(event, Instant::now()),
                None => break,
            },
            _ = next_prune(&mut prune_interval) => state.prune(Instant::now()),
        };
        if changed {
            snapshot_tx.send_replace(state.snapshot());
        }
    }
    debug!("Session loop finished.");
}

fn prune_period(ttl: Duration) -> Duration {
    (ttl / 2).max(Duration::from_millis(100))
}

async fn next_prune(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
