//! Application state management
//! Everything the frontend commands share: config, login state and the
//! active tracking session.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use log::{info, warn};
use tokio::sync::Mutex;

use crate::api::KekeClient;
use crate::auth::{AuthService, FileTokenStore, TokenStore};
use crate::config::AppConfig;
use crate::core::bluetooth::{PermissionGate, platform_permissions};
use crate::core::{SessionOptions, TrackingSession};

/// Global application state
pub struct AppState {
    pub config: AppConfig,
    pub config_dir: PathBuf,
    pub client: KekeClient,
    pub auth: AuthService,
    /// The session of the device list screen, if it is showing.
    pub tracker: Arc<Mutex<Option<TrackingSession>>>,
}

impl AppState {
    /// Loads the config from `config_dir` and wires the client and the
    /// token store kept next to it.
    pub async fn new(config_dir: &Path) -> Result<Self> {
        let config = match AppConfig::load_config(config_dir).await {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load config, using default: {}", e);
                AppConfig::default()
            }
        };
        let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(config_dir));
        Self::with_store(config, config_dir, store)
    }

    pub fn with_store(
        config: AppConfig,
        config_dir: &Path,
        store: Arc<dyn TokenStore>,
    ) -> Result<Self> {
        let client = KekeClient::new(&config.api)?;
        info!("Using registry at {}", client.devices_url());
        let auth = AuthService::new(client.clone(), store);
        Ok(Self {
            config,
            config_dir: config_dir.to_path_buf(),
            client,
            auth,
            tracker: Arc::new(Mutex::new(None)),
        })
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions::from(&self.config)
    }

    pub fn permission_gate(&self) -> Arc<dyn PermissionGate> {
        platform_permissions()
    }

    /// Collaborators for a session scanning with the platform adapter.
    #[cfg(feature = "ble")]
    pub fn session_deps(&self) -> crate::core::SessionDeps {
        use crate::core::bluetooth::BluestScanner;

        crate::core::SessionDeps {
            registry: Arc::new(self.client.clone()),
            tokens: self.auth.store(),
            scanner: Box::new(BluestScanner::new(&self.config.scan)),
            permissions: self.permission_gate(),
        }
    }

    /// Stops the active session, if any.
    pub async fn stop_tracking(&self) {
        let session = self.tracker.lock().await.take();
        if let Some(session) = session {
            session.stop().await;
        }
    }
}
