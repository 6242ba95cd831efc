//! Periodic refresh of the registered device list.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{info, warn};

use crate::api::{ApiError, AuthToken, KekeClient};
use crate::auth::TokenStore;
use crate::core::model::RegistryEntry;
use crate::core::schedule::PeriodicTask;
use crate::core::session::{SessionEvent, SessionSender};

/// Source of the authoritative device list.
#[async_trait]
pub trait RegistrySource: Send + Sync {
    async fn fetch_registry(&self, token: &AuthToken) -> Result<Vec<RegistryEntry>, ApiError>;
}

#[async_trait]
impl RegistrySource for KekeClient {
    async fn fetch_registry(&self, token: &AuthToken) -> Result<Vec<RegistryEntry>, ApiError> {
        self.fetch_devices(token).await
    }
}

/// Fetches the registry right away and then on every period, feeding the
/// result into the session.
///
/// Failed fetches leave the previous list in place. A rejected token is
/// removed from the store and ends the poller.
pub struct RegistryPoller {
    task: PeriodicTask,
}

impl RegistryPoller {
    pub fn start(
        source: Arc<dyn RegistrySource>,
        tokens: Arc<dyn TokenStore>,
        events: SessionSender,
        period: Duration,
    ) -> Self {
        let task = PeriodicTask::spawn("registry-poller", period, move || {
            let source = source.clone();
            let tokens = tokens.clone();
            let events = events.clone();
            async move { poll_once(source.as_ref(), tokens.as_ref(), &events).await }
        });
        Self { task }
    }

    pub async fn stop(&mut self) {
        self.task.stop().await;
    }
}

async fn poll_once(
    source: &dyn RegistrySource,
    tokens: &dyn TokenStore,
    events: &SessionSender,
) -> ControlFlow<()> {
    let Some(token) = tokens.get().await else {
        info!("No token available any more, stopping registry refresh.");
        events.send(SessionEvent::AuthLost).await;
        return ControlFlow::Break(());
    };

    let event = match source.fetch_registry(&token).await {
        Ok(entries) => {
            info!("Fetched {} registered devices.", entries.len());
            SessionEvent::Registry(entries)
        }
        Err(e) if e.is_auth_rejected() => {
            warn!("Registry rejected the token: {}", e);
            if let Err(e) = tokens.remove().await {
                warn!("Failed to clear the rejected token: {}", e);
            }
            events.send(SessionEvent::AuthLost).await;
            return ControlFlow::Break(());
        }
        Err(e) => {
            warn!("Fetching registry failed, keeping the previous list: {}", e);
            SessionEvent::RegistryFailed(e.to_string())
        }
    };

    if events.send(event).await {
        ControlFlow::Continue(())
    } else {
        // session loop is gone
        ControlFlow::Break(())
    }
}
