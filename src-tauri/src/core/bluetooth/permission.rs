use std::sync::Arc;

use async_trait::async_trait;

/// Runtime permission check that must pass before scanning starts.
#[async_trait]
pub trait PermissionGate: Send + Sync {
    /// Asks for (or checks) permission. `false` means no sightings this session.
    async fn request(&self) -> bool;
}

/// For platforms where the OS prompts on first adapter use (desktop, iOS).
#[derive(Debug, Clone, Copy, Default)]
pub struct GrantedPermissions;

#[async_trait]
impl PermissionGate for GrantedPermissions {
    async fn request(&self) -> bool {
        true
    }
}

/// For builds or platforms without Bluetooth access.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeniedPermissions;

#[async_trait]
impl PermissionGate for DeniedPermissions {
    async fn request(&self) -> bool {
        false
    }
}

/// The gate for the platform this build targets.
///
/// Desktop platforms prompt on first adapter use. Android needs a runtime
/// location/scan permission request that this app does not make, so
/// scanning stays off there.
pub fn platform_permissions() -> Arc<dyn PermissionGate> {
    #[cfg(target_os = "android")]
    {
        Arc::new(DeniedPermissions)
    }
    #[cfg(not(target_os = "android"))]
    {
        Arc::new(GrantedPermissions)
    }
}
