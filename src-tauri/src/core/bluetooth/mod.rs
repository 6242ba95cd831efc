//! Bluetooth side of tracking: turning advertisements into sightings and
//! the seams the session uses to start and stop scanning.

mod constants;
mod permission;
#[cfg(feature = "ble")]
mod scanner;
mod source;
mod types;

pub use constants::*;
pub use permission::{DeniedPermissions, GrantedPermissions, PermissionGate, platform_permissions};
#[cfg(feature = "ble")]
pub use scanner::BluestScanner;
pub use source::ScanSource;
pub use types::{hardware_id, sighting_from_advertisement};
