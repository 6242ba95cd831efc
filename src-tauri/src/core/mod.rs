//! Tracking core: domain model, reconciliation and the session that ties
//! the registry and the scanner together.

pub mod bluetooth;
pub mod model;
pub mod proximity;
pub mod reconcile;
pub mod registry;
pub mod schedule;
pub mod session;

pub use model::{BatteryLevel, DisplayEntry, RegistryEntry, ScanSighting};
pub use proximity::{Band, Proximity};
pub use reconcile::{SightingTable, reconcile};
pub use registry::{RegistryPoller, RegistrySource};
pub use session::{
    DisplaySnapshot, SessionDeps, SessionError, SessionEvent, SessionOptions, SessionSender,
    TrackingSession,
};
