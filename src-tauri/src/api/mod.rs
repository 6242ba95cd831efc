//! Keke backend API: login handshake and device registry.

mod client;
mod error;
mod types;

pub use client::KekeClient;
pub use error::ApiError;
pub use types::{AuthToken, WireDevice};
