use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://www.kekefinder.de/";

/// Where the backend lives and how often the device list is refreshed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Root of the Keke backend.
    pub base_url: String,
    /// Login endpoint, relative to `base_url`.
    pub login_path: String,
    /// Device registry endpoint, relative to `base_url`.
    pub devices_path: String,
    /// Seconds between two device list refreshes.
    pub poll_interval_secs: u64,
    /// Per-request timeout. `None` keeps the HTTP client default.
    pub request_timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            login_path: "usercheck.php".to_string(),
            devices_path: "devices.php".to_string(),
            poll_interval_secs: 60,
            request_timeout_secs: None,
        }
    }
}
