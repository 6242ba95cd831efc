pub mod api_config;
pub mod scan_config;

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::config::api_config::ApiConfig;
use crate::config::scan_config::ScanConfig;
use crate::utils::write_file_replacing;

const CONFIG_FILE_NAME: &str = "kekefinder_config.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub scan: ScanConfig,
}

impl AppConfig {
    /// Loads the config from `config_dir`, falling back to defaults when
    /// the file does not exist yet.
    pub async fn load_config(config_dir: &Path) -> Result<Self> {
        let file_path = config_dir.join(CONFIG_FILE_NAME);

        if !file_path.exists() {
            warn!("Config file not found at {:?}, using default.", file_path);
            return Ok(Self::default());
        }

        let config_json = fs::read_to_string(&file_path).await?;
        let config: Self = serde_json::from_str(&config_json)?;

        info!("Config loaded from {:?}", file_path);
        Ok(config)
    }

    /// Saves the config into `config_dir`, creating the directory if needed.
    pub async fn save_config(&self, config_dir: &Path) -> Result<()> {
        let file_path = config_dir.join(CONFIG_FILE_NAME);

        let config_json = match serde_json::to_string_pretty(&self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize app config to JSON: {}", e);
                return Err(e.into());
            }
        };

        write_file_replacing(&file_path, &config_json).await?;
        info!("Config saved to {:?}", file_path);
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        // a zero period would make tokio's interval panic
        Duration::from_secs(self.api.poll_interval_secs.max(1))
    }

    pub fn sighting_ttl(&self) -> Option<Duration> {
        self.scan.sighting_ttl_secs.map(Duration::from_secs)
    }
}
