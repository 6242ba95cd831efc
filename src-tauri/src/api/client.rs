//! HTTP client for the Keke backend.
//!
//! Two endpoints: `usercheck.php` trades email + PIN for a token, and
//! `devices.php` lists the trackers registered to that token. Both are
//! plain GETs with query parameters.

use std::time::Duration;

use log::{debug, warn};
use reqwest::StatusCode;
use url::Url;

use crate::api::error::ApiError;
use crate::api::types::{AuthToken, WireDevice, parse_login_body};
use crate::config::api_config::ApiConfig;
use crate::core::model::RegistryEntry;

const USER_AGENT: &str = concat!("kekefinder/", env!("CARGO_PKG_VERSION"));
const INVALID_CREDENTIALS: &str = "Invalid Credentials Provided.";

/// Client for the login and device registry endpoints.
#[derive(Debug, Clone)]
pub struct KekeClient {
    http: reqwest::Client,
    login_url: Url,
    devices_url: Url,
}

impl KekeClient {
    /// Builds a client from the API section of the app config.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build()?;
        let base_url = Url::parse(config.base_url.trim())?;
        Self::with_client(http, &base_url, &config.login_path, &config.devices_path)
    }

    /// Uses a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: &Url,
        login_path: &str,
        devices_path: &str,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            http,
            login_url: endpoint(base_url, login_path)?,
            devices_url: endpoint(base_url, devices_path)?,
        })
    }

    pub fn login_url(&self) -> &Url {
        &self.login_url
    }

    pub fn devices_url(&self) -> &Url {
        &self.devices_url
    }

    /// Exchanges email and PIN for a session token.
    pub async fn login(&self, email: &str, pin: &str) -> Result<AuthToken, ApiError> {
        let email = email.trim();
        let pin = pin.trim();
        if email.is_empty() || pin.is_empty() {
            return Err(ApiError::MissingCredentials);
        }

        debug!("GET {}", self.login_url);
        let resp = self
            .http
            .get(self.login_url.clone())
            .query(&[("l", email), ("p", pin)])
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Authentication {
                message: INVALID_CREDENTIALS.into(),
            });
        }
        let body = resp.text().await?;
        if !status.is_success() {
            warn!("Login answered with HTTP {status}");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: preview(&body).to_string(),
            });
        }
        if status != StatusCode::OK {
            return Err(ApiError::Authentication {
                message: INVALID_CREDENTIALS.into(),
            });
        }

        parse_login_body(&body).ok_or_else(|| ApiError::Authentication {
            message: INVALID_CREDENTIALS.into(),
        })
    }

    /// Fetches the devices registered to `token`.
    pub async fn fetch_devices(&self, token: &AuthToken) -> Result<Vec<RegistryEntry>, ApiError> {
        debug!("GET {}", self.devices_url);
        let resp = self
            .http
            .get(self.devices_url.clone())
            .query(&[("k", token.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Authentication {
                message: format!("token rejected (HTTP {})", status.as_u16()),
            });
        }

        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: preview(&body).to_string(),
            });
        }

        parse_devices_body(&body)
    }
}

fn endpoint(base_url: &Url, path: &str) -> Result<Url, ApiError> {
    // Url::join drops the last segment unless the base ends with '/'.
    let base = if base_url.path().ends_with('/') {
        base_url.clone()
    } else {
        Url::parse(&format!("{}/", base_url.as_str()))?
    };
    Ok(base.join(path.trim_start_matches('/'))?)
}

fn parse_devices_body(body: &str) -> Result<Vec<RegistryEntry>, ApiError> {
    let trimmed = body.trim();
    if trimmed == "false" {
        return Err(ApiError::Authentication {
            message: "token rejected".into(),
        });
    }
    if trimmed.is_empty() || trimmed == "null" {
        return Err(ApiError::Deserialization {
            message: "empty device list response".into(),
            body: body.to_string(),
        });
    }

    let devices: Vec<WireDevice> =
        serde_json::from_str(trimmed).map_err(|e| ApiError::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(trimmed)),
            body: body.to_string(),
        })?;

    Ok(devices.into_iter().map(RegistryEntry::from).collect())
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
