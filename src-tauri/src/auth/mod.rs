//! Login state: obtaining, keeping and dropping the session token.

mod token_store;

pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};

use std::sync::Arc;

use log::{info, warn};
use thiserror::Error;

use crate::api::{ApiError, AuthToken, KekeClient};

const SERVER_UNREACHABLE: &str = "Server not accessible";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("The received token is empty")]
    InvalidToken,

    #[error("Could not store the token: {0}")]
    Storage(#[source] anyhow::Error),
}

impl AuthError {
    /// Text for the alert on the login screen.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(ApiError::Transport(_) | ApiError::Status { .. }) => {
                SERVER_UNREACHABLE.to_string()
            }
            Self::Api(ApiError::Authentication { message }) => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Ties the login endpoint to the token store.
#[derive(Clone)]
pub struct AuthService {
    client: KekeClient,
    store: Arc<dyn TokenStore>,
}

impl AuthService {
    pub fn new(client: KekeClient, store: Arc<dyn TokenStore>) -> Self {
        Self { client, store }
    }

    pub fn store(&self) -> Arc<dyn TokenStore> {
        self.store.clone()
    }

    /// Logs in with email and PIN and keeps the issued token.
    pub async fn login(&self, email: &str, pin: &str) -> Result<AuthToken, AuthError> {
        let token = match self.client.login(email, pin).await {
            Ok(token) => token,
            Err(e) => {
                warn!("Login failed: {}", e);
                return Err(e.into());
            }
        };
        self.store.save(&token).await.map_err(AuthError::Storage)?;
        info!("Logged in.");
        Ok(token)
    }

    /// Accepts a token handed over out of band, e.g. by a deep link.
    pub async fn accept_token(&self, raw: &str) -> Result<AuthToken, AuthError> {
        let token = AuthToken::new(raw).ok_or(AuthError::InvalidToken)?;
        self.store.save(&token).await.map_err(AuthError::Storage)?;
        info!("Token accepted from link.");
        Ok(token)
    }

    pub async fn logout(&self) -> Result<(), AuthError> {
        self.store.remove().await.map_err(AuthError::Storage)?;
        info!("Logged out.");
        Ok(())
    }

    pub async fn current_token(&self) -> Option<AuthToken> {
        self.store.get().await
    }

    pub async fn is_authenticated(&self) -> bool {
        self.current_token().await.is_some()
    }
}
