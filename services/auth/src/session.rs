//! Session management backed by the key-value store
//!
//! Refresh tokens are stored under `refresh_token:<token>` with the refresh
//! expiration as TTL. Validation is non-destructive: a token stays usable
//! until its TTL lapses or it is removed.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use common::KeyValueStore;
use tracing::{debug, info};

use crate::error::{AuthError, AuthResult};
use crate::models::RefreshTokenRecord;

const REFRESH_TOKEN_PREFIX: &str = "refresh_token:";

/// Storage key of a refresh token
pub fn refresh_token_key(token: &str) -> String {
    format!("{REFRESH_TOKEN_PREFIX}{token}")
}

/// Refresh token to identity bindings
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    /// Create a new session store
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Persist a refresh token for a user
    pub async fn save_refresh_token(
        &self,
        token: &str,
        user_id: i64,
        role: &str,
        ttl: Duration,
    ) -> AuthResult<()> {
        info!("Creating session for user: {}", user_id);

        let record = RefreshTokenRecord {
            user_id,
            role: role.to_string(),
        };
        let payload = serde_json::to_string(&record).context("Failed to encode refresh token")?;

        self.store
            .set(&refresh_token_key(token), &payload, Some(ttl))
            .await
            .context("Failed to save refresh token")?;

        Ok(())
    }

    /// Resolve a refresh token to the identity it was issued for
    pub async fn validate_refresh_token(&self, token: &str) -> AuthResult<RefreshTokenRecord> {
        let payload = self
            .store
            .get(&refresh_token_key(token))
            .await
            .context("Failed to validate refresh token")?
            .ok_or_else(|| {
                AuthError::NotFoundOrExpired("Invalid or expired refresh token".to_string())
            })?;

        let record: RefreshTokenRecord =
            serde_json::from_str(&payload).context("Stored refresh token is corrupted")?;
        debug!("Refresh token resolved for user: {}", record.user_id);

        Ok(record)
    }

    /// Remove a refresh token; removing an unknown token succeeds
    pub async fn remove_refresh_token(&self, token: &str) -> AuthResult<()> {
        self.store
            .delete(&refresh_token_key(token))
            .await
            .context("Failed to remove refresh token")?;
        Ok(())
    }
}
