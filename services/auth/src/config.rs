//! Service configuration assembled from the environment

use std::time::Duration;

use anyhow::Result;
use common::RedisConfig;

use crate::identity::IdentityProviderConfig;
use crate::jwt::JwtConfig;
use crate::notifier::DEFAULT_EXCHANGE;

/// Default deadline for persisting a confirmation code during registration
pub const DEFAULT_CONFIRMATION_SAVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Authentication service configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Address the HTTP server binds to
    pub listen_addr: String,
    /// Exchange notifications are published under
    pub notification_exchange: String,
    /// Independent deadline for the confirmation step of registration
    pub confirmation_save_timeout: Duration,
    pub jwt: JwtConfig,
    pub redis: RedisConfig,
    pub identity: IdentityProviderConfig,
}

impl AuthConfig {
    /// Create a new AuthConfig from environment variables
    ///
    /// # Environment Variables
    /// - `AUTH_LISTEN_ADDR`: Bind address (default: "0.0.0.0:3000")
    /// - `NOTIFICATION_EXCHANGE`: Notification exchange (default: "auth")
    /// - `CONFIRMATION_SAVE_TIMEOUT_MS`: Confirmation deadline in milliseconds (default: 5000)
    ///
    /// plus the variables read by [`JwtConfig`], [`RedisConfig`] and
    /// [`IdentityProviderConfig`].
    pub fn from_env() -> Result<Self> {
        let listen_addr =
            std::env::var("AUTH_LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let notification_exchange = std::env::var("NOTIFICATION_EXCHANGE")
            .ok()
            .filter(|exchange| !exchange.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_EXCHANGE.to_string());

        let confirmation_save_timeout = std::env::var("CONFIRMATION_SAVE_TIMEOUT_MS")
            .ok()
            .and_then(|ms| ms.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_CONFIRMATION_SAVE_TIMEOUT);

        Ok(AuthConfig {
            listen_addr,
            notification_exchange,
            confirmation_save_timeout,
            jwt: JwtConfig::from_env()?,
            redis: RedisConfig::from_env()?,
            identity: IdentityProviderConfig::from_env()?,
        })
    }
}
