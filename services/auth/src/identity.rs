//! Identity provider client
//!
//! Account creation, password checks and account confirmation belong to the
//! users service. This module defines the [`IdentityProvider`] seam and an
//! HTTP implementation of it. Errors the provider reports are passed through
//! with their status and message.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use axum::http::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{AuthError, AuthResult};
use crate::models::{LoginCredentials, NewUser, User};

/// Operations delegated to the identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account and return its canonical record
    async fn create_user(&self, new_user: &NewUser) -> AuthResult<User>;

    /// Check email and password and return the matching account
    async fn login_user_by_email(&self, credentials: &LoginCredentials) -> AuthResult<User>;

    /// Look up an account by email
    async fn find_user_by_email(&self, email: &str) -> AuthResult<User>;

    /// Mark an account's email as confirmed
    async fn confirm_user(&self, user_id: i64) -> AuthResult<()>;
}

/// Identity provider configuration
#[derive(Debug, Clone)]
pub struct IdentityProviderConfig {
    /// Base URL of the users service
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl IdentityProviderConfig {
    /// Create a new IdentityProviderConfig from environment variables
    ///
    /// # Environment Variables
    /// - `USERS_SERVICE_URL`: Base URL of the users service (default: "http://localhost:3001")
    /// - `USERS_SERVICE_TIMEOUT`: Request timeout in seconds (default: 10)
    pub fn from_env() -> anyhow::Result<Self> {
        let base_url = std::env::var("USERS_SERVICE_URL")
            .unwrap_or_else(|_| "http://localhost:3001".to_string());

        let timeout_seconds = std::env::var("USERS_SERVICE_TIMEOUT")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);

        Ok(IdentityProviderConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_seconds,
        })
    }
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: User,
}

#[derive(Deserialize)]
struct ProviderErrorBody {
    error: String,
}

/// Identity provider reached over HTTP
#[derive(Clone)]
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIdentityProvider {
    /// Create a new HTTP identity provider client
    pub fn new(config: &IdentityProviderConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to build identity provider client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> AuthResult<reqwest::Response> {
        let response = request
            .send()
            .await
            .context("Identity provider request failed")?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let status = StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ProviderErrorBody>(&body)
            .map(|body| body.error)
            .unwrap_or_else(|_| {
                status
                    .canonical_reason()
                    .unwrap_or("Identity provider error")
                    .to_string()
            });

        warn!("Identity provider responded with {}: {}", status, message);
        Err(AuthError::Upstream { status, message })
    }

    async fn fetch_user(&self, request: reqwest::RequestBuilder) -> AuthResult<User> {
        let envelope: UserEnvelope = self
            .send(request)
            .await?
            .json()
            .await
            .context("Failed to decode identity provider response")?;
        Ok(envelope.user)
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn create_user(&self, new_user: &NewUser) -> AuthResult<User> {
        debug!("Creating user: {}", new_user.email);
        self.fetch_user(self.client.post(self.url("/users")).json(new_user))
            .await
    }

    async fn login_user_by_email(&self, credentials: &LoginCredentials) -> AuthResult<User> {
        debug!("Checking credentials for: {}", credentials.email);
        self.fetch_user(self.client.post(self.url("/users/login")).json(credentials))
            .await
    }

    async fn find_user_by_email(&self, email: &str) -> AuthResult<User> {
        self.fetch_user(
            self.client
                .get(self.url("/users/by-email"))
                .query(&[("email", email)]),
        )
        .await
    }

    async fn confirm_user(&self, user_id: i64) -> AuthResult<()> {
        debug!("Confirming user: {}", user_id);
        self.send(self.client.post(self.url(&format!("/users/{user_id}/confirm"))))
            .await?;
        Ok(())
    }
}
