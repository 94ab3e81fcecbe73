//! Credential lifecycle orchestration
//!
//! Each operation is a short sequence across the identity provider, the token
//! issuer, the two stores and the notification publisher. Within a request the
//! provider call comes first, then token issuance, then session persistence,
//! then notifications. Steps that already committed are never rolled back when
//! a later step fails or the request is dropped.

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use common::KeyValueStore;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::confirmation::{CONFIRMATION_CODE_TTL, ConfirmationStore};
use crate::error::{AuthError, AuthResult};
use crate::identity::IdentityProvider;
use crate::jwt::TokenIssuer;
use crate::models::{
    ConfirmationRequested, ConfirmationSucceeded, LoginCredentials, NewUser, Notification, User,
};
use crate::notifier::NotificationPublisher;
use crate::session::SessionStore;

/// User id stored when a resend cannot resolve the account
pub const UNRESOLVED_USER_ID: i64 = -1;

/// Tokens and profile returned by register and login
#[derive(Debug, Clone, Serialize)]
pub struct IssuedSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

/// Orchestrates registration, login, token refresh and email confirmation
#[derive(Clone)]
pub struct CredentialService {
    identity: Arc<dyn IdentityProvider>,
    publisher: Arc<dyn NotificationPublisher>,
    tokens: TokenIssuer,
    sessions: SessionStore,
    confirmations: ConfirmationStore,
    confirmation_save_timeout: Duration,
}

impl CredentialService {
    /// Create a new credential service over a shared key-value store
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        publisher: Arc<dyn NotificationPublisher>,
        tokens: TokenIssuer,
        store: Arc<dyn KeyValueStore>,
        confirmation_save_timeout: Duration,
    ) -> Self {
        Self {
            identity,
            publisher,
            tokens,
            sessions: SessionStore::new(store.clone()),
            confirmations: ConfirmationStore::new(store),
            confirmation_save_timeout,
        }
    }

    /// Token issuer used by the service
    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Create an account, open a session and send a confirmation code
    ///
    /// The confirmation step is best effort: its failure is logged and the
    /// registration still succeeds.
    pub async fn register(&self, new_user: NewUser) -> AuthResult<IssuedSession> {
        let user = self.identity.create_user(&new_user).await?;
        info!("Registered user {} ({})", user.id, user.email);

        let session = self.open_session(user).await?;

        let user = &session.user;
        if let Err(e) = self
            .create_email_confirmation(user.id, &user.email, &user.full_name)
            .await
        {
            error!(
                "Failed to create email confirmation for {}: {}",
                user.email, e
            );
        }

        Ok(session)
    }

    /// Check credentials with the identity provider and open a session
    pub async fn login(&self, credentials: LoginCredentials) -> AuthResult<IssuedSession> {
        let user = self.identity.login_user_by_email(&credentials).await?;
        info!("User {} logged in", user.id);

        self.open_session(user).await
    }

    /// Mint a new access token for the identity bound to a refresh token
    ///
    /// The refresh token itself is neither rotated nor extended.
    pub async fn refresh_token(&self, refresh_token: &str) -> AuthResult<String> {
        let record = self.sessions.validate_refresh_token(refresh_token).await?;
        let access_token = self
            .tokens
            .generate_access_token(record.user_id, &record.role)?;
        debug!("Issued refreshed access token for user {}", record.user_id);
        Ok(access_token)
    }

    /// End a session; unknown tokens are accepted
    pub async fn logout(&self, refresh_token: &str) -> AuthResult<()> {
        self.sessions.remove_refresh_token(refresh_token).await
    }

    /// Confirm an email address with the code sent to it
    pub async fn verify_user(&self, email: &str, code: u32) -> AuthResult<()> {
        let record = self
            .confirmations
            .validate_confirmation_code(email)
            .await
            .inspect_err(|e| warn!("Failed to validate confirm code for {}: {}", email, e))?;

        if record.code != code {
            return Err(AuthError::IncorrectCode);
        }

        self.identity.confirm_user(record.user_id).await?;

        if let Err(e) = self.confirmations.remove_confirmation_code(email).await {
            warn!("Failed to remove confirm code for {}: {}", email, e);
        }

        let notification = Notification::ConfirmationSucceeded(ConfirmationSucceeded {
            name: record.name,
            email: email.to_string(),
        });
        self.publisher
            .publish(&notification)
            .await
            .map_err(|e| AuthError::Internal(e.context("Failed to publish confirmation success")))?;

        info!("User {} confirmed {}", record.user_id, email);
        Ok(())
    }

    /// Issue or reissue a confirmation code for an email
    ///
    /// The account is looked up to fill a new record with the canonical id and
    /// name. The lookup is best effort: when it fails the record is still
    /// written, with [`UNRESOLVED_USER_ID`] and the supplied name. A live record
    /// keeps its own id and name either way.
    pub async fn create_confirmation_code(&self, email: &str, full_name: &str) -> AuthResult<()> {
        let (user_id, name) = match self.identity.find_user_by_email(email).await {
            Ok(user) => (user.id, user.full_name),
            Err(e) => {
                warn!("Failed to resolve account for {}: {}", email, e);
                (UNRESOLVED_USER_ID, full_name.to_string())
            }
        };

        self.create_email_confirmation(user_id, email, &name).await
    }

    async fn open_session(&self, user: User) -> AuthResult<IssuedSession> {
        let access_token = self.tokens.generate_access_token(user.id, &user.role)?;
        let refresh_token = self.tokens.generate_refresh_token();

        self.sessions
            .save_refresh_token(
                &refresh_token,
                user.id,
                &user.role,
                self.tokens.refresh_expiration(),
            )
            .await?;

        Ok(IssuedSession {
            access_token,
            refresh_token,
            user,
        })
    }

    async fn create_email_confirmation(
        &self,
        user_id: i64,
        email: &str,
        name: &str,
    ) -> AuthResult<()> {
        let code = self.tokens.generate_confirmation_code();

        tokio::time::timeout(
            self.confirmation_save_timeout,
            self.confirmations
                .save_confirmation_code(user_id, email, name, code),
        )
        .await
        .map_err(|_| AuthError::Internal(anyhow!("Timed out saving confirm code")))??;

        let notification = Notification::ConfirmationRequested(ConfirmationRequested {
            name: name.to_string(),
            email: email.to_string(),
            code,
            validity_minutes: CONFIRMATION_CODE_TTL.as_secs() / 60,
        });
        self.publisher
            .publish(&notification)
            .await
            .map_err(|e| AuthError::Internal(e.context("Failed to publish confirm code")))?;

        debug!("Confirmation email queued for {}", email);
        Ok(())
    }
}
