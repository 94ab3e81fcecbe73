//! Test doubles for the credential service collaborators

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use auth::{
    AuthError, AuthResult, CredentialService,
    identity::IdentityProvider,
    jwt::{JwtConfig, TokenIssuer},
    models::{LoginCredentials, NewUser, Notification, User},
    notifier::NotificationPublisher,
};
use axum::http::StatusCode;
use chrono::Utc;
use common::{CacheError, CacheResult, KeyValueStore, MemoryStore};

pub const SECRET: &str = "integration-secret";
pub const REFRESH_TTL: Duration = Duration::from_secs(3600);
pub const CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(5);

/// In-memory users service
pub struct FakeIdentityProvider {
    users: Mutex<HashMap<String, (User, String)>>,
    next_id: Mutex<i64>,
    pub fail_confirm: AtomicBool,
    pub fail_lookup: AtomicBool,
    pub confirm_calls: AtomicUsize,
}

impl FakeIdentityProvider {
    pub fn new(first_id: i64) -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            next_id: Mutex::new(first_id),
            fail_confirm: AtomicBool::new(false),
            fail_lookup: AtomicBool::new(false),
            confirm_calls: AtomicUsize::new(0),
        }
    }

    pub fn user(&self, email: &str) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .get(email)
            .map(|(user, _)| user.clone())
    }

    fn upstream(status: StatusCode, message: &str) -> AuthError {
        AuthError::Upstream {
            status,
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn create_user(&self, new_user: &NewUser) -> AuthResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&new_user.email) {
            return Err(Self::upstream(StatusCode::CONFLICT, "email already exists"));
        }

        let mut next_id = self.next_id.lock().unwrap();
        let now = Utc::now();
        let user = User {
            id: *next_id,
            email: new_user.email.clone(),
            avatar_url: None,
            full_name: new_user.full_name.clone(),
            slug: Some(new_user.full_name.to_lowercase()),
            bio: None,
            last_login_at: None,
            role: "user".to_string(),
            is_verified: false,
            updated_at: now,
            created_at: now,
        };
        *next_id += 1;

        users.insert(
            new_user.email.clone(),
            (user.clone(), new_user.password.clone()),
        );
        Ok(user)
    }

    async fn login_user_by_email(&self, credentials: &LoginCredentials) -> AuthResult<User> {
        let users = self.users.lock().unwrap();
        match users.get(&credentials.email) {
            Some((user, password)) if *password == credentials.password => Ok(user.clone()),
            _ => Err(Self::upstream(
                StatusCode::UNAUTHORIZED,
                "invalid credentials",
            )),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> AuthResult<User> {
        if self.fail_lookup.load(Ordering::SeqCst) {
            return Err(Self::upstream(
                StatusCode::SERVICE_UNAVAILABLE,
                "users service unavailable",
            ));
        }
        self.user(email)
            .ok_or_else(|| Self::upstream(StatusCode::NOT_FOUND, "user not found"))
    }

    async fn confirm_user(&self, user_id: i64) -> AuthResult<()> {
        self.confirm_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_confirm.load(Ordering::SeqCst) {
            return Err(Self::upstream(
                StatusCode::SERVICE_UNAVAILABLE,
                "users service unavailable",
            ));
        }

        let mut users = self.users.lock().unwrap();
        let (user, _) = users
            .values_mut()
            .find(|(user, _)| user.id == user_id)
            .ok_or_else(|| Self::upstream(StatusCode::NOT_FOUND, "user not found"))?;
        user.is_verified = true;
        Ok(())
    }
}

/// Publisher that records messages and can be switched off
#[derive(Default)]
pub struct RecordingPublisher {
    messages: Mutex<Vec<Notification>>,
    pub fail: AtomicBool,
}

impl RecordingPublisher {
    pub fn messages(&self) -> Vec<Notification> {
        self.messages.lock().unwrap().clone()
    }

    /// Code carried by the latest confirmation request for `email`
    pub fn last_code(&self, email: &str) -> Option<u32> {
        self.messages()
            .into_iter()
            .rev()
            .find_map(|message| match message {
                Notification::ConfirmationRequested(mail) if mail.email == email => {
                    Some(mail.code)
                }
                _ => None,
            })
    }
}

#[async_trait]
impl NotificationPublisher for RecordingPublisher {
    async fn publish(&self, notification: &Notification) -> anyhow::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("notification channel unreachable");
        }
        self.messages.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Store wrapper that can stall or fail writes under a key prefix
pub struct FaultyStore {
    inner: MemoryStore,
    prefix: &'static str,
    write_delay: Option<Duration>,
    fail_writes: bool,
}

impl FaultyStore {
    pub fn slow_writes(inner: MemoryStore, prefix: &'static str, delay: Duration) -> Self {
        Self {
            inner,
            prefix,
            write_delay: Some(delay),
            fail_writes: false,
        }
    }

    pub fn failing_writes(inner: MemoryStore, prefix: &'static str) -> Self {
        Self {
            inner,
            prefix,
            write_delay: None,
            fail_writes: true,
        }
    }
}

#[async_trait]
impl KeyValueStore for FaultyStore {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()> {
        if key.starts_with(self.prefix) {
            if let Some(delay) = self.write_delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_writes {
                return Err(CacheError::Configuration("backend unavailable".to_string()));
            }
        }
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.inner.delete(key).await
    }
}

/// Credential service wired to in-memory collaborators
pub struct Harness {
    pub service: CredentialService,
    pub store: MemoryStore,
    pub identity: Arc<FakeIdentityProvider>,
    pub publisher: Arc<RecordingPublisher>,
}

pub fn token_issuer() -> TokenIssuer {
    TokenIssuer::new(JwtConfig {
        secret: SECRET.to_string(),
        access_token_expiry: 900,
        refresh_token_expiry: REFRESH_TTL.as_secs(),
    })
    .unwrap()
}

impl Harness {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        Self::with_backend(store.clone(), Arc::new(store))
    }

    /// Harness whose service writes through `backend`, which wraps `store`
    pub fn with_backend(store: MemoryStore, backend: Arc<dyn KeyValueStore>) -> Self {
        let identity = Arc::new(FakeIdentityProvider::new(7));
        let publisher = Arc::new(RecordingPublisher::default());
        let service = CredentialService::new(
            identity.clone(),
            publisher.clone(),
            token_issuer(),
            backend,
            CONFIRMATION_TIMEOUT,
        );

        Self {
            service,
            store,
            identity,
            publisher,
        }
    }

    pub async fn raw(&self, key: &str) -> Option<serde_json::Value> {
        self.store
            .get(key)
            .await
            .unwrap()
            .map(|payload| serde_json::from_str(&payload).unwrap())
    }
}

pub fn new_user(email: &str, full_name: &str, password: &str) -> NewUser {
    NewUser {
        email: email.to_string(),
        full_name: full_name.to_string(),
        password: password.to_string(),
    }
}
