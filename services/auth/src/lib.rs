//! Authentication service for the Joy Kunga application
//!
//! Issues access and refresh tokens for identities verified by the users
//! service and runs the email confirmation workflow. Sessions and pending
//! confirmations live in a TTL key-value store; no state is kept in process
//! between requests.

pub mod config;
pub mod confirmation;
pub mod error;
pub mod identity;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod notifier;
pub mod routes;
pub mod service;
pub mod session;
pub mod validation;

use std::sync::Arc;

pub use error::{AuthError, AuthResult};
pub use service::{CredentialService, IssuedSession};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CredentialService>,
}

impl AppState {
    /// Wrap a credential service for the router
    pub fn new(service: CredentialService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
