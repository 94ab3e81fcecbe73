//! Email confirmation codes backed by the key-value store
//!
//! Each email has at most one pending record under `confirm_token:<email>`.
//! Issuing a new code while one is pending replaces the code, keeps the
//! owner and name, and restarts the five minute window. Concurrent writers
//! race last-writer-wins.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use common::KeyValueStore;
use tracing::debug;

use crate::error::{AuthError, AuthResult};
use crate::models::ConfirmationRecord;

const CONFIRM_TOKEN_PREFIX: &str = "confirm_token:";

/// Lifetime of a confirmation code
pub const CONFIRMATION_CODE_TTL: Duration = Duration::from_secs(5 * 60);

/// Storage key of an email's pending confirmation
pub fn confirm_token_key(email: &str) -> String {
    format!("{CONFIRM_TOKEN_PREFIX}{email}")
}

/// Pending email confirmations
#[derive(Clone)]
pub struct ConfirmationStore {
    store: Arc<dyn KeyValueStore>,
}

impl ConfirmationStore {
    /// Create a new confirmation store
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Record a new code for `email`, replacing the code of a pending record
    pub async fn save_confirmation_code(
        &self,
        user_id: i64,
        email: &str,
        name: &str,
        code: u32,
    ) -> AuthResult<()> {
        let key = confirm_token_key(email);

        let existing = self
            .store
            .get(&key)
            .await
            .context("Failed to fetch confirm code")?;

        let record = match existing {
            Some(payload) => {
                let mut record: ConfirmationRecord = serde_json::from_str(&payload)
                    .context("Stored confirm code is corrupted")?;
                debug!("Replacing pending confirm code for {}", email);
                record.code = code;
                record
            }
            None => ConfirmationRecord {
                user_id,
                name: name.to_string(),
                code,
            },
        };

        let payload = serde_json::to_string(&record).context("Failed to encode confirm code")?;
        self.store
            .set(&key, &payload, Some(CONFIRMATION_CODE_TTL))
            .await
            .context("Failed to save confirm code")?;

        Ok(())
    }

    /// Read the pending confirmation for `email` without consuming it
    pub async fn validate_confirmation_code(&self, email: &str) -> AuthResult<ConfirmationRecord> {
        let payload = self
            .store
            .get(&confirm_token_key(email))
            .await
            .context("Failed to validate confirm code")?
            .ok_or_else(|| {
                AuthError::NotFoundOrExpired("Invalid or expired confirm code".to_string())
            })?;

        let record: ConfirmationRecord =
            serde_json::from_str(&payload).context("Stored confirm code is corrupted")?;
        Ok(record)
    }

    /// Drop the pending confirmation for `email`; missing records are fine
    pub async fn remove_confirmation_code(&self, email: &str) -> AuthResult<()> {
        self.store
            .delete(&confirm_token_key(email))
            .await
            .context("Failed to remove confirm code")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::MemoryStore;

    fn confirmation_store() -> (MemoryStore, ConfirmationStore) {
        let backend = MemoryStore::new();
        let confirmations = ConfirmationStore::new(Arc::new(backend.clone()));
        (backend, confirmations)
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_creates_record() {
        let (backend, confirmations) = confirmation_store();
        confirmations
            .save_confirmation_code(7, "a@x.com", "Ann", 123456)
            .await
            .unwrap();

        let record = confirmations
            .validate_confirmation_code("a@x.com")
            .await
            .unwrap();
        assert_eq!(
            record,
            ConfirmationRecord {
                user_id: 7,
                name: "Ann".to_string(),
                code: 123456
            }
        );
        assert_eq!(
            backend.ttl("confirm_token:a@x.com").await,
            Some(CONFIRMATION_CODE_TTL)
        );
    }

    #[tokio::test]
    async fn test_second_code_replaces_first_in_place() {
        let (backend, confirmations) = confirmation_store();
        confirmations
            .save_confirmation_code(7, "a@x.com", "Ann", 111111)
            .await
            .unwrap();
        confirmations
            .save_confirmation_code(99, "a@x.com", "Someone Else", 222222)
            .await
            .unwrap();

        let record = confirmations
            .validate_confirmation_code("a@x.com")
            .await
            .unwrap();
        assert_eq!(record.code, 222222);
        assert_eq!(record.user_id, 7);
        assert_eq!(record.name, "Ann");
        assert_eq!(backend.count_prefix("confirm_token:").await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resend_restarts_window() {
        let (_, confirmations) = confirmation_store();
        confirmations
            .save_confirmation_code(7, "a@x.com", "Ann", 111111)
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(4 * 60)).await;
        confirmations
            .save_confirmation_code(7, "a@x.com", "Ann", 222222)
            .await
            .unwrap();

        // Past the first window, inside the second
        tokio::time::advance(Duration::from_secs(4 * 60)).await;
        let record = confirmations
            .validate_confirmation_code("a@x.com")
            .await
            .unwrap();
        assert_eq!(record.code, 222222);

        tokio::time::advance(Duration::from_secs(60)).await;
        let err = confirmations
            .validate_confirmation_code("a@x.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotFoundOrExpired(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_record_is_recreated() {
        let (_, confirmations) = confirmation_store();
        confirmations
            .save_confirmation_code(7, "a@x.com", "Ann", 111111)
            .await
            .unwrap();

        tokio::time::advance(CONFIRMATION_CODE_TTL).await;
        confirmations
            .save_confirmation_code(8, "a@x.com", "Anna", 333333)
            .await
            .unwrap();

        let record = confirmations
            .validate_confirmation_code("a@x.com")
            .await
            .unwrap();
        assert_eq!(record.user_id, 8);
        assert_eq!(record.name, "Anna");
        assert_eq!(record.code, 333333);
    }

    #[tokio::test]
    async fn test_validation_does_not_consume() {
        let (_, confirmations) = confirmation_store();
        confirmations
            .save_confirmation_code(7, "a@x.com", "Ann", 123456)
            .await
            .unwrap();

        confirmations
            .validate_confirmation_code("a@x.com")
            .await
            .unwrap();
        confirmations
            .validate_confirmation_code("a@x.com")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_corrupted_record_fails_save_and_validate() {
        let (backend, confirmations) = confirmation_store();
        backend
            .set("confirm_token:a@x.com", "{", None)
            .await
            .unwrap();

        let err = confirmations
            .save_confirmation_code(7, "a@x.com", "Ann", 123456)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Internal(_)));

        let err = confirmations
            .validate_confirmation_code("a@x.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Internal(_)));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let (_, confirmations) = confirmation_store();
        confirmations
            .save_confirmation_code(7, "a@x.com", "Ann", 123456)
            .await
            .unwrap();

        confirmations.remove_confirmation_code("a@x.com").await.unwrap();
        confirmations.remove_confirmation_code("a@x.com").await.unwrap();

        let err = confirmations
            .validate_confirmation_code("a@x.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotFoundOrExpired(_)));
    }

    #[tokio::test]
    async fn test_namespaces_do_not_collide() {
        let (backend, confirmations) = confirmation_store();
        backend
            .set("refresh_token:a@x.com", r#"{"user_id":1,"role":"admin"}"#, None)
            .await
            .unwrap();

        let err = confirmations
            .validate_confirmation_code("a@x.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotFoundOrExpired(_)));
    }
}
