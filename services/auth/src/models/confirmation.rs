//! Pending email confirmation record

use serde::{Deserialize, Serialize};

/// Pending confirmation for one email address
///
/// The email itself is the storage key and is not repeated in the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationRecord {
    pub user_id: i64,
    pub name: String,
    pub code: u32,
}
