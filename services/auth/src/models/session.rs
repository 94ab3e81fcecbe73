//! Refresh token record stored in the session namespace

use serde::{Deserialize, Serialize};

/// Identity bound to a refresh token for the token's lifetime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    pub user_id: i64,
    pub role: String,
}
