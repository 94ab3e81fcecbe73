//! Authentication service models

pub mod confirmation;
pub mod notification;
pub mod session;
pub mod user;

// Re-export for convenience
pub use confirmation::ConfirmationRecord;
pub use notification::{ConfirmationRequested, ConfirmationSucceeded, Notification};
pub use session::RefreshTokenRecord;
pub use user::{LoginCredentials, NewUser, User};
