//! Outbound email notifications

use serde::{Deserialize, Serialize};

/// Routing key for confirmation code emails
pub const CONFIRM_USER_EMAIL_KEY: &str = "confirm_user_email";
/// Routing key for "email confirmed" emails
pub const SUCCESS_CONFIRM_USER_EMAIL_KEY: &str = "success_confirm_user_email";

/// Asks the mailer to send a confirmation code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationRequested {
    pub name: String,
    pub email: String,
    pub code: u32,
    pub validity_minutes: u64,
}

/// Tells the mailer an address was confirmed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationSucceeded {
    pub name: String,
    pub email: String,
}

/// Any message published to the notification exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    ConfirmationRequested(ConfirmationRequested),
    ConfirmationSucceeded(ConfirmationSucceeded),
}

impl Notification {
    /// Routing key under the notification exchange
    pub fn routing_key(&self) -> &'static str {
        match self {
            Notification::ConfirmationRequested(_) => CONFIRM_USER_EMAIL_KEY,
            Notification::ConfirmationSucceeded(_) => SUCCESS_CONFIRM_USER_EMAIL_KEY,
        }
    }

    /// JSON body of the message
    pub fn to_json(&self) -> serde_json::Result<String> {
        match self {
            Notification::ConfirmationRequested(mail) => serde_json::to_string(mail),
            Notification::ConfirmationSucceeded(mail) => serde_json::to_string(mail),
        }
    }

    /// Recipient address
    pub fn email(&self) -> &str {
        match self {
            Notification::ConfirmationRequested(mail) => &mail.email,
            Notification::ConfirmationSucceeded(mail) => &mail.email,
        }
    }
}
