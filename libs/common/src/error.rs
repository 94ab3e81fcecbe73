//! Custom error types for the common library
//!
//! This module defines the error types raised by the key-value backends
//! shared across services.

use redis::RedisError;
use thiserror::Error;

/// Custom error type for cache operations
#[derive(Error, Debug)]
pub enum CacheError {
    /// Error occurred while opening or acquiring a connection
    #[error("Cache connection error: {0}")]
    Connection(#[source] RedisError),

    /// Error occurred while executing a command
    #[error("Cache command error: {0}")]
    Command(#[source] RedisError),

    /// Configuration error
    #[error("Cache configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with CacheError
pub type CacheResult<T> = Result<T, CacheError>;
