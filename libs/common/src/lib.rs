//! Common library for the Joy Kunga application
//!
//! This crate provides shared functionality used across different services
//! in the Joy Kunga application: Redis connectivity, the TTL key-value store
//! abstraction with an in-memory implementation, and error types.
//!
//! ```rust,no_run
//! use common::{KeyValueStore, RedisConfig, RedisPool};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RedisConfig::from_env()?;
//!     let pool = RedisPool::new(&config).await?;
//!     pool.set("greeting", "hello", Some(Duration::from_secs(30))).await?;
//!     println!("Redis health check: {}", pool.health_check().await?);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod error;
pub mod memory;

pub use cache::{KeyValueStore, RedisConfig, RedisPool};
pub use error::{CacheError, CacheResult};
pub use memory::MemoryStore;
