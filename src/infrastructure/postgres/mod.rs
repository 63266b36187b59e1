//! PostgreSQL persistence module.
//!
//! Provides connection pooling for the recipient directory.

pub mod pool;

pub use pool::PostgresPool;
