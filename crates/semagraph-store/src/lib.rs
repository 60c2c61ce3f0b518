//! # semagraph-store
//!
//! SPARQL 1.1 protocol client: query and update execution over HTTP,
//! bounded-backoff retries for idempotent reads, and atomic update
//! units for everything that must become visible together.

pub mod client;
pub mod config;
pub mod transaction;

pub use client::{BindingRow, GraphStoreClient, SparqlHttpClient};
pub use config::{RetryPolicy, StoreConfig};
pub use transaction::TransactionUnit;

use thiserror::Error;

/// Store operation result type
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transient network fault. Read-only calls retry these
    /// automatically; update calls surface them immediately.
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Store rejected request: {status} - {message}")]
    Api { status: u16, message: String },

    /// Commit failure. Never silently retried: the caller re-submits
    /// the whole unit or gives up.
    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Response decode error: {0}")]
    Decode(String),
}
