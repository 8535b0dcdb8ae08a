//! Core type definitions for flocksync.
//!
//! This crate defines the records that flow through a sync run:
//! - `SourceContact`: a loosely-typed contact as returned by the source API
//! - `MappedContact`: a contact in the target schema, keyed by email
//! - `SyncSummary`: the per-invocation outcome (counts plus a bounded error list)
//!
//! Nothing here performs I/O; the sync crate owns fetching and upserting.

mod contact;
mod summary;

pub use contact::{AttributeValue, MappedContact, SourceContact};
pub use summary::{DEFAULT_MAX_REPORTED_ERRORS, SyncFailure, SyncSummary};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when building contact records.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("contact record must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("mapped contact requires a non-empty email")]
    EmptyEmail,
}
