//! Error types for the sync engine.
//!
//! Failures are classified by what happened to local state:
//! - Fetch: list call failed, collection cleared (no stale data shown)
//! - Mutation: backend rejected, collection rolled back to the snapshot
//! - PartialLink: creation stands, one or more follow-up links failed
//!
//! None of these are fatal — the engine stays usable afterwards.

use thiserror::Error;

use crate::backend::BackendError;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("fetch failed: {0}")]
    Fetch(#[source] BackendError),

    #[error("mutation failed: {0}")]
    Mutation(#[source] BackendError),

    /// Create succeeded but some project links did not. The created item
    /// remains; `failures` pairs each failed project id with its error.
    #[error("item {created_id} created, but {} project link(s) failed", failures.len())]
    PartialLink {
        created_id: String,
        failures: Vec<(String, BackendError)>,
    },

    /// Bulk link reconciliation partially failed; succeeded link changes
    /// stand.
    #[error("{} link change(s) failed for item {item_id}", failures.len())]
    LinkSync {
        item_id: String,
        failures: Vec<(String, BackendError)>,
    },

    #[error("{0} is not supported in this mode")]
    Unsupported(&'static str),

    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("engine is closed")]
    Closed,
}

impl SyncError {
    /// True when re-invoking the same operation has a chance of succeeding
    /// (transient transport trouble rather than a rejected request).
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Fetch(e) | SyncError::Mutation(e) => e.is_retryable(),
            SyncError::PartialLink { failures, .. } | SyncError::LinkSync { failures, .. } => {
                failures.iter().any(|(_, e)| e.is_retryable())
            }
            _ => false,
        }
    }

    /// True when local state was restored to its pre-mutation snapshot.
    pub fn rolled_back(&self) -> bool {
        matches!(self, SyncError::Mutation(_))
    }
}
