//! Data-synchronization core for the multi-mode action item board.
//!
//! Keeps a local, filtered view of a backend-owned collection of action
//! items responsive under optimistic mutation, and reconciles it across
//! three routing modes: the global task pool, a project-scoped subset,
//! and a read-only meeting-derived snapshot.
//!
//! Reads flow one direction: backend → [`normalize`] → [`filter`] →
//! [`board`] → consumer. Writes are intercepted: consumer intent →
//! optimistic local apply + routed backend call → confirm or rollback →
//! re-derived view. The [`engine::SyncEngine`] owns the authoritative
//! collection; consumers receive snapshots and route every change through
//! its mutation entry points.

pub mod backend;
pub mod board;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
mod mutation;
pub mod normalize;
pub mod router;
pub mod types;
pub mod util;

pub use board::BoardView;
pub use config::BackendConfig;
pub use engine::SyncEngine;
pub use error::SyncError;
pub use types::{
    ActionItem, FilterCriteria, ItemDraft, ItemPatch, Mode, Priority, RawItem, Status,
    TimeHorizon,
};
