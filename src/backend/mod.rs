//! Backend collaborator contract.
//!
//! The board never talks to the network directly — every operation goes
//! through [`TaskBackend`], which the HTTP client implements for production
//! and the mock implements for tests. The trait mirrors the server's
//! endpoint set one-to-one; mode semantics (which endpoint an operation
//! maps to) live in the router, not here.

use async_trait::async_trait;
use serde::Serialize;

use crate::types::RawItem;

pub mod http;

#[cfg(test)]
pub(crate) mod mock;

pub use http::HttpBackend;

/// Errors from backend operations.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("network error: {0}")]
    Network(String),
    #[error("backend returned {status}: {body}")]
    Http { status: u16, body: String },
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl BackendError {
    /// Transient transport trouble or a server-side failure; a retry of the
    /// same request has a chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::Network(_) => true,
            BackendError::Http { status, .. } => *status == 429 || *status >= 500,
            BackendError::Decode(_) => false,
        }
    }
}

/// Create payload as the backend expects it.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDraft {
    pub task: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub priority: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

/// Update payload. Absent fields are left untouched by the server; an
/// explicit `null` (the inner `None`) clears a field. The status string
/// vocabulary is chosen by the router per endpoint.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<String>>,
}

/// The server's endpoint set, protocol-agnostic.
#[async_trait]
pub trait TaskBackend: Send + Sync {
    async fn list_global_items(&self) -> Result<Vec<RawItem>, BackendError>;

    /// Items linked to one project, optionally narrowed server-side to one
    /// owner.
    async fn list_project_items(
        &self,
        project_id: &str,
        owner: Option<&str>,
    ) -> Result<Vec<RawItem>, BackendError>;

    /// Every item regardless of linkage; backs the "available to link"
    /// computation.
    async fn list_all_items(&self) -> Result<Vec<RawItem>, BackendError>;

    async fn create_global_item(&self, payload: &WireDraft) -> Result<RawItem, BackendError>;

    async fn create_project_item(
        &self,
        project_id: &str,
        payload: &WireDraft,
    ) -> Result<RawItem, BackendError>;

    async fn create_meeting_item(
        &self,
        transcription_id: &str,
        payload: &WireDraft,
    ) -> Result<RawItem, BackendError>;

    /// Shared update endpoint (project and meeting routing).
    async fn update_item(&self, id: &str, payload: &WirePatch) -> Result<RawItem, BackendError>;

    /// Global-pool update endpoint.
    async fn update_global_item(
        &self,
        id: &str,
        payload: &WirePatch,
    ) -> Result<RawItem, BackendError>;

    /// Hard delete. The item ceases to exist everywhere.
    async fn delete_item(&self, id: &str) -> Result<(), BackendError>;

    async fn link_item_to_project(
        &self,
        project_id: &str,
        item_id: &str,
    ) -> Result<(), BackendError>;

    async fn unlink_item_from_project(
        &self,
        project_id: &str,
        item_id: &str,
    ) -> Result<(), BackendError>;
}
