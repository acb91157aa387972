//! Mode Router — maps a logical board operation onto the correct backend
//! endpoint for the engine's mode, and owns the status vocabulary
//! translation at the wire boundary.
//!
//! Routing table:
//!
//! | operation | global        | project                    | meeting          |
//! |-----------|---------------|----------------------------|------------------|
//! | list      | global pool   | project subset (+owner)    | supplied snapshot|
//! | create    | global pool   | under project, then link   | under meeting    |
//! | update    | global update | shared update (underscore) | shared update    |
//! | delete    | hard delete   | unlink from project        | unsupported      |
//! | link      | yes           | yes (minus own project)    | yes              |
//! | unlink    | yes           | yes                        | yes              |

use std::sync::Arc;

use crate::backend::{BackendError, TaskBackend, WireDraft, WirePatch};
use crate::types::{FilterCriteria, ItemDraft, ItemPatch, Mode, RawItem};

pub struct ModeRouter {
    mode: Mode,
    backend: Arc<dyn TaskBackend>,
}

impl ModeRouter {
    pub fn new(mode: Mode, backend: Arc<dyn TaskBackend>) -> Self {
        Self { mode, backend }
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// List the mode's item source. Meeting mode reads the externally
    /// supplied snapshot and never touches the network.
    pub async fn list(
        &self,
        criteria: &FilterCriteria,
        meeting_snapshot: &[RawItem],
    ) -> Result<Vec<RawItem>, BackendError> {
        match &self.mode {
            Mode::Global => self.backend.list_global_items().await,
            Mode::Project { project_id } => {
                let owner = server_owner_filter(criteria);
                self.backend
                    .list_project_items(project_id, owner.as_deref())
                    .await
            }
            Mode::Meeting { .. } => Ok(meeting_snapshot.to_vec()),
        }
    }

    /// Every item regardless of linkage (backs the link picker).
    pub async fn list_all(&self) -> Result<Vec<RawItem>, BackendError> {
        self.backend.list_all_items().await
    }

    pub async fn create(&self, draft: &ItemDraft) -> Result<RawItem, BackendError> {
        let wire = to_wire_draft(draft);
        match &self.mode {
            Mode::Global => self.backend.create_global_item(&wire).await,
            Mode::Project { project_id } => {
                self.backend.create_project_item(project_id, &wire).await
            }
            Mode::Meeting { transcription_id } => {
                self.backend.create_meeting_item(transcription_id, &wire).await
            }
        }
    }

    /// Projects a freshly created item still needs linking to. In project
    /// mode the create endpoint already established the link to the
    /// current project, so it is excluded from the bulk targets.
    pub fn extra_link_targets<'a>(&self, draft: &'a ItemDraft) -> Vec<&'a str> {
        draft
            .linked_project_ids
            .iter()
            .map(String::as_str)
            .filter(|pid| self.mode.project_id() != Some(*pid))
            .collect()
    }

    /// Route an update. The global pool has its own endpoint speaking the
    /// canonical hyphenated status; project and meeting items go through
    /// the shared endpoint, which expects the underscore vocabulary.
    pub async fn update(&self, id: &str, patch: &ItemPatch) -> Result<RawItem, BackendError> {
        match &self.mode {
            Mode::Global => {
                let wire = to_wire_patch(patch, StatusEncoding::Hyphenated);
                self.backend.update_global_item(id, &wire).await
            }
            Mode::Project { .. } | Mode::Meeting { .. } => {
                let wire = to_wire_patch(patch, StatusEncoding::Underscore);
                self.backend.update_item(id, &wire).await
            }
        }
    }

    /// Whether this mode has a delete route at all. Meeting items are
    /// read-only in meeting mode.
    pub fn supports_delete(&self) -> bool {
        !matches!(self.mode, Mode::Meeting { .. })
    }

    /// Remove the item from this mode's scope. Project mode only severs
    /// the project↔item association — the item may be linked elsewhere, so
    /// a hard delete must never be issued here.
    pub async fn delete(&self, id: &str) -> Result<(), BackendError> {
        match &self.mode {
            Mode::Global => self.backend.delete_item(id).await,
            Mode::Project { project_id } => {
                self.backend.unlink_item_from_project(project_id, id).await
            }
            Mode::Meeting { .. } => Err(BackendError::Http {
                status: 405,
                body: "meeting items are read-only".to_string(),
            }),
        }
    }

    /// Hard delete, regardless of any project linkage. The engine only
    /// routes here in global mode.
    pub async fn hard_delete(&self, id: &str) -> Result<(), BackendError> {
        self.backend.delete_item(id).await
    }

    pub async fn link(&self, project_id: &str, item_id: &str) -> Result<(), BackendError> {
        self.backend.link_item_to_project(project_id, item_id).await
    }

    pub async fn unlink(&self, project_id: &str, item_id: &str) -> Result<(), BackendError> {
        self.backend
            .unlink_item_from_project(project_id, item_id)
            .await
    }
}

enum StatusEncoding {
    Hyphenated,
    Underscore,
}

fn server_owner_filter(criteria: &FilterCriteria) -> Option<String> {
    if !criteria.show_only_my_tasks {
        return None;
    }
    let name = criteria.filter_user_name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn to_wire_draft(draft: &ItemDraft) -> WireDraft {
    WireDraft {
        task: draft.task.clone(),
        owner: draft.owner.clone(),
        priority: draft.priority.as_str().to_string(),
        due_date: draft.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
    }
}

fn to_wire_patch(patch: &ItemPatch, encoding: StatusEncoding) -> WirePatch {
    WirePatch {
        task: patch.task.clone(),
        owner: if patch.clear_owner {
            Some(None)
        } else {
            patch.owner.clone().map(Some)
        },
        status: patch.status.map(|s| {
            match encoding {
                StatusEncoding::Hyphenated => s.as_hyphenated(),
                StatusEncoding::Underscore => s.as_underscore(),
            }
            .to_string()
        }),
        priority: patch.priority.map(|p| p.as_str().to_string()),
        due_date: if patch.clear_due_date {
            Some(None)
        } else {
            patch
                .due_date
                .map(|d| Some(d.format("%Y-%m-%d").to_string()))
        },
    }
}
