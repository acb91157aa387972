//! Sync Engine — owns the authoritative item collection and composes the
//! normalizer, filter pipeline, router and mutation coordinator on every
//! fetch, mutation and criteria change.
//!
//! Consumers share the engine behind an `Arc`; interior state sits behind
//! one non-poisoning mutex and is only ever mutated through engine
//! methods — the derived views handed out are snapshots, so nothing
//! outside this module can touch the collection directly. Every mutating
//! operation applies its optimistic change before the first await point
//! and resolves asynchronously via confirm-or-rollback.
//!
//! The consumer calls [`SyncEngine::fetch`] once right after
//! construction; afterwards the engine refetches itself (debounced) on
//! every criteria change. Scheduling happens through `tokio::spawn`, so
//! [`SyncEngine::set_criteria`] must run inside a tokio runtime.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::backend::{HttpBackend, TaskBackend};
use crate::board::{group_by_status, BoardView};
use crate::config::{BackendConfig, DEFAULT_DEBOUNCE_MS};
use crate::error::SyncError;
use crate::filter::filter_items;
use crate::mutation::Mutation;
use crate::normalize::{normalize, normalize_all};
use crate::router::ModeRouter;
use crate::types::{ActionItem, FilterCriteria, ItemDraft, ItemPatch, Mode, RawItem, Status};
use crate::util::{validate_bounded_string, validate_id_slug};

/// Bounds on the task display text, matching what the backend accepts.
const TASK_MIN_CHARS: usize = 1;
const TASK_MAX_CHARS: usize = 280;

struct EngineState {
    items: Vec<ActionItem>,
    criteria: FilterCriteria,
    loading: bool,
    last_error: Option<String>,
    /// List source for meeting mode, supplied by the caller.
    meeting_snapshot: Vec<RawItem>,
}

pub struct SyncEngine {
    router: ModeRouter,
    state: Mutex<EngineState>,
    /// Monotonic guard: bumped on every criteria change and on close.
    /// A list response is applied only if the generation it started under
    /// is still current, so a stale in-flight response cannot overwrite
    /// newer state.
    generation: AtomicU64,
    alive: AtomicBool,
    debounce: Duration,
}

impl SyncEngine {
    pub fn new(mode: Mode, backend: Arc<dyn TaskBackend>) -> Arc<Self> {
        Self::with_debounce(mode, backend, Duration::from_millis(DEFAULT_DEBOUNCE_MS))
    }

    pub fn with_debounce(
        mode: Mode,
        backend: Arc<dyn TaskBackend>,
        debounce: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            router: ModeRouter::new(mode, backend),
            state: Mutex::new(EngineState {
                items: Vec::new(),
                criteria: FilterCriteria::default(),
                loading: false,
                last_error: None,
                meeting_snapshot: Vec::new(),
            }),
            generation: AtomicU64::new(0),
            alive: AtomicBool::new(true),
            debounce,
        })
    }

    /// Wire up an engine against the configured HTTP backend.
    pub fn from_config(mode: Mode, config: &BackendConfig) -> Result<Arc<Self>, SyncError> {
        let backend = Arc::new(HttpBackend::new(config)?);
        Ok(Self::with_debounce(
            mode,
            backend,
            Duration::from_millis(config.debounce_ms),
        ))
    }

    pub fn mode(&self) -> &Mode {
        self.router.mode()
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Snapshot of the authoritative collection.
    pub fn items(&self) -> Vec<ActionItem> {
        self.state.lock().items.clone()
    }

    /// The collection run through the filter pipeline. Computed fresh on
    /// every read; never cached across criteria changes.
    pub fn filtered_items(&self, now: DateTime<Utc>) -> Vec<ActionItem> {
        let state = self.state.lock();
        filter_items(&state.items, &state.criteria, self.router.mode(), now)
    }

    /// The filtered list grouped into board columns.
    pub fn board_view(&self, now: DateTime<Utc>) -> BoardView {
        group_by_status(&self.filtered_items(now))
    }

    pub fn criteria(&self) -> FilterCriteria {
        self.state.lock().criteria.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.lock().last_error.clone()
    }

    pub fn clear_error(&self) {
        self.state.lock().last_error = None;
    }

    // -----------------------------------------------------------------------
    // Fetch & criteria
    // -----------------------------------------------------------------------

    /// Full-replace the authoritative collection from the mode's list
    /// source. Idempotent. A failure clears the collection — the board
    /// never shows stale data behind an error flag. A response that lands
    /// after the criteria changed again, or after `close`, is discarded.
    pub async fn fetch(&self) -> Result<(), SyncError> {
        self.ensure_alive()?;
        let generation = self.generation.load(Ordering::SeqCst);
        let (criteria, snapshot) = {
            let mut state = self.state.lock();
            state.loading = true;
            (state.criteria.clone(), state.meeting_snapshot.clone())
        };

        let result = self.router.list(&criteria, &snapshot).await;

        let mut state = self.state.lock();
        if !self.alive.load(Ordering::SeqCst)
            || self.generation.load(Ordering::SeqCst) != generation
        {
            // A newer schedule owns the collection now.
            log::info!("fetch: discarding stale list response");
            return Ok(());
        }
        state.loading = false;
        match result {
            Ok(raws) => {
                state.items = normalize_all(&raws);
                state.last_error = None;
                log::debug!("fetch: collection replaced, {} item(s)", state.items.len());
                Ok(())
            }
            Err(e) => {
                let err = SyncError::Fetch(e);
                state.items.clear();
                state.last_error = Some(err.to_string());
                log::warn!("{}", err);
                Err(err)
            }
        }
    }

    /// Replace the filter criteria and schedule a debounced server
    /// refetch. Every change inside the quiescence window supersedes the
    /// previous timer, so a burst of keystrokes costs one request.
    pub fn set_criteria(self: &Arc<Self>, criteria: FilterCriteria) {
        if !self.alive.load(Ordering::SeqCst) {
            return;
        }
        self.state.lock().criteria = criteria;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        log::debug!("criteria changed, refetch scheduled (generation {})", generation);

        let engine = Arc::clone(self);
        let debounce = self.debounce;
        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if !engine.alive.load(Ordering::SeqCst)
                || engine.generation.load(Ordering::SeqCst) != generation
            {
                return;
            }
            if let Err(e) = engine.fetch().await {
                log::debug!("debounced refetch: {}", e);
            }
        });
    }

    /// Provide the meeting-derived snapshot. In meeting mode this is the
    /// list source, and supplying it applies it immediately.
    pub fn supply_meeting_items(&self, raws: Vec<RawItem>) {
        let mut state = self.state.lock();
        state.meeting_snapshot = raws;
        if matches!(self.router.mode(), Mode::Meeting { .. }) {
            state.items = normalize_all(&state.meeting_snapshot);
            state.loading = false;
        }
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Move an item to a new status (the board's drag between columns).
    pub async fn set_status(&self, id: &str, status: Status) -> Result<(), SyncError> {
        self.update_item(id, ItemPatch::status(status)).await
    }

    /// Patch an item. The optimistic guess is replaced by the backend's
    /// canonical record once it lands.
    pub async fn update_item(&self, id: &str, patch: ItemPatch) -> Result<(), SyncError> {
        self.ensure_alive()?;
        validate_id_slug(id, "id")?;
        let mut patch = patch;
        if let Some(t) = patch.task.take() {
            patch.task = Some(validate_bounded_string(
                &t,
                "task",
                TASK_MIN_CHARS,
                TASK_MAX_CHARS,
            )?);
        }

        let mutation = {
            let mut state = self.state.lock();
            Mutation::begin(&mut state.items, "update", |items| {
                if let Some(item) = items.iter_mut().find(|i| i.id == id) {
                    patch.apply_to(item);
                }
            })
        };

        match self.router.update(id, &patch).await {
            Ok(raw) => {
                let canonical = normalize(&raw);
                let mut state = self.state.lock();
                mutation.confirm(&mut state.items, Some((id, canonical)));
                Ok(())
            }
            Err(e) => {
                let err = SyncError::Mutation(e);
                let mut state = self.state.lock();
                mutation.rollback(&mut state.items);
                state.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Create an item in the mode's scope, then link it to any further
    /// requested projects. Creation and links are not atomic: a failed
    /// link leaves the item created and unlinked from that target, and the
    /// created id is returned inside the aggregate error.
    pub async fn create_item(&self, draft: ItemDraft) -> Result<String, SyncError> {
        self.ensure_alive()?;
        let task = validate_bounded_string(&draft.task, "task", TASK_MIN_CHARS, TASK_MAX_CHARS)?;
        for pid in &draft.linked_project_ids {
            validate_id_slug(pid, "projectId")?;
        }
        let draft = ItemDraft { task, ..draft };

        // Provisional entry the board shows until the canonical record
        // lands; the id is swapped on confirm.
        let provisional_id = format!("pending-{}", uuid::Uuid::new_v4());
        let provisional = ActionItem {
            id: provisional_id.clone(),
            task: draft.task.clone(),
            owner: draft.owner.clone(),
            status: Status::Pending,
            priority: draft.priority,
            due_date: draft.due_date,
            meeting_title: None,
            linked_project_ids: draft.linked_project_ids.clone(),
        };

        let mutation = {
            let mut state = self.state.lock();
            Mutation::begin(&mut state.items, "create", |items| {
                items.push(provisional.clone())
            })
        };

        let raw = match self.router.create(&draft).await {
            Ok(raw) => raw,
            Err(e) => {
                let err = SyncError::Mutation(e);
                let mut state = self.state.lock();
                mutation.rollback(&mut state.items);
                state.last_error = Some(err.to_string());
                return Err(err);
            }
        };

        let canonical = normalize(&raw);
        let created_id = canonical.id.clone();
        {
            let mut state = self.state.lock();
            mutation.confirm(&mut state.items, Some((provisional_id.as_str(), canonical)));
        }

        let mut failures = Vec::new();
        for pid in self.router.extra_link_targets(&draft) {
            match self.router.link(pid, &created_id).await {
                Ok(()) => self.apply_link_locally(&created_id, pid),
                Err(e) => {
                    log::warn!("create: link to project {} failed: {}", pid, e);
                    failures.push((pid.to_string(), e));
                }
            }
        }

        if failures.is_empty() {
            Ok(created_id)
        } else {
            let err = SyncError::PartialLink {
                created_id,
                failures,
            };
            self.state.lock().last_error = Some(err.to_string());
            Err(err)
        }
    }

    /// Remove an item from this mode's view. Global mode hard-deletes;
    /// project mode only severs the project↔item association; meeting
    /// items are read-only here.
    pub async fn delete_item(&self, id: &str) -> Result<(), SyncError> {
        self.ensure_alive()?;
        validate_id_slug(id, "id")?;
        if !self.router.supports_delete() {
            return Err(SyncError::Unsupported("delete"));
        }

        let mutation = {
            let mut state = self.state.lock();
            Mutation::begin(&mut state.items, "delete", |items| {
                items.retain(|i| i.id != id)
            })
        };

        match self.router.delete(id).await {
            Ok(()) => {
                let mut state = self.state.lock();
                mutation.confirm(&mut state.items, None);
                Ok(())
            }
            Err(e) => {
                let err = SyncError::Mutation(e);
                let mut state = self.state.lock();
                mutation.rollback(&mut state.items);
                state.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Hard delete, regardless of any project linkage. Exists only in
    /// global mode.
    pub async fn permanently_delete_item(&self, id: &str) -> Result<(), SyncError> {
        self.ensure_alive()?;
        validate_id_slug(id, "id")?;
        if !matches!(self.router.mode(), Mode::Global) {
            return Err(SyncError::Unsupported("permanent delete"));
        }

        let mutation = {
            let mut state = self.state.lock();
            Mutation::begin(&mut state.items, "permanent delete", |items| {
                items.retain(|i| i.id != id)
            })
        };

        match self.router.hard_delete(id).await {
            Ok(()) => {
                let mut state = self.state.lock();
                mutation.confirm(&mut state.items, None);
                Ok(())
            }
            Err(e) => {
                let err = SyncError::Mutation(e);
                let mut state = self.state.lock();
                mutation.rollback(&mut state.items);
                state.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Associate an item with a project.
    pub async fn link_to_project(&self, item_id: &str, project_id: &str) -> Result<(), SyncError> {
        self.ensure_alive()?;
        validate_id_slug(item_id, "id")?;
        validate_id_slug(project_id, "projectId")?;

        let mutation = {
            let mut state = self.state.lock();
            Mutation::begin(&mut state.items, "link", |items| {
                if let Some(item) = items.iter_mut().find(|i| i.id == item_id) {
                    if !item.linked_project_ids.iter().any(|p| p == project_id) {
                        item.linked_project_ids.push(project_id.to_string());
                    }
                }
            })
        };

        match self.router.link(project_id, item_id).await {
            Ok(()) => {
                let mut state = self.state.lock();
                mutation.confirm(&mut state.items, None);
                Ok(())
            }
            Err(e) => {
                let err = SyncError::Mutation(e);
                let mut state = self.state.lock();
                mutation.rollback(&mut state.items);
                state.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Dissociate an item from a project without affecting its existence
    /// elsewhere. In project mode, unlinking from the current project also
    /// drops the item from this view.
    pub async fn unlink_from_project(
        &self,
        item_id: &str,
        project_id: &str,
    ) -> Result<(), SyncError> {
        self.ensure_alive()?;
        validate_id_slug(item_id, "id")?;
        validate_id_slug(project_id, "projectId")?;

        let leaves_view = self.router.mode().project_id() == Some(project_id);
        let mutation = {
            let mut state = self.state.lock();
            Mutation::begin(&mut state.items, "unlink", |items| {
                if leaves_view {
                    items.retain(|i| i.id != item_id);
                } else if let Some(item) = items.iter_mut().find(|i| i.id == item_id) {
                    item.linked_project_ids.retain(|p| p != project_id);
                }
            })
        };

        match self.router.unlink(project_id, item_id).await {
            Ok(()) => {
                let mut state = self.state.lock();
                mutation.confirm(&mut state.items, None);
                Ok(())
            }
            Err(e) => {
                let err = SyncError::Mutation(e);
                let mut state = self.state.lock();
                mutation.rollback(&mut state.items);
                state.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Reconcile an item's project associations to `desired` (the edit
    /// dialog's bulk form). Issues only the delta link/unlink calls, each
    /// through the usual optimistic protocol; partial failure leaves the
    /// succeeded changes in place and surfaces one aggregate error.
    pub async fn set_item_links(
        &self,
        item_id: &str,
        desired: Vec<String>,
    ) -> Result<(), SyncError> {
        self.ensure_alive()?;
        validate_id_slug(item_id, "id")?;
        for pid in &desired {
            validate_id_slug(pid, "projectId")?;
        }

        let current = {
            let state = self.state.lock();
            match state.items.iter().find(|i| i.id == item_id) {
                Some(item) => item.linked_project_ids.clone(),
                None => {
                    return Err(SyncError::Validation {
                        field: "id",
                        reason: format!("no item {}", item_id),
                    })
                }
            }
        };

        let mut failures = Vec::new();
        for pid in desired.iter().filter(|p| !current.contains(p)) {
            if let Err(e) = self.link_to_project(item_id, pid).await {
                failures.push((pid.clone(), backend_cause(e)));
            }
        }
        for pid in current.iter().filter(|p| !desired.contains(p)) {
            if let Err(e) = self.unlink_from_project(item_id, pid).await {
                failures.push((pid.clone(), backend_cause(e)));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            let err = SyncError::LinkSync {
                item_id: item_id.to_string(),
                failures,
            };
            self.state.lock().last_error = Some(err.to_string());
            Err(err)
        }
    }

    /// Items that could still be linked in the current scope — backs the
    /// "available to link" picker. Read-only; the authoritative collection
    /// is untouched.
    pub async fn linkable_items(&self) -> Result<Vec<ActionItem>, SyncError> {
        self.ensure_alive()?;
        let raws = self.router.list_all().await.map_err(|e| {
            let err = SyncError::Fetch(e);
            self.state.lock().last_error = Some(err.to_string());
            err
        })?;
        let all = normalize_all(&raws);

        Ok(match self.router.mode() {
            Mode::Project { project_id } => all
                .into_iter()
                .filter(|i| !i.linked_project_ids.iter().any(|p| p == project_id))
                .collect(),
            _ => {
                let present: HashSet<String> =
                    self.state.lock().items.iter().map(|i| i.id.clone()).collect();
                all.into_iter().filter(|i| !present.contains(&i.id)).collect()
            }
        })
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Dispose the engine. Pending debounce timers are invalidated,
    /// in-flight responses become no-ops, and subsequent operations return
    /// [`SyncError::Closed`]. In-flight requests are not aborted — their
    /// resolution just has nowhere to land.
    pub fn close(&self) {
        self.alive.store(false, Ordering::SeqCst);
        self.generation.fetch_add(1, Ordering::SeqCst);
        log::debug!("engine closed");
    }

    fn ensure_alive(&self) -> Result<(), SyncError> {
        if self.alive.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SyncError::Closed)
        }
    }

    fn apply_link_locally(&self, item_id: &str, project_id: &str) {
        let mut state = self.state.lock();
        if let Some(item) = state.items.iter_mut().find(|i| i.id == item_id) {
            if !item.linked_project_ids.iter().any(|p| p == project_id) {
                item.linked_project_ids.push(project_id.to_string());
            }
        }
    }
}

/// Pull the transport error out of a single link/unlink failure for
/// aggregation.
fn backend_cause(err: SyncError) -> crate::backend::BackendError {
    match err {
        SyncError::Mutation(e) | SyncError::Fetch(e) => e,
        other => crate::backend::BackendError::Network(other.to_string()),
    }
}
