//! Scripted in-memory backend for router and engine tests.
//!
//! Holds a server-side item store, records every call it receives, and can
//! be scripted to fail a given operation — either wholesale
//! (`fail_on("updateItem")`) or for one argument
//! (`fail_on("linkItemToProject:4")`).

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::backend::{BackendError, TaskBackend, WireDraft, WirePatch};
use crate::types::RawItem;

#[derive(Default)]
pub(crate) struct MockBackend {
    store: Mutex<Vec<RawItem>>,
    fail: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
    next_id: AtomicU64,
    list_gate: Mutex<Option<Arc<Notify>>>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed(&self, items: Vec<RawItem>) {
        *self.store.lock() = items;
    }

    pub fn store(&self) -> Vec<RawItem> {
        self.store.lock().clone()
    }

    pub fn fail_on(&self, key: &str) {
        self.fail.lock().insert(key.to_string());
    }

    pub fn clear_failures(&self) {
        self.fail.lock().clear();
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Make list calls block until the returned handle is notified.
    pub fn gate_lists(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.list_gate.lock() = Some(gate.clone());
        gate
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }

    fn check(&self, op: &str, arg: &str) -> Result<(), BackendError> {
        let fail = self.fail.lock();
        if fail.contains(op) || fail.contains(&format!("{}:{}", op, arg)) {
            return Err(BackendError::Network(format!("scripted failure: {}", op)));
        }
        Ok(())
    }

    async fn wait_gate(&self) {
        let gate = self.list_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    fn assign_id(&self) -> String {
        format!("srv-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn draft_to_item(&self, draft: &WireDraft) -> RawItem {
        RawItem {
            id: self.assign_id(),
            task: Some(draft.task.clone()),
            owner: draft.owner.clone(),
            status: Some("pending".to_string()),
            priority: Some(draft.priority.clone()),
            due_date: draft.due_date.clone(),
            ..RawItem::default()
        }
    }

    fn patch_in_store(&self, id: &str, patch: &WirePatch) -> Result<RawItem, BackendError> {
        let mut store = self.store.lock();
        let item = store
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| BackendError::Http {
                status: 404,
                body: format!("no item {}", id),
            })?;
        if let Some(ref t) = patch.task {
            item.task = Some(t.clone());
        }
        if let Some(ref o) = patch.owner {
            item.owner = o.clone();
        }
        if let Some(ref s) = patch.status {
            item.status = Some(s.clone());
        }
        if let Some(ref p) = patch.priority {
            item.priority = Some(p.clone());
        }
        if let Some(ref d) = patch.due_date {
            item.due_date = d.clone();
        }
        Ok(item.clone())
    }
}

#[async_trait]
impl TaskBackend for MockBackend {
    async fn list_global_items(&self) -> Result<Vec<RawItem>, BackendError> {
        self.record("listGlobalItems".to_string());
        self.check("listGlobalItems", "")?;
        self.wait_gate().await;
        Ok(self.store.lock().clone())
    }

    async fn list_project_items(
        &self,
        project_id: &str,
        owner: Option<&str>,
    ) -> Result<Vec<RawItem>, BackendError> {
        self.record(format!(
            "listProjectItems({},{})",
            project_id,
            owner.unwrap_or("")
        ));
        self.check("listProjectItems", project_id)?;
        self.wait_gate().await;
        Ok(self
            .store
            .lock()
            .iter()
            .filter(|i| i.linked_project_ids.iter().any(|p| p == project_id))
            .filter(|i| owner.is_none() || i.owner.as_deref() == owner)
            .cloned()
            .collect())
    }

    async fn list_all_items(&self) -> Result<Vec<RawItem>, BackendError> {
        self.record("listAllItems".to_string());
        self.check("listAllItems", "")?;
        Ok(self.store.lock().clone())
    }

    async fn create_global_item(&self, payload: &WireDraft) -> Result<RawItem, BackendError> {
        self.record(format!("createGlobalItem({})", payload.task));
        self.check("createGlobalItem", &payload.task)?;
        let item = self.draft_to_item(payload);
        self.store.lock().push(item.clone());
        Ok(item)
    }

    async fn create_project_item(
        &self,
        project_id: &str,
        payload: &WireDraft,
    ) -> Result<RawItem, BackendError> {
        self.record(format!("createProjectItem({},{})", project_id, payload.task));
        self.check("createProjectItem", project_id)?;
        let mut item = self.draft_to_item(payload);
        item.linked_project_ids = vec![project_id.to_string()];
        self.store.lock().push(item.clone());
        Ok(item)
    }

    async fn create_meeting_item(
        &self,
        transcription_id: &str,
        payload: &WireDraft,
    ) -> Result<RawItem, BackendError> {
        self.record(format!(
            "createMeetingItem({},{})",
            transcription_id, payload.task
        ));
        self.check("createMeetingItem", transcription_id)?;
        let item = self.draft_to_item(payload);
        self.store.lock().push(item.clone());
        Ok(item)
    }

    async fn update_item(&self, id: &str, payload: &WirePatch) -> Result<RawItem, BackendError> {
        self.record(format!("updateItem({})", id));
        self.check("updateItem", id)?;
        self.patch_in_store(id, payload)
    }

    async fn update_global_item(
        &self,
        id: &str,
        payload: &WirePatch,
    ) -> Result<RawItem, BackendError> {
        self.record(format!("updateGlobalItem({})", id));
        self.check("updateGlobalItem", id)?;
        self.patch_in_store(id, payload)
    }

    async fn delete_item(&self, id: &str) -> Result<(), BackendError> {
        self.record(format!("deleteItem({})", id));
        self.check("deleteItem", id)?;
        self.store.lock().retain(|i| i.id != id);
        Ok(())
    }

    async fn link_item_to_project(
        &self,
        project_id: &str,
        item_id: &str,
    ) -> Result<(), BackendError> {
        self.record(format!("linkItemToProject({},{})", project_id, item_id));
        self.check("linkItemToProject", project_id)?;
        let mut store = self.store.lock();
        if let Some(item) = store.iter_mut().find(|i| i.id == item_id) {
            if !item.linked_project_ids.iter().any(|p| p == project_id) {
                item.linked_project_ids.push(project_id.to_string());
            }
        }
        Ok(())
    }

    async fn unlink_item_from_project(
        &self,
        project_id: &str,
        item_id: &str,
    ) -> Result<(), BackendError> {
        self.record(format!("unlinkItemFromProject({},{})", project_id, item_id));
        self.check("unlinkItemFromProject", project_id)?;
        let mut store = self.store.lock();
        if let Some(item) = store.iter_mut().find(|i| i.id == item_id) {
            item.linked_project_ids.retain(|p| p != project_id);
        }
        Ok(())
    }
}
