//! Optimistic Mutation Coordinator.
//!
//! Every mutating operation runs the same protocol: snapshot the whole
//! collection, apply the intended end state locally, attempt the remote
//! call, then either confirm (canonical record supersedes the guess) or
//! roll back to the exact snapshot. Lifecycle per mutation:
//! `Idle → Applied → Confirmed | RolledBack`.
//!
//! `begin` runs before the caller's first await point, so the optimistic
//! state is visible to every reader while the network call is in flight.
//! Same-item double mutation is an accepted last-resolved-wins race; each
//! call carries its own snapshot and resolves independently.

use crate::types::ActionItem;

pub(crate) struct Mutation {
    label: &'static str,
    snapshot: Vec<ActionItem>,
}

impl Mutation {
    /// Snapshot the collection and apply the optimistic change in one
    /// step, under the caller's lock.
    pub fn begin(
        items: &mut Vec<ActionItem>,
        label: &'static str,
        apply: impl FnOnce(&mut Vec<ActionItem>),
    ) -> Self {
        let snapshot = items.clone();
        apply(items);
        log::debug!("{}: optimistic change applied", label);
        Mutation { label, snapshot }
    }

    /// The backend confirmed. When it returned a canonical record, that
    /// record replaces the optimistic guess stored under `id` (which may
    /// be a provisional id for an inserted item).
    pub fn confirm(self, items: &mut [ActionItem], canonical: Option<(&str, ActionItem)>) {
        if let Some((id, canon)) = canonical {
            if let Some(slot) = items.iter_mut().find(|i| i.id == id) {
                *slot = canon;
            }
        }
        log::debug!("{}: confirmed", self.label);
    }

    /// The backend rejected. Restore the exact pre-mutation snapshot —
    /// all-or-nothing, never a partial undo.
    pub fn rollback(self, items: &mut Vec<ActionItem>) {
        *items = self.snapshot;
        log::warn!("{}: backend call failed, rolled back", self.label);
    }
}
