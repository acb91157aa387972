//! View Derivation — groups a (filtered) item list into the board's three
//! status columns.

use serde::Serialize;

use crate::types::{ActionItem, Status};

/// The grouped board view. Serialized bucket keys use the board's
/// hyphenated vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoardView {
    pub pending: Vec<ActionItem>,
    #[serde(rename = "in-progress")]
    pub in_progress: Vec<ActionItem>,
    pub completed: Vec<ActionItem>,
}

impl BoardView {
    pub fn total(&self) -> usize {
        self.pending.len() + self.in_progress.len() + self.completed.len()
    }
}

/// Partition items into columns by status. Non-canonical status strings
/// were already collapsed to `Pending` at the wire boundary
/// (`Status::from_wire`), which is what keeps this match exhaustive — an
/// unrecognized status ends up on the board instead of vanishing.
pub fn group_by_status(items: &[ActionItem]) -> BoardView {
    let mut view = BoardView::default();
    for item in items {
        match item.status {
            Status::Pending => view.pending.push(item.clone()),
            Status::InProgress => view.in_progress.push(item.clone()),
            Status::Completed => view.completed.push(item.clone()),
        }
    }
    view
}
