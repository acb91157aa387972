//! Item Normalizer — coerces heterogeneous raw records into the canonical
//! [`ActionItem`] shape.
//!
//! Total over any object-shaped input: missing fields degrade to defaults,
//! never to an error. Display text falls through the alias chain
//! task → description → title; if every alias is empty the item stays
//! valid but unlabeled.

use chrono::NaiveDate;

use crate::types::{ActionItem, Priority, RawItem, Status};

pub fn normalize(raw: &RawItem) -> ActionItem {
    ActionItem {
        id: raw.id.clone(),
        task: first_non_empty(&[&raw.task, &raw.description, &raw.title]),
        owner: non_empty(&raw.owner),
        status: raw
            .status
            .as_deref()
            .map(Status::from_wire)
            .unwrap_or_default(),
        priority: raw
            .priority
            .as_deref()
            .map(Priority::from_wire)
            .unwrap_or_default(),
        due_date: raw.due_date.as_deref().and_then(parse_due_date),
        meeting_title: non_empty(&raw.meeting_title),
        linked_project_ids: raw.linked_project_ids.clone(),
    }
}

pub fn normalize_all(raws: &[RawItem]) -> Vec<ActionItem> {
    raws.iter().map(normalize).collect()
}

fn first_non_empty(candidates: &[&Option<String>]) -> String {
    candidates
        .iter()
        .filter_map(|c| c.as_deref())
        .find(|s| !s.is_empty())
        .unwrap_or("")
        .to_string()
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|s| !s.is_empty()).map(String::from)
}

/// Lenient ISO-8601 date parse: a bare `YYYY-MM-DD` or the date prefix of
/// a full timestamp. Unparseable input degrades to `None`.
fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
