//! Filter Pipeline — pure derivation from the authoritative collection.
//!
//! Stages run in a fixed narrowing order: time horizon, owner, completed
//! visibility (project mode only), then search. Each stage sees only what
//! the previous one let through. Input order is preserved; no sort here.

use chrono::{DateTime, Duration, Utc};

use crate::types::{ActionItem, FilterCriteria, Mode, Status};

pub fn filter_items(
    items: &[ActionItem],
    criteria: &FilterCriteria,
    mode: &Mode,
    now: DateTime<Utc>,
) -> Vec<ActionItem> {
    items
        .iter()
        .filter(|i| passes_time_horizon(i, criteria, now))
        .filter(|i| passes_owner(i, criteria))
        .filter(|i| passes_completed_visibility(i, criteria, mode))
        .filter(|i| passes_search(i, &criteria.search_query))
        .cloned()
        .collect()
}

/// Horizon rule: no due date always passes; an overdue item passes as long
/// as it is not completed (it must stay visible no matter how narrow the
/// window); otherwise the due date has to fall inside `[today, today+offset]`.
fn passes_time_horizon(item: &ActionItem, criteria: &FilterCriteria, now: DateTime<Utc>) -> bool {
    let Some(offset_days) = criteria.time_horizon.offset_days() else {
        return true;
    };
    let Some(due) = item.due_date else {
        return true;
    };

    let today = now.date_naive();
    if due < today {
        return item.status != Status::Completed;
    }
    due <= today + Duration::days(offset_days)
}

fn passes_owner(item: &ActionItem, criteria: &FilterCriteria) -> bool {
    if !criteria.show_only_my_tasks {
        return true;
    }
    let me = criteria.filter_user_name.trim();
    if me.is_empty() {
        return true;
    }
    match item.owner.as_deref() {
        Some(owner) => owner.trim().to_lowercase() == me.to_lowercase(),
        None => false,
    }
}

fn passes_completed_visibility(
    item: &ActionItem,
    criteria: &FilterCriteria,
    mode: &Mode,
) -> bool {
    if mode.is_project() && !criteria.show_completed {
        return item.status != Status::Completed;
    }
    true
}

fn passes_search(item: &ActionItem, query: &str) -> bool {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return true;
    }
    let hit = |field: &str| field.to_lowercase().contains(&q);
    hit(&item.task)
        || item.owner.as_deref().map(hit).unwrap_or(false)
        || item.meeting_title.as_deref().map(hit).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Priority, TimeHorizon};
    use chrono::{NaiveDate, TimeZone};

    fn item(id: &str, status: Status, due: Option<NaiveDate>) -> ActionItem {
        ActionItem {
            id: id.to_string(),
            task: format!("Task {}", id),
            owner: None,
            status,
            priority: Priority::None,
            due_date: due,
            meeting_title: None,
            linked_project_ids: vec![],
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn all_horizon_skips_time_filter() {
        let items = vec![item("1", Status::Pending, Some(date(2030, 1, 1)))];
        let criteria = FilterCriteria::default();
        assert_eq!(filter_items(&items, &criteria, &Mode::Global, now()).len(), 1);
    }

    #[test]
    fn overdue_incomplete_survives_narrow_horizon() {
        // Due yesterday, still pending: passes 1week even though yesterday
        // is outside [now, now+7d].
        let items = vec![item("1", Status::Pending, Some(date(2026, 8, 6)))];
        let criteria = FilterCriteria {
            time_horizon: TimeHorizon::OneWeek,
            ..FilterCriteria::default()
        };
        assert_eq!(filter_items(&items, &criteria, &Mode::Global, now()).len(), 1);
    }

    #[test]
    fn overdue_completed_is_dropped_by_horizon() {
        let items = vec![item("1", Status::Completed, Some(date(2026, 8, 6)))];
        let criteria = FilterCriteria {
            time_horizon: TimeHorizon::OneWeek,
            ..FilterCriteria::default()
        };
        assert!(filter_items(&items, &criteria, &Mode::Global, now()).is_empty());
    }

    #[test]
    fn horizon_window_is_inclusive() {
        let items = vec![
            item("today", Status::Pending, Some(date(2026, 8, 7))),
            item("limit", Status::Pending, Some(date(2026, 8, 14))),
            item("past-limit", Status::Pending, Some(date(2026, 8, 15))),
            item("undated", Status::Pending, None),
        ];
        let criteria = FilterCriteria {
            time_horizon: TimeHorizon::OneWeek,
            ..FilterCriteria::default()
        };
        let kept: Vec<String> = filter_items(&items, &criteria, &Mode::Global, now())
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(kept, vec!["today", "limit", "undated"]);
    }

    #[test]
    fn owner_filter_is_trimmed_and_case_insensitive() {
        let mut a = item("1", Status::Pending, None);
        a.owner = Some("  Alice Smith ".into());
        let mut b = item("2", Status::Pending, None);
        b.owner = Some("Bob".into());
        let c = item("3", Status::Pending, None); // ownerless: excluded

        let criteria = FilterCriteria {
            show_only_my_tasks: true,
            filter_user_name: "alice smith".into(),
            ..FilterCriteria::default()
        };
        let kept = filter_items(&[a, b, c], &criteria, &Mode::Global, now());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "1");
    }

    #[test]
    fn owner_filter_inert_without_name() {
        let items = vec![item("1", Status::Pending, None)];
        let criteria = FilterCriteria {
            show_only_my_tasks: true,
            filter_user_name: "   ".into(),
            ..FilterCriteria::default()
        };
        assert_eq!(filter_items(&items, &criteria, &Mode::Global, now()).len(), 1);
    }

    #[test]
    fn completed_hidden_only_in_project_mode() {
        let items = vec![
            item("1", Status::Completed, None),
            item("2", Status::Pending, None),
        ];
        let criteria = FilterCriteria {
            show_completed: false,
            ..FilterCriteria::default()
        };

        let project = Mode::Project {
            project_id: "12".into(),
        };
        let kept = filter_items(&items, &criteria, &project, now());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "2");

        // Global mode ignores the flag.
        assert_eq!(filter_items(&items, &criteria, &Mode::Global, now()).len(), 2);
    }

    #[test]
    fn search_matches_any_of_task_owner_meeting_title() {
        let mut a = item("1", Status::Pending, None);
        a.owner = Some("Alice Smith".into());
        let mut b = item("2", Status::Pending, None);
        b.owner = Some("Bob".into());
        b.task = "Quarterly review".into();
        let mut c = item("3", Status::Pending, None);
        c.meeting_title = Some("Alice 1:1".into());

        let criteria = FilterCriteria {
            search_query: " alice ".into(),
            ..FilterCriteria::default()
        };
        let kept: Vec<String> = filter_items(&[a, b, c], &criteria, &Mode::Global, now())
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(kept, vec!["1", "3"]);
    }

    #[test]
    fn filter_is_idempotent_and_order_preserving() {
        let mut a = item("1", Status::Pending, Some(date(2026, 8, 9)));
        a.owner = Some("Alice".into());
        let mut b = item("2", Status::InProgress, Some(date(2026, 8, 6)));
        b.owner = Some("alice".into());
        let mut c = item("3", Status::Pending, None);
        c.owner = Some("Bob".into());

        let criteria = FilterCriteria {
            time_horizon: TimeHorizon::OneWeek,
            show_only_my_tasks: true,
            filter_user_name: "Alice".into(),
            ..FilterCriteria::default()
        };
        let items = vec![a, b, c];
        let once = filter_items(&items, &criteria, &Mode::Global, now());
        let twice = filter_items(&once, &criteria, &Mode::Global, now());
        assert_eq!(once, twice);
        let ids: Vec<&str> = once.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }
}
