use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Completion status of an action item.
///
/// In-memory state always holds this enum. The two string encodings the
/// backend speaks (hyphenated and underscore) exist only at the wire
/// boundary — see [`Status::from_wire`], [`Status::as_hyphenated`] and
/// [`Status::as_underscore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Pending,
    InProgress,
    Completed,
}

impl Default for Status {
    fn default() -> Self {
        Status::Pending
    }
}

impl Status {
    /// Decode a wire status. Accepts both the hyphenated and the underscore
    /// vocabulary; anything unrecognized (including empty) lands on
    /// `Pending` so no record is ever dropped over a status value.
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim() {
            "in-progress" | "in_progress" => Status::InProgress,
            "completed" => Status::Completed,
            _ => Status::Pending,
        }
    }

    /// Canonical hyphenated form (the board vocabulary).
    pub fn as_hyphenated(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::InProgress => "in-progress",
            Status::Completed => "completed",
        }
    }

    /// Underscore form, spoken by the shared update endpoint.
    pub fn as_underscore(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::InProgress => "in_progress",
            Status::Completed => "completed",
        }
    }
}

/// Action priority level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
    None,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::None
    }
}

impl Priority {
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim() {
            "high" => Priority::High,
            "medium" => Priority::Medium,
            "low" => Priority::Low,
            _ => Priority::None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
            Priority::None => "none",
        }
    }
}

/// Relative future-date cutoff for the board's time filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeHorizon {
    #[serde(rename = "all")]
    All,
    #[serde(rename = "1week")]
    OneWeek,
    #[serde(rename = "2weeks")]
    TwoWeeks,
    #[serde(rename = "1month")]
    OneMonth,
    #[serde(rename = "3months")]
    ThreeMonths,
    #[serde(rename = "6months")]
    SixMonths,
    #[serde(rename = "1year")]
    OneYear,
}

impl Default for TimeHorizon {
    fn default() -> Self {
        TimeHorizon::All
    }
}

impl TimeHorizon {
    /// Horizon width in days. `None` means no cutoff is applied.
    pub fn offset_days(self) -> Option<i64> {
        match self {
            TimeHorizon::All => None,
            TimeHorizon::OneWeek => Some(7),
            TimeHorizon::TwoWeeks => Some(14),
            TimeHorizon::OneMonth => Some(30),
            TimeHorizon::ThreeMonths => Some(90),
            TimeHorizon::SixMonths => Some(180),
            TimeHorizon::OneYear => Some(365),
        }
    }
}

/// Scoping context for an engine instance. Fixed for the engine's lifetime;
/// every routing decision derives from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// The global task pool.
    Global,
    /// Items linked to one project.
    Project { project_id: String },
    /// Read-mostly snapshot of items extracted from one meeting transcript.
    Meeting { transcription_id: String },
}

impl Mode {
    pub fn is_project(&self) -> bool {
        matches!(self, Mode::Project { .. })
    }

    pub fn project_id(&self) -> Option<&str> {
        match self {
            Mode::Project { project_id } => Some(project_id),
            _ => None,
        }
    }
}

/// Filter settings for the board view. Purely derivational — no field here
/// ever mutates item data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterCriteria {
    pub filter_user_name: String,
    pub show_only_my_tasks: bool,
    pub time_horizon: TimeHorizon,
    /// Honored in project mode only.
    pub show_completed: bool,
    pub search_query: String,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            filter_user_name: String::new(),
            show_only_my_tasks: false,
            time_horizon: TimeHorizon::All,
            show_completed: true,
            search_query: String::new(),
        }
    }
}

/// A canonical action item as held in the authoritative collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub id: String,
    /// Display text. May be empty when the source record carried no usable
    /// label — the item is still valid, just unlabeled.
    pub task: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub status: Status,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Present only for meeting-sourced items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_title: Option<String>,
    /// Backend-owned project associations, mirrored transiently for the
    /// edit dialog's link reconciliation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub linked_project_ids: Vec<String>,
}

/// An action item as the backend sends it, before normalization. Every
/// field is defaulted so any object-shaped record deserializes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawItem {
    pub id: String,
    pub task: Option<String>,
    pub description: Option<String>,
    pub title: Option<String>,
    pub owner: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
    pub meeting_title: Option<String>,
    pub linked_project_ids: Vec<String>,
}

/// Request payload for creating an action item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemDraft {
    pub task: String,
    pub owner: Option<String>,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    /// Projects the item should be linked to after creation.
    pub linked_project_ids: Vec<String>,
}

/// Request payload for updating an action item. Only present fields are
/// sent; `clear_*` flags explicitly null a field out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemPatch {
    pub task: Option<String>,
    pub owner: Option<String>,
    pub clear_owner: bool,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDate>,
    pub clear_due_date: bool,
}

impl ItemPatch {
    /// A patch that only moves the status.
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Apply this patch to an in-memory item (the optimistic guess the
    /// board shows until the canonical record lands).
    pub fn apply_to(&self, item: &mut ActionItem) {
        if let Some(ref t) = self.task {
            item.task = t.clone();
        }
        if self.clear_owner {
            item.owner = None;
        } else if let Some(ref o) = self.owner {
            item.owner = Some(o.clone());
        }
        if let Some(s) = self.status {
            item.status = s;
        }
        if let Some(p) = self.priority {
            item.priority = p;
        }
        if self.clear_due_date {
            item.due_date = None;
        } else if let Some(d) = self.due_date {
            item.due_date = Some(d);
        }
    }
}
