use std::collections::{BTreeSet, HashSet};
use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::date::CalendarDate;

/// Title given to tasks created or loaded with a blank title
pub const UNTITLED: &str = "Untitled";

/// Opaque, stable task identifier. New ids are millisecond timestamps,
/// bumped forward until they are unique within the document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        TaskId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A fresh id not present in `taken`.
    pub fn generate(taken: &HashSet<TaskId>) -> Self {
        TaskId(stamp_id(|candidate| taken.contains(candidate)))
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        TaskId(id.to_string())
    }
}

impl std::borrow::Borrow<str> for TaskId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_id(deserializer).map(TaskId)
    }
}

/// Timestamp-based id generator shared by tasks and checklists.
pub fn stamp_id(is_taken: impl Fn(&str) -> bool) -> String {
    let mut stamp = Utc::now().timestamp_millis();
    loop {
        let candidate = stamp.to_string();
        if !is_taken(&candidate) {
            return candidate;
        }
        stamp += 1;
    }
}

/// Ids have been written both as JSON strings and as bare numbers.
pub(crate) fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Float(f64),
    }
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Int(n) => n.to_string(),
        RawId::Float(n) => n.to_string(),
    })
}

/// Trimmed title, or the placeholder when blank.
pub fn normalize_title(title: &str) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        UNTITLED.to_string()
    } else {
        trimmed.to_string()
    }
}

/// The user-supplied parts of a new task; the id is assigned on insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub interval_days: u32,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, interval_days: u32) -> Self {
        TaskDraft {
            title: title.into(),
            interval_days,
        }
    }
}

/// A recurring task and its subtree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "TaskRecord")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    /// Days until the task is due again after a completion
    pub interval_days: u32,
    /// Days the task was marked done. Written newest first.
    #[serde(serialize_with = "serialize_newest_first")]
    pub completion_dates: BTreeSet<CalendarDate>,
    /// UI-only fold state; always true for a task without children
    pub collapsed: bool,
    /// Palette index
    pub swatch_id: u32,
    /// Literal background colour, overriding the palette entry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<String>,
    pub children: Vec<Task>,
}

impl Task {
    pub fn new(id: TaskId, title: &str) -> Self {
        Task {
            id,
            title: normalize_title(title),
            interval_days: 0,
            completion_dates: BTreeSet::new(),
            collapsed: true,
            swatch_id: 0,
            bg_color: None,
            children: Vec::new(),
        }
    }

    pub fn from_draft(id: TaskId, draft: &TaskDraft) -> Self {
        let mut task = Task::new(id, &draft.title);
        task.interval_days = draft.interval_days;
        task
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = normalize_title(title);
    }

    /// Most recent completion on or before `today`.
    pub fn last_completed(&self, today: CalendarDate) -> Option<CalendarDate> {
        self.completion_dates.range(..=today).next_back().copied()
    }

    /// `last_completed + interval_days`, if the task has been done at all.
    pub fn next_due(&self, today: CalendarDate) -> Option<CalendarDate> {
        self.last_completed(today)
            .map(|last| last.add_days(i64::from(self.interval_days)))
    }

    /// Add `date` if absent, remove it if present. Returns whether the task
    /// is now marked done on `date`.
    pub fn toggle_completion(&mut self, date: CalendarDate) -> bool {
        if self.completion_dates.remove(&date) {
            false
        } else {
            self.completion_dates.insert(date);
            true
        }
    }

    /// Pre-order walk over this task and its descendants.
    pub fn for_each(&self, f: &mut dyn FnMut(&Task)) {
        f(self);
        for child in &self.children {
            child.for_each(f);
        }
    }

    /// Number of tasks in this subtree, including itself.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Task::subtree_len).sum::<usize>()
    }
}

fn serialize_newest_first<S: Serializer>(
    dates: &BTreeSet<CalendarDate>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(dates.iter().rev())
}

/// Wire shape of a task. Absent fields take their defaults here, once, so
/// the rest of the crate never sees a half-filled task.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRecord {
    id: TaskId,
    #[serde(default)]
    title: String,
    #[serde(default)]
    interval_days: u32,
    #[serde(default)]
    completion_dates: Vec<CalendarDate>,
    #[serde(default)]
    collapsed: Option<bool>,
    #[serde(default)]
    swatch_id: u32,
    #[serde(default)]
    bg_color: Option<String>,
    #[serde(default)]
    children: Vec<Task>,
}

impl From<TaskRecord> for Task {
    fn from(record: TaskRecord) -> Self {
        let collapsed = record.children.is_empty() || record.collapsed.unwrap_or(true);
        Task {
            id: record.id,
            title: normalize_title(&record.title),
            interval_days: record.interval_days,
            completion_dates: record.completion_dates.into_iter().collect(),
            collapsed,
            swatch_id: record.swatch_id,
            bg_color: record.bg_color,
            children: record.children,
        }
    }
}
