use std::collections::{BTreeSet, HashSet};
use std::mem;

use serde::{Deserialize, Serialize};

use super::date::CalendarDate;
use super::task::{Task, TaskId, deserialize_id};

/// A free-text note shown beside the calendar
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memo {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub swatch_id: u32,
}

/// A numbered checklist: the numbers `start_number..=end_number`, some of
/// which are ticked off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistList {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub start_number: i64,
    #[serde(default)]
    pub end_number: i64,
    #[serde(default)]
    pub swatch_id: u32,
    #[serde(default)]
    pub done_numbers: BTreeSet<i64>,
}

impl ChecklistList {
    pub fn contains(&self, number: i64) -> bool {
        (self.start_number..=self.end_number).contains(&number)
    }

    /// Ticked numbers that fall inside the list's range.
    pub fn done_in_range(&self) -> usize {
        self.done_numbers
            .range(self.start_number..=self.end_number)
            .count()
    }

    /// Count of numbers in the range, saturating at `usize::MAX`.
    pub fn len(&self) -> usize {
        // i128 holds end - start + 1 for any pair of i64 bounds
        let span = i128::from(self.end_number) - i128::from(self.start_number) + 1;
        if span <= 0 {
            0
        } else {
            usize::try_from(span).unwrap_or(usize::MAX)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Inclusive span of visible calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: CalendarDate,
    pub end: CalendarDate,
}

impl DateRange {
    pub fn new(start: CalendarDate, end: CalendarDate) -> Self {
        DateRange { start, end }
    }

    /// `today - before ..= today + after`
    pub fn around(today: CalendarDate, before: u32, after: u32) -> Self {
        DateRange {
            start: today.add_days(-i64::from(before)),
            end: today.add_days(i64::from(after)),
        }
    }

    pub fn contains(&self, date: CalendarDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn is_inverted(&self) -> bool {
        self.end < self.start
    }
}

/// The whole persistable unit: the task forest and its sibling collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Owner key in multi-user deployments; carried through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub memos: Vec<Memo>,
    #[serde(default)]
    pub lists: Vec<ChecklistList>,
    #[serde(default)]
    pub holidays: BTreeSet<CalendarDate>,
    #[serde(default, with = "calendar_range")]
    pub calendar_range: Option<DateRange>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Document {
            tasks,
            ..Default::default()
        }
    }

    /// Every task id in the forest.
    pub fn task_ids(&self) -> HashSet<TaskId> {
        let mut ids = HashSet::new();
        for task in &self.tasks {
            task.for_each(&mut |t| {
                ids.insert(t.id.clone());
            });
        }
        ids
    }

    pub fn task_count(&self) -> usize {
        self.tasks.iter().map(Task::subtree_len).sum()
    }

    pub fn is_holiday(&self, date: CalendarDate) -> bool {
        self.holidays.contains(&date)
    }

    /// The stored calendar range, or a window around `today`.
    pub fn visible_range(&self, today: CalendarDate, before: u32, after: u32) -> DateRange {
        self.calendar_range
            .unwrap_or_else(|| DateRange::around(today, before, after))
    }

    /// Deep copy of the undoable state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tasks: self.tasks.clone(),
            memos: self.memos.clone(),
            lists: self.lists.clone(),
            holidays: self.holidays.clone(),
            calendar_range: self.calendar_range,
        }
    }

    /// True when the undoable state equals `snapshot`.
    pub fn matches_snapshot(&self, snapshot: &Snapshot) -> bool {
        self.tasks == snapshot.tasks
            && self.memos == snapshot.memos
            && self.lists == snapshot.lists
            && self.holidays == snapshot.holidays
            && self.calendar_range == snapshot.calendar_range
    }

    /// Replace the undoable state with `snapshot`.
    pub fn restore(&mut self, snapshot: Snapshot) {
        let _ = self.swap_snapshot(snapshot);
    }

    /// Install `snapshot` and hand back the state it replaced, without cloning.
    pub fn swap_snapshot(&mut self, snapshot: Snapshot) -> Snapshot {
        Snapshot {
            tasks: mem::replace(&mut self.tasks, snapshot.tasks),
            memos: mem::replace(&mut self.memos, snapshot.memos),
            lists: mem::replace(&mut self.lists, snapshot.lists),
            holidays: mem::replace(&mut self.holidays, snapshot.holidays),
            calendar_range: mem::replace(&mut self.calendar_range, snapshot.calendar_range),
        }
    }
}

/// Point-in-time capture of everything undo/redo restores. Owned values
/// only, so later edits to the live document never reach a stored snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub tasks: Vec<Task>,
    pub memos: Vec<Memo>,
    pub lists: Vec<ChecklistList>,
    pub holidays: BTreeSet<CalendarDate>,
    pub calendar_range: Option<DateRange>,
}

/// `calendarRange` is written as `{start, end}`, or `{}` when unset.
/// Missing, null, empty-string and half-filled ranges all load as unset.
mod calendar_range {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::DateRange;
    use crate::model::date::CalendarDate;

    #[derive(Serialize, Deserialize, Default)]
    struct RawRange {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        end: Option<String>,
    }

    pub fn serialize<S: Serializer>(range: &Option<DateRange>, serializer: S) -> Result<S::Ok, S::Error> {
        let raw = match range {
            Some(range) => RawRange {
                start: Some(range.start.format()),
                end: Some(range.end.format()),
            },
            None => RawRange::default(),
        };
        raw.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateRange>, D::Error> {
        let Some(raw) = Option::<RawRange>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let parse = |field: Option<String>| -> Result<Option<CalendarDate>, D::Error> {
            match field.as_deref().map(str::trim) {
                None | Some("") => Ok(None),
                Some(text) => CalendarDate::parse(text)
                    .map(Some)
                    .map_err(serde::de::Error::custom),
            }
        };
        match (parse(raw.start)?, parse(raw.end)?) {
            (Some(start), Some(end)) => Ok(Some(DateRange { start, end })),
            _ => Ok(None),
        }
    }
}
