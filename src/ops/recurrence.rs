use serde::Serialize;

use crate::model::date::CalendarDate;
use crate::model::task::Task;

/// Whether a completion mark sits on or before today, or ahead of it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DoneWhen {
    Past,
    Future,
}

/// Status of one task on one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CellStatus {
    /// The task was (or is planned to be) done on this day
    Done { when: DoneWhen },
    /// `days` left until the next due date; 0 means due on this day
    Pending { days: i64 },
    /// `days` past the due date; always at least 1
    Overdue { days: i64 },
    /// The day precedes the task's whole completion history
    Normal,
}

impl CellStatus {
    /// Stable name for the status, e.g. for styling a cell
    pub fn kind(&self) -> &'static str {
        match self {
            CellStatus::Done {
                when: DoneWhen::Past,
            } => "done-past",
            CellStatus::Done {
                when: DoneWhen::Future,
            } => "done-future",
            CellStatus::Pending { .. } => "pending",
            CellStatus::Overdue { .. } => "overdue",
            CellStatus::Normal => "normal",
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, CellStatus::Done { .. })
    }
}

/// Classify `task` on `date`.
///
/// 1. A completion on `date` is `Done`, past or future relative to `today`.
/// 2. Otherwise the countdown runs from the latest completion on or before
///    `date` (not before `today`), so days behind the newest mark still
///    read correctly.
/// 3. With no earlier completion the day is `Normal`.
/// 4. `next = prev + interval`; a non-negative gap is `Pending`, a negative
///    one `Overdue`. Due-today is `Pending { days: 0 }`.
pub fn classify(task: &Task, date: CalendarDate, today: CalendarDate) -> CellStatus {
    if task.completion_dates.contains(&date) {
        let when = if date <= today {
            DoneWhen::Past
        } else {
            DoneWhen::Future
        };
        return CellStatus::Done { when };
    }

    let Some(prev) = task.completion_dates.range(..=date).next_back() else {
        return CellStatus::Normal;
    };

    let next = prev.add_days(i64::from(task.interval_days));
    let diff = next.days_since(date);
    if diff >= 0 {
        CellStatus::Pending { days: diff }
    } else {
        CellStatus::Overdue { days: -diff }
    }
}

/// Status of `task` on `today` itself.
pub fn status_today(task: &Task, today: CalendarDate) -> CellStatus {
    classify(task, today, today)
}
