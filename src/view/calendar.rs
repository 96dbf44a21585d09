use serde::Serialize;

use crate::model::date::CalendarDate;
use crate::model::document::{DateRange, Document};
use crate::model::path::TaskPath;
use crate::ops::recurrence::{CellStatus, classify};
use crate::view::flatten::flatten_visible;

/// Every day from `start` to `end`, inclusive. Empty when `end < start`.
pub fn generate_date_range(start: CalendarDate, end: CalendarDate) -> Vec<CalendarDate> {
    let mut dates = Vec::new();
    let mut date = start;
    while date <= end {
        dates.push(date);
        let next = date.add_days(1);
        if next == date {
            break;
        }
        date = next;
    }
    dates
}

/// One task on one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub date: CalendarDate,
    #[serde(flatten)]
    pub status: CellStatus,
    pub is_today: bool,
    pub is_holiday: bool,
}

/// One visible task across the whole date range
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarRow {
    pub task_id: String,
    pub path: TaskPath,
    pub depth: usize,
    pub title: String,
    pub full_title: String,
    pub cells: Vec<Cell>,
}

/// The date × task grid the calendar view renders. Keys are camelCase,
/// like the stored document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarMatrix {
    pub today: CalendarDate,
    pub dates: Vec<CalendarDate>,
    pub rows: Vec<CalendarRow>,
}

/// Classify every visible task on every day of `range`.
pub fn build_calendar_matrix(doc: &Document, range: DateRange, today: CalendarDate) -> CalendarMatrix {
    let dates = generate_date_range(range.start, range.end);
    let rows = flatten_visible(&doc.tasks)
        .into_iter()
        .map(|row| CalendarRow {
            task_id: row.task.id.to_string(),
            cells: dates
                .iter()
                .map(|&date| Cell {
                    date,
                    status: classify(row.task, date, today),
                    is_today: date == today,
                    is_holiday: doc.is_holiday(date),
                })
                .collect(),
            path: row.path,
            depth: row.depth,
            title: row.task.title.clone(),
            full_title: row.full_title,
        })
        .collect();
    CalendarMatrix { today, dates, rows }
}
