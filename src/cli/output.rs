use serde::Serialize;

use crate::model::date::CalendarDate;
use crate::model::document::{ChecklistList, Memo};
use crate::ops::check::{CheckError, CheckResult, CheckWarning};
use crate::ops::command::Applied;
use crate::ops::recurrence::{CellStatus, DoneWhen, status_today};
use crate::util::unicode::pad_to_width;
use crate::view::calendar::CalendarMatrix;
use crate::view::flatten::FlatRow;

/// Width of the title column in the calendar grid
const TITLE_COLUMN: usize = 24;
/// Width of one day column in the calendar grid
const DAY_COLUMN: usize = 3;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRowJson {
    pub id: String,
    pub path: String,
    pub depth: usize,
    pub title: String,
    pub full_title: String,
    pub interval_days: u32,
    pub collapsed: bool,
    pub children: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_completed: Option<CalendarDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_due: Option<CalendarDate>,
    pub today: CellStatus,
}

#[derive(Serialize)]
pub struct MemoJson<'a> {
    pub index: usize,
    #[serde(flatten)]
    pub memo: &'a Memo,
}

#[derive(Serialize)]
pub struct ChecklistJson<'a> {
    #[serde(flatten)]
    pub list: &'a ChecklistList,
    pub done: usize,
    pub total: usize,
}

/// What a write command reports
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedJson {
    pub command: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toggled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_id: Option<String>,
}

pub fn row_to_json(row: &FlatRow<'_>, today: CalendarDate) -> TaskRowJson {
    let task = row.task;
    TaskRowJson {
        id: task.id.to_string(),
        path: row.path.to_string(),
        depth: row.depth,
        title: task.title.clone(),
        full_title: row.full_title.clone(),
        interval_days: task.interval_days,
        collapsed: task.collapsed,
        children: task.children.len(),
        last_completed: task.last_completed(today),
        next_due: task.next_due(today),
        today: status_today(task, today),
    }
}

pub fn applied_to_json(command: &'static str, applied: &Applied) -> AppliedJson {
    let mut json = AppliedJson {
        command,
        path: None,
        toggled: None,
        index: None,
        list_id: None,
    };
    match applied {
        Applied::Unit => {}
        Applied::Path(path) => json.path = Some(path.to_string()),
        Applied::Toggled(on) => json.toggled = Some(*on),
        Applied::Index(index) => json.index = Some(*index),
        Applied::ListId(id) => json.list_id = Some(id.clone()),
    }
    json
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

/// Human reading of a status, e.g. `due in 3d` or `overdue 2d`.
pub fn status_label(status: &CellStatus) -> String {
    match status {
        CellStatus::Done {
            when: DoneWhen::Past,
        } => "done".to_string(),
        CellStatus::Done {
            when: DoneWhen::Future,
        } => "planned".to_string(),
        CellStatus::Pending { days: 0 } => "due today".to_string(),
        CellStatus::Pending { days } => format!("due in {}d", days),
        CellStatus::Overdue { days } => format!("overdue {}d", days),
        CellStatus::Normal => "not started".to_string(),
    }
}

/// Compact cell for the grid: `✓` done, `+` planned, the countdown while
/// pending, `!n` when overdue, `·` before any history.
pub fn cell_glyph(status: &CellStatus) -> String {
    match status {
        CellStatus::Done {
            when: DoneWhen::Past,
        } => "✓".to_string(),
        CellStatus::Done {
            when: DoneWhen::Future,
        } => "+".to_string(),
        CellStatus::Pending { days } if *days > 99 => "99".to_string(),
        CellStatus::Pending { days } => days.to_string(),
        CellStatus::Overdue { days } if *days > 99 => "!!".to_string(),
        CellStatus::Overdue { days } => format!("!{}", days),
        CellStatus::Normal => "·".to_string(),
    }
}

/// One line of `cad tree`.
pub fn format_tree_line(row: &FlatRow<'_>, today: CalendarDate) -> String {
    let task = row.task;
    let fold = if task.is_leaf() {
        " "
    } else if task.collapsed {
        "▸"
    } else {
        "▾"
    };
    format!(
        "{}{} {} {} (every {}d) {}",
        "  ".repeat(row.depth),
        fold,
        row.path,
        task.title,
        task.interval_days,
        status_label(&status_today(task, today)),
    )
}

/// `cad calendar` as text: a title column, then one column per day.
pub fn format_calendar(matrix: &CalendarMatrix, holidays: &dyn Fn(CalendarDate) -> bool) -> Vec<String> {
    let mut lines = Vec::new();
    let (Some(first), Some(last)) = (matrix.dates.first(), matrix.dates.last()) else {
        lines.push("(no days in range)".to_string());
        return lines;
    };
    lines.push(format!("{} .. {}", first, last));

    let mut days = pad_to_width("", TITLE_COLUMN);
    let mut marks = pad_to_width("", TITLE_COLUMN);
    for &date in &matrix.dates {
        days.push_str(&format!("{:>width$}", date.day(), width = DAY_COLUMN));
        let mark = if date == matrix.today {
            "^"
        } else if holidays(date) {
            "H"
        } else {
            ""
        };
        marks.push_str(&format!("{:>width$}", mark, width = DAY_COLUMN));
    }
    lines.push(days);
    lines.push(marks.trim_end().to_string());

    for row in &matrix.rows {
        let title = format!("{}{}", "  ".repeat(row.depth), row.title);
        let mut line = pad_to_width(&title, TITLE_COLUMN);
        for cell in &row.cells {
            let glyph = cell_glyph(&cell.status);
            line.push_str(&pad_to_width(&format!(" {:>2}", glyph), DAY_COLUMN));
        }
        lines.push(line.trim_end().to_string());
    }
    lines
}

pub fn format_memo_line(index: usize, memo: &Memo) -> String {
    format!("{}. {}", index, memo.text)
}

pub fn format_checklist_line(list: &ChecklistList) -> String {
    format!(
        "[{}] {} {}..{} ({}/{} done)",
        list.id,
        list.name,
        list.start_number,
        list.end_number,
        list.done_in_range(),
        list.len()
    )
}

/// Text report for `cad check`.
pub fn format_check_result(result: &CheckResult) -> Vec<String> {
    let mut lines = Vec::new();
    if !result.errors.is_empty() {
        lines.push("Errors:".to_string());
        for err in &result.errors {
            lines.push(match err {
                CheckError::DuplicateId { task_id, paths } => {
                    format!("  task id {} is used at {}", task_id, paths.join(", "))
                }
                CheckError::DuplicateListId { list_id, count } => {
                    format!("  list id {} is used {} times", list_id, count)
                }
            });
        }
    }
    if !result.warnings.is_empty() {
        if !result.errors.is_empty() {
            lines.push(String::new());
        }
        lines.push("Warnings:".to_string());
        for warn in &result.warnings {
            lines.push(match warn {
                CheckWarning::ExpandedLeaf { task_id, path } => {
                    format!("  {} ({}) has no subtasks but is unfolded", path, task_id)
                }
                CheckWarning::ChecklistOutOfRange { list_id, numbers } => {
                    let numbers: Vec<String> = numbers.iter().map(i64::to_string).collect();
                    format!("  list {} has ticks outside its range: {}", list_id, numbers.join(", "))
                }
                CheckWarning::InvertedChecklist { list_id, start, end } => {
                    format!("  list {} starts at {} but ends at {}", list_id, start, end)
                }
                CheckWarning::InvertedRange { start, end } => {
                    format!("  calendar range {} .. {} is inverted", start, end)
                }
            });
        }
    }
    if result.valid {
        lines.push("✓ document is valid".to_string());
    } else {
        lines.push("✗ document has errors".to_string());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::document::{DateRange, Document};
    use crate::model::task::{Task, TaskId};
    use crate::view::calendar::build_calendar_matrix;
    use crate::view::flatten::flatten_visible;

    fn d(s: &str) -> CalendarDate {
        CalendarDate::parse(s).unwrap()
    }

    fn sample() -> Document {
        let mut gym = Task::new(TaskId::from("1"), "Gym");
        gym.interval_days = 7;
        gym.completion_dates.insert(d("2025-08-01"));
        let mut home = Task::new(TaskId::from("2"), "Home");
        home.children.push(Task::new(TaskId::from("3"), "Dishes"));
        home.collapsed = false;
        Document::from_tasks(vec![gym, home])
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(status_label(&CellStatus::Pending { days: 0 }), "due today");
        assert_eq!(status_label(&CellStatus::Pending { days: 3 }), "due in 3d");
        assert_eq!(status_label(&CellStatus::Overdue { days: 2 }), "overdue 2d");
        assert_eq!(status_label(&CellStatus::Normal), "not started");
    }

    #[test]
    fn test_cell_glyphs() {
        assert_eq!(cell_glyph(&CellStatus::Pending { days: 150 }), "99");
        assert_eq!(cell_glyph(&CellStatus::Overdue { days: 4 }), "!4");
        assert_eq!(cell_glyph(&CellStatus::Overdue { days: 400 }), "!!");
    }

    #[test]
    fn test_tree_lines() {
        let doc = sample();
        let today = d("2025-08-10");
        let lines: Vec<String> = flatten_visible(&doc.tasks)
            .iter()
            .map(|row| format_tree_line(row, today))
            .collect();
        assert_eq!(
            lines,
            vec![
                "  0 Gym (every 7d) overdue 2d",
                "▾ 1 Home (every 0d) not started",
                "    1.0 Dishes (every 0d) not started",
            ]
        );
    }

    #[test]
    fn test_calendar_text() {
        let doc = sample();
        let matrix = build_calendar_matrix(&doc, DateRange::new(d("2025-08-07"), d("2025-08-10")), d("2025-08-10"));
        let lines = format_calendar(&matrix, &|date| date == d("2025-08-09"));
        assert_eq!(lines[0], "2025-08-07 .. 2025-08-10");
        assert_eq!(lines[1], format!("{}  7  8  9 10", " ".repeat(TITLE_COLUMN)));
        assert_eq!(lines[2], format!("{}        H  ^", " ".repeat(TITLE_COLUMN)));
        assert_eq!(lines[3], format!("Gym{}  1  0 !1 !2", " ".repeat(TITLE_COLUMN - 3)));
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_empty_calendar() {
        let doc = sample();
        let matrix = build_calendar_matrix(&doc, DateRange::new(d("2025-08-10"), d("2025-08-01")), d("2025-08-10"));
        assert_eq!(format_calendar(&matrix, &|_| false), vec!["(no days in range)"]);
    }

    #[test]
    fn test_row_json() {
        let doc = sample();
        let rows = flatten_visible(&doc.tasks);
        let json = serde_json::to_value(row_to_json(&rows[0], d("2025-08-10"))).unwrap();
        assert_eq!(json["nextDue"], "2025-08-08");
        assert_eq!(json["today"]["status"], "overdue");
        assert_eq!(json["today"]["days"], 2);
        assert!(json.get("lastCompleted").is_some());
        assert_eq!(json["fullTitle"], "Gym");
        let json = serde_json::to_value(row_to_json(&rows[1], d("2025-08-10"))).unwrap();
        assert!(json.get("nextDue").is_none());
    }

    #[test]
    fn test_checklist_line_with_huge_range() {
        let list = ChecklistList {
            id: "9".into(),
            name: "big".into(),
            start_number: i64::MIN,
            end_number: i64::MAX,
            ..Default::default()
        };
        let line = format_checklist_line(&list);
        assert!(line.starts_with(&format!("[9] big {}..{} (0/", i64::MIN, i64::MAX)));
        assert!(line.ends_with(" done)"));
    }

    #[test]
    fn test_applied_json() {
        let json = serde_json::to_value(applied_to_json("toggle-holiday", &Applied::Toggled(true))).unwrap();
        assert_eq!(json, serde_json::json!({"command": "toggle-holiday", "toggled": true}));
    }
}
