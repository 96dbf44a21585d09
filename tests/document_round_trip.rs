//! Load fixture documents from disk, run them through the engine and the
//! store, and check what comes back out.

use std::fs;
use std::path::PathBuf;

use cadence::io::document_io;
use cadence::model::date::{CalendarDate, FixedClock};
use cadence::model::document::{DateRange, Document};
use cadence::model::path::TaskPath;
use cadence::model::task::{TaskDraft, TaskId};
use cadence::ops::check::check_document;
use cadence::ops::command::Command;
use cadence::ops::recurrence::{CellStatus, status_today};
use cadence::ops::task_ops::{self, TaskRef};
use cadence::session::Session;
use cadence::view::calendar::build_calendar_matrix;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn d(s: &str) -> CalendarDate {
    CalendarDate::parse(s).unwrap()
}

#[test]
fn canonical_document_survives_load_and_save() {
    let path = fixture("household.json");
    let doc = document_io::load_document(&path).unwrap();
    assert_eq!(doc.user.as_deref(), Some("sam"));
    assert_eq!(doc.task_count(), 4);
    assert!(check_document(&doc).valid);

    let expected: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(document_io::serialize(&doc).unwrap(), expected);

    let tmp = TempDir::new().unwrap();
    let copy = tmp.path().join("copy.json");
    document_io::save_document(&copy, &doc).unwrap();
    assert_eq!(document_io::load_document(&copy).unwrap(), doc);
}

#[test]
fn legacy_array_is_upgraded() {
    let doc = document_io::load_document(&fixture("legacy_array.json")).unwrap();
    assert_eq!(doc.task_count(), 3);
    assert!(doc.memos.is_empty());
    assert_eq!(doc.calendar_range, None);

    let water = &doc.tasks[0];
    assert_eq!(water.id, TaskId::from("1690000000000"));
    assert_eq!(water.title, "Water plants");
    // duplicate dates collapse, and a leaf is always folded
    assert_eq!(water.completion_dates.len(), 2);
    assert!(water.collapsed);
    assert_eq!(water.last_completed(d("2025-08-10")), Some(d("2025-08-01")));

    let value = document_io::serialize(&doc).unwrap();
    assert!(value["tasks"][0].get("lastCompleted").is_none());
    assert_eq!(
        value["tasks"][0]["completionDates"],
        serde_json::json!(["2025-08-01", "2025-07-29"])
    );
    assert_eq!(value["tasks"][1]["children"][0]["id"], "1690000000002");
}

#[test]
fn empty_file_is_empty_document() {
    let doc = document_io::load_document(&fixture("empty.json")).unwrap();
    assert_eq!(doc, Document::default());
}

#[test]
fn statuses_on_the_household_fixture() {
    let doc = document_io::load_document(&fixture("household.json")).unwrap();
    let today = d("2025-08-10");
    let water = task_ops::get(&doc.tasks, &TaskPath::from([0, 0])).unwrap();
    let laundry = task_ops::get(&doc.tasks, &TaskPath::from([0, 1])).unwrap();
    let gym = task_ops::get(&doc.tasks, &TaskPath::from([1])).unwrap();

    assert_eq!(status_today(water, today), CellStatus::Pending { days: 1 });
    assert_eq!(status_today(laundry, today), CellStatus::Overdue { days: 2 });
    // only a planned future mark: nothing before today
    assert_eq!(status_today(gym, today), CellStatus::Normal);
    assert_eq!(gym.next_due(today), None);

    let matrix = build_calendar_matrix(&doc, DateRange::new(d("2025-08-11"), d("2025-08-13")), today);
    let gym_row = matrix.rows.iter().find(|row| row.title == "Gym").unwrap();
    let kinds: Vec<&str> = gym_row.cells.iter().map(|cell| cell.status.kind()).collect();
    assert_eq!(kinds, vec!["normal", "done-future", "pending"]);
}

#[test]
fn session_edits_persist_and_undo_restores_the_file_state() {
    let doc = document_io::load_document(&fixture("household.json")).unwrap();
    let original = doc.clone();
    let mut session = Session::new(doc, FixedClock(d("2025-08-10")));

    session
        .execute(&Command::ToggleCompletion {
            task: TaskRef::Id(TaskId::from("1723000000002")),
            date: d("2025-08-10"),
        })
        .unwrap();
    session
        .execute(&Command::AddChild {
            parent: TaskPath::from([1]),
            draft: TaskDraft::new("Stretch", 1),
        })
        .unwrap();
    session.execute(&Command::ToggleHoliday { date: d("2025-08-15") }).unwrap();

    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("household.json");
    document_io::save_document(&path, session.document()).unwrap();
    let reloaded = document_io::load_document(&path).unwrap();
    assert_eq!(&reloaded, session.document());
    assert_eq!(reloaded.tasks[1].children[0].title, "Stretch");
    assert!(!reloaded.is_holiday(d("2025-08-15")));

    session.undo().unwrap();
    session.undo().unwrap();
    session.undo().unwrap();
    assert_eq!(session.document(), &original);
    assert!(session.undo().is_err());
}
