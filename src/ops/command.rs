use crate::model::date::CalendarDate;
use crate::model::document::{DateRange, Document};
use crate::model::path::TaskPath;
use crate::model::task::{Task, TaskDraft, TaskId};
use crate::ops::document_ops::{self, DocumentError};
use crate::ops::task_ops::{self, TaskError, TaskRef};

/// One user-level edit, addressed by paths, ids and plain values so it can
/// be built anywhere and applied later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddChild { parent: TaskPath, draft: TaskDraft },
    AddSibling { after: TaskPath, draft: TaskDraft },
    Delete { path: TaskPath },
    Move { from: TaskPath, to_parent: TaskPath, to_index: usize },
    Reorder { parent: TaskPath, from: usize, to: usize },
    Copy { path: TaskPath },
    ToggleCollapse { path: TaskPath },
    ToggleCompletion { task: TaskRef, date: CalendarDate },
    Edit {
        path: TaskPath,
        title: Option<String>,
        interval_days: Option<u32>,
    },
    SetSwatch {
        path: TaskPath,
        swatch_id: u32,
        bg_color: Option<String>,
    },
    AddMemo { text: String, swatch_id: u32 },
    EditMemo {
        index: usize,
        text: Option<String>,
        swatch_id: Option<u32>,
    },
    RemoveMemo { index: usize },
    MoveMemo { from: usize, to: usize },
    AddList {
        name: String,
        start: i64,
        end: i64,
        swatch_id: u32,
    },
    RemoveList { id: String },
    RenameList { id: String, name: String },
    ToggleListNumber { id: String, number: i64 },
    ToggleHoliday { date: CalendarDate },
    SetCalendarRange { range: Option<DateRange> },
}

/// What a successfully applied command reports back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    Unit,
    /// Where the affected task now lives
    Path(TaskPath),
    /// New state of a toggled flag
    Toggled(bool),
    /// Index of a new memo
    Index(usize),
    ListId(String),
}

/// Error type for applying a command
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

impl Command {
    /// Short name used in logs and history listings
    pub fn name(&self) -> &'static str {
        match self {
            Command::AddChild { .. } => "add-child",
            Command::AddSibling { .. } => "add-sibling",
            Command::Delete { .. } => "delete",
            Command::Move { .. } => "move",
            Command::Reorder { .. } => "reorder",
            Command::Copy { .. } => "copy",
            Command::ToggleCollapse { .. } => "toggle-collapse",
            Command::ToggleCompletion { .. } => "toggle-completion",
            Command::Edit { .. } => "edit",
            Command::SetSwatch { .. } => "set-swatch",
            Command::AddMemo { .. } => "add-memo",
            Command::EditMemo { .. } => "edit-memo",
            Command::RemoveMemo { .. } => "remove-memo",
            Command::MoveMemo { .. } => "move-memo",
            Command::AddList { .. } => "add-list",
            Command::RemoveList { .. } => "remove-list",
            Command::RenameList { .. } => "rename-list",
            Command::ToggleListNumber { .. } => "toggle-list-number",
            Command::ToggleHoliday { .. } => "toggle-holiday",
            Command::SetCalendarRange { .. } => "set-calendar-range",
        }
    }

    /// Apply to `doc` in place. A failing command may leave `doc` partly
    /// changed; `Session::execute` restores it.
    pub fn apply(&self, doc: &mut Document) -> Result<Applied, CommandError> {
        let applied = match self {
            Command::AddChild { parent, draft } => {
                let task = new_task(doc, draft);
                Applied::Path(task_ops::insert_child(&mut doc.tasks, parent, task)?)
            }
            Command::AddSibling { after, draft } => {
                let task = new_task(doc, draft);
                Applied::Path(task_ops::insert_sibling(&mut doc.tasks, after, task)?)
            }
            Command::Delete { path } => {
                task_ops::delete_node(&mut doc.tasks, path)?;
                Applied::Unit
            }
            Command::Move {
                from,
                to_parent,
                to_index,
            } => Applied::Path(task_ops::move_node(&mut doc.tasks, from, to_parent, *to_index)?),
            Command::Reorder { parent, from, to } => {
                task_ops::reorder_siblings(&mut doc.tasks, parent, *from, *to)?;
                Applied::Path(parent.child(*to))
            }
            Command::Copy { path } => Applied::Path(task_ops::copy_subtree(&mut doc.tasks, path)?),
            Command::ToggleCollapse { path } => {
                Applied::Toggled(task_ops::toggle_collapse(&mut doc.tasks, path)?)
            }
            Command::ToggleCompletion { task, date } => {
                Applied::Toggled(task_ops::toggle_completion(&mut doc.tasks, task, *date)?)
            }
            Command::Edit {
                path,
                title,
                interval_days,
            } => {
                task_ops::edit_task(&mut doc.tasks, path, title.as_deref(), *interval_days)?;
                Applied::Path(path.clone())
            }
            Command::SetSwatch {
                path,
                swatch_id,
                bg_color,
            } => {
                task_ops::set_swatch(&mut doc.tasks, path, *swatch_id, bg_color.clone())?;
                Applied::Path(path.clone())
            }
            Command::AddMemo { text, swatch_id } => {
                Applied::Index(document_ops::add_memo(doc, text, *swatch_id))
            }
            Command::EditMemo {
                index,
                text,
                swatch_id,
            } => {
                document_ops::edit_memo(doc, *index, text.as_deref(), *swatch_id)?;
                Applied::Index(*index)
            }
            Command::RemoveMemo { index } => {
                document_ops::remove_memo(doc, *index)?;
                Applied::Unit
            }
            Command::MoveMemo { from, to } => {
                document_ops::move_memo(doc, *from, *to)?;
                Applied::Index(*to)
            }
            Command::AddList {
                name,
                start,
                end,
                swatch_id,
            } => Applied::ListId(document_ops::add_list(doc, name, *start, *end, *swatch_id)?),
            Command::RemoveList { id } => {
                document_ops::remove_list(doc, id)?;
                Applied::Unit
            }
            Command::RenameList { id, name } => {
                document_ops::rename_list(doc, id, name)?;
                Applied::ListId(id.clone())
            }
            Command::ToggleListNumber { id, number } => {
                Applied::Toggled(document_ops::toggle_list_number(doc, id, *number)?)
            }
            Command::ToggleHoliday { date } => Applied::Toggled(document_ops::toggle_holiday(doc, *date)),
            Command::SetCalendarRange { range } => {
                document_ops::set_calendar_range(doc, *range);
                Applied::Unit
            }
        };
        Ok(applied)
    }
}

fn new_task(doc: &Document, draft: &TaskDraft) -> Task {
    Task::from_draft(TaskId::generate(&doc.task_ids()), draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn d(s: &str) -> CalendarDate {
        CalendarDate::parse(s).unwrap()
    }

    #[test]
    fn test_add_child_assigns_fresh_id() {
        let mut doc = Document::new();
        let first = Command::AddChild {
            parent: TaskPath::root(),
            draft: TaskDraft::new("Laundry", 7),
        }
        .apply(&mut doc)
        .unwrap();
        assert_eq!(first, Applied::Path(TaskPath::from([0])));

        let second = Command::AddChild {
            parent: TaskPath::from([0]),
            draft: TaskDraft::new("Darks", 14),
        }
        .apply(&mut doc)
        .unwrap();
        assert_eq!(second, Applied::Path(TaskPath::from([0, 0])));
        assert_ne!(doc.tasks[0].id, doc.tasks[0].children[0].id);
        assert_eq!(doc.tasks[0].children[0].interval_days, 14);
    }

    #[test]
    fn test_toggle_completion_reports_state() {
        let mut doc = Document::new();
        Command::AddChild {
            parent: TaskPath::root(),
            draft: TaskDraft::new("Gym", 2),
        }
        .apply(&mut doc)
        .unwrap();
        let cmd = Command::ToggleCompletion {
            task: TaskRef::Path(TaskPath::from([0])),
            date: d("2025-08-01"),
        };
        assert_eq!(cmd.apply(&mut doc).unwrap(), Applied::Toggled(true));
        assert_eq!(cmd.apply(&mut doc).unwrap(), Applied::Toggled(false));
    }

    #[test]
    fn test_errors_are_typed() {
        let mut doc = Document::new();
        let err = Command::Delete {
            path: TaskPath::from([0]),
        }
        .apply(&mut doc)
        .unwrap_err();
        assert_eq!(err, CommandError::Task(TaskError::PathNotFound(TaskPath::from([0]))));

        let err = Command::RemoveList { id: "x".into() }.apply(&mut doc).unwrap_err();
        assert_eq!(err, CommandError::Document(DocumentError::ListNotFound("x".into())));
        assert_eq!(err.to_string(), "list not found: x");
    }

    #[test]
    fn test_names() {
        assert_eq!(
            Command::ToggleHoliday {
                date: d("2025-01-01")
            }
            .name(),
            "toggle-holiday"
        );
        assert_eq!(Command::Copy { path: TaskPath::root() }.name(), "copy");
    }
}
