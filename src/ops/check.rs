use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::document::Document;
use crate::model::path::TaskPath;
use crate::model::task::Task;

/// Structured result from `cad check`, suitable for --json output.
#[derive(Debug, Default, Serialize)]
pub struct CheckResult {
    pub valid: bool,
    pub errors: Vec<CheckError>,
    pub warnings: Vec<CheckWarning>,
}

/// A validation error (something that should be fixed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum CheckError {
    /// The same task id appears at more than one path
    #[serde(rename = "duplicate_id")]
    DuplicateId { task_id: String, paths: Vec<String> },
    /// Two checklists share an id
    #[serde(rename = "duplicate_list_id")]
    DuplicateListId { list_id: String, count: usize },
}

/// A validation warning (non-critical issue).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum CheckWarning {
    /// A task without children is marked expanded
    #[serde(rename = "expanded_leaf")]
    ExpandedLeaf { task_id: String, path: String },
    /// A checklist has ticked numbers outside its range
    #[serde(rename = "checklist_out_of_range")]
    ChecklistOutOfRange { list_id: String, numbers: Vec<i64> },
    /// A checklist's start number is after its end number
    #[serde(rename = "inverted_checklist")]
    InvertedChecklist { list_id: String, start: i64, end: i64 },
    /// The stored calendar range ends before it starts
    #[serde(rename = "inverted_range")]
    InvertedRange { start: String, end: String },
}

// ---------------------------------------------------------------------------
// Main check entry point
// ---------------------------------------------------------------------------

/// Validate a document and return structured results. Read-only.
///
/// Checks performed:
/// 1. Task ids are unique across the forest
/// 2. Checklist ids are unique
/// 3. Warnings for expanded leaves, stray checklist numbers and inverted ranges
pub fn check_document(doc: &Document) -> CheckResult {
    let mut result = CheckResult::default();

    for (task_id, paths) in find_duplicate_ids(&doc.tasks) {
        result.errors.push(CheckError::DuplicateId { task_id, paths });
    }

    let mut list_ids: BTreeMap<&str, usize> = BTreeMap::new();
    for list in &doc.lists {
        *list_ids.entry(list.id.as_str()).or_default() += 1;
    }
    for (list_id, count) in list_ids {
        if count > 1 {
            result.errors.push(CheckError::DuplicateListId {
                list_id: list_id.to_string(),
                count,
            });
        }
    }

    check_tasks(&doc.tasks, &TaskPath::root(), &mut result);

    for list in &doc.lists {
        if list.end_number < list.start_number {
            result.warnings.push(CheckWarning::InvertedChecklist {
                list_id: list.id.clone(),
                start: list.start_number,
                end: list.end_number,
            });
            continue;
        }
        let stray: Vec<i64> = list
            .done_numbers
            .iter()
            .copied()
            .filter(|n| !list.contains(*n))
            .collect();
        if !stray.is_empty() {
            result.warnings.push(CheckWarning::ChecklistOutOfRange {
                list_id: list.id.clone(),
                numbers: stray,
            });
        }
    }

    if let Some(range) = doc.calendar_range
        && range.is_inverted()
    {
        result.warnings.push(CheckWarning::InvertedRange {
            start: range.start.format(),
            end: range.end.format(),
        });
    }

    result.valid = result.errors.is_empty();
    result
}

fn check_tasks(tasks: &[Task], prefix: &TaskPath, result: &mut CheckResult) {
    for (i, task) in tasks.iter().enumerate() {
        let path = prefix.child(i);
        if task.is_leaf() && !task.collapsed {
            result.warnings.push(CheckWarning::ExpandedLeaf {
                task_id: task.id.to_string(),
                path: path.to_string(),
            });
        }
        check_tasks(&task.children, &path, result);
    }
}

/// Task ids that appear more than once, with every path they appear at.
fn find_duplicate_ids(tasks: &[Task]) -> Vec<(String, Vec<String>)> {
    let mut id_to_paths: BTreeMap<String, Vec<String>> = BTreeMap::new();
    collect_id_locations(tasks, &TaskPath::root(), &mut id_to_paths);
    id_to_paths
        .into_iter()
        .filter(|(_, paths)| paths.len() > 1)
        .collect()
}

fn collect_id_locations(tasks: &[Task], prefix: &TaskPath, id_to_paths: &mut BTreeMap<String, Vec<String>>) {
    for (i, task) in tasks.iter().enumerate() {
        let path = prefix.child(i);
        id_to_paths
            .entry(task.id.to_string())
            .or_default()
            .push(path.to_string());
        collect_id_locations(&task.children, &path, id_to_paths);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
