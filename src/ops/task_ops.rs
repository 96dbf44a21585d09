use std::collections::HashSet;

use crate::model::date::CalendarDate;
use crate::model::path::TaskPath;
use crate::model::task::{Task, TaskId};

/// Error type for task tree operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("no task at path {0}")]
    PathNotFound(TaskPath),
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    #[error("cannot move {from} under {to}: the destination is inside the moved task")]
    InvalidMove { from: TaskPath, to: TaskPath },
    #[error("index {index} is out of range for {len} sibling(s)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// A task addressed either by position or by id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskRef {
    Path(TaskPath),
    Id(TaskId),
}

/// A located node: the sibling list that holds it and its index there
#[derive(Debug, Clone, Copy)]
pub struct Resolved<'a> {
    pub siblings: &'a [Task],
    pub index: usize,
}

impl<'a> Resolved<'a> {
    pub fn node(&self) -> &'a Task {
        &self.siblings[self.index]
    }
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Locate the node at `path`. The root path names no node.
pub fn resolve<'a>(forest: &'a [Task], path: &TaskPath) -> Result<Resolved<'a>, TaskError> {
    let (&index, parents) = path
        .indices()
        .split_last()
        .ok_or_else(|| TaskError::PathNotFound(path.clone()))?;
    let mut siblings = forest;
    for &i in parents {
        siblings = &siblings
            .get(i)
            .ok_or_else(|| TaskError::PathNotFound(path.clone()))?
            .children;
    }
    if index >= siblings.len() {
        return Err(TaskError::PathNotFound(path.clone()));
    }
    Ok(Resolved { siblings, index })
}

pub fn get<'a>(forest: &'a [Task], path: &TaskPath) -> Result<&'a Task, TaskError> {
    resolve(forest, path).map(|r| r.node())
}

pub fn get_mut<'a>(forest: &'a mut [Task], path: &TaskPath) -> Result<&'a mut Task, TaskError> {
    let not_found = || TaskError::PathNotFound(path.clone());
    let (&first, rest) = path.indices().split_first().ok_or_else(not_found)?;
    let mut node = forest.get_mut(first).ok_or_else(not_found)?;
    for &i in rest {
        node = node.children.get_mut(i).ok_or_else(not_found)?;
    }
    Ok(node)
}

/// The child list under `parent`; the forest itself for the root path.
fn siblings_mut<'a>(forest: &'a mut Vec<Task>, parent: &TaskPath) -> Result<&'a mut Vec<Task>, TaskError> {
    if parent.is_root() {
        Ok(forest)
    } else {
        Ok(&mut get_mut(forest, parent)?.children)
    }
}

/// Find a task by id anywhere in the forest.
pub fn find_task<'a>(forest: &'a [Task], id: &TaskId) -> Option<&'a Task> {
    for task in forest {
        if &task.id == id {
            return Some(task);
        }
        if let Some(found) = find_task(&task.children, id) {
            return Some(found);
        }
    }
    None
}

/// Find a task by id anywhere in the forest, return mutable ref.
pub fn find_task_mut<'a>(forest: &'a mut [Task], id: &TaskId) -> Option<&'a mut Task> {
    for task in forest.iter_mut() {
        if &task.id == id {
            return Some(task);
        }
        if let Some(found) = find_task_mut(&mut task.children, id) {
            return Some(found);
        }
    }
    None
}

/// Path of the task with the given id.
pub fn path_of(forest: &[Task], id: &TaskId) -> Option<TaskPath> {
    fn walk(tasks: &[Task], id: &TaskId, prefix: &TaskPath) -> Option<TaskPath> {
        for (i, task) in tasks.iter().enumerate() {
            let path = prefix.child(i);
            if &task.id == id {
                return Some(path);
            }
            if let Some(found) = walk(&task.children, id, &path) {
                return Some(found);
            }
        }
        None
    }
    walk(forest, id, &TaskPath::root())
}

pub fn get_ref_mut<'a>(forest: &'a mut [Task], target: &TaskRef) -> Result<&'a mut Task, TaskError> {
    match target {
        TaskRef::Path(path) => get_mut(forest, path),
        TaskRef::Id(id) => find_task_mut(forest, id).ok_or_else(|| TaskError::TaskNotFound(id.clone())),
    }
}

/// Iterate over all tasks (including subtasks), pre-order.
pub fn for_each_task(forest: &[Task], f: &mut dyn FnMut(&Task)) {
    for task in forest {
        task.for_each(f);
    }
}

/// Every id in the forest.
pub fn collect_ids(forest: &[Task]) -> HashSet<TaskId> {
    let mut ids = HashSet::new();
    for_each_task(forest, &mut |task| {
        ids.insert(task.id.clone());
    });
    ids
}

// ---------------------------------------------------------------------------
// Insert / delete
// ---------------------------------------------------------------------------

/// Append `task` as the last child of `parent` (the root path appends a
/// top-level task). Returns the new task's path.
pub fn insert_child(forest: &mut Vec<Task>, parent: &TaskPath, task: Task) -> Result<TaskPath, TaskError> {
    let siblings = siblings_mut(forest, parent)?;
    siblings.push(task);
    Ok(parent.child(siblings.len() - 1))
}

/// Insert `task` right after the node at `path`, under the same parent.
pub fn insert_sibling(forest: &mut Vec<Task>, path: &TaskPath, task: Task) -> Result<TaskPath, TaskError> {
    resolve(forest, path)?;
    let (parent, index) = split(path)?;
    let siblings = siblings_mut(forest, &parent)?;
    siblings.insert(index + 1, task);
    Ok(path.with_last(index + 1))
}

/// Remove the node at `path` together with its whole subtree.
pub fn delete_node(forest: &mut Vec<Task>, path: &TaskPath) -> Result<Task, TaskError> {
    resolve(forest, path)?;
    let (parent, index) = split(path)?;
    let removed = siblings_mut(forest, &parent)?.remove(index);
    settle_collapsed(forest, &parent);
    Ok(removed)
}

// ---------------------------------------------------------------------------
// Move operations
// ---------------------------------------------------------------------------

/// Move the node at `from` (with its subtree) to `to_parent` at `to_index`.
///
/// `to_index` counts positions in the destination list after the node has
/// been taken out, and is clamped to the end of that list. A destination
/// equal to `from` or inside its subtree is rejected before anything moves.
/// Returns the node's new path.
pub fn move_node(
    forest: &mut Vec<Task>,
    from: &TaskPath,
    to_parent: &TaskPath,
    to_index: usize,
) -> Result<TaskPath, TaskError> {
    resolve(forest, from)?;
    if to_parent.starts_with(from) {
        return Err(TaskError::InvalidMove {
            from: from.clone(),
            to: to_parent.clone(),
        });
    }
    if !to_parent.is_root() {
        resolve(forest, to_parent)?;
    }

    let (from_parent, from_index) = split(from)?;
    let target = shift_for_removal(to_parent, from);

    let node = siblings_mut(forest, &from_parent)?.remove(from_index);
    settle_collapsed(forest, &from_parent);

    let siblings = siblings_mut(forest, &target)?;
    let index = to_index.min(siblings.len());
    siblings.insert(index, node);
    Ok(target.child(index))
}

/// Move one child within its own list (drag-reorder). `to_index` is the
/// child's final position.
pub fn reorder_siblings(
    forest: &mut Vec<Task>,
    parent: &TaskPath,
    from_index: usize,
    to_index: usize,
) -> Result<(), TaskError> {
    let siblings = siblings_mut(forest, parent)?;
    let len = siblings.len();
    if from_index >= len {
        return Err(TaskError::PathNotFound(parent.child(from_index)));
    }
    if to_index >= len {
        return Err(TaskError::IndexOutOfRange { index: to_index, len });
    }
    let task = siblings.remove(from_index);
    siblings.insert(to_index, task);
    Ok(())
}

// ---------------------------------------------------------------------------
// Copy
// ---------------------------------------------------------------------------

/// Deep-copy the node at `path` as its next sibling. Every node in the copy
/// gets a fresh id; completion history and structure are kept.
/// Returns the copy's path.
pub fn copy_subtree(forest: &mut Vec<Task>, path: &TaskPath) -> Result<TaskPath, TaskError> {
    let mut copy = get(forest, path)?.clone();
    let mut taken = collect_ids(forest);
    reassign_ids(&mut copy, &mut taken);
    insert_sibling(forest, path, copy)
}

fn reassign_ids(task: &mut Task, taken: &mut HashSet<TaskId>) {
    let id = TaskId::generate(taken);
    taken.insert(id.clone());
    task.id = id;
    for child in &mut task.children {
        reassign_ids(child, taken);
    }
}

// ---------------------------------------------------------------------------
// Per-task edits
// ---------------------------------------------------------------------------

/// Flip the fold state. A task without children stays collapsed.
/// Returns the new state.
pub fn toggle_collapse(forest: &mut [Task], path: &TaskPath) -> Result<bool, TaskError> {
    let task = get_mut(forest, path)?;
    task.collapsed = task.is_leaf() || !task.collapsed;
    Ok(task.collapsed)
}

/// Mark or unmark `date` as done. Returns whether the task is now done on
/// that date.
pub fn toggle_completion(forest: &mut [Task], target: &TaskRef, date: CalendarDate) -> Result<bool, TaskError> {
    Ok(get_ref_mut(forest, target)?.toggle_completion(date))
}

/// Change title and/or interval. A blank title becomes the placeholder.
pub fn edit_task(
    forest: &mut [Task],
    path: &TaskPath,
    title: Option<&str>,
    interval_days: Option<u32>,
) -> Result<(), TaskError> {
    let task = get_mut(forest, path)?;
    if let Some(title) = title {
        task.set_title(title);
    }
    if let Some(days) = interval_days {
        task.interval_days = days;
    }
    Ok(())
}

pub fn set_swatch(
    forest: &mut [Task],
    path: &TaskPath,
    swatch_id: u32,
    bg_color: Option<String>,
) -> Result<(), TaskError> {
    let task = get_mut(forest, path)?;
    task.swatch_id = swatch_id;
    task.bg_color = bg_color;
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// (parent path, index within parent) of a non-root path.
fn split(path: &TaskPath) -> Result<(TaskPath, usize), TaskError> {
    match (path.parent(), path.last()) {
        (Some(parent), Some(index)) => Ok((parent, index)),
        _ => Err(TaskError::PathNotFound(path.clone())),
    }
}

/// Where `path` points once the node at `removed` is taken out: a later
/// sibling of `removed` (or anything below one) shifts up by one.
fn shift_for_removal(path: &TaskPath, removed: &TaskPath) -> TaskPath {
    let depth = removed.depth();
    let (Some(removed_index), Some(removed_parent)) = (removed.last(), removed.parent()) else {
        return path.clone();
    };
    if path.depth() < depth || !path.starts_with(&removed_parent) {
        return path.clone();
    }
    let mut indices = path.indices().to_vec();
    if indices[depth - 1] > removed_index {
        indices[depth - 1] -= 1;
    }
    TaskPath::new(indices)
}

/// A parent that lost its last child folds back up.
fn settle_collapsed(forest: &mut [Task], parent: &TaskPath) {
    if parent.is_root() {
        return;
    }
    if let Ok(task) = get_mut(forest, parent)
        && task.is_leaf()
    {
        task.collapsed = true;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn d(s: &str) -> CalendarDate {
        CalendarDate::parse(s).unwrap()
    }

    fn node(id: &str, children: Vec<Task>) -> Task {
        let mut task = Task::new(TaskId::from(id), &format!("Task {id}"));
        task.collapsed = children.is_empty();
        task.children = children;
        task
    }

    /// A ─┬─ B ── C
    ///    └─ D
    /// E
    fn sample_forest() -> Vec<Task> {
        vec![
            node("A", vec![node("B", vec![node("C", vec![])]), node("D", vec![])]),
            node("E", vec![]),
        ]
    }

    fn ids(tasks: &[Task]) -> Vec<String> {
        tasks.iter().map(|t| t.id.to_string()).collect()
    }

    fn p<const N: usize>(indices: [usize; N]) -> TaskPath {
        TaskPath::from(indices)
    }

    // --- Lookup ---

    #[test]
    fn test_resolve() {
        let forest = sample_forest();
        let r = resolve(&forest, &p([0, 0, 0])).unwrap();
        assert_eq!(r.node().id.as_str(), "C");
        assert_eq!(r.index, 0);
        assert_eq!(resolve(&forest, &p([0, 1])).unwrap().siblings.len(), 2);
    }

    #[test]
    fn test_resolve_out_of_bounds() {
        let forest = sample_forest();
        for path in [p([2]), p([0, 5]), p([1, 0]), TaskPath::root()] {
            assert_eq!(
                resolve(&forest, &path).unwrap_err(),
                TaskError::PathNotFound(path.clone())
            );
        }
    }

    #[test]
    fn test_find_by_id_and_path_of() {
        let forest = sample_forest();
        assert_eq!(find_task(&forest, &TaskId::from("D")).unwrap().title, "Task D");
        assert_eq!(path_of(&forest, &TaskId::from("C")), Some(p([0, 0, 0])));
        assert_eq!(path_of(&forest, &TaskId::from("E")), Some(p([1])));
        assert_eq!(path_of(&forest, &TaskId::from("Z")), None);
    }

    // --- Insert / delete ---

    #[test]
    fn test_insert_child() {
        let mut forest = sample_forest();
        let path = insert_child(&mut forest, &p([1]), node("F", vec![])).unwrap();
        assert_eq!(path, p([1, 0]));
        assert_eq!(ids(&forest[1].children), vec!["F"]);

        let top = insert_child(&mut forest, &TaskPath::root(), node("G", vec![])).unwrap();
        assert_eq!(top, p([2]));
        assert_eq!(ids(&forest), vec!["A", "E", "G"]);
    }

    #[test]
    fn test_insert_child_missing_parent() {
        let mut forest = sample_forest();
        let before = forest.clone();
        let err = insert_child(&mut forest, &p([7]), node("F", vec![])).unwrap_err();
        assert_eq!(err, TaskError::PathNotFound(p([7])));
        assert_eq!(forest, before);
    }

    #[test]
    fn test_insert_sibling() {
        let mut forest = sample_forest();
        let path = insert_sibling(&mut forest, &p([0, 0]), node("F", vec![])).unwrap();
        assert_eq!(path, p([0, 1]));
        assert_eq!(ids(&forest[0].children), vec!["B", "F", "D"]);
    }

    #[test]
    fn test_delete_node_removes_subtree() {
        let mut forest = sample_forest();
        let removed = delete_node(&mut forest, &p([0, 0])).unwrap();
        assert_eq!(removed.id.as_str(), "B");
        assert_eq!(removed.children.len(), 1);
        assert_eq!(ids(&forest[0].children), vec!["D"]);
        assert!(find_task(&forest, &TaskId::from("C")).is_none());
    }

    #[test]
    fn test_delete_last_child_folds_parent() {
        let mut forest = sample_forest();
        forest[0].children[0].collapsed = false;
        delete_node(&mut forest, &p([0, 0, 0])).unwrap();
        assert!(forest[0].children[0].collapsed);
    }

    #[test]
    fn test_delete_missing_path() {
        let mut forest = sample_forest();
        assert!(delete_node(&mut forest, &p([3])).is_err());
        assert!(delete_node(&mut forest, &TaskPath::root()).is_err());
        assert_eq!(forest, sample_forest());
    }

    // --- Move ---

    #[test]
    fn test_move_into_own_child_is_rejected() {
        let mut forest = sample_forest();
        let err = move_node(&mut forest, &p([0]), &p([0, 0]), 0).unwrap_err();
        assert_eq!(
            err,
            TaskError::InvalidMove {
                from: p([0]),
                to: p([0, 0]),
            }
        );
        assert_eq!(forest, sample_forest());
    }

    #[test]
    fn test_move_into_itself_is_rejected() {
        let mut forest = sample_forest();
        assert!(matches!(
            move_node(&mut forest, &p([0, 0]), &p([0, 0]), 0),
            Err(TaskError::InvalidMove { .. })
        ));
        assert!(matches!(
            move_node(&mut forest, &p([0]), &p([0, 0, 0]), 0),
            Err(TaskError::InvalidMove { .. })
        ));
        assert_eq!(forest, sample_forest());
    }

    #[test]
    fn test_move_to_other_parent() {
        let mut forest = sample_forest();
        let path = move_node(&mut forest, &p([0, 1]), &p([1]), 0).unwrap();
        assert_eq!(path, p([1, 0]));
        assert_eq!(ids(&forest[0].children), vec!["B"]);
        assert_eq!(ids(&forest[1].children), vec!["D"]);
    }

    #[test]
    fn test_move_to_later_sibling_adjusts_target() {
        // Moving A under E: E shifts from index 1 to 0 once A is gone.
        let mut forest = sample_forest();
        let path = move_node(&mut forest, &p([0]), &p([1]), 0).unwrap();
        assert_eq!(path, p([0, 0]));
        assert_eq!(ids(&forest), vec!["E"]);
        assert_eq!(ids(&forest[0].children), vec!["A"]);
        assert_eq!(ids(&forest[0].children[0].children), vec!["B", "D"]);
    }

    #[test]
    fn test_move_nested_target_below_later_sibling() {
        // Move B (0.0) under D (0.1): D becomes 0.0 after removal.
        let mut forest = sample_forest();
        let path = move_node(&mut forest, &p([0, 0]), &p([0, 1]), 5).unwrap();
        assert_eq!(path, p([0, 0, 0]));
        assert_eq!(ids(&forest[0].children), vec!["D"]);
        assert_eq!(ids(&forest[0].children[0].children), vec!["B"]);
    }

    #[test]
    fn test_move_to_root_and_clamp() {
        let mut forest = sample_forest();
        let path = move_node(&mut forest, &p([0, 0, 0]), &TaskPath::root(), 99).unwrap();
        assert_eq!(path, p([2]));
        assert_eq!(ids(&forest), vec!["A", "E", "C"]);
        // B lost its only child
        assert!(forest[0].children[0].collapsed);
    }

    #[test]
    fn test_move_missing_destination() {
        let mut forest = sample_forest();
        assert_eq!(
            move_node(&mut forest, &p([1]), &p([0, 9]), 0).unwrap_err(),
            TaskError::PathNotFound(p([0, 9]))
        );
        assert_eq!(forest, sample_forest());
    }

    #[test]
    fn test_reorder_siblings() {
        let mut forest = sample_forest();
        reorder_siblings(&mut forest, &p([0]), 0, 1).unwrap();
        assert_eq!(ids(&forest[0].children), vec!["D", "B"]);
        reorder_siblings(&mut forest, &TaskPath::root(), 1, 0).unwrap();
        assert_eq!(ids(&forest), vec!["E", "A"]);
    }

    #[test]
    fn test_reorder_out_of_range() {
        let mut forest = sample_forest();
        assert_eq!(
            reorder_siblings(&mut forest, &p([0]), 2, 0).unwrap_err(),
            TaskError::PathNotFound(p([0, 2]))
        );
        assert_eq!(
            reorder_siblings(&mut forest, &p([0]), 0, 2).unwrap_err(),
            TaskError::IndexOutOfRange { index: 2, len: 2 }
        );
    }

    // --- Copy ---

    #[test]
    fn test_copy_subtree_uses_fresh_ids() {
        let mut forest = sample_forest();
        forest[0].children[0].completion_dates.insert(d("2025-08-01"));
        let original_ids = collect_ids(&forest);

        let path = copy_subtree(&mut forest, &p([0])).unwrap();
        assert_eq!(path, p([1]));
        assert_eq!(forest.len(), 3);

        let copy = &forest[1];
        assert_eq!(copy.subtree_len(), forest[0].subtree_len());
        assert_eq!(copy.children[0].title, "Task B");
        assert_eq!(copy.children[0].children[0].title, "Task C");
        assert_eq!(
            copy.children[0].completion_dates,
            forest[0].children[0].completion_dates
        );

        let mut copy_ids = Vec::new();
        copy.for_each(&mut |t| copy_ids.push(t.id.clone()));
        for id in &copy_ids {
            assert!(!original_ids.contains(id), "copied id {id} reused");
        }
        let unique: HashSet<_> = copy_ids.iter().collect();
        assert_eq!(unique.len(), copy_ids.len());
    }

    // --- Per-task edits ---

    #[test]
    fn test_toggle_collapse() {
        let mut forest = sample_forest();
        assert!(!forest[0].collapsed);
        assert!(toggle_collapse(&mut forest, &p([0])).unwrap());
        assert!(!toggle_collapse(&mut forest, &p([0])).unwrap());
        // Leaves stay collapsed
        assert!(toggle_collapse(&mut forest, &p([1])).unwrap());
        assert!(toggle_collapse(&mut forest, &p([1])).unwrap());
    }

    #[test]
    fn test_toggle_completion_by_id_and_path() {
        let mut forest = sample_forest();
        let target = TaskRef::Id(TaskId::from("C"));
        assert!(toggle_completion(&mut forest, &target, d("2025-08-01")).unwrap());
        assert!(
            forest[0].children[0].children[0]
                .completion_dates
                .contains(&d("2025-08-01"))
        );

        let by_path = TaskRef::Path(p([0, 0, 0]));
        assert!(!toggle_completion(&mut forest, &by_path, d("2025-08-01")).unwrap());
        assert_eq!(forest, sample_forest());

        assert_eq!(
            toggle_completion(&mut forest, &TaskRef::Id(TaskId::from("Z")), d("2025-08-01")).unwrap_err(),
            TaskError::TaskNotFound(TaskId::from("Z"))
        );
    }

    #[test]
    fn test_edit_task() {
        let mut forest = sample_forest();
        edit_task(&mut forest, &p([1]), Some("  Gym "), Some(3)).unwrap();
        assert_eq!(forest[1].title, "Gym");
        assert_eq!(forest[1].interval_days, 3);

        edit_task(&mut forest, &p([1]), None, Some(10)).unwrap();
        assert_eq!(forest[1].title, "Gym");
        assert_eq!(forest[1].interval_days, 10);
    }

    #[test]
    fn test_set_swatch() {
        let mut forest = sample_forest();
        set_swatch(&mut forest, &p([1]), 4, Some("#ffcc00".into())).unwrap();
        assert_eq!(forest[1].swatch_id, 4);
        assert_eq!(forest[1].bg_color.as_deref(), Some("#ffcc00"));
    }

    #[test]
    fn test_shift_for_removal() {
        assert_eq!(shift_for_removal(&p([2, 1]), &p([0])), p([1, 1]));
        assert_eq!(shift_for_removal(&p([0, 3]), &p([0, 1])), p([0, 2]));
        assert_eq!(shift_for_removal(&p([0, 0]), &p([0, 1])), p([0, 0]));
        assert_eq!(shift_for_removal(&p([1]), &p([0, 1])), p([1]));
        assert_eq!(shift_for_removal(&TaskPath::root(), &p([0])), TaskPath::root());
    }
}
