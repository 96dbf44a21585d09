use crate::model::path::TaskPath;
use crate::model::task::Task;

/// Joins ancestor titles in `FlatRow::full_title`
pub const TITLE_SEPARATOR: &str = " / ";

/// One task as it appears in a flat, render-ready list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRow<'a> {
    pub task: &'a Task,
    pub path: TaskPath,
    /// 0 for top-level tasks
    pub depth: usize,
    /// Ancestor titles and the task's own, e.g. `Home / Laundry / Darks`
    pub full_title: String,
}

/// Pre-order walk of the forest. A task's children are included only when
/// `show_children(task)` holds.
pub fn flatten<'a, F>(tasks: &'a [Task], show_children: F) -> Vec<FlatRow<'a>>
where
    F: Fn(&Task) -> bool,
{
    let mut rows = Vec::new();
    walk(tasks, &TaskPath::root(), None, &show_children, &mut rows);
    rows
}

/// Rows honoring each task's fold state.
pub fn flatten_visible(tasks: &[Task]) -> Vec<FlatRow<'_>> {
    flatten(tasks, |task| !task.collapsed)
}

/// Every task, folded or not.
pub fn flatten_all(tasks: &[Task]) -> Vec<FlatRow<'_>> {
    flatten(tasks, |_| true)
}

fn walk<'a, F>(
    tasks: &'a [Task],
    prefix: &TaskPath,
    parent_title: Option<&str>,
    show_children: &F,
    rows: &mut Vec<FlatRow<'a>>,
) where
    F: Fn(&Task) -> bool,
{
    for (i, task) in tasks.iter().enumerate() {
        let path = prefix.child(i);
        let full_title = match parent_title {
            Some(parent) => format!("{parent}{TITLE_SEPARATOR}{}", task.title),
            None => task.title.clone(),
        };
        rows.push(FlatRow {
            task,
            path: path.clone(),
            depth: prefix.depth(),
            full_title: full_title.clone(),
        });
        if show_children(task) {
            walk(&task.children, &path, Some(&full_title), show_children, rows);
        }
    }
}
