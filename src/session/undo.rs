use crate::model::document::{Document, Snapshot};

/// The undo/redo stack. Each entry is a full copy of the document state
/// taken before (undo) or after (redo) one command.
#[derive(Debug, Default)]
pub struct UndoStack {
    undo: Vec<Snapshot>,
    redo: Vec<Snapshot>,
    /// Maximum undo depth; `None` keeps everything
    limit: Option<usize>,
}

impl UndoStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: Option<usize>) -> Self {
        UndoStack {
            limit,
            ..Self::default()
        }
    }

    /// Record the state from before a command. Clears the redo stack.
    pub fn record(&mut self, before: Snapshot) {
        self.undo.push(before);
        if let Some(limit) = self.limit
            && self.undo.len() > limit
        {
            self.undo.drain(..self.undo.len() - limit);
        }
        self.redo.clear();
    }

    /// Step back one command. Returns false when there is nothing to undo.
    pub fn undo(&mut self, doc: &mut Document) -> bool {
        let Some(previous) = self.undo.pop() else {
            return false;
        };
        let current = doc.swap_snapshot(previous);
        self.redo.push(current);
        true
    }

    /// Re-apply the last undone command. Returns false when there is nothing to redo.
    pub fn redo(&mut self, doc: &mut Document) -> bool {
        let Some(next) = self.redo.pop() else {
            return false;
        };
        let current = doc.swap_snapshot(next);
        self.undo.push(current);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
