pub mod undo;

use crate::model::config::CalendarConfig;
use crate::model::date::{CalendarDate, Clock, SystemClock};
use crate::model::document::{Document, Snapshot};
use crate::ops::command::{Applied, Command, CommandError};
use crate::ops::document_ops::DocumentError;
use crate::ops::task_ops::TaskError;
use crate::view::calendar::{CalendarMatrix, build_calendar_matrix};
use crate::view::flatten::{FlatRow, flatten_visible};

pub use undo::UndoStack;

/// Error type for session operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("nothing to undo")]
    EmptyUndo,
    #[error("nothing to redo")]
    EmptyRedo,
}

impl From<CommandError> for SessionError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Task(e) => SessionError::Task(e),
            CommandError::Document(e) => SessionError::Document(e),
        }
    }
}

/// One editing session over one document: the live document, its undo
/// history and the day everything is evaluated against. Dirtiness is
/// measured against the last saved state, so undoing back to it is clean.
pub struct Session {
    document: Document,
    history: UndoStack,
    clock: Box<dyn Clock>,
    today: CalendarDate,
    saved: Snapshot,
}

impl Session {
    pub fn new(document: Document, clock: impl Clock + 'static) -> Self {
        let today = clock.today();
        Session {
            saved: document.snapshot(),
            document,
            history: UndoStack::new(),
            clock: Box::new(clock),
            today,
        }
    }

    /// A session on the system clock.
    pub fn open(document: Document) -> Self {
        Self::new(document, SystemClock)
    }

    pub fn with_history_limit(mut self, limit: Option<usize>) -> Self {
        self.history = UndoStack::with_limit(limit);
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn history(&self) -> &UndoStack {
        &self.history
    }

    /// The day fixed at the last refresh.
    pub fn today(&self) -> CalendarDate {
        self.today
    }

    /// Re-read the clock. Call once at the top of each render cycle so a
    /// session that crosses midnight moves on to the new day.
    pub fn refresh(&mut self) -> CalendarDate {
        let today = self.clock.today();
        if today != self.today {
            tracing::debug!(from = %self.today, to = %today, "day changed");
            self.today = today;
        }
        today
    }

    /// True when the document has changes not yet saved.
    pub fn is_dirty(&self) -> bool {
        !self.document.matches_snapshot(&self.saved)
    }

    /// Record the current state as the one on disk.
    pub fn mark_saved(&mut self) {
        self.saved = self.document.snapshot();
    }

    /// Replace the document with a freshly loaded one. History no longer
    /// applies to it and is dropped.
    pub fn adopt(&mut self, document: Document) {
        self.saved = document.snapshot();
        self.document = document;
        self.history.clear();
    }

    /// Apply `command` as one undoable step. On failure the document is left
    /// exactly as it was and nothing is recorded.
    pub fn execute(&mut self, command: &Command) -> Result<Applied, SessionError> {
        let before = self.document.snapshot();
        match command.apply(&mut self.document) {
            Ok(applied) => {
                self.history.record(before);
                tracing::debug!(command = command.name(), ?applied, "executed");
                Ok(applied)
            }
            Err(err) => {
                self.document.restore(before);
                tracing::debug!(command = command.name(), error = %err, "rejected");
                Err(err.into())
            }
        }
    }

    pub fn undo(&mut self) -> Result<(), SessionError> {
        if !self.history.undo(&mut self.document) {
            return Err(SessionError::EmptyUndo);
        }
        tracing::debug!(remaining = self.history.undo_len(), "undo");
        Ok(())
    }

    pub fn redo(&mut self) -> Result<(), SessionError> {
        if !self.history.redo(&mut self.document) {
            return Err(SessionError::EmptyRedo);
        }
        tracing::debug!(remaining = self.history.redo_len(), "redo");
        Ok(())
    }

    /// Visible rows of the task tree.
    pub fn rows(&self) -> Vec<FlatRow<'_>> {
        flatten_visible(&self.document.tasks)
    }

    /// The calendar grid over the document's range, or the configured
    /// window around today when it has none.
    pub fn calendar(&self, config: &CalendarConfig) -> CalendarMatrix {
        let range = self
            .document
            .visible_range(self.today, config.days_before, config.days_after);
        build_calendar_matrix(&self.document, range, self.today)
    }
}
