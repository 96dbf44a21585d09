pub mod check;
pub mod command;
pub mod document_ops;
pub mod recurrence;
pub mod task_ops;
