use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::model::date::CalendarDate;
use crate::model::path::TaskPath;

#[derive(Parser)]
#[command(name = "cad", about = concat!("cadence v", env!("CARGO_PKG_VERSION"), " - recurring tasks on a calendar grid"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Document file
    #[arg(short = 'f', long = "file", global = true, default_value = "cadence.json")]
    pub file: PathBuf,

    /// Config file (default: cadence.toml beside the document)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Evaluate as if today were this date (YYYY-MM-DD)
    #[arg(long, global = true)]
    pub today: Option<CalendarDate>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an empty document and a default cadence.toml
    Init(InitArgs),
    /// Show the task tree
    Tree(TreeArgs),
    /// Show the calendar grid
    Calendar(CalendarArgs),
    /// Validate document integrity
    Check,
    /// Read commands from stdin, with undo/redo; saves at end of input
    Shell,
    #[command(flatten)]
    Doc(DocCommand),
}

/// Commands that edit the document. Shared by the CLI and `cad shell`.
#[derive(Subcommand, Debug, Clone)]
pub enum DocCommand {
    /// Add a task (top level, or under --parent)
    Add(AddArgs),
    /// Add a task right after another
    After(AfterArgs),
    /// Change a task's title or interval
    Edit(EditArgs),
    /// Set a task's colour
    Swatch(SwatchArgs),
    /// Delete a task and its subtasks
    Rm(PathArg),
    /// Move a task under another parent
    Mv(MvArgs),
    /// Reorder a task among its siblings
    Reorder(ReorderArgs),
    /// Duplicate a task and its subtasks
    Cp(PathArg),
    /// Fold or unfold a task
    Fold(PathArg),
    /// Mark (or unmark) a task done on a day
    Done(DoneArgs),
    /// Memo management
    Memo(MemoCmd),
    /// Numbered checklist management
    List(ListCmd),
    /// Toggle a holiday
    Holiday(HolidayArgs),
    /// Pin or clear the visible date range
    Range(RangeArgs),
}

// ---------------------------------------------------------------------------
// Init / read args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing document and config
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct TreeArgs {
    /// Include folded subtasks
    #[arg(long)]
    pub all: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CalendarArgs {
    /// First day shown (default: the document's range, or a window around today)
    #[arg(long, requires = "end")]
    pub start: Option<CalendarDate>,
    /// Last day shown
    #[arg(long, requires = "start")]
    pub end: Option<CalendarDate>,
}

// ---------------------------------------------------------------------------
// Task args
// ---------------------------------------------------------------------------

#[derive(Args, Debug, Clone)]
pub struct PathArg {
    /// Task path, e.g. 0.2.1
    pub path: TaskPath,
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Task title
    pub title: String,
    /// Parent task path (default: top level)
    #[arg(long)]
    pub parent: Option<TaskPath>,
    /// Recurrence interval in days
    #[arg(long)]
    pub interval: Option<u32>,
}

#[derive(Args, Debug, Clone)]
pub struct AfterArgs {
    /// Path of the task to insert after
    pub path: TaskPath,
    /// Task title
    pub title: String,
    /// Recurrence interval in days
    #[arg(long)]
    pub interval: Option<u32>,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// Task path
    pub path: TaskPath,
    /// New title
    #[arg(long)]
    pub title: Option<String>,
    /// New interval in days
    #[arg(long)]
    pub interval: Option<u32>,
}

#[derive(Args, Debug, Clone)]
pub struct SwatchArgs {
    /// Task path
    pub path: TaskPath,
    /// Palette index
    #[arg(long, default_value = "0")]
    pub id: u32,
    /// Literal background colour, e.g. "#ffcc00"
    #[arg(long)]
    pub color: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct MvArgs {
    /// Path of the task to move
    pub from: TaskPath,
    /// New parent path ("/" for top level)
    pub to_parent: TaskPath,
    /// Position under the new parent (default: last)
    #[arg(long)]
    pub index: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct ReorderArgs {
    /// Parent path ("/" for top level)
    pub parent: TaskPath,
    /// Current index of the child
    pub from: usize,
    /// New index of the child
    pub to: usize,
}

#[derive(Args, Debug, Clone)]
pub struct DoneArgs {
    /// Task id or path
    pub task: String,
    /// Day to toggle (default: today)
    pub date: Option<CalendarDate>,
}

// ---------------------------------------------------------------------------
// Memo / checklist / calendar args
// ---------------------------------------------------------------------------

#[derive(Args, Debug, Clone)]
pub struct MemoCmd {
    #[command(subcommand)]
    pub action: MemoAction,
}

#[derive(Subcommand, Debug, Clone)]
pub enum MemoAction {
    /// Add a memo
    Add {
        text: String,
        #[arg(long, default_value = "0")]
        swatch: u32,
    },
    /// Change a memo's text or colour
    Edit {
        index: usize,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        swatch: Option<u32>,
    },
    /// Remove a memo
    Rm { index: usize },
    /// Move a memo to a new position
    Mv { from: usize, to: usize },
    /// List memos
    Ls,
}

#[derive(Args, Debug, Clone)]
pub struct ListCmd {
    #[command(subcommand)]
    pub action: ListAction,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ListAction {
    /// Add a checklist numbered START..=END
    Add {
        name: String,
        start: i64,
        end: i64,
        #[arg(long, default_value = "0")]
        swatch: u32,
    },
    /// Remove a checklist
    Rm { id: String },
    /// Rename a checklist
    Rename { id: String, name: String },
    /// Tick or untick a number
    Check { id: String, number: i64 },
    /// List checklists
    Ls,
}

#[derive(Args, Debug, Clone)]
pub struct HolidayArgs {
    /// Day to toggle
    pub date: CalendarDate,
}

#[derive(Args, Debug, Clone)]
pub struct RangeArgs {
    /// First visible day
    #[arg(required_unless_present = "clear", requires = "end")]
    pub start: Option<CalendarDate>,
    /// Last visible day
    pub end: Option<CalendarDate>,
    /// Go back to the window around today
    #[arg(long, conflicts_with_all = ["start", "end"])]
    pub clear: bool,
}

// ---------------------------------------------------------------------------
// Shell lines
// ---------------------------------------------------------------------------

/// One line typed into `cad shell`
#[derive(Parser, Debug)]
#[command(name = "shell", no_binary_name = true, disable_version_flag = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: ShellCommand,
}

#[derive(Subcommand, Debug)]
pub enum ShellCommand {
    /// Step back one command
    Undo,
    /// Re-apply the last undone command
    Redo,
    /// Show the task tree
    Tree(TreeArgs),
    /// Show the calendar grid
    Calendar(CalendarArgs),
    /// Stop reading input
    #[command(alias = "exit")]
    Quit,
    #[command(flatten)]
    Doc(DocCommand),
}
