mod init;
mod shell;

pub use init::cmd_init;
pub use shell::cmd_shell;

use std::error::Error;
use std::path::PathBuf;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::document_io;
use crate::io::lock::DocumentLock;
use crate::model::config::AppConfig;
use crate::model::date::{CalendarDate, FixedClock};
use crate::model::document::{DateRange, Document};
use crate::model::path::TaskPath;
use crate::model::task::{TaskDraft, TaskId};
use crate::ops::check;
use crate::ops::command::{Applied, Command};
use crate::ops::task_ops::{self, TaskRef};
use crate::session::Session;
use crate::view::calendar::{CalendarMatrix, build_calendar_matrix};
use crate::view::flatten::{flatten_all, flatten_visible};

/// Everything a handler needs from the global flags
pub struct Context {
    pub file: PathBuf,
    pub config: AppConfig,
    pub json: bool,
    /// Pinned by `--today`; the system clock otherwise
    pub today: Option<CalendarDate>,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Result<Self, Box<dyn Error>> {
        let config = config_io::load_config(cli.config.as_deref(), &cli.file)?;
        Ok(Context {
            file: cli.file.clone(),
            config,
            json: cli.json,
            today: cli.today,
        })
    }

    /// A session over `doc` using this context's clock and history limit.
    pub fn session(&self, doc: Document) -> Session {
        let session = match self.today {
            Some(today) => Session::new(doc, FixedClock(today)),
            None => Session::open(doc),
        };
        session.with_history_limit(self.config.history.limit)
    }

    fn load(&self) -> Result<Document, Box<dyn Error>> {
        let doc = document_io::load_document(&self.file)?;
        let result = check::check_document(&doc);
        if !result.valid {
            tracing::warn!(
                path = %self.file.display(),
                errors = result.errors.len(),
                "document failed integrity checks (run `cad check`)"
            );
        }
        Ok(doc)
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn Error>> {
    let ctx = Context::from_cli(&cli)?;

    match cli.command {
        Commands::Init(args) => cmd_init(&ctx, args),

        // Read commands
        Commands::Tree(args) => cmd_tree(&ctx, &args),
        Commands::Calendar(args) => cmd_calendar(&ctx, &args),
        Commands::Check => cmd_check(&ctx),
        Commands::Doc(DocCommand::Memo(MemoCmd {
            action: MemoAction::Ls,
        })) => cmd_memo_ls(&ctx),
        Commands::Doc(DocCommand::List(ListCmd {
            action: ListAction::Ls,
        })) => cmd_list_ls(&ctx),

        // Write commands
        Commands::Doc(cmd) => cmd_write(&ctx, &cmd),
        Commands::Shell => cmd_shell(&ctx),
    }
}

// ---------------------------------------------------------------------------
// Read command handlers
// ---------------------------------------------------------------------------

fn cmd_tree(ctx: &Context, args: &TreeArgs) -> Result<(), Box<dyn Error>> {
    let session = ctx.session(ctx.load()?);
    print_tree(&session, args, ctx.json)
}

fn cmd_calendar(ctx: &Context, args: &CalendarArgs) -> Result<(), Box<dyn Error>> {
    let session = ctx.session(ctx.load()?);
    print_calendar(&session, &ctx.config, args, ctx.json)
}

fn cmd_check(ctx: &Context) -> Result<(), Box<dyn Error>> {
    let doc = document_io::load_document(&ctx.file)?;
    let result = check::check_document(&doc);
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for line in format_check_result(&result) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_memo_ls(ctx: &Context) -> Result<(), Box<dyn Error>> {
    print_memos(&ctx.load()?, ctx.json)
}

fn cmd_list_ls(ctx: &Context) -> Result<(), Box<dyn Error>> {
    print_lists(&ctx.load()?, ctx.json)
}

pub(crate) fn print_memos(doc: &Document, json: bool) -> Result<(), Box<dyn Error>> {
    if json {
        let memos: Vec<MemoJson<'_>> = doc
            .memos
            .iter()
            .enumerate()
            .map(|(index, memo)| MemoJson { index, memo })
            .collect();
        println!("{}", serde_json::to_string_pretty(&memos)?);
    } else {
        for (index, memo) in doc.memos.iter().enumerate() {
            println!("{}", format_memo_line(index, memo));
        }
    }
    Ok(())
}

pub(crate) fn print_lists(doc: &Document, json: bool) -> Result<(), Box<dyn Error>> {
    if json {
        let lists: Vec<ChecklistJson<'_>> = doc
            .lists
            .iter()
            .map(|list| ChecklistJson {
                list,
                done: list.done_in_range(),
                total: list.len(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&lists)?);
    } else {
        for list in &doc.lists {
            println!("{}", format_checklist_line(list));
        }
    }
    Ok(())
}

pub(crate) fn print_tree(session: &Session, args: &TreeArgs, json: bool) -> Result<(), Box<dyn Error>> {
    let tasks = &session.document().tasks;
    let rows = if args.all {
        flatten_all(tasks)
    } else {
        flatten_visible(tasks)
    };
    let today = session.today();
    if json {
        let rows: Vec<TaskRowJson> = rows.iter().map(|row| row_to_json(row, today)).collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for row in &rows {
            println!("{}", format_tree_line(row, today));
        }
    }
    Ok(())
}

pub(crate) fn print_calendar(
    session: &Session,
    config: &AppConfig,
    args: &CalendarArgs,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    let matrix: CalendarMatrix = match (args.start, args.end) {
        (Some(start), Some(end)) => {
            build_calendar_matrix(session.document(), DateRange::new(start, end), session.today())
        }
        _ => session.calendar(&config.calendar),
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&matrix)?);
    } else {
        let doc = session.document();
        for line in format_calendar(&matrix, &|date| doc.is_holiday(date)) {
            println!("{}", line);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write command handlers
// ---------------------------------------------------------------------------

/// Lock, load, apply one command, save.
fn cmd_write(ctx: &Context, cmd: &DocCommand) -> Result<(), Box<dyn Error>> {
    let _lock = DocumentLock::acquire_default(&ctx.file)?;
    let mut session = ctx.session(ctx.load()?);
    let command = to_command(cmd, session.document(), session.today(), &ctx.config)?;
    let applied = session.execute(&command)?;
    document_io::save_document(&ctx.file, session.document())?;
    session.mark_saved();
    print_applied(&command, &applied, ctx.json)
}

pub(crate) fn print_applied(command: &Command, applied: &Applied, json: bool) -> Result<(), Box<dyn Error>> {
    if json {
        println!("{}", serde_json::to_string(&applied_to_json(command.name(), applied))?);
        return Ok(());
    }
    match applied {
        Applied::Unit => {}
        Applied::Path(path) => println!("{}", path),
        Applied::Toggled(on) => println!("{}", if *on { "on" } else { "off" }),
        Applied::Index(index) => println!("{}", index),
        Applied::ListId(id) => println!("{}", id),
    }
    Ok(())
}

/// Turn parsed arguments into an engine command. Read-only variants
/// (`memo ls`, `list ls`) have no command and are rejected here.
pub(crate) fn to_command(
    cmd: &DocCommand,
    doc: &Document,
    today: CalendarDate,
    config: &AppConfig,
) -> Result<Command, Box<dyn Error>> {
    let interval = |explicit: Option<u32>| explicit.unwrap_or(config.tasks.default_interval_days);
    Ok(match cmd {
        DocCommand::Add(args) => Command::AddChild {
            parent: args.parent.clone().unwrap_or_default(),
            draft: TaskDraft::new(args.title.clone(), interval(args.interval)),
        },
        DocCommand::After(args) => Command::AddSibling {
            after: args.path.clone(),
            draft: TaskDraft::new(args.title.clone(), interval(args.interval)),
        },
        DocCommand::Edit(args) => {
            if args.title.is_none() && args.interval.is_none() {
                return Err("nothing to change: pass --title and/or --interval".into());
            }
            Command::Edit {
                path: args.path.clone(),
                title: args.title.clone(),
                interval_days: args.interval,
            }
        }
        DocCommand::Swatch(args) => Command::SetSwatch {
            path: args.path.clone(),
            swatch_id: args.id,
            bg_color: args.color.clone(),
        },
        DocCommand::Rm(args) => Command::Delete {
            path: args.path.clone(),
        },
        DocCommand::Mv(args) => Command::Move {
            from: args.from.clone(),
            to_parent: args.to_parent.clone(),
            to_index: args.index.unwrap_or(usize::MAX),
        },
        DocCommand::Reorder(args) => Command::Reorder {
            parent: args.parent.clone(),
            from: args.from,
            to: args.to,
        },
        DocCommand::Cp(args) => Command::Copy {
            path: args.path.clone(),
        },
        DocCommand::Fold(args) => Command::ToggleCollapse {
            path: args.path.clone(),
        },
        DocCommand::Done(args) => Command::ToggleCompletion {
            task: resolve_task_ref(doc, &args.task)?,
            date: args.date.unwrap_or(today),
        },
        DocCommand::Memo(memo) => match &memo.action {
            MemoAction::Add { text, swatch } => Command::AddMemo {
                text: text.clone(),
                swatch_id: *swatch,
            },
            MemoAction::Edit { index, text, swatch } => Command::EditMemo {
                index: *index,
                text: text.clone(),
                swatch_id: *swatch,
            },
            MemoAction::Rm { index } => Command::RemoveMemo { index: *index },
            MemoAction::Mv { from, to } => Command::MoveMemo { from: *from, to: *to },
            MemoAction::Ls => return Err("`memo ls` does not change the document".into()),
        },
        DocCommand::List(list) => match &list.action {
            ListAction::Add {
                name,
                start,
                end,
                swatch,
            } => Command::AddList {
                name: name.clone(),
                start: *start,
                end: *end,
                swatch_id: *swatch,
            },
            ListAction::Rm { id } => Command::RemoveList { id: id.clone() },
            ListAction::Rename { id, name } => Command::RenameList {
                id: id.clone(),
                name: name.clone(),
            },
            ListAction::Check { id, number } => Command::ToggleListNumber {
                id: id.clone(),
                number: *number,
            },
            ListAction::Ls => return Err("`list ls` does not change the document".into()),
        },
        DocCommand::Holiday(args) => Command::ToggleHoliday { date: args.date },
        DocCommand::Range(args) => Command::SetCalendarRange {
            range: match (args.clear, args.start, args.end) {
                (false, Some(start), Some(end)) => Some(DateRange::new(start, end)),
                _ => None,
            },
        },
    })
}

/// A task id takes precedence; anything else must parse as a path.
fn resolve_task_ref(doc: &Document, text: &str) -> Result<TaskRef, Box<dyn Error>> {
    let id = TaskId::from(text);
    if task_ops::find_task(&doc.tasks, &id).is_some() {
        return Ok(TaskRef::Id(id));
    }
    let path: TaskPath = text
        .parse()
        .map_err(|_| format!("no task with id or path {:?}", text))?;
    Ok(TaskRef::Path(path))
}
