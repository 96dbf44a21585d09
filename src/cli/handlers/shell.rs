use std::error::Error;
use std::io::{self, BufRead};

use clap::Parser;

use super::{Context, print_applied, print_calendar, print_lists, print_memos, print_tree, to_command};
use crate::cli::commands::{DocCommand, ListAction, ListCmd, MemoAction, MemoCmd, ShellCommand, ShellLine};
use crate::io::document_io;
use crate::io::lock::DocumentLock;
use crate::model::config::AppConfig;
use crate::session::Session;

/// Error from splitting a shell line into words
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unterminated quote in: {0}")]
pub struct SplitError(String);

/// Counts reported when the input ends
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ShellSummary {
    pub applied: usize,
    pub failed: usize,
}

/// `cad shell`: hold the document lock, run one command per stdin line,
/// then save once if anything changed.
pub fn cmd_shell(ctx: &Context) -> Result<(), Box<dyn Error>> {
    let _lock = DocumentLock::acquire_default(&ctx.file)?;
    let mut session = ctx.session(ctx.load()?);

    let stdin = io::stdin();
    let summary = run_script(&mut session, &ctx.config, stdin.lock(), ctx.json)?;

    if session.is_dirty() {
        document_io::save_document(&ctx.file, session.document())?;
        session.mark_saved();
        eprintln!(
            "saved {} ({} applied, {} failed)",
            ctx.file.display(),
            summary.applied,
            summary.failed
        );
    }
    Ok(())
}

/// Run every line of `input` against `session`. Bad lines and rejected
/// commands are reported on stderr and do not stop the script.
pub fn run_script(
    session: &mut Session,
    config: &AppConfig,
    input: impl BufRead,
    json: bool,
) -> Result<ShellSummary, Box<dyn Error>> {
    let mut summary = ShellSummary::default();
    for line in input.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        session.refresh();

        let words = match split_words(trimmed) {
            Ok(words) => words,
            Err(e) => {
                eprintln!("error: {}", e);
                summary.failed += 1;
                continue;
            }
        };
        let parsed = match ShellLine::try_parse_from(words) {
            Ok(parsed) => parsed,
            Err(e) => {
                eprintln!("{}", e.render());
                summary.failed += 1;
                continue;
            }
        };

        let outcome: Result<(), Box<dyn Error>> = match parsed.command {
            ShellCommand::Quit => break,
            ShellCommand::Undo => session.undo().map_err(Into::into),
            ShellCommand::Redo => session.redo().map_err(Into::into),
            ShellCommand::Tree(args) => print_tree(session, &args, json),
            ShellCommand::Calendar(args) => print_calendar(session, config, &args, json),
            ShellCommand::Doc(DocCommand::Memo(MemoCmd {
                action: MemoAction::Ls,
            })) => print_memos(session.document(), json),
            ShellCommand::Doc(DocCommand::List(ListCmd {
                action: ListAction::Ls,
            })) => print_lists(session.document(), json),
            ShellCommand::Doc(cmd) => apply_line(session, config, &cmd, json),
        };
        match outcome {
            Ok(()) => summary.applied += 1,
            Err(e) => {
                eprintln!("error: {}", e);
                summary.failed += 1;
            }
        }
    }
    Ok(summary)
}

fn apply_line(session: &mut Session, config: &AppConfig, cmd: &DocCommand, json: bool) -> Result<(), Box<dyn Error>> {
    let command = to_command(cmd, session.document(), session.today(), config)?;
    let applied = session.execute(&command)?;
    print_applied(&command, &applied, json)
}

/// Split a line into words. Single and double quotes group words; a
/// backslash escapes the next character outside single quotes.
pub fn split_words(line: &str) -> Result<Vec<String>, SplitError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some('\''), c) => current.push(c),
            (_, '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                in_word = true;
            }
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if quote.is_some() {
        return Err(SplitError(line.to_string()));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}
