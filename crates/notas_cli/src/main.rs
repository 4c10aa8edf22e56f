//! `notas` command-line entry point.
//!
//! # Responsibility
//! - Parse commands and map them onto `NoteStore` operations.
//! - Render notes as plain text; no note logic lives here.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use notas_core::db::open_db;
use notas_core::{
    default_log_level, format_date, format_timestamp, init_logging, Note, NoteDraft, NoteFilters,
    NoteStore, SlotStorage, SqliteSlotStorage, StoreError,
};
use std::io::{self, Write};
use std::path::PathBuf;
use uuid::Uuid;

const DB_FILE_NAME: &str = "notas.sqlite3";

#[derive(Parser)]
#[command(name = "notas")]
#[command(about = "Keep track of important notes")]
#[command(version)]
struct Cli {
    /// Database file (defaults to the user data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Log level: trace|debug|info|warn|error (needs --log-dir)
    #[arg(long, global = true, requires = "log_dir")]
    log_level: Option<String>,
    /// Absolute directory for log files; logging is off when omitted
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new note
    Add(AddArgs),
    /// List active notes
    List(ListArgs),
    /// Archive a note by id
    Archive(ArchiveArgs),
    /// List archived notes
    Archived,
    /// List tags in use by active notes
    Tags,
}

#[derive(Args)]
struct AddArgs {
    /// Short title
    title: String,
    /// Details or reminder text
    #[arg(default_value = "")]
    content: String,
    /// Comma-separated tags
    #[arg(short, long, default_value = "")]
    tags: String,
    /// Due date, e.g. 2024-01-31 or 2024-01-31T18:00
    #[arg(short, long, default_value = "")]
    due: String,
}

#[derive(Args)]
struct ListArgs {
    /// Only notes carrying this tag
    #[arg(short, long, default_value = "")]
    tag: String,
    /// Only notes whose title or content contains this text
    #[arg(short, long, default_value = "")]
    search: String,
}

#[derive(Args)]
struct ArchiveArgs {
    /// Note id as printed by `add` or `list`
    id: Uuid,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let level = cli
            .log_level
            .clone()
            .unwrap_or_else(|| default_log_level().to_string());
        init_logging(&level, log_dir).context("failed to initialize logging")?;
    }

    let db_path = match cli.db {
        Some(path) => path,
        None => default_db_path()?,
    };
    let conn = open_db(&db_path)
        .with_context(|| format!("failed to open database `{}`", db_path.display()))?;
    let mut store = NoteStore::new(SqliteSlotStorage::new(conn));
    load_store(&mut store)?;

    let stdout = io::stdout();
    run(cli.command, &mut store, &mut stdout.lock())
}

/// Executes one command against a loaded store, writing user output to `out`.
fn run<S: SlotStorage>(
    command: Commands,
    store: &mut NoteStore<S>,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Commands::Add(args) => {
            let draft = NoteDraft::new(args.title, args.content, args.tags, args.due);
            let note = store.add_note(draft)?;
            writeln!(out, "Note created with id {}.", note.id)?;
        }
        Commands::List(args) => {
            *store.filters_mut() = NoteFilters::new(args.search, args.tag);
            let empty_message = if store.filters().is_empty() {
                "No notes to show."
            } else {
                "No notes match the filters."
            };
            write_notes(out, store.filtered_notes(), empty_message)?;
        }
        Commands::Archive(args) => {
            if store.archive_note(args.id)? {
                writeln!(out, "Note {} archived.", args.id)?;
            } else if store.get_note(args.id).is_some() {
                writeln!(out, "Note {} was already archived.", args.id)?;
            } else {
                writeln!(out, "No note found with id {}.", args.id)?;
            }
        }
        Commands::Archived => {
            write_notes(out, store.archived_notes(), "No archived notes.")?;
        }
        Commands::Tags => {
            let tags = store.known_tags();
            if tags.is_empty() {
                writeln!(out, "No tags in use.")?;
            }
            for tag in tags {
                writeln!(out, "{tag}")?;
            }
        }
    }

    Ok(())
}

/// Loads persisted notes; a corrupt payload is reported but not fatal.
fn load_store<S: SlotStorage>(store: &mut NoteStore<S>) -> Result<()> {
    match store.load() {
        Ok(()) => Ok(()),
        Err(err @ StoreError::CorruptState { .. }) => {
            eprintln!("warning: {err}; starting with an empty collection");
            info!("event=cli_load module=cli status=recovered reason=corrupt_state");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn default_db_path() -> Result<PathBuf> {
    let base = dirs::data_dir().context("could not determine the user data directory")?;
    Ok(base.join("notas").join(DB_FILE_NAME))
}

fn write_notes<'a>(
    out: &mut impl Write,
    notes: impl Iterator<Item = &'a Note>,
    empty_message: &str,
) -> io::Result<()> {
    let mut shown = 0usize;
    for note in notes {
        writeln!(out, "{}\n", render_note(note))?;
        shown += 1;
    }
    if shown == 0 {
        writeln!(out, "{empty_message}")?;
    }
    Ok(())
}

fn render_note(note: &Note) -> String {
    let tags = if note.tags.is_empty() {
        String::new()
    } else {
        format!(" [tags: {}]", note.tags.join(", "))
    };
    let due = match note.due_date.as_deref() {
        Some(value) => format!(" (due: {})", format_date(Some(value))),
        None => String::new(),
    };
    let mut rendered = format!(
        "{} {}{}{}\n  created {}",
        note.id,
        note.title,
        tags,
        due,
        format_timestamp(&note.created_at)
    );
    if !note.content.is_empty() {
        rendered.push_str("\n  ");
        rendered.push_str(&note.content);
    }
    rendered
}
