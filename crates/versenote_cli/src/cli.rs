//! Command definitions and handlers.
//!
//! # Responsibility
//! - Resolve global settings from flags and environment.
//! - Open the note store once and dispatch one subcommand against it.
//!
//! # Invariants
//! - Logging starts before the store is opened.
//! - Stdout carries command output only; diagnostics go to the log file.

use anyhow::{bail, Context};
use log::info;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use versenote_core::db::open_db;
use versenote_core::{
    default_log_level, import_cross_references, import_translation, init_logging, verse_id,
    DocumentService, NoteListQuery, SqliteNoteRepository, SqliteVerseRepository,
    UuidIdGenerator, VerseRepository,
};

#[derive(Debug, clap::Parser)]
#[command(name = "versenote", version, about = "Outline notes with verse references")]
pub struct Cli {
    /// Note store file
    #[arg(long, env = "VERSENOTE_DB", default_value = "versenote.db", global = true)]
    db: PathBuf,

    /// Absolute directory for log files [default: <tmp>/versenote-logs]
    #[arg(long, env = "VERSENOTE_LOG_DIR", global = true)]
    log_dir: Option<PathBuf>,

    /// trace, debug, info, warn or error [default: debug in debug builds, info otherwise]
    #[arg(long, env = "VERSENOTE_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Resolve an outline document and store every changed note
    Ingest(Ingest),

    /// Print one stored note as JSON
    Show {
        id: String,
    },

    /// Delete a note and drop it from every other note's references
    Delete {
        id: String,
    },

    /// List stored notes matching all given filters
    Find(Find),

    /// Print one verse
    Verse(Verse),

    /// Import a translation from bible-database JSON files
    ImportVerses {
        /// Translation code, e.g. `asv`
        translation: String,
        /// Book key file (`key_english.json`)
        keys: PathBuf,
        /// Translation row file (`t_asv.json`)
        rows: PathBuf,
    },

    /// Import verse cross-references from bible-cross-reference JSON files
    ImportCrossRefs {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Debug, clap::Args)]
pub struct Ingest {
    file: PathBuf,

    /// List the notes that would be written; store and file stay untouched
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, clap::Args)]
pub struct Find {
    /// Plain tag
    #[arg(long)]
    tag: Option<String>,

    /// Key of a `key: value` tag
    #[arg(long)]
    key: Option<String>,

    /// Referenced verse id, e.g. `asv/John/3/16`
    #[arg(long)]
    verse: Option<String>,

    #[arg(long)]
    limit: Option<u32>,

    #[arg(long, default_value_t = 0)]
    offset: u32,
}

#[derive(Debug, clap::Args)]
pub struct Verse {
    book: String,
    chapter: u32,
    verse: u32,

    #[arg(long, default_value = "asv")]
    translation: String,

    /// Skip the text of cross-referenced verses
    #[arg(long)]
    no_refs: bool,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        self.setup_logging()?;
        info!(
            "event=cli_start module=cli status=ok version={}",
            versenote_core::core_version()
        );

        let mut conn = open_db(&self.db)
            .with_context(|| format!("failed to open note store `{}`", self.db.display()))?;
        self.command.run(&mut conn)
    }

    fn setup_logging(&self) -> anyhow::Result<()> {
        let level = self
            .log_level
            .clone()
            .unwrap_or_else(|| default_log_level().to_string());
        let dir = self
            .log_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("versenote-logs"));
        let dir = dir
            .to_str()
            .with_context(|| format!("log directory `{}` is not valid UTF-8", dir.display()))?;
        init_logging(&level, dir).map_err(anyhow::Error::msg)
    }
}

impl Command {
    fn run(self, conn: &mut Connection) -> anyhow::Result<()> {
        match self {
            Self::Ingest(ingest) => ingest.run(conn),
            Self::Show { id } => {
                let service = document_service(conn)?;
                let Some(note) = service.get_note(&id)? else {
                    bail!("note `{id}` not found");
                };
                println!("{}", serde_json::to_string_pretty(&note)?);
                Ok(())
            }
            Self::Delete { id } => {
                let mut service = document_service(conn)?;
                if !service.delete_note(&id)? {
                    bail!("note `{id}` not found");
                }
                println!("deleted {id}");
                Ok(())
            }
            Self::Find(find) => find.run(conn),
            Self::Verse(verse) => verse.run(conn),
            Self::ImportVerses {
                translation,
                keys,
                rows,
            } => {
                let keys_json = read_file(&keys)?;
                let rows_json = read_file(&rows)?;
                let mut repo = SqliteVerseRepository::try_new(conn)?;
                let written = import_translation(&mut repo, &translation, &keys_json, &rows_json)?;
                println!("imported {written} verses into `{translation}`");
                Ok(())
            }
            Self::ImportCrossRefs { files } => {
                let mut repo = SqliteVerseRepository::try_new(conn)?;
                let mut written = 0;
                for file in &files {
                    let json = read_file(file)?;
                    written += import_cross_references(&mut repo, &json)
                        .with_context(|| format!("failed to import `{}`", file.display()))?;
                }
                println!("imported cross-references for {written} verses");
                Ok(())
            }
        }
    }
}

impl Ingest {
    /// Generated ids are written back into the file so the next run updates
    /// the same notes instead of creating new ones.
    fn run(self, conn: &mut Connection) -> anyhow::Result<()> {
        let document = read_file(&self.file)?;
        let mut service = document_service(conn)?;

        if self.dry_run {
            let pending = service
                .preview(&document)
                .with_context(|| format!("failed to resolve `{}`", self.file.display()))?;
            println!("would write {}", pending.len());
            for id in &pending {
                println!("  {id}");
            }
            return Ok(());
        }

        let report = service
            .ingest(&document)
            .with_context(|| format!("failed to ingest `{}`", self.file.display()))?;

        println!(
            "resolved {} notes, wrote {}",
            report.root.node_count(),
            report.written.len()
        );
        for id in &report.written {
            println!("  {id}");
        }

        let annotated = report.annotated_document();
        if annotated != document.replace("\r\n", "\n") {
            fs::write(&self.file, annotated)
                .with_context(|| format!("failed to write `{}`", self.file.display()))?;
            info!(
                "event=document_write_back module=cli status=ok notes={}",
                report.root.node_count()
            );
            println!("updated ids in {}", self.file.display());
        }
        Ok(())
    }
}

impl Find {
    fn run(self, conn: &mut Connection) -> anyhow::Result<()> {
        let service = document_service(conn)?;
        let query = NoteListQuery {
            tag: self.tag,
            kv_key: self.key,
            verse: self.verse,
            limit: self.limit,
            offset: self.offset,
        };
        for note in service.list_notes(&query)? {
            let title = note
                .attributes
                .title
                .or(note.attributes.theme)
                .unwrap_or_default();
            println!("{}\t{}", note.id, title.lines().next().unwrap_or_default());
        }
        Ok(())
    }
}

impl Verse {
    fn run(self, conn: &mut Connection) -> anyhow::Result<()> {
        let repo = SqliteVerseRepository::try_new(conn)?;
        let id = verse_id(
            &self.translation,
            &capitalize_book(&self.book),
            self.chapter,
            self.verse,
        );
        let Some(verse) = repo.get_verse(&id)? else {
            bail!("verse `{id}` not found");
        };
        println!("{} {}:{} {}", verse.book, verse.chapter, verse.verse, verse.text);
        if self.no_refs {
            return Ok(());
        }

        for reference in repo.cross_references(&id)? {
            println!(
                "  {} {}:{} {}",
                reference.book, reference.chapter, reference.verse, reference.text
            );
        }
        Ok(())
    }
}

fn document_service(
    conn: &mut Connection,
) -> anyhow::Result<DocumentService<SqliteNoteRepository<'_>, UuidIdGenerator>> {
    let repo = SqliteNoteRepository::try_new(conn)?;
    Ok(DocumentService::new(repo, UuidIdGenerator))
}

fn read_file(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read `{}`", path.display()))
}

/// `john` becomes `John`; numbered books such as `1john` are left alone.
fn capitalize_book(book: &str) -> String {
    let mut chars = book.chars();
    match chars.next() {
        Some(first) if first.is_ascii_digit() => book.to_string(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{capitalize_book, Cli, Command, Ingest};
    use clap::{CommandFactory, Parser};
    use rusqlite::Connection;
    use std::fs;
    use versenote_core::db::open_db_in_memory;

    const DOCUMENT: &str = "@theme\nRoot\n@\n@tags\nstudy\n@\n\n# @ Child\n@theme\nChild\n@\n@tags\nleaf\n@";

    fn note_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM notes;", [], |row| row.get(0))
            .unwrap()
    }

    fn ingest(path: &std::path::Path, dry_run: bool, conn: &mut Connection) {
        Ingest {
            file: path.to_path_buf(),
            dry_run,
        }
        .run(conn)
        .unwrap();
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn book_names_are_capitalized() {
        assert_eq!(capitalize_book("john"), "John");
        assert_eq!(capitalize_book("Psalms"), "Psalms");
        assert_eq!(capitalize_book("1john"), "1john");
        assert_eq!(capitalize_book(""), "");
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "versenote",
            "ingest",
            "notes.md",
            "--dry-run",
            "--db",
            "/tmp/other.db",
        ])
        .unwrap();
        assert_eq!(cli.db, std::path::PathBuf::from("/tmp/other.db"));
        match cli.command {
            Command::Ingest(ingest) => assert!(ingest.dry_run),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn repeated_ingest_reuses_ids_written_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        fs::write(&path, DOCUMENT).unwrap();
        let mut conn = open_db_in_memory().unwrap();

        ingest(&path, false, &mut conn);
        let annotated = fs::read_to_string(&path).unwrap();
        ingest(&path, false, &mut conn);

        assert_eq!(note_count(&conn), 2);
        assert!(annotated.starts_with("@_id"));
        assert_eq!(fs::read_to_string(&path).unwrap(), annotated);
    }

    #[test]
    fn dry_run_leaves_store_and_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        fs::write(&path, DOCUMENT).unwrap();
        let mut conn = open_db_in_memory().unwrap();

        ingest(&path, true, &mut conn);

        assert_eq!(note_count(&conn), 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), DOCUMENT);
    }

    #[test]
    fn verse_translation_defaults_to_asv() {
        let cli = Cli::try_parse_from(["versenote", "verse", "john", "3", "16"]).unwrap();
        match cli.command {
            Command::Verse(verse) => {
                assert_eq!(verse.translation, "asv");
                assert_eq!((verse.chapter, verse.verse), (3, 16));
                assert!(!verse.no_refs);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
