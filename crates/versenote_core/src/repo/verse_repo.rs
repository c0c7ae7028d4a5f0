//! Verse lookup contract and SQLite implementation.
//!
//! # Invariants
//! - Verse ids follow `translation/book/chapter/verse`.
//! - Inserting an existing verse id replaces its text.
//! - Cross-references are keyed by translation-independent location; the
//!   first import of a location/target pair wins.

use crate::model::verse::{CrossReference, VerseRecord};
use crate::repo::{ensure_schema, RepoResult};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

/// Verse lookup contract.
pub trait VerseRepository {
    fn verse_exists(&self, verse_id: &str) -> RepoResult<bool>;
    fn get_verse(&self, verse_id: &str) -> RepoResult<Option<VerseRecord>>;
    /// Inserts or replaces verses; returns the number written.
    fn insert_verses(&mut self, verses: &[VerseRecord]) -> RepoResult<usize>;
    fn count_verses(&self, translation: &str) -> RepoResult<u64>;
    /// Stores cross-references; returns the number of source locations.
    fn insert_cross_references(&mut self, references: &[CrossReference]) -> RepoResult<usize>;
    /// Verses cross-referenced by `verse_id`, read in the same translation.
    ///
    /// Targets missing from that translation are skipped.
    fn cross_references(&self, verse_id: &str) -> RepoResult<Vec<VerseRecord>>;
}

/// SQLite-backed verse store.
pub struct SqliteVerseRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteVerseRepository<'conn> {
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_schema(
            conn,
            &[
                (
                    "verses",
                    &["id", "translation", "book", "chapter", "verse", "text"],
                ),
                ("verse_cross_refs", &["location", "target", "position"]),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl VerseRepository for SqliteVerseRepository<'_> {
    fn verse_exists(&self, verse_id: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM verses WHERE id = ?1);",
            [verse_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn get_verse(&self, verse_id: &str) -> RepoResult<Option<VerseRecord>> {
        let verse = self
            .conn
            .query_row(
                "SELECT translation, book, chapter, verse, text
                 FROM verses
                 WHERE id = ?1;",
                [verse_id],
                |row| {
                    Ok(VerseRecord {
                        translation: row.get("translation")?,
                        book: row.get("book")?,
                        chapter: row.get("chapter")?,
                        verse: row.get("verse")?,
                        text: row.get("text")?,
                    })
                },
            )
            .optional()?;
        Ok(verse)
    }

    fn insert_verses(&mut self, verses: &[VerseRecord]) -> RepoResult<usize> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO verses (id, translation, book, chapter, verse, text)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET text = excluded.text;",
            )?;
            for verse in verses {
                stmt.execute(params![
                    verse.id(),
                    verse.translation.as_str(),
                    verse.book.as_str(),
                    verse.chapter,
                    verse.verse,
                    verse.text.as_str(),
                ])?;
            }
        }
        tx.commit()?;

        info!(
            "event=verse_insert module=repo status=ok count={}",
            verses.len()
        );
        Ok(verses.len())
    }

    fn count_verses(&self, translation: &str) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM verses WHERE translation = ?1;",
            [translation],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    fn insert_cross_references(&mut self, references: &[CrossReference]) -> RepoResult<usize> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO verse_cross_refs (location, target, position)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(location, target) DO NOTHING;",
            )?;
            for reference in references {
                for (position, target) in reference.targets.iter().enumerate() {
                    stmt.execute(params![
                        reference.location.as_str(),
                        target.as_str(),
                        i64::try_from(position).unwrap_or(i64::MAX),
                    ])?;
                }
            }
        }
        tx.commit()?;

        info!(
            "event=cross_ref_insert module=repo status=ok count={}",
            references.len()
        );
        Ok(references.len())
    }

    fn cross_references(&self, verse_id: &str) -> RepoResult<Vec<VerseRecord>> {
        let Some((translation, location)) = verse_id.split_once('/') else {
            return Ok(Vec::new());
        };

        let mut stmt = self.conn.prepare(
            "SELECT v.translation, v.book, v.chapter, v.verse, v.text
             FROM verse_cross_refs r
             JOIN verses v ON v.id = ?1 || '/' || r.target
             WHERE r.location = ?2
             ORDER BY r.position ASC, r.target ASC;",
        )?;
        let mut rows = stmt.query(params![translation, location])?;
        let mut verses = Vec::new();
        while let Some(row) = rows.next()? {
            verses.push(VerseRecord {
                translation: row.get("translation")?,
                book: row.get("book")?,
                chapter: row.get("chapter")?,
                verse: row.get("verse")?,
                text: row.get("text")?,
            });
        }
        Ok(verses)
    }
}
