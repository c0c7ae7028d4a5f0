//! Note store contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist note records with their tag, kv-tag and reference sets.
//! - Enforce referential validation before commit.
//! - Cascade note deletion into every other note's references.
//!
//! # Invariants
//! - An upsert replaces the whole record; `date_created` is written once.
//! - Set-valued attributes are replaced in the same transaction as the row.
//! - Delete purges references first and aborts if the purge fails.

use crate::model::note::{NoteAttributes, NoteId, NoteRecord, NoteValidationError};
use crate::repo::{ensure_schema, RepoError, RepoResult};
use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, TransactionBehavior};

const NOTES_DEFAULT_LIMIT: u32 = 10;
const NOTES_LIMIT_MAX: u32 = 50;

/// Current time as epoch milliseconds.
const NOW_MILLIS_SQL: &str = "CAST(ROUND((julianday('now') - 2440587.5) * 86400000.0) AS INTEGER)";

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    raw_text,
    title,
    theme,
    date_created,
    date_updated
FROM notes";

/// Query options for note listings. Filters combine with `AND`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteListQuery {
    /// Exact plain-tag match.
    pub tag: Option<String>,
    /// Notes carrying this kv-tag key, whatever the value.
    pub kv_key: Option<String>,
    /// Notes referencing this verse id.
    pub verse: Option<String>,
    /// Defaults to 10 and clamps to 50.
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Note store contract.
pub trait NoteRepository {
    /// Loads one note, or `None` when the id is unknown.
    fn get_note(&self, id: &str) -> RepoResult<Option<NoteRecord>>;
    fn note_exists(&self, id: &str) -> RepoResult<bool>;
    /// Validates and writes one note, returning the stored record.
    fn upsert_note(&mut self, note: &NoteRecord) -> RepoResult<NoteRecord>;
    /// Writes notes in order. Implementations may make the batch atomic.
    fn upsert_notes(&mut self, notes: &[NoteRecord]) -> RepoResult<Vec<NoteRecord>> {
        notes.iter().map(|note| self.upsert_note(note)).collect()
    }
    /// Deletes one note and purges it from all references.
    ///
    /// Returns `false` when the id is unknown.
    fn delete_note(&mut self, id: &str) -> RepoResult<bool>;
    fn list_notes(&self, query: &NoteListQuery) -> RepoResult<Vec<NoteRecord>>;
    /// Ids of notes whose `referenced_notes` contains `id`.
    fn list_referencing(&self, id: &str) -> RepoResult<Vec<NoteId>>;
}

/// SQLite-backed note store.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Wraps a migrated connection after checking the note tables.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_schema(
            conn,
            &[
                (
                    "notes",
                    &["id", "raw_text", "title", "theme", "date_created", "date_updated"],
                ),
                ("note_tags", &["note_id", "tag"]),
                ("note_kv_tags", &["note_id", "tag_key", "tag_value"]),
                ("note_verse_refs", &["note_id", "verse_id"]),
                ("note_note_refs", &["note_id", "ref_note_id"]),
                ("verses", &["id"]),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn get_note(&self, id: &str) -> RepoResult<Option<NoteRecord>> {
        load_note(self.conn, id)
    }

    fn note_exists(&self, id: &str) -> RepoResult<bool> {
        note_exists(self.conn, id)
    }

    fn upsert_note(&mut self, note: &NoteRecord) -> RepoResult<NoteRecord> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let stored = write_note(&tx, note)?;
        tx.commit()?;
        Ok(stored)
    }

    /// All notes commit together or not at all.
    fn upsert_notes(&mut self, notes: &[NoteRecord]) -> RepoResult<Vec<NoteRecord>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut stored = Vec::with_capacity(notes.len());
        for note in notes {
            stored.push(write_note(&tx, note)?);
        }
        tx.commit()?;
        Ok(stored)
    }

    fn delete_note(&mut self, id: &str) -> RepoResult<bool> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !note_exists(&tx, id)? {
            return Ok(false);
        }

        let purged = tx.execute(
            "DELETE FROM note_note_refs WHERE ref_note_id = ?1;",
            [id],
        )?;
        tx.execute("DELETE FROM notes WHERE id = ?1;", [id])?;
        tx.commit()?;

        info!("event=note_delete module=repo status=ok note_id={id} purged_refs={purged}");
        Ok(true)
    }

    fn list_notes(&self, query: &NoteListQuery) -> RepoResult<Vec<NoteRecord>> {
        let mut sql = format!("{NOTE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(tag) = query.tag.as_ref() {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1 FROM note_tags t
                    WHERE t.note_id = notes.id AND t.tag = ?
                )",
            );
            bind_values.push(Value::Text(tag.clone()));
        }
        if let Some(key) = query.kv_key.as_ref() {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1 FROM note_kv_tags kv
                    WHERE kv.note_id = notes.id AND kv.tag_key = ?
                )",
            );
            bind_values.push(Value::Text(key.clone()));
        }
        if let Some(verse) = query.verse.as_ref() {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1 FROM note_verse_refs v
                    WHERE v.note_id = notes.id AND v.verse_id = ?
                )",
            );
            bind_values.push(Value::Text(verse.clone()));
        }

        sql.push_str(" ORDER BY date_updated DESC, id ASC LIMIT ?");
        bind_values.push(Value::Integer(i64::from(normalize_note_limit(query.limit))));
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            ids.push(row.get::<_, String>("id")?);
        }

        let mut notes = Vec::with_capacity(ids.len());
        for id in ids {
            let note = load_note(self.conn, &id)?.ok_or_else(|| {
                RepoError::InvalidData(format!("note `{id}` vanished while listing"))
            })?;
            notes.push(note);
        }
        Ok(notes)
    }

    fn list_referencing(&self, id: &str) -> RepoResult<Vec<NoteId>> {
        let mut stmt = self.conn.prepare(
            "SELECT note_id
             FROM note_note_refs
             WHERE ref_note_id = ?1
             ORDER BY note_id ASC;",
        )?;
        let mut rows = stmt.query([id])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            ids.push(row.get(0)?);
        }
        Ok(ids)
    }
}

/// Normalizes a list limit according to the listing contract.
pub fn normalize_note_limit(limit: Option<u32>) -> u32 {
    match limit {
        None | Some(0) => NOTES_DEFAULT_LIMIT,
        Some(value) => value.min(NOTES_LIMIT_MAX),
    }
}

fn write_note(conn: &Connection, note: &NoteRecord) -> RepoResult<NoteRecord> {
    note.validate()?;
    for target in &note.attributes.referenced_notes {
        if !note_exists(conn, target)? {
            return Err(NoteValidationError::UnknownNoteReference {
                note_id: note.id.clone(),
                target: target.clone(),
            }
            .into());
        }
    }
    for verse_id in &note.attributes.referenced_verses {
        if !verse_exists(conn, verse_id)? {
            return Err(NoteValidationError::UnknownVerseReference {
                note_id: note.id.clone(),
                verse_id: verse_id.clone(),
            }
            .into());
        }
    }

    let upsert_sql = format!(
        "INSERT INTO notes (id, raw_text, title, theme, date_created, date_updated)
         VALUES (?1, ?2, ?3, ?4, {NOW_MILLIS_SQL}, {NOW_MILLIS_SQL})
         ON CONFLICT(id) DO UPDATE SET
            raw_text = excluded.raw_text,
            title = excluded.title,
            theme = excluded.theme,
            date_updated = excluded.date_updated;"
    );
    conn.execute(
        &upsert_sql,
        params![
            note.id.as_str(),
            note.raw_text.as_str(),
            note.attributes.title.as_deref(),
            note.attributes.theme.as_deref(),
        ],
    )?;
    replace_attribute_sets(conn, &note.id, &note.attributes)?;
    debug!("event=note_upsert module=repo status=ok note_id={}", note.id);

    load_note(conn, &note.id)?.ok_or_else(|| {
        RepoError::InvalidData(format!("note `{}` missing after upsert", note.id))
    })
}

fn replace_attribute_sets(conn: &Connection, id: &str, attributes: &NoteAttributes) -> RepoResult<()> {
    for table in ["note_tags", "note_kv_tags", "note_verse_refs", "note_note_refs"] {
        conn.execute(&format!("DELETE FROM {table} WHERE note_id = ?1;"), [id])?;
    }

    for tag in &attributes.tags {
        conn.execute(
            "INSERT INTO note_tags (note_id, tag) VALUES (?1, ?2);",
            params![id, tag],
        )?;
    }
    for (key, value) in &attributes.kv_tags {
        conn.execute(
            "INSERT INTO note_kv_tags (note_id, tag_key, tag_value) VALUES (?1, ?2, ?3);",
            params![id, key, value],
        )?;
    }
    for verse_id in &attributes.referenced_verses {
        conn.execute(
            "INSERT INTO note_verse_refs (note_id, verse_id) VALUES (?1, ?2);",
            params![id, verse_id],
        )?;
    }
    for target in &attributes.referenced_notes {
        conn.execute(
            "INSERT INTO note_note_refs (note_id, ref_note_id) VALUES (?1, ?2);",
            params![id, target],
        )?;
    }
    Ok(())
}

fn load_note(conn: &Connection, id: &str) -> RepoResult<Option<NoteRecord>> {
    let row = conn
        .query_row(
            &format!("{NOTE_SELECT_SQL} WHERE id = ?1;"),
            [id],
            |row| {
                Ok((
                    row.get::<_, String>("id")?,
                    row.get::<_, String>("raw_text")?,
                    row.get::<_, Option<String>>("title")?,
                    row.get::<_, String>("theme")?,
                    row.get::<_, i64>("date_created")?,
                    row.get::<_, i64>("date_updated")?,
                ))
            },
        )
        .optional()?;

    let Some((id, raw_text, title, theme, date_created, date_updated)) = row else {
        return Ok(None);
    };

    let mut record = NoteRecord::new(id, raw_text);
    record.attributes.title = title;
    record.attributes.theme = Some(theme);
    record.date_created = Some(date_created);
    record.date_updated = Some(date_updated);

    record.attributes.tags = load_column(conn, "SELECT tag FROM note_tags WHERE note_id = ?1;", &record.id)?
        .into_iter()
        .collect();
    record.attributes.referenced_verses = load_column(
        conn,
        "SELECT verse_id FROM note_verse_refs WHERE note_id = ?1;",
        &record.id,
    )?
    .into_iter()
    .collect();
    record.attributes.referenced_notes = load_column(
        conn,
        "SELECT ref_note_id FROM note_note_refs WHERE note_id = ?1;",
        &record.id,
    )?
    .into_iter()
    .collect();

    let mut stmt = conn.prepare("SELECT tag_key, tag_value FROM note_kv_tags WHERE note_id = ?1;")?;
    let mut rows = stmt.query([record.id.as_str()])?;
    while let Some(row) = rows.next()? {
        record
            .attributes
            .kv_tags
            .insert(row.get("tag_key")?, row.get("tag_value")?);
    }

    Ok(Some(record))
}

fn load_column(conn: &Connection, sql: &str, id: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([id])?;
    let mut values = Vec::new();
    while let Some(row) = rows.next()? {
        values.push(row.get(0)?);
    }
    Ok(values)
}

fn note_exists(conn: &Connection, id: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM notes WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn verse_exists(conn: &Connection, verse_id: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM verses WHERE id = ?1);",
        [verse_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

#[cfg(test)]
mod tests {
    use super::normalize_note_limit;

    #[test]
    fn limit_defaults_and_clamps() {
        assert_eq!(normalize_note_limit(None), 10);
        assert_eq!(normalize_note_limit(Some(0)), 10);
        assert_eq!(normalize_note_limit(Some(25)), 25);
        assert_eq!(normalize_note_limit(Some(500)), 50);
    }
}
