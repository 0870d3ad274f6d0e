//! SQLite-backed record store.
//!
//! Schema: one `records` table. Deletes are soft: the row is marked
//! `DELETE` and kept, so a ledger reference written onto a row is never
//! lost from the relational side.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};

use super::{Operation, Record, Result, StorageError};

/// Relational store of mirrored records.
pub struct RecordStore {
    conn: Mutex<Connection>,
}

impl RecordStore {
    /// Open (or create) the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(dir) = path.as_ref().parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                field1 TEXT NOT NULL,
                field2 TEXT NOT NULL,
                ledger_id TEXT,
                operation TEXT NOT NULL DEFAULT 'CREATE',
                created_at TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_records_created_at ON records(created_at)",
            [],
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    /// Insert a new row, returning its id.
    pub fn insert(&self, field1: &str, field2: &str, created_at: &str) -> Result<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO records (field1, field2, operation, created_at)
             VALUES (?1, ?2, 'CREATE', ?3)",
            params![field1, field2, created_at],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Update a live row in place. Soft-deleted rows count as absent.
    /// `created_at` is the insert time and is never touched, so updates
    /// do not reorder the newest-first listing.
    pub fn update(&self, id: i64, field1: &str, field2: &str) -> Result<()> {
        let conn = self.lock()?;
        let affected = conn.execute(
            "UPDATE records
             SET field1 = ?1, field2 = ?2, operation = 'UPDATE'
             WHERE id = ?3 AND operation != 'DELETE'",
            params![field1, field2, id],
        )?;
        if affected == 0 {
            return Err(StorageError::NotFound(id));
        }
        Ok(())
    }

    /// Soft-delete a row, returning it as it was before the mark.
    pub fn mark_deleted(&self, id: i64) -> Result<Record> {
        let conn = self.lock()?;
        let row = Self::query_live(&conn, id)?.ok_or(StorageError::NotFound(id))?;
        conn.execute(
            "UPDATE records SET operation = 'DELETE' WHERE id = ?1",
            params![id],
        )?;
        Ok(row)
    }

    /// Fetch a row regardless of deletion state.
    pub fn get(&self, id: i64) -> Result<Option<Record>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, field1, field2, ledger_id, operation, created_at
             FROM records WHERE id = ?1",
            params![id],
            Self::row_to_record,
        )
        .optional()
        .map_err(Into::into)
    }

    /// Persist the ledger-assigned identifier after a successful submit.
    pub fn attach_ledger_id(&self, id: i64, ledger_id: &str) -> Result<()> {
        let conn = self.lock()?;
        let affected = conn.execute(
            "UPDATE records SET ledger_id = ?1 WHERE id = ?2",
            params![ledger_id, id],
        )?;
        if affected == 0 {
            return Err(StorageError::NotFound(id));
        }
        Ok(())
    }

    /// All rows, newest first.
    pub fn list(&self) -> Result<Vec<Record>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, field1, field2, ledger_id, operation, created_at
             FROM records ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([], Self::row_to_record)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    fn query_live(conn: &Connection, id: i64) -> Result<Option<Record>> {
        conn.query_row(
            "SELECT id, field1, field2, ledger_id, operation, created_at
             FROM records WHERE id = ?1 AND operation != 'DELETE'",
            params![id],
            Self::row_to_record,
        )
        .optional()
        .map_err(Into::into)
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<Record> {
        let tag: String = row.get(4)?;
        let operation = tag.parse::<Operation>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, e.into())
        })?;
        Ok(Record {
            id: row.get(0)?,
            field1: row.get(1)?,
            field2: row.get(2)?,
            ledger_id: row.get(3)?,
            operation,
            created_at: row.get(5)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> RecordStore {
        RecordStore::open_in_memory().unwrap()
    }

    #[test]
    fn insert_and_list_newest_first() {
        let store = store();
        let a = store.insert("a1", "a2", "2024-01-01T00:00:00Z").unwrap();
        let b = store.insert("b1", "b2", "2024-01-02T00:00:00Z").unwrap();
        let rows = store.list().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, b);
        assert_eq!(rows[1].id, a);
        assert_eq!(rows[0].operation, Operation::Create);
        assert!(rows[0].ledger_id.is_none());
    }

    #[test]
    fn update_missing_row_is_not_found() {
        let store = store();
        let err = store.update(42, "x", "y").unwrap_err();
        assert!(matches!(err, StorageError::NotFound(42)));
    }

    #[test]
    fn update_mutates_in_place() {
        let store = store();
        let id = store.insert("old1", "old2", "2024-01-01T00:00:00Z").unwrap();
        store.update(id, "new1", "new2").unwrap();
        let row = store.get(id).unwrap().unwrap();
        assert_eq!(row.field1, "new1");
        assert_eq!(row.operation, Operation::Update);
    }

    #[test]
    fn update_preserves_insert_time_and_ordering() {
        let store = store();
        let a = store.insert("a1", "a2", "2024-01-01T00:00:00Z").unwrap();
        let b = store.insert("b1", "b2", "2024-01-02T00:00:00Z").unwrap();
        store.update(a, "a1-new", "a2-new").unwrap();

        let rows = store.list().unwrap();
        assert_eq!(rows[0].id, b);
        assert_eq!(rows[1].id, a);
        assert_eq!(rows[1].created_at, "2024-01-01T00:00:00Z");
    }

    #[test]
    fn delete_is_soft_and_returns_prior_state() {
        let store = store();
        let id = store.insert("f1", "f2", "2024-01-01T00:00:00Z").unwrap();
        let prior = store.mark_deleted(id).unwrap();
        assert_eq!(prior.field1, "f1");
        assert_eq!(prior.operation, Operation::Create);

        // Row is retained but marked, and no longer updatable.
        let row = store.get(id).unwrap().unwrap();
        assert_eq!(row.operation, Operation::Delete);
        assert!(matches!(
            store.update(id, "x", "y"),
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            store.mark_deleted(id),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn attach_ledger_id_persists() {
        let store = store();
        let id = store.insert("f1", "f2", "2024-01-01T00:00:00Z").unwrap();
        store.attach_ledger_id(id, "abc123").unwrap();
        let row = store.get(id).unwrap().unwrap();
        assert_eq!(row.ledger_id.as_deref(), Some("abc123"));
    }

    #[test]
    fn attach_ledger_id_missing_row_is_not_found() {
        let store = store();
        assert!(matches!(
            store.attach_ledger_id(9, "abc"),
            Err(StorageError::NotFound(9))
        ));
    }
}
