use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension};

use super::RawStore;
use crate::error::StoreError;

/// All raw pages in one SQLite table. Identifiers are stored unescaped.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::with_connection(conn)
    }

    pub fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS raw_pages (
                identifier TEXT PRIMARY KEY,
                body       TEXT NOT NULL,
                fetched_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            ",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl RawStore for SqliteStore {
    fn put(&self, identifier: &str, body: &str) -> Result<(), StoreError> {
        self.conn()?.execute(
            "INSERT INTO raw_pages (identifier, body) VALUES (?1, ?2)
             ON CONFLICT(identifier) DO UPDATE SET body = excluded.body, fetched_at = datetime('now')",
            rusqlite::params![identifier, body],
        )?;
        Ok(())
    }

    fn get(&self, identifier: &str) -> Result<Option<String>, StoreError> {
        let body = self
            .conn()?
            .query_row(
                "SELECT body FROM raw_pages WHERE identifier = ?1",
                [identifier],
                |row| row.get(0),
            )
            .optional()?;
        Ok(body)
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT identifier FROM raw_pages ORDER BY identifier")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteStore {
        SqliteStore::with_connection(Connection::open_in_memory().unwrap()).unwrap()
    }

    #[test]
    fn upsert_and_list() {
        let store = store();
        store.put("b/course", "one").unwrap();
        store.put("a_course", "two").unwrap();
        store.put("b/course", "three").unwrap();

        assert_eq!(store.list().unwrap(), vec!["a_course", "b/course"]);
        assert_eq!(store.get("b/course").unwrap().as_deref(), Some("three"));
        assert!(store.get("missing").unwrap().is_none());
    }

    #[test]
    fn open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("raw.sqlite");
        let store = SqliteStore::open(&path).unwrap();
        store.put("x", "y").unwrap();
        assert!(path.is_file());
    }
}
