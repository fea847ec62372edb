//! SQLite-backed key-value medium over the `kv_entries` table.

use super::{KeyValueStore, KvBatch, StoreKey};
use crate::db::DbResult;
use rusqlite::{params, Connection, OptionalExtension};

const UPSERT_SQL: &str = "INSERT INTO kv_entries (key, value, updated_at)
     VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
     ON CONFLICT(key) DO UPDATE SET
        value = excluded.value,
        updated_at = excluded.updated_at;";

/// Key-value store borrowing a migrated connection.
pub struct SqliteKvStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKvStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl KeyValueStore for SqliteKvStore<'_> {
    fn get(&self, key: StoreKey) -> DbResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: StoreKey, value: &str) -> DbResult<()> {
        self.conn.execute(UPSERT_SQL, params![key.as_str(), value])?;
        Ok(())
    }

    fn read_many(&self, keys: &[StoreKey]) -> DbResult<Vec<Option<String>>> {
        let tx = self.conn.unchecked_transaction()?;
        let mut values = Vec::with_capacity(keys.len());
        {
            let mut stmt = tx.prepare("SELECT value FROM kv_entries WHERE key = ?1;")?;
            for key in keys {
                let value = stmt
                    .query_row([key.as_str()], |row| row.get::<_, String>(0))
                    .optional()?;
                values.push(value);
            }
        }
        tx.commit()?;
        Ok(values)
    }

    fn commit(&self, batch: &KvBatch) -> DbResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let tx = self.conn.unchecked_transaction()?;
        if batch.clears_first() {
            tx.execute("DELETE FROM kv_entries;", [])?;
        }
        {
            let mut stmt = tx.prepare(UPSERT_SQL)?;
            for (key, value) in batch.puts() {
                stmt.execute(params![key.as_str(), value])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}
