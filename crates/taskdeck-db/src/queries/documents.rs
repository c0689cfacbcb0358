use chrono::Utc;
use rusqlite::{params, Row};

use taskdeck_core::document::Document;

use crate::{Db, DbError, SqliteResultExt};

fn row_to_document(row: &Row) -> rusqlite::Result<Document> {
    Ok(Document {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        file_name: row.get("file_name")?,
        store_key: row.get("store_key")?,
        size_bytes: row.get("size_bytes")?,
        uploaded_at: row.get("uploaded_at")?,
    })
}

impl Db {
    /// Insert a document row. The id is supplied by the caller because the
    /// blob is written under a key derived from it before the row exists.
    pub fn insert_document(
        &self,
        id: &str,
        task_id: &str,
        file_name: &str,
        store_key: &str,
        size_bytes: i64,
    ) -> Result<Document, DbError> {
        self.with_conn(|conn| {
            let now = Utc::now();
            conn.execute(
                "INSERT INTO documents (id, task_id, file_name, store_key, size_bytes, uploaded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id, task_id, file_name, store_key, size_bytes, now],
            )
            .to_db()?;
            conn.query_row(
                "SELECT * FROM documents WHERE id = ?1",
                params![id],
                row_to_document,
            )
            .to_db()
        })
    }

    pub fn get_document(&self, id: &str) -> Result<Document, DbError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM documents WHERE id = ?1",
                params![id],
                row_to_document,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    DbError::NotFound(format!("document {id}"))
                }
                other => crate::map_sqlite_err(other),
            })
        })
    }

    pub fn list_documents(&self, task_id: &str) -> Result<Vec<Document>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT * FROM documents WHERE task_id = ?1 ORDER BY uploaded_at ASC")
                .to_db()?;
            let documents = stmt
                .query_map(params![task_id], row_to_document)
                .to_db()?
                .collect::<Result<Vec<_>, _>>()
                .to_db()?;
            Ok(documents)
        })
    }

    pub fn count_documents(&self, task_id: &str) -> Result<usize, DbError> {
        self.with_conn(|conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM documents WHERE task_id = ?1",
                    params![task_id],
                    |row| row.get(0),
                )
                .to_db()?;
            Ok(count as usize)
        })
    }
}
