use rusqlite::Connection;

use crate::{DbError, SqliteResultExt};

pub fn run(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id            TEXT PRIMARY KEY,
            email         TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role          TEXT NOT NULL DEFAULT 'USER'
                              CHECK(role IN ('USER', 'ADMIN')),
            created_at    TEXT NOT NULL,
            updated_at    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id          TEXT PRIMARY KEY,
            title       TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            status      TEXT NOT NULL DEFAULT 'todo'
                            CHECK(status IN ('todo', 'in_progress', 'completed')),
            priority    TEXT NOT NULL DEFAULT 'medium'
                            CHECK(priority IN ('low', 'medium', 'high')),
            due_date    TEXT,
            assigned_to TEXT NOT NULL REFERENCES users(id),
            created_by  TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_tasks_assignee ON tasks(assigned_to);

        CREATE TABLE IF NOT EXISTS documents (
            id          TEXT PRIMARY KEY,
            task_id     TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
            file_name   TEXT NOT NULL,
            store_key   TEXT NOT NULL,
            size_bytes  INTEGER NOT NULL,
            uploaded_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_documents_task ON documents(task_id);
        ",
    )
    .to_db()
}
