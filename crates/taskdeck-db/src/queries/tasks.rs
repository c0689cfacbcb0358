use chrono::Utc;
use rusqlite::{params, Row};

use taskdeck_core::task::{Priority, Status, Task, UpdateTask};

use crate::{Db, DbError, SqliteResultExt};

fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
    let status_str: String = row.get("status")?;
    let priority_str: String = row.get("priority")?;
    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status: Status::parse_str(&status_str).unwrap_or(Status::Todo),
        priority: Priority::parse_str(&priority_str).unwrap_or(Priority::Medium),
        due_date: row.get("due_date")?,
        assigned_to: row.get("assigned_to")?,
        created_by: row.get("created_by")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Fields for a new task row, already resolved by the service layer
/// (assignee and creator have passed the access rules).
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: Status,
    pub priority: Priority,
    pub due_date: Option<chrono::DateTime<Utc>>,
    pub assigned_to: String,
    pub created_by: String,
}

impl Db {
    pub fn create_task(&self, input: &NewTask) -> Result<Task, DbError> {
        self.with_conn(|conn| {
            let id = uuid::Uuid::new_v4().to_string();
            let now = Utc::now();
            conn.execute(
                "INSERT INTO tasks (
                    id, title, description, status, priority, due_date,
                    assigned_to, created_by, created_at, updated_at
                 )
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    id,
                    input.title,
                    input.description,
                    input.status.as_str(),
                    input.priority.as_str(),
                    input.due_date,
                    input.assigned_to,
                    input.created_by,
                    now,
                    now
                ],
            )
            .to_db()?;
            conn.query_row("SELECT * FROM tasks WHERE id = ?1", params![id], row_to_task)
                .to_db()
        })
    }

    pub fn get_task(&self, id: &str) -> Result<Task, DbError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT * FROM tasks WHERE id = ?1", params![id], row_to_task)
                .map_err(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => DbError::NotFound(format!("task {id}")),
                    other => crate::map_sqlite_err(other),
                })
        })
    }

    pub fn get_task_opt(&self, id: &str) -> Result<Option<Task>, DbError> {
        match self.get_task(id) {
            Ok(task) => Ok(Some(task)),
            Err(DbError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn list_tasks(&self) -> Result<Vec<Task>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT * FROM tasks ORDER BY created_at DESC")
                .to_db()?;
            let tasks = stmt
                .query_map([], row_to_task)
                .to_db()?
                .collect::<Result<Vec<_>, _>>()
                .to_db()?;
            Ok(tasks)
        })
    }

    pub fn list_tasks_assigned_to(&self, user_id: &str) -> Result<Vec<Task>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT * FROM tasks WHERE assigned_to = ?1 ORDER BY created_at DESC")
                .to_db()?;
            let tasks = stmt
                .query_map(params![user_id], row_to_task)
                .to_db()?
                .collect::<Result<Vec<_>, _>>()
                .to_db()?;
            Ok(tasks)
        })
    }

    /// Partial update; only the provided fields are written, and
    /// `updated_at` is always bumped.
    pub fn update_task(&self, id: &str, update: &UpdateTask) -> Result<Task, DbError> {
        self.with_conn(|conn| {
            let now = Utc::now();
            let mut sets = vec!["updated_at = ?1".to_string()];
            let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(now)];

            if let Some(ref title) = update.title {
                param_values.push(Box::new(title.clone()));
                sets.push(format!("title = ?{}", param_values.len()));
            }
            if let Some(ref description) = update.description {
                param_values.push(Box::new(description.clone()));
                sets.push(format!("description = ?{}", param_values.len()));
            }
            if let Some(status) = update.status {
                param_values.push(Box::new(status.as_str().to_string()));
                sets.push(format!("status = ?{}", param_values.len()));
            }
            if let Some(priority) = update.priority {
                param_values.push(Box::new(priority.as_str().to_string()));
                sets.push(format!("priority = ?{}", param_values.len()));
            }
            if let Some(ref due_date) = update.due_date {
                param_values.push(Box::new(*due_date));
                sets.push(format!("due_date = ?{}", param_values.len()));
            }
            if let Some(ref assigned_to) = update.assigned_to {
                param_values.push(Box::new(assigned_to.clone()));
                sets.push(format!("assigned_to = ?{}", param_values.len()));
            }

            param_values.push(Box::new(id.to_string()));
            let sql = format!(
                "UPDATE tasks SET {} WHERE id = ?{}",
                sets.join(", "),
                param_values.len()
            );
            let params_ref: Vec<&dyn rusqlite::types::ToSql> =
                param_values.iter().map(|p| p.as_ref()).collect();

            let changed = conn.execute(&sql, params_ref.as_slice()).to_db()?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("task {id}")));
            }
            conn.query_row("SELECT * FROM tasks WHERE id = ?1", params![id], row_to_task)
                .to_db()
        })
    }

    /// Delete a task and return the removed record. Document rows go with
    /// it through the cascade.
    pub fn delete_task(&self, id: &str) -> Result<Task, DbError> {
        self.with_conn(|conn| {
            let task = conn
                .query_row("SELECT * FROM tasks WHERE id = ?1", params![id], row_to_task)
                .map_err(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => DbError::NotFound(format!("task {id}")),
                    other => crate::map_sqlite_err(other),
                })?;
            conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])
                .to_db()?;
            Ok(task)
        })
    }
}
