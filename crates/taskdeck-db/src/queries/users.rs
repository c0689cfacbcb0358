use chrono::Utc;
use rusqlite::{params, Row};

use taskdeck_core::user::{CreateUser, Role, UpdateUser, User};

use crate::{Db, DbError, SqliteResultExt};

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    let role_str: String = row.get("role")?;
    Ok(User {
        id: row.get("id")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        role: Role::parse_str(&role_str).unwrap_or(Role::User),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

impl Db {
    /// Insert a new account. A duplicate email surfaces as `Conflict`
    /// through the unique index.
    pub fn create_user(&self, input: &CreateUser) -> Result<User, DbError> {
        self.with_conn(|conn| {
            let id = uuid::Uuid::new_v4().to_string();
            let now = Utc::now();
            conn.execute(
                "INSERT INTO users (id, email, password_hash, role, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id,
                    input.email,
                    input.password_hash,
                    input.role.as_str(),
                    now,
                    now
                ],
            )
            .map_err(|e| match crate::map_sqlite_err(e) {
                DbError::Conflict(_) => {
                    DbError::Conflict(format!("email {} already registered", input.email))
                }
                other => other,
            })?;
            conn.query_row("SELECT * FROM users WHERE id = ?1", params![id], row_to_user)
                .to_db()
        })
    }

    pub fn get_user(&self, id: &str) -> Result<User, DbError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT * FROM users WHERE id = ?1", params![id], row_to_user)
                .map_err(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => DbError::NotFound(format!("user {id}")),
                    other => crate::map_sqlite_err(other),
                })
        })
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        self.with_conn(|conn| {
            match conn.query_row(
                "SELECT * FROM users WHERE email = ?1",
                params![email],
                row_to_user,
            ) {
                Ok(user) => Ok(Some(user)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(crate::map_sqlite_err(e)),
            }
        })
    }

    pub fn list_users(&self) -> Result<Vec<User>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT * FROM users ORDER BY created_at ASC")
                .to_db()?;
            let users = stmt
                .query_map([], row_to_user)
                .to_db()?
                .collect::<Result<Vec<_>, _>>()
                .to_db()?;
            Ok(users)
        })
    }

    pub fn update_user(&self, id: &str, update: &UpdateUser) -> Result<User, DbError> {
        self.with_conn(|conn| {
            let now = Utc::now();
            let mut sets = vec!["updated_at = ?1".to_string()];
            let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(now)];

            if let Some(ref email) = update.email {
                param_values.push(Box::new(email.clone()));
                sets.push(format!("email = ?{}", param_values.len()));
            }
            if let Some(role) = update.role {
                param_values.push(Box::new(role.as_str().to_string()));
                sets.push(format!("role = ?{}", param_values.len()));
            }

            param_values.push(Box::new(id.to_string()));
            let sql = format!(
                "UPDATE users SET {} WHERE id = ?{}",
                sets.join(", "),
                param_values.len()
            );
            let params_ref: Vec<&dyn rusqlite::types::ToSql> =
                param_values.iter().map(|p| p.as_ref()).collect();

            let changed = conn.execute(&sql, params_ref.as_slice()).to_db()?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("user {id}")));
            }
            conn.query_row("SELECT * FROM users WHERE id = ?1", params![id], row_to_user)
                .to_db()
        })
    }

    /// Remove an account. Fails with `Conflict` while tasks are still
    /// assigned to it (the foreign key on `tasks.assigned_to` blocks the
    /// delete).
    pub fn delete_user(&self, id: &str) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn
                .execute("DELETE FROM users WHERE id = ?1", params![id])
                .map_err(|e| match &e {
                    rusqlite::Error::SqliteFailure(err, _)
                        if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                    {
                        DbError::Conflict(format!("user {id} still has tasks assigned"))
                    }
                    _ => crate::map_sqlite_err(e),
                })?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("user {id}")));
            }
            Ok(())
        })
    }
}
