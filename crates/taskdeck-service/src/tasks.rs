use std::sync::Arc;

use taskdeck_core::access;
use taskdeck_core::actor::Actor;
use taskdeck_core::task::{CreateTask, ListedTask, Task, UpdateTask};
use taskdeck_db::queries::tasks::NewTask;
use taskdeck_db::{Db, DbError};
use taskdeck_store::ObjectStore;

use crate::ServiceError;

/// Task CRUD, gated through the access rules. Holds the object store so
/// deleting a task can also remove its document blobs.
#[derive(Clone)]
pub struct TaskService {
    db: Db,
    store: Arc<dyn ObjectStore>,
}

impl TaskService {
    pub fn new(db: Db, store: Arc<dyn ObjectStore>) -> Self {
        Self { db, store }
    }

    fn ensure_assignee_exists(&self, user_id: &str) -> Result<(), ServiceError> {
        match self.db.get_user(user_id) {
            Ok(_) => Ok(()),
            Err(DbError::NotFound(_)) => Err(ServiceError::InvalidInput(format!(
                "assigned user {user_id} does not exist"
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Create a task. A non-admin actor always becomes the assignee, even
    /// when the payload names someone else; the requested value is
    /// overwritten rather than rejected.
    pub fn create(&self, input: &CreateTask, actor: &Actor) -> Result<Task, ServiceError> {
        if input.title.trim().is_empty() {
            return Err(ServiceError::InvalidInput("title must not be empty".into()));
        }
        let assigned_to = access::effective_assignee(actor, input.assigned_to.as_deref());
        let created_by = access::effective_creator(actor, input.created_by.as_deref());
        self.ensure_assignee_exists(&assigned_to)?;

        let task = self.db.create_task(&NewTask {
            title: input.title.clone(),
            description: input.description.clone(),
            status: input.status,
            priority: input.priority,
            due_date: input.due_date,
            assigned_to,
            created_by,
        })?;
        tracing::info!(task_id = %task.id, assigned_to = %task.assigned_to, "created task");
        Ok(task)
    }

    /// List what the actor may see: everything for admins, own tasks
    /// (annotated) otherwise.
    pub fn list(&self, actor: &Actor) -> Result<Vec<ListedTask>, ServiceError> {
        let tasks = if actor.is_admin() {
            self.db.list_tasks()?
        } else {
            self.db.list_tasks_assigned_to(&actor.user_id)?
        };
        Ok(access::visible_tasks(actor, tasks))
    }

    /// Fetch one task. An existing task the actor may not read answers
    /// `NotFound`, indistinguishable from a missing one.
    pub fn get(&self, id: &str, actor: &Actor) -> Result<Task, ServiceError> {
        let task = self
            .db
            .get_task_opt(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("task {id}")))?;
        if !access::can_read_task(actor, &task) {
            return Err(ServiceError::NotFound(format!("task {id}")));
        }
        Ok(task)
    }

    /// Partial update. Existence is checked before the permission, so a
    /// missing task is `NotFound` even for an actor who could never have
    /// touched it.
    pub fn update(
        &self,
        id: &str,
        update: &UpdateTask,
        actor: &Actor,
    ) -> Result<Task, ServiceError> {
        let task = self.db.get_task(id)?;
        if !access::can_mutate_task(actor, &task) {
            return Err(ServiceError::Unauthorized("task not assigned to you".into()));
        }
        if let Some(ref assigned_to) = update.assigned_to {
            self.ensure_assignee_exists(assigned_to)?;
        }
        Ok(self.db.update_task(id, update)?)
    }

    /// Delete a task, its document rows (via the cascade) and their
    /// blobs (explicitly; the store has no cascading delete). Returns the
    /// removed record.
    pub async fn delete(&self, id: &str, actor: &Actor) -> Result<Task, ServiceError> {
        let task = self.db.get_task(id)?;
        if !access::can_mutate_task(actor, &task) {
            return Err(ServiceError::Unauthorized("task not assigned to you".into()));
        }
        let documents = self.db.list_documents(id)?;
        let task = self.db.delete_task(id)?;
        for document in &documents {
            if let Err(e) = self.store.delete(&document.store_key).await {
                tracing::warn!(key = %document.store_key, error = %e, "failed to delete document blob");
            }
        }
        tracing::info!(task_id = id, deleted_by = %actor.user_id, "deleted task");
        Ok(task)
    }
}
