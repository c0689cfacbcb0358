//! Access rules for tasks, users and documents.
//!
//! Every rule is a pure function over an [`Actor`] and the record it
//! targets. The services apply each rule exactly once per operation, so
//! the read path and the write path cannot drift apart.
//!
//! The model is two-tier: an admin passes every check, a regular user
//! only touches their own account and the tasks currently assigned to
//! them.

use crate::actor::Actor;
use crate::task::{ListedTask, Task};

/// Any authenticated actor may create a task.
pub fn can_create_task(_actor: &Actor) -> bool {
    true
}

/// Resolve the assignee for a new task.
///
/// An admin may assign to anyone (defaulting to themselves when no
/// assignee is requested). A regular user is always the assignee: a
/// mismatched request is overwritten, not rejected.
pub fn effective_assignee(actor: &Actor, requested: Option<&str>) -> String {
    if actor.is_admin() {
        requested.unwrap_or(&actor.user_id).to_string()
    } else {
        actor.user_id.clone()
    }
}

/// Resolve the recorded creator for a new task. Only an admin may create
/// on someone else's behalf.
pub fn effective_creator(actor: &Actor, requested: Option<&str>) -> String {
    if actor.is_admin() {
        requested.unwrap_or(&actor.user_id).to_string()
    } else {
        actor.user_id.clone()
    }
}

pub fn can_read_task(actor: &Actor, task: &Task) -> bool {
    actor.is_admin() || task.assigned_to == actor.user_id
}

/// Update and delete share one rule: admin, or current assignee.
pub fn can_mutate_task(actor: &Actor, task: &Task) -> bool {
    actor.is_admin() || task.assigned_to == actor.user_id
}

/// Documents inherit the read rule of their parent task.
pub fn can_view_document(actor: &Actor, parent: &Task) -> bool {
    can_read_task(actor, parent)
}

/// Filter a full task listing down to what the actor may see.
///
/// Admins see everything, unannotated. A regular user sees only the
/// tasks assigned to them, each carrying the `is_assigned` marker the
/// listing consumers expect.
pub fn visible_tasks(actor: &Actor, tasks: Vec<Task>) -> Vec<ListedTask> {
    if actor.is_admin() {
        tasks
            .into_iter()
            .map(|task| ListedTask {
                task,
                is_assigned: None,
            })
            .collect()
    } else {
        tasks
            .into_iter()
            .filter(|task| task.assigned_to == actor.user_id)
            .map(|task| ListedTask {
                task,
                is_assigned: Some(true),
            })
            .collect()
    }
}

pub fn can_read_user(actor: &Actor, target_user_id: &str) -> bool {
    actor.is_admin() || actor.user_id == target_user_id
}

/// Same ownership rule as reading. Role changes inside the payload are
/// handled separately: a non-admin's role change is dropped, not refused.
pub fn can_mutate_user(actor: &Actor, target_user_id: &str) -> bool {
    can_read_user(actor, target_user_id)
}

/// An actor may always remove their own account; an admin may remove
/// anyone's.
pub fn can_delete_user(actor: &Actor, target_user_id: &str) -> bool {
    can_read_user(actor, target_user_id)
}

pub fn can_list_users(actor: &Actor) -> bool {
    actor.is_admin()
}
