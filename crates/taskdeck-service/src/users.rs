use taskdeck_core::access;
use taskdeck_core::actor::Actor;
use taskdeck_core::user::{CreateUser, Role, UpdateUser, User};
use taskdeck_db::Db;

use crate::ServiceError;

/// Account operations, gated through the access rules. Password hashing
/// happens at the boundary; this service only ever sees the hash.
#[derive(Clone)]
pub struct UserService {
    db: Db,
}

impl UserService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Open registration: no actor required. Duplicate emails conflict.
    pub fn register(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, ServiceError> {
        let user = self.db.create_user(&CreateUser {
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role,
        })?;
        tracing::info!(user_id = %user.id, role = %user.role, "registered user");
        Ok(user)
    }

    /// Credential lookup for login. Returns `None` for an unknown email so
    /// the boundary can keep unknown-user and wrong-password responses
    /// identical.
    pub fn find_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.db.find_user_by_email(email)?)
    }

    pub fn get(&self, id: &str, actor: &Actor) -> Result<User, ServiceError> {
        if !access::can_read_user(actor, id) {
            return Err(ServiceError::Unauthorized(
                "cannot view another user's account".into(),
            ));
        }
        Ok(self.db.get_user(id)?)
    }

    /// Partial update. A non-admin may only touch their own record, and a
    /// `role` field in their payload is dropped rather than refused.
    pub fn update(
        &self,
        id: &str,
        actor: &Actor,
        mut update: UpdateUser,
    ) -> Result<User, ServiceError> {
        if !access::can_mutate_user(actor, id) {
            return Err(ServiceError::Unauthorized(
                "cannot modify another user's account".into(),
            ));
        }
        if !actor.is_admin() && update.role.take().is_some() {
            tracing::debug!(target_user = id, "dropped role change from non-admin update");
        }
        Ok(self.db.update_user(id, &update)?)
    }

    pub fn delete(&self, id: &str, actor: &Actor) -> Result<(), ServiceError> {
        if !access::can_delete_user(actor, id) {
            return Err(ServiceError::Unauthorized(
                "cannot delete another user's account".into(),
            ));
        }
        self.db.delete_user(id)?;
        tracing::info!(user_id = id, deleted_by = %actor.user_id, "deleted user");
        Ok(())
    }

    pub fn list(&self, actor: &Actor) -> Result<Vec<User>, ServiceError> {
        if !access::can_list_users(actor) {
            return Err(ServiceError::Unauthorized(
                "only admins may list users".into(),
            ));
        }
        Ok(self.db.list_users()?)
    }
}
