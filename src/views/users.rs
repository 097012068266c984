use super::{Outcome, ViewContext};
use crate::error::ApiError;
use crate::liveness::ScreenScope;
use crate::models::{AdminUserUpdate, User};
use crate::permissions;
use crate::validation;

/// UserManagementScreen
///
/// Admin view over every account: list, edit name, email or role, delete.
/// An admin cannot delete their own account from here.
pub struct UserManagementScreen {
    ctx: ViewContext,
    scope: ScreenScope,
    users: Vec<User>,
    pub search: String,
}

impl UserManagementScreen {
    pub fn new(ctx: ViewContext) -> Self {
        let scope = ctx.scope();
        Self {
            ctx,
            scope,
            users: Vec::new(),
            search: String::new(),
        }
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Users whose name or email contains the search text.
    pub fn visible(&self) -> Vec<&User> {
        let needle = self.search.trim().to_lowercase();
        self.users
            .iter()
            .filter(|u| {
                needle.is_empty()
                    || u.full_name.to_lowercase().contains(&needle)
                    || u.email.to_lowercase().contains(&needle)
            })
            .collect()
    }

    fn ensure_admin(&self, action: &str) -> Result<(), ApiError> {
        if permissions::can_manage_users(&self.ctx.session.snapshot()) {
            Ok(())
        } else {
            Err(self.ctx.deny(action))
        }
    }

    pub async fn load(&mut self) -> Result<Outcome, ApiError> {
        self.ensure_admin("list users")?;
        let ticket = self.scope.issue();
        let result = self.ctx.backend.list_users().await;
        match self
            .ctx
            .settle(&self.scope, &ticket, "Failed to load users", result)?
        {
            Some(users) => {
                self.users = users;
                Ok(Outcome::Applied)
            }
            None => Ok(Outcome::Discarded),
        }
    }

    /// Fetches one account fresh for the edit form and refreshes its row.
    pub async fn open(&mut self, id: i64) -> Result<Option<User>, ApiError> {
        self.ensure_admin("view user")?;
        let ticket = self.scope.issue();
        let result = self.ctx.backend.get_user(id).await;
        let Some(user) = self
            .ctx
            .settle(&self.scope, &ticket, "Failed to load user", result)?
        else {
            return Ok(None);
        };
        match self.users.iter_mut().find(|u| u.id == id) {
            Some(row) => *row = user.clone(),
            None => self.users.push(user.clone()),
        }
        Ok(Some(user))
    }

    pub async fn update(&mut self, id: i64, update: AdminUserUpdate) -> Result<User, ApiError> {
        self.ensure_admin("update user")?;
        if let Some(name) = update.full_name.as_deref() {
            if name.trim().is_empty() {
                return Err(self
                    .ctx
                    .fail("Failed to update user", ApiError::validation("Full name is required")));
            }
        }
        if let Some(email) = update.email.as_deref() {
            validation::validate_email_change(email)
                .map_err(|e| self.ctx.fail("Failed to update user", e))?;
        }

        let user = self
            .ctx
            .backend
            .update_user(id, &update)
            .await
            .map_err(|e| self.ctx.fail("Failed to update user", e))?;
        if let Some(slot) = self.users.iter_mut().find(|u| u.id == id) {
            *slot = user.clone();
        }
        self.ctx.notifier.success("User updated successfully");
        Ok(user)
    }

    pub async fn delete(&mut self, id: i64) -> Result<(), ApiError> {
        self.ensure_admin("delete user")?;
        if self.ctx.session.user().is_some_and(|me| me.id == id) {
            return Err(self.ctx.fail(
                "Failed to delete user",
                ApiError::validation("You cannot delete your own account"),
            ));
        }
        self.ctx
            .backend
            .delete_user(id)
            .await
            .map_err(|e| self.ctx.fail("Failed to delete user", e))?;
        self.users.retain(|u| u.id != id);
        self.ctx.notifier.success("User deleted successfully");
        Ok(())
    }
}
