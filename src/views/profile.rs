use super::ViewContext;
use crate::auth::AuthManager;
use crate::error::ApiError;
use crate::models::{ChangePasswordRequest, UpdateProfileRequest, User};

/// ProfileScreen
///
/// Profile edits go through the auth manager, which keeps the session's
/// cached user in step with what the backend returns.
pub struct ProfileScreen {
    ctx: ViewContext,
    auth: AuthManager,
}

impl ProfileScreen {
    pub fn new(ctx: ViewContext, auth: AuthManager) -> Self {
        Self { ctx, auth }
    }

    pub fn user(&self) -> Option<User> {
        self.ctx.session.user()
    }

    pub async fn update_profile(&self, full_name: &str, email: &str) -> Result<User, ApiError> {
        let req = UpdateProfileRequest {
            full_name: full_name.trim().to_string(),
            email: email.trim().to_string(),
        };
        let user = self
            .auth
            .update_profile(req)
            .await
            .map_err(|e| self.ctx.fail("Failed to update profile", e))?;
        self.ctx.notifier.success("Profile updated successfully!");
        Ok(user)
    }

    pub async fn update_email(&self, email: &str) -> Result<User, ApiError> {
        let user = self
            .auth
            .update_email(email)
            .await
            .map_err(|e| self.ctx.fail("Failed to update email", e))?;
        self.ctx.notifier.success("Email updated successfully!");
        Ok(user)
    }

    pub async fn change_password(
        &self,
        current: &str,
        new: &str,
        confirm: &str,
    ) -> Result<(), ApiError> {
        let req = ChangePasswordRequest {
            current_password: current.to_string(),
            new_password: new.to_string(),
            confirm_password: confirm.to_string(),
        };
        self.auth
            .change_password(req)
            .await
            .map_err(|e| self.ctx.fail("Failed to update password", e))?;
        self.ctx.notifier.success("Password updated successfully!");
        Ok(())
    }
}
