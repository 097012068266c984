use reqwest::Method;

use crate::error::{ApiError, AuthError};
use crate::models::{
    ChangePasswordRequest, LoginRequest, RegisterRequest, TokenResponse, UpdateEmailRequest,
    UpdateProfileRequest, User,
};
use crate::session::{EndReason, Session, SessionHandle};
use crate::transport::{Credentials, HttpTransport};
use crate::validation;

/// AuthManager
///
/// Drives every session transition: sign-in (login or registration), the
/// startup restore, logout and profile edits. It is the only writer of the
/// session besides the transport's 401 interceptor.
///
/// Sign-in is a two step exchange: credentials for a token, then the token
/// for the current user. The token is only persisted once the user is known,
/// so a failed second step never leaves a half-authenticated session behind.
#[derive(Clone)]
pub struct AuthManager {
    session: SessionHandle,
    transport: HttpTransport,
}

impl AuthManager {
    pub fn new(transport: HttpTransport) -> Self {
        Self {
            session: transport.session().clone(),
            transport,
        }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// login
    ///
    /// `POST /auth/login`, then `GET /users/me` with the issued token.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let req = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        validation::validate_login(&req)?;

        let issued: TokenResponse = self
            .transport
            .send_json(Method::POST, "/auth/login", Credentials::Anonymous, &req)
            .await?;
        tracing::debug!(email = %req.email, "credentials accepted");

        self.complete_sign_in(issued.token).await
    }

    /// register
    ///
    /// Same contract as `login`, against `POST /auth/register`.
    pub async fn register(&self, req: RegisterRequest) -> Result<Session, AuthError> {
        validation::validate_registration(&req)?;

        let issued: TokenResponse = self
            .transport
            .send_json(Method::POST, "/auth/register", Credentials::Anonymous, &req)
            .await?;
        tracing::info!(email = %req.email, "account registered");

        self.complete_sign_in(issued.token).await
    }

    async fn complete_sign_in(&self, token: String) -> Result<Session, AuthError> {
        let user = match self.fetch_current_user(&token).await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "profile fetch failed after token issuance");
                self.session.end(EndReason::Failed);
                return Err(e);
            }
        };

        self.session.establish(token, user).inspect_err(|e| {
            tracing::error!(error = %e, "could not persist session token");
            self.session.end(EndReason::Failed);
        })
    }

    async fn fetch_current_user(&self, token: &str) -> Result<User, ApiError> {
        self.transport
            .get_json("/users/me", Credentials::Bearer(token))
            .await
    }

    /// restore_session
    ///
    /// Runs once at startup. A persisted token is only trusted after the
    /// backend resolves it to a user; any failure along the way (unreadable
    /// store, network, 401, malformed profile) ends in the same state as
    /// having no token at all. Always returns the resulting session.
    pub async fn restore_session(&self) -> Result<Session, AuthError> {
        let token = match self.session.store().load() {
            Ok(Some(token)) => token,
            Ok(None) => {
                tracing::debug!("no persisted token");
                self.session.finish_loading();
                return Ok(self.session.snapshot());
            }
            Err(e) => {
                tracing::warn!(error = %e, "token store unreadable, starting signed out");
                self.session.end(EndReason::Failed);
                return Ok(self.session.snapshot());
            }
        };

        match self.fetch_current_user(&token).await {
            Ok(user) => {
                if let Err(e) = self.session.establish(token, user) {
                    tracing::warn!(error = %e, "could not re-persist restored token");
                    self.session.end(EndReason::Failed);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "persisted token rejected, clearing");
                self.session.end(EndReason::Failed);
            }
        }
        Ok(self.session.snapshot())
    }

    /// Clears token and user. Local only; the backend is not told.
    pub fn logout(&self) {
        self.session.end(EndReason::Logout);
    }

    /// Replaces the cached user after a profile edit. The token is not
    /// re-validated.
    pub fn update_user(&self, user: User) -> Result<(), AuthError> {
        self.session.replace_user(user)
    }

    // --- Profile ---

    pub async fn update_profile(&self, req: UpdateProfileRequest) -> Result<User, AuthError> {
        validation::validate_profile(&req)?;
        let user: User = self
            .transport
            .send_json(Method::PUT, "/users/me", Credentials::Session, &req)
            .await?;
        self.update_user(user.clone())?;
        tracing::info!(user_id = user.id, "profile updated");
        Ok(user)
    }

    pub async fn update_email(&self, email: &str) -> Result<User, AuthError> {
        let email = email.trim();
        validation::validate_email_change(email)?;
        let req = UpdateEmailRequest {
            email: email.to_string(),
        };
        let user: User = self
            .transport
            .send_json(Method::PUT, "/users/me/email", Credentials::Session, &req)
            .await?;
        self.update_user(user.clone())?;
        Ok(user)
    }

    pub async fn change_password(&self, req: ChangePasswordRequest) -> Result<(), AuthError> {
        validation::validate_password_change(&req)?;
        self.transport
            .send_json_discard(Method::PUT, "/users/me/password", Credentials::Session, &req)
            .await?;
        tracing::info!("password changed");
        Ok(())
    }
}
