use crate::models::Role;
use crate::session::{AuthStatus, Session};

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Access
///
/// What a route demands of the session. `required_role` pins a route to a
/// single role; `allowed_roles` admits any role in the list. An empty list
/// means no restriction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Access {
    pub authenticated: bool,
    pub required_role: Option<Role>,
    pub allowed_roles: Vec<Role>,
}

impl Access {
    pub fn public() -> Self {
        Self::default()
    }

    pub fn authenticated() -> Self {
        Self {
            authenticated: true,
            ..Self::default()
        }
    }

    pub fn role(role: Role) -> Self {
        Self {
            authenticated: true,
            required_role: Some(role),
            allowed_roles: Vec::new(),
        }
    }

    pub fn any_of(roles: &[Role]) -> Self {
        Self {
            authenticated: true,
            required_role: None,
            allowed_roles: roles.to_vec(),
        }
    }

    /// Whether anything beyond a public visit is demanded.
    pub fn is_protected(&self) -> bool {
        self.authenticated || self.required_role.is_some() || !self.allowed_roles.is_empty()
    }
}

/// Decision
///
/// Outcome of one guard evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The startup restore is still running; render nothing yet.
    Pending,
    Admit,
    Redirect(String),
}

/// RouteGuard
///
/// Stateless gate consulted on every navigation attempt. Failing
/// authentication sends the visitor to the login screen; failing a role
/// check sends them to their dashboard, never back to login.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteGuard;

impl RouteGuard {
    pub fn check(&self, session: &Session, access: &Access) -> Decision {
        if !access.is_protected() {
            return Decision::Admit;
        }

        let user = match (session.status(), session.user.as_ref()) {
            (AuthStatus::Loading, _) => return Decision::Pending,
            (AuthStatus::Authenticated, Some(user)) => user,
            _ => return Decision::Redirect(LOGIN_PATH.to_string()),
        };

        if let Some(required) = access.required_role {
            if user.role != required {
                tracing::debug!(role = %user.role, %required, "role mismatch, redirecting");
                return Decision::Redirect(DASHBOARD_PATH.to_string());
            }
        }

        if !access.allowed_roles.is_empty() && !access.allowed_roles.contains(&user.role) {
            tracing::debug!(role = %user.role, "role not allowed, redirecting");
            return Decision::Redirect(DASHBOARD_PATH.to_string());
        }

        Decision::Admit
    }
}
