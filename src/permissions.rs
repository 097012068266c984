//! Role-gated capabilities.
//!
//! Pure predicates over the session's role and the event at hand. Screens
//! consult these before offering an action; the backend enforces the same
//! rules again on its side.

use crate::models::{Event, Role};
use crate::session::Session;

fn role_in(session: &Session, roles: &[Role]) -> bool {
    session.is_authenticated() && session.role().is_some_and(|r| roles.contains(&r))
}

/// Students and faculty take part in events; admins only run them.
pub fn is_participant(session: &Session) -> bool {
    role_in(session, &[Role::Student, Role::Faculty])
}

pub fn can_create_event(session: &Session) -> bool {
    role_in(session, &[Role::Admin, Role::Faculty])
}

/// Path of the create-event screen for the session's role.
pub fn create_event_path(session: &Session) -> Option<&'static str> {
    match session.role()? {
        Role::Admin if session.is_authenticated() => Some("/admin/events/create"),
        Role::Faculty if session.is_authenticated() => Some("/faculty/events/create"),
        _ => None,
    }
}

/// Where a finished event form sends the author.
pub fn events_home(role: Role) -> &'static str {
    match role {
        Role::Admin => "/admin/events",
        Role::Faculty => "/faculty/events",
        Role::Student => "/student/events",
    }
}

pub fn can_register(session: &Session, event: &Event, registered: bool) -> bool {
    is_participant(session) && event.approved && !registered
}

pub fn can_give_feedback(session: &Session, registered: bool) -> bool {
    is_participant(session) && registered
}

/// Approve and reject are only offered while the event is pending.
pub fn can_moderate(session: &Session, event: &Event) -> bool {
    role_in(session, &[Role::Admin, Role::Faculty]) && !event.approved
}

/// Edit, delete and the participants export.
pub fn can_manage_events(session: &Session) -> bool {
    role_in(session, &[Role::Admin])
}

pub fn can_manage_users(session: &Session) -> bool {
    role_in(session, &[Role::Admin])
}
