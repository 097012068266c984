use super::{RouteSpec, Screen};
use crate::guard::Access;
use crate::models::Role;

/// Admin Routes
///
/// Moderation and administration screens. The whole section requires the
/// `ADMIN` role; anyone else who lands here is sent back to `/dashboard`.
pub fn admin_routes() -> Vec<RouteSpec> {
    let admin = || Access::role(Role::Admin);
    vec![
        RouteSpec::redirect("/admin", "/admin/dashboard", admin()),
        RouteSpec::screen("/admin/dashboard", Screen::Dashboard, admin()),
        RouteSpec::screen("/admin/users", Screen::UserManagement, admin()),
        RouteSpec::screen("/admin/events", Screen::EventManagement, admin()),
        RouteSpec::screen("/admin/events/create", Screen::CreateEvent, admin()),
        RouteSpec::screen("/admin/events/:id/edit", Screen::EditEvent, admin()),
    ]
}
