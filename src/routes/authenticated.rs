use super::{RouteSpec, Screen};
use crate::guard::{Access, DASHBOARD_PATH};

/// Authenticated Routes
///
/// Screens shared by every role. Any signed-in user is admitted; what they
/// can do once there is decided by the capability checks in `permissions`.
pub fn authenticated_routes() -> Vec<RouteSpec> {
    vec![
        // The bare root forwards to the dashboard.
        RouteSpec::redirect("/", DASHBOARD_PATH, Access::authenticated()),
        RouteSpec::screen("/dashboard", Screen::Dashboard, Access::authenticated()),
        RouteSpec::screen("/events", Screen::Events, Access::authenticated()),
        RouteSpec::screen("/events/:id", Screen::EventDetails, Access::authenticated()),
        RouteSpec::screen("/my-events", Screen::MyEvents, Access::authenticated()),
        RouteSpec::screen("/profile", Screen::Profile, Access::authenticated()),
    ]
}
