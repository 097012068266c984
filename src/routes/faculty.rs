use super::{RouteSpec, Screen};
use crate::guard::Access;
use crate::models::Role;

/// Faculty Routes
///
/// The shared screens again under `/faculty`, plus event creation through
/// the faculty endpoint.
pub fn faculty_routes() -> Vec<RouteSpec> {
    let faculty = || Access::role(Role::Faculty);
    vec![
        RouteSpec::redirect("/faculty", "/faculty/dashboard", faculty()),
        RouteSpec::screen("/faculty/dashboard", Screen::Dashboard, faculty()),
        RouteSpec::screen("/faculty/events", Screen::Events, faculty()),
        RouteSpec::screen("/faculty/events/create", Screen::CreateEvent, faculty()),
        RouteSpec::screen("/faculty/events/:id", Screen::EventDetails, faculty()),
        RouteSpec::screen("/faculty/my-events", Screen::MyEvents, faculty()),
        RouteSpec::screen("/faculty/profile", Screen::Profile, faculty()),
    ]
}
