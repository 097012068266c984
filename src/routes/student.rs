use super::{RouteSpec, Screen};
use crate::guard::Access;
use crate::models::Role;

/// Student Routes
pub fn student_routes() -> Vec<RouteSpec> {
    let student = || Access::role(Role::Student);
    vec![
        RouteSpec::redirect("/student", "/student/dashboard", student()),
        RouteSpec::screen("/student/dashboard", Screen::Dashboard, student()),
        RouteSpec::screen("/student/events", Screen::Events, student()),
        RouteSpec::screen("/student/events/:id", Screen::EventDetails, student()),
        RouteSpec::screen("/student/my-events", Screen::MyEvents, student()),
        RouteSpec::screen("/student/profile", Screen::Profile, student()),
    ]
}
