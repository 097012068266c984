use super::{RouteSpec, Screen};
use crate::guard::Access;

/// Public Routes
///
/// Entry points for visitors without a session. They stay reachable while
/// the startup restore is still running.
pub fn public_routes() -> Vec<RouteSpec> {
    vec![
        RouteSpec::screen("/login", Screen::Login, Access::public()),
        RouteSpec::screen("/register", Screen::Register, Access::public()),
    ]
}
