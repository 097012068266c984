/// Route Table Index
///
/// The client's navigable paths, split by who may reach them. Each section
/// module contributes its own `RouteSpec`s with the access rule attached, so
/// a path can never be registered without a guard decision behind it.

/// Login and registration. Reachable without a session.
pub mod public;

/// Shared screens for any signed-in role.
pub mod authenticated;

/// The `/admin` section, pinned to `ADMIN`.
pub mod admin;

/// The `/faculty` section, pinned to `FACULTY`.
pub mod faculty;

/// The `/student` section, pinned to `STUDENT`.
pub mod student;

use std::collections::BTreeMap;

use crate::guard::{Access, DASHBOARD_PATH};

/// Screen
///
/// Every screen controller a path can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Login,
    Register,
    Dashboard,
    Events,
    EventDetails,
    MyEvents,
    Profile,
    UserManagement,
    EventManagement,
    CreateEvent,
    EditEvent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Screen(Screen),
    /// Index routes that only forward somewhere else.
    Redirect(&'static str),
}

/// RouteSpec
///
/// One registered path pattern. Segments starting with `:` capture a
/// parameter (`/events/:id`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSpec {
    pub pattern: &'static str,
    pub target: Target,
    pub access: Access,
}

impl RouteSpec {
    pub fn screen(pattern: &'static str, screen: Screen, access: Access) -> Self {
        Self {
            pattern,
            target: Target::Screen(screen),
            access,
        }
    }

    pub fn redirect(pattern: &'static str, to: &'static str, access: Access) -> Self {
        Self {
            pattern,
            target: Target::Redirect(to),
            access,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    pub route: &'a RouteSpec,
    pub params: BTreeMap<String, String>,
}

/// RouteTable
///
/// Resolves a path to the route that owns it. Literal segments win over
/// parameters, so `/faculty/events/create` is never read as an event id.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteSpec>,
}

impl RouteTable {
    pub fn new(routes: Vec<RouteSpec>) -> Self {
        Self { routes }
    }

    /// The application's full route table.
    pub fn standard() -> Self {
        let mut routes = public::public_routes();
        routes.extend(authenticated::authenticated_routes());
        routes.extend(admin::admin_routes());
        routes.extend(faculty::faculty_routes());
        routes.extend(student::student_routes());
        Self::new(routes)
    }

    pub fn routes(&self) -> &[RouteSpec] {
        &self.routes
    }

    pub fn resolve(&self, path: &str) -> Option<RouteMatch<'_>> {
        let path = normalize(path);
        self.routes
            .iter()
            .filter_map(|route| {
                match_pattern(route.pattern, &path).map(|params| RouteMatch { route, params })
            })
            .min_by_key(|m| m.params.len())
    }

    /// Where unknown paths are sent.
    pub fn fallback(&self) -> &'static str {
        DASHBOARD_PATH
    }
}

/// Drops any query or fragment, repeated and trailing slashes.
pub fn normalize(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

fn match_pattern(pattern: &str, path: &str) -> Option<BTreeMap<String, String>> {
    let want: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let got: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if want.len() != got.len() {
        return None;
    }

    let mut params = BTreeMap::new();
    for (w, g) in want.iter().zip(got.iter()) {
        match w.strip_prefix(':') {
            Some(name) => {
                params.insert(name.to_string(), g.to_string());
            }
            None if w == g => {}
            None => return None,
        }
    }
    Some(params)
}
