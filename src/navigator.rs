use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::guard::{Decision, RouteGuard};
use crate::routes::{RouteTable, Screen, Target, normalize};
use crate::session::{SessionEvent, SessionHandle};

/// Upper bound on redirects followed for one navigation.
pub const MAX_REDIRECTS: usize = 8;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("redirect loop while resolving '{0}'")]
    RedirectLoop(String),
}

/// Location
///
/// Where the navigator currently is: the final path after redirects, the
/// screen it shows and the captured path parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub screen: Screen,
    pub params: BTreeMap<String, String>,
}

impl Location {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// The `:id` parameter parsed as a backend id.
    pub fn id(&self) -> Option<i64> {
        self.param("id").and_then(|raw| raw.parse().ok())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Arrived(Location),
    /// The session is still restoring; the request is parked and replayed
    /// by `sync` once a decision can be made.
    Pending { requested: String },
}

/// Navigator
///
/// Owns the current location. Every navigation consults the guard afresh
/// and follows redirects until a screen is admitted. It also listens for
/// session transitions: when the session ends while a protected screen is
/// shown, the next `sync` moves to `/login`.
pub struct Navigator {
    session: SessionHandle,
    guard: RouteGuard,
    table: Arc<RouteTable>,
    current: Option<Location>,
    pending: Option<String>,
    events: broadcast::Receiver<SessionEvent>,
}

impl Navigator {
    pub fn new(session: SessionHandle, table: Arc<RouteTable>) -> Self {
        let events = session.subscribe();
        Self {
            session,
            guard: RouteGuard,
            table,
            current: None,
            pending: None,
            events,
        }
    }

    pub fn current(&self) -> Option<&Location> {
        self.current.as_ref()
    }

    pub fn current_path(&self) -> Option<&str> {
        self.current.as_ref().map(|l| l.path.as_str())
    }

    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// navigate
    ///
    /// Resolves `path` against the route table and the current session.
    /// Unknown paths fall back to the dashboard, which is itself guarded.
    pub fn navigate(&mut self, path: &str) -> Result<Navigation, NavigationError> {
        let requested = normalize(path);
        let session = self.session.snapshot();
        let mut target = requested.clone();

        for _ in 0..=MAX_REDIRECTS {
            let Some(matched) = self.table.resolve(&target) else {
                tracing::debug!(path = %target, "no route, falling back");
                target = self.table.fallback().to_string();
                continue;
            };

            match self.guard.check(&session, &matched.route.access) {
                Decision::Pending => {
                    tracing::debug!(path = %requested, "session loading, navigation parked");
                    self.pending = Some(requested.clone());
                    return Ok(Navigation::Pending { requested });
                }
                Decision::Redirect(to) => {
                    target = to;
                    continue;
                }
                Decision::Admit => {}
            }

            match &matched.route.target {
                Target::Redirect(to) => target = to.to_string(),
                Target::Screen(screen) => {
                    let location = Location {
                        path: target.clone(),
                        screen: *screen,
                        params: matched.params,
                    };
                    if target != requested {
                        tracing::info!(from = %requested, to = %target, "redirected");
                    }
                    self.pending = None;
                    self.current = Some(location.clone());
                    return Ok(Navigation::Arrived(location));
                }
            }
        }

        tracing::error!(path = %requested, "redirect limit exceeded");
        Err(NavigationError::RedirectLoop(requested))
    }

    /// sync
    ///
    /// Applies session transitions observed since the last call. A parked
    /// request is replayed once loading has finished. After a session end
    /// the current location is guarded again against whatever session is
    /// now in place: signed out lands on `/login`, a fresh sign-in keeps
    /// the screen its role may see. Returns the new navigation when
    /// anything moved.
    pub fn sync(&mut self) -> Result<Option<Navigation>, NavigationError> {
        let mut ended = false;
        loop {
            match self.events.try_recv() {
                Ok(SessionEvent::Ended(reason)) => {
                    tracing::debug!(?reason, "navigator saw session end");
                    ended = true;
                }
                Ok(_) => {}
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "navigator lagged behind session events");
                    ended = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        if self.pending.is_some() && !self.session.is_loading() {
            return self.resume();
        }

        if ended {
            if let Some(path) = self.current_path().map(str::to_string) {
                if self.requires_session(&path) {
                    return match self.navigate(&path)? {
                        Navigation::Arrived(location) if location.path == path => Ok(None),
                        moved => Ok(Some(moved)),
                    };
                }
            }
        }
        Ok(None)
    }

    /// Replays a parked navigation, if there is one.
    pub fn resume(&mut self) -> Result<Option<Navigation>, NavigationError> {
        match self.pending.take() {
            Some(path) => self.navigate(&path).map(Some),
            None => Ok(None),
        }
    }

    fn requires_session(&self, path: &str) -> bool {
        self.table
            .resolve(path)
            .map(|m| m.route.access.is_protected())
            .unwrap_or(true)
    }
}
