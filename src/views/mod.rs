/// Screen Controllers
///
/// One controller per screen in the route table. They hold the screen's
/// data, call the backend, and report outcomes as notices. Nothing here
/// renders; a front end reads the controller state and draws it.
pub mod dashboard;
pub mod event_details;
pub mod event_form;
pub mod event_management;
pub mod events;
pub mod my_events;
pub mod profile;
pub mod users;

use crate::api::BackendState;
use crate::error::ApiError;
use crate::liveness::{ScreenScope, Ticket};
use crate::notify::Notifier;
use crate::session::SessionHandle;

/// ViewContext
///
/// The services every screen needs, cloned into each controller.
#[derive(Clone)]
pub struct ViewContext {
    pub backend: BackendState,
    pub session: SessionHandle,
    pub notifier: Notifier,
}

impl ViewContext {
    pub fn new(backend: BackendState, session: SessionHandle, notifier: Notifier) -> Self {
        Self {
            backend,
            session,
            notifier,
        }
    }

    pub fn scope(&self) -> ScreenScope {
        ScreenScope::new(self.session.clone())
    }

    /// settle
    ///
    /// Funnels a finished request through the screen's liveness check. A
    /// stale result (superseded, unmounted or from a previous session) is
    /// dropped silently, errors included. A live failure is reported under
    /// `context` and handed back.
    pub(crate) fn settle<T>(
        &self,
        scope: &ScreenScope,
        ticket: &Ticket,
        context: &str,
        result: Result<T, ApiError>,
    ) -> Result<Option<T>, ApiError> {
        if !scope.is_current(ticket) {
            tracing::debug!(context, "dropping result for stale screen");
            return Ok(None);
        }
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                self.notifier.report(context, &e);
                Err(e)
            }
        }
    }

    /// settle_action
    ///
    /// The action counterpart of `settle`. Returns `Ok(true)` when the
    /// screen may apply the result, `Ok(false)` when it went stale while
    /// the request was out.
    pub(crate) fn settle_action<T>(
        &self,
        scope: &ScreenScope,
        ticket: &Ticket,
        context: &str,
        result: Result<T, ApiError>,
    ) -> Result<bool, ApiError> {
        if !scope.is_live(ticket) {
            tracing::debug!(context, "dropping action result for stale screen");
            return Ok(false);
        }
        result.map(|_| true).map_err(|e| {
            self.notifier.report(context, &e);
            e
        })
    }

    /// Refuses an action the session's role may not take.
    pub(crate) fn deny(&self, action: &str) -> ApiError {
        tracing::warn!(action, role = ?self.session.role(), "action not permitted");
        let err = ApiError::Forbidden;
        self.notifier.error(err.to_string());
        err
    }

    /// Reports a failed action that is not tied to a screen load.
    pub(crate) fn fail(&self, context: &str, err: ApiError) -> ApiError {
        self.notifier.report(context, &err);
        err
    }
}

/// Whether a load was applied to the screen or discarded as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Discarded,
}
