use super::{Outcome, ViewContext};
use crate::error::ApiError;
use crate::liveness::ScreenScope;
use crate::models::{DashboardStats, Event};
use crate::permissions;

/// How many events the "recent" panel shows.
pub const RECENT_EVENTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardData {
    pub stats: DashboardStats,
    pub recent: Vec<Event>,
}

/// Pending is whatever is not approved.
pub fn compute_stats(all: &[Event], approved: &[Event], registered: usize) -> DashboardStats {
    DashboardStats {
        total_events: all.len(),
        approved_events: approved.len(),
        pending_events: all.len().saturating_sub(approved.len()),
        registered_events: registered,
    }
}

/// The latest `limit` events by start time, newest first.
pub fn recent_events(all: &[Event], limit: usize) -> Vec<Event> {
    let mut sorted = all.to_vec();
    sorted.sort_by(|a, b| b.start_time.cmp(&a.start_time));
    sorted.truncate(limit);
    sorted
}

/// DashboardScreen
///
/// Landing screen for every role. Counts are role-aware: only participants
/// have a registered count, and failing to fetch it never fails the screen.
pub struct DashboardScreen {
    ctx: ViewContext,
    scope: ScreenScope,
    data: Option<DashboardData>,
}

impl DashboardScreen {
    pub fn new(ctx: ViewContext) -> Self {
        let scope = ctx.scope();
        Self {
            ctx,
            scope,
            data: None,
        }
    }

    pub fn data(&self) -> Option<&DashboardData> {
        self.data.as_ref()
    }

    /// The create-event entry point offered to roles that may create.
    pub fn create_event_link(&self) -> Option<&'static str> {
        permissions::create_event_path(&self.ctx.session.snapshot())
    }

    pub fn scope(&self) -> &ScreenScope {
        &self.scope
    }

    pub async fn load(&mut self) -> Result<Outcome, ApiError> {
        let ticket = self.scope.issue();
        let backend = &self.ctx.backend;

        let lists = tokio::try_join!(backend.list_events(), backend.list_approved_events());
        let Some((all, approved)) = self.ctx.settle(
            &self.scope,
            &ticket,
            "Failed to load dashboard data. Please try again.",
            lists,
        )?
        else {
            return Ok(Outcome::Discarded);
        };

        let session = self.ctx.session.snapshot();
        let registered = if permissions::is_participant(&session) {
            match backend.registered_events().await {
                Ok(list) => list.len(),
                Err(e) => {
                    tracing::warn!(error = %e, "could not fetch registered events");
                    0
                }
            }
        } else {
            0
        };

        if !self.scope.is_current(&ticket) {
            return Ok(Outcome::Discarded);
        }

        let stats = compute_stats(&all, &approved, registered);
        tracing::debug!(?stats, "dashboard loaded");
        self.data = Some(DashboardData {
            stats,
            recent: recent_events(&all, RECENT_EVENTS),
        });
        Ok(Outcome::Applied)
    }
}
