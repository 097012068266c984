use super::{Outcome, ViewContext};
use crate::error::ApiError;
use crate::liveness::ScreenScope;
use crate::models::{Event, EventStatusFilter};
use crate::permissions;

/// EventFilter
///
/// Search text matched case-insensitively against name and description,
/// combined with the approval filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub search: String,
    pub status: EventStatusFilter,
}

impl EventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        let needle = self.search.trim().to_lowercase();
        let matches_search = needle.is_empty()
            || event.name.to_lowercase().contains(&needle)
            || event.description.to_lowercase().contains(&needle);
        let matches_status = match self.status {
            EventStatusFilter::All => true,
            EventStatusFilter::Approved => event.approved,
            EventStatusFilter::Pending => !event.approved,
        };
        matches_search && matches_status
    }
}

pub fn filter_events<'a>(events: &'a [Event], filter: &EventFilter) -> Vec<&'a Event> {
    events.iter().filter(|e| filter.matches(e)).collect()
}

/// EventsScreen
///
/// The full event list with search and approval filters. Admins and
/// faculty can approve or reject pending events straight from the list.
pub struct EventsScreen {
    ctx: ViewContext,
    scope: ScreenScope,
    events: Vec<Event>,
    pub filter: EventFilter,
}

impl EventsScreen {
    pub fn new(ctx: ViewContext) -> Self {
        let scope = ctx.scope();
        Self {
            ctx,
            scope,
            events: Vec::new(),
            filter: EventFilter::default(),
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn visible(&self) -> Vec<&Event> {
        filter_events(&self.events, &self.filter)
    }

    pub fn scope(&self) -> &ScreenScope {
        &self.scope
    }

    pub async fn load(&mut self) -> Result<Outcome, ApiError> {
        let ticket = self.scope.issue();
        let result = self.ctx.backend.list_events().await;
        match self
            .ctx
            .settle(&self.scope, &ticket, "Failed to load events", result)?
        {
            Some(events) => {
                self.events = events;
                Ok(Outcome::Applied)
            }
            None => Ok(Outcome::Discarded),
        }
    }

    fn moderatable(&self, id: i64) -> Result<(), ApiError> {
        let session = self.ctx.session.snapshot();
        match self.events.iter().find(|e| e.id == id) {
            Some(event) if permissions::can_moderate(&session, event) => Ok(()),
            Some(_) => Err(self.ctx.deny("moderate event")),
            None => Err(self
                .ctx
                .fail("Event not found", ApiError::NotFound(format!("event {}", id)))),
        }
    }

    pub async fn approve(&mut self, id: i64) -> Result<(), ApiError> {
        self.moderatable(id)?;
        self.ctx
            .backend
            .approve_event(id)
            .await
            .map_err(|e| self.ctx.fail("Failed to approve event", e))?;
        self.ctx.notifier.success("Event approved successfully!");
        self.load().await?;
        Ok(())
    }

    pub async fn reject(&mut self, id: i64) -> Result<(), ApiError> {
        self.moderatable(id)?;
        self.ctx
            .backend
            .reject_event(id)
            .await
            .map_err(|e| self.ctx.fail("Failed to reject event", e))?;
        self.ctx.notifier.success("Event rejected");
        self.load().await?;
        Ok(())
    }
}
