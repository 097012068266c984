use super::events::{EventFilter, filter_events};
use super::{Outcome, ViewContext};
use crate::error::ApiError;
use crate::liveness::ScreenScope;
use crate::models::{Event, Registration};
use crate::permissions;

/// A downloaded participants list, ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantsExport {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventCounts {
    pub total: usize,
    pub approved: usize,
    pub pending: usize,
}

/// EventManagementScreen
///
/// The admin's event table: filtering, deletion, per-event registrations
/// and the participants CSV.
pub struct EventManagementScreen {
    ctx: ViewContext,
    scope: ScreenScope,
    events: Vec<Event>,
    pub filter: EventFilter,
}

impl EventManagementScreen {
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

    pub fn counts(&self) -> EventCounts {
        let approved = self.events.iter().filter(|e| e.approved).count();
        EventCounts {
            total: self.events.len(),
            approved,
            pending: self.events.len() - approved,
        }
    }

    fn ensure_admin(&self, action: &str) -> Result<(), ApiError> {
        if permissions::can_manage_events(&self.ctx.session.snapshot()) {
            Ok(())
        } else {
            Err(self.ctx.deny(action))
        }
    }

    pub async fn load(&mut self) -> Result<Outcome, ApiError> {
        self.ensure_admin("manage events")?;
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

    pub async fn delete(&mut self, id: i64) -> Result<(), ApiError> {
        self.ensure_admin("delete event")?;
        self.ctx
            .backend
            .delete_event(id)
            .await
            .map_err(|e| self.ctx.fail("Failed to delete event", e))?;
        self.events.retain(|e| e.id != id);
        self.ctx.notifier.success("Event deleted successfully");
        Ok(())
    }

    pub async fn registrations(&self, id: i64) -> Result<Vec<Registration>, ApiError> {
        self.ensure_admin("view registrations")?;
        self.ctx
            .backend
            .event_registrations(id)
            .await
            .map_err(|e| self.ctx.fail("Failed to load registrations", e))
    }

    pub async fn download_csv(&self, id: i64) -> Result<ParticipantsExport, ApiError> {
        self.ensure_admin("download participants")?;
        let bytes = self
            .ctx
            .backend
            .participants_csv(id)
            .await
            .map_err(|e| self.ctx.fail("Failed to download CSV", e))?;
        self.ctx.notifier.success("CSV downloaded successfully");
        Ok(ParticipantsExport {
            file_name: format!("event-{}-participants.csv", id),
            bytes,
        })
    }
}
