use chrono::{Local, NaiveDateTime};
use futures_util::future::join_all;

use super::{Outcome, ViewContext};
use crate::error::ApiError;
use crate::liveness::ScreenScope;
use crate::models::{Event, Registration};
use crate::permissions;

#[derive(Debug, Clone, PartialEq)]
pub struct MyEventEntry {
    pub registration: Registration,
    pub event: Event,
    /// False when `event` is a placeholder because the lookup failed.
    pub details_available: bool,
}

/// Stand-in for an event whose details could not be fetched.
pub fn placeholder_event(registration: &Registration, now: NaiveDateTime) -> Event {
    Event {
        id: registration.event_id().unwrap_or_default(),
        name: registration
            .event_name
            .clone()
            .unwrap_or_else(|| "Unknown event".to_string()),
        description: "Event details unavailable".to_string(),
        start_time: now,
        end_time: now,
        venue: "Unknown".to_string(),
        capacity: 0,
        organizer: String::new(),
        approved: false,
        image_ref: None,
    }
}

/// MyEventsScreen
///
/// The participant's registrations, each paired with the full event. The
/// event lookups run concurrently; one failing only degrades its own entry.
pub struct MyEventsScreen {
    ctx: ViewContext,
    scope: ScreenScope,
    entries: Vec<MyEventEntry>,
}

impl MyEventsScreen {
    pub fn new(ctx: ViewContext) -> Self {
        let scope = ctx.scope();
        Self {
            ctx,
            scope,
            entries: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[MyEventEntry] {
        &self.entries
    }

    pub fn scope(&self) -> &ScreenScope {
        &self.scope
    }

    pub async fn load(&mut self) -> Result<Outcome, ApiError> {
        if !permissions::is_participant(&self.ctx.session.snapshot()) {
            self.entries.clear();
            return Ok(Outcome::Applied);
        }

        let ticket = self.scope.issue();
        let result = self.ctx.backend.registered_events().await;
        let registrations = match self
            .ctx
            .settle(&self.scope, &ticket, "Failed to load your events", result)
        {
            Ok(Some(list)) => list,
            Ok(None) => return Ok(Outcome::Discarded),
            Err(e) => {
                self.entries.clear();
                return Err(e);
            }
        };

        let entries = join_all(registrations.into_iter().map(|r| self.enrich(r))).await;

        if !self.scope.is_current(&ticket) {
            return Ok(Outcome::Discarded);
        }
        self.entries = entries;
        Ok(Outcome::Applied)
    }

    async fn enrich(&self, registration: Registration) -> MyEventEntry {
        if let Some(event) = registration.event.clone() {
            return MyEventEntry {
                registration,
                event,
                details_available: true,
            };
        }

        let lookup = match registration.event_id() {
            Some(id) => self.ctx.backend.get_event(id).await,
            None => Err(ApiError::NotFound("registration without event".into())),
        };
        match lookup {
            Ok(event) => MyEventEntry {
                registration,
                event,
                details_available: true,
            },
            Err(e) => {
                tracing::warn!(registration_id = registration.id, error = %e, "event lookup failed");
                let event = placeholder_event(&registration, Local::now().naive_local());
                MyEventEntry {
                    registration,
                    event,
                    details_available: false,
                }
            }
        }
    }
}
