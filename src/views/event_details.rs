use super::{Outcome, ViewContext};
use crate::error::ApiError;
use crate::liveness::ScreenScope;
use crate::models::{Event, Registration, Role};
use crate::permissions;
use crate::validation;

/// Whether any of the registrations points at `event_id`.
pub fn is_registered_for(registrations: &[Registration], event_id: i64) -> bool {
    registrations.iter().any(|r| r.event_id() == Some(event_id))
}

/// EventDetailsScreen
///
/// A single event plus the actions the session may take on it:
/// registration and feedback for participants, moderation for admins and
/// faculty, deletion for admins.
pub struct EventDetailsScreen {
    ctx: ViewContext,
    scope: ScreenScope,
    id: i64,
    event: Option<Event>,
    registered: bool,
}

impl EventDetailsScreen {
    pub fn new(ctx: ViewContext, id: i64) -> Self {
        let scope = ctx.scope();
        Self {
            ctx,
            scope,
            id,
            event: None,
            registered: false,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn event(&self) -> Option<&Event> {
        self.event.as_ref()
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub fn scope(&self) -> &ScreenScope {
        &self.scope
    }

    pub fn image_url(&self) -> Option<String> {
        let file = self.event.as_ref()?.image_ref.as_deref()?;
        Some(self.ctx.backend.event_image_url(file))
    }

    pub fn can_register(&self) -> bool {
        self.event.as_ref().is_some_and(|e| {
            permissions::can_register(&self.ctx.session.snapshot(), e, self.registered)
        })
    }

    pub fn can_give_feedback(&self) -> bool {
        permissions::can_give_feedback(&self.ctx.session.snapshot(), self.registered)
    }

    pub fn can_moderate(&self) -> bool {
        self.event
            .as_ref()
            .is_some_and(|e| permissions::can_moderate(&self.ctx.session.snapshot(), e))
    }

    pub fn can_delete(&self) -> bool {
        permissions::can_manage_events(&self.ctx.session.snapshot())
    }

    /// load
    ///
    /// Fetches the event, then (for participants) whether they are already
    /// registered. A failed registration lookup leaves `registered` false
    /// rather than failing the screen.
    pub async fn load(&mut self) -> Result<Outcome, ApiError> {
        let ticket = self.scope.issue();
        let result = self.ctx.backend.get_event(self.id).await;
        let Some(event) =
            self.ctx
                .settle(&self.scope, &ticket, "Failed to load event details", result)?
        else {
            return Ok(Outcome::Discarded);
        };

        let mut registered = false;
        if permissions::is_participant(&self.ctx.session.snapshot()) {
            match self.ctx.backend.registered_events().await {
                Ok(list) => registered = is_registered_for(&list, self.id),
                Err(e) => tracing::warn!(event_id = self.id, error = %e, "registration check failed"),
            }
        }

        if !self.scope.is_current(&ticket) {
            return Ok(Outcome::Discarded);
        }
        self.event = Some(event);
        self.registered = registered;
        Ok(Outcome::Applied)
    }

    pub async fn register(&mut self) -> Result<(), ApiError> {
        if !self.can_register() {
            return Err(self.ctx.deny("register for event"));
        }
        let ticket = self.scope.begin_action();
        let result = self.ctx.backend.register_for_event(self.id).await;
        if self.ctx.settle_action(
            &self.scope,
            &ticket,
            "Failed to register for the event",
            result,
        )? {
            self.registered = true;
            self.ctx
                .notifier
                .success("Successfully registered for the event!");
        }
        Ok(())
    }

    pub async fn submit_feedback(&mut self, feedback: &str) -> Result<(), ApiError> {
        validation::validate_feedback(feedback).map_err(|e| self.ctx.fail("Please enter feedback", e))?;
        if !self.can_give_feedback() {
            return Err(self.ctx.deny("submit feedback"));
        }
        self.ctx
            .backend
            .submit_feedback(self.id, feedback.trim())
            .await
            .map_err(|e| self.ctx.fail("Failed to submit feedback", e))?;
        self.ctx.notifier.success("Feedback submitted successfully!");
        Ok(())
    }

    pub async fn approve(&mut self) -> Result<(), ApiError> {
        if !self.can_moderate() {
            return Err(self.ctx.deny("approve event"));
        }
        let ticket = self.scope.begin_action();
        let result = self.ctx.backend.approve_event(self.id).await;
        if self
            .ctx
            .settle_action(&self.scope, &ticket, "Failed to approve event", result)?
        {
            if let Some(event) = self.event.as_mut() {
                event.approved = true;
            }
            self.ctx.notifier.success("Event approved successfully!");
        }
        Ok(())
    }

    pub async fn reject(&mut self) -> Result<(), ApiError> {
        if !self.can_moderate() {
            return Err(self.ctx.deny("reject event"));
        }
        let ticket = self.scope.begin_action();
        let result = self.ctx.backend.reject_event(self.id).await;
        if self
            .ctx
            .settle_action(&self.scope, &ticket, "Failed to reject event", result)?
        {
            if let Some(event) = self.event.as_mut() {
                event.approved = false;
            }
            self.ctx.notifier.success("Event rejected");
        }
        Ok(())
    }

    /// Deletes the event and returns where to go next.
    pub async fn delete(&mut self) -> Result<&'static str, ApiError> {
        if !self.can_delete() {
            return Err(self.ctx.deny("delete event"));
        }
        self.ctx
            .backend
            .delete_event(self.id)
            .await
            .map_err(|e| self.ctx.fail("Failed to delete event", e))?;
        self.event = None;
        self.scope.unmount();
        self.ctx.notifier.success("Event deleted successfully");
        Ok(permissions::events_home(Role::Admin))
    }
}
