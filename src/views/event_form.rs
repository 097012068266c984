use super::{Outcome, ViewContext};
use crate::error::ApiError;
use crate::liveness::ScreenScope;
use crate::models::{Event, EventRequest, ImageUpload, Role};
use crate::permissions;
use crate::validation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(i64),
}

/// What a successful submit produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Submitted {
    pub event: Event,
    /// `None` when no image was attached.
    pub image_uploaded: Option<bool>,
    /// The events screen to return to.
    pub next: &'static str,
}

/// EventFormScreen
///
/// Create and edit share one controller. Creation goes through the admin or
/// faculty endpoint depending on the author's role and always starts
/// unapproved. Editing is admin-only. An attached image is uploaded after
/// the event is saved; a failed upload does not undo the save.
pub struct EventFormScreen {
    ctx: ViewContext,
    scope: ScreenScope,
    mode: FormMode,
    existing: Option<Event>,
}

impl EventFormScreen {
    pub fn create(ctx: ViewContext) -> Self {
        Self::with_mode(ctx, FormMode::Create)
    }

    pub fn edit(ctx: ViewContext, id: i64) -> Self {
        Self::with_mode(ctx, FormMode::Edit(id))
    }

    fn with_mode(ctx: ViewContext, mode: FormMode) -> Self {
        let scope = ctx.scope();
        Self {
            ctx,
            scope,
            mode,
            existing: None,
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    /// The loaded event when editing.
    pub fn existing(&self) -> Option<&Event> {
        self.existing.as_ref()
    }

    /// Form values to start from: the stored event when editing.
    pub fn draft(&self) -> Option<EventRequest> {
        self.existing.as_ref().map(EventRequest::from_event)
    }

    /// Loads the event being edited. A no-op for creation.
    pub async fn load(&mut self) -> Result<Outcome, ApiError> {
        let FormMode::Edit(id) = self.mode else {
            return Ok(Outcome::Applied);
        };
        let ticket = self.scope.issue();
        let result = self.ctx.backend.get_event(id).await;
        match self
            .ctx
            .settle(&self.scope, &ticket, "Failed to load event details", result)?
        {
            Some(event) => {
                self.existing = Some(event);
                Ok(Outcome::Applied)
            }
            None => Ok(Outcome::Discarded),
        }
    }

    pub async fn submit(
        &mut self,
        req: EventRequest,
        image: Option<ImageUpload>,
    ) -> Result<Submitted, ApiError> {
        match self.mode {
            FormMode::Create => self.submit_create(req, image).await,
            FormMode::Edit(id) => self.submit_edit(id, req, image).await,
        }
    }

    async fn submit_create(
        &mut self,
        req: EventRequest,
        image: Option<ImageUpload>,
    ) -> Result<Submitted, ApiError> {
        let role = match self.ctx.session.role() {
            Some(role) if permissions::can_create_event(&self.ctx.session.snapshot()) => role,
            _ => return Err(self.ctx.deny("create event")),
        };
        validation::validate_event(&req).map_err(|e| self.ctx.fail("Failed to create event", e))?;

        let req = EventRequest {
            approved: false,
            ..req
        };
        let backend = &self.ctx.backend;
        let created = match role {
            Role::Faculty => backend.create_faculty_event(&req).await,
            _ => backend.create_event(&req).await,
        }
        .map_err(|e| self.ctx.fail("Failed to create event", e))?;
        tracing::info!(event_id = created.id, %role, "event created");

        let image_uploaded = self
            .upload(created.id, image, "Event created but image upload failed")
            .await;
        self.ctx.notifier.success("Event created successfully!");
        Ok(Submitted {
            event: created,
            image_uploaded,
            next: permissions::events_home(role),
        })
    }

    async fn submit_edit(
        &mut self,
        id: i64,
        req: EventRequest,
        image: Option<ImageUpload>,
    ) -> Result<Submitted, ApiError> {
        if !permissions::can_manage_events(&self.ctx.session.snapshot()) {
            return Err(self.ctx.deny("edit event"));
        }
        validation::validate_event(&req).map_err(|e| self.ctx.fail("Failed to update event", e))?;

        let updated = self
            .ctx
            .backend
            .update_event(id, &req)
            .await
            .map_err(|e| self.ctx.fail("Failed to update event", e))?;

        let image_uploaded = self
            .upload(id, image, "Event updated but image upload failed")
            .await;
        self.existing = Some(updated.clone());
        self.ctx.notifier.success("Event updated successfully!");
        Ok(Submitted {
            event: updated,
            image_uploaded,
            next: permissions::events_home(Role::Admin),
        })
    }

    async fn upload(&self, id: i64, image: Option<ImageUpload>, failure: &str) -> Option<bool> {
        let image = image?;
        match self.ctx.backend.upload_event_image(id, image).await {
            Ok(()) => Some(true),
            Err(e) => {
                tracing::warn!(event_id = id, error = %e, "image upload failed");
                self.ctx.notifier.report(failure, &e);
                Some(false)
            }
        }
    }
}
