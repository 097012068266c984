use async_trait::async_trait;
use reqwest::{Method, multipart};
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::{
    AdminUserUpdate, Event, EventRequest, FeedbackRequest, ImageUpload, Registration, User,
};
use crate::transport::{Credentials, HttpTransport};

/// EventsBackend
///
/// Abstract contract for every event, participation and user-administration
/// call the screens make. Screens only ever hold `BackendState`, so tests can
/// swap in a canned implementation.
///
/// Authentication and profile calls are not here; they belong to the
/// `AuthManager` because they transition the session.
#[async_trait]
pub trait EventsBackend: Send + Sync {
    // --- Event Retrieval ---
    async fn list_events(&self) -> Result<Vec<Event>, ApiError>;
    async fn list_approved_events(&self) -> Result<Vec<Event>, ApiError>;
    async fn get_event(&self, id: i64) -> Result<Event, ApiError>;

    // --- Event Authoring ---
    // Admin endpoint.
    async fn create_event(&self, req: &EventRequest) -> Result<Event, ApiError>;
    // Faculty endpoint. Events created here always await approval.
    async fn create_faculty_event(&self, req: &EventRequest) -> Result<Event, ApiError>;
    async fn update_event(&self, id: i64, req: &EventRequest) -> Result<Event, ApiError>;
    async fn delete_event(&self, id: i64) -> Result<(), ApiError>;
    async fn upload_event_image(&self, id: i64, image: ImageUpload) -> Result<(), ApiError>;

    /// Absolute URL of an uploaded image. Pure; no request is made.
    fn event_image_url(&self, file_name: &str) -> String;

    // --- Moderation ---
    async fn approve_event(&self, id: i64) -> Result<(), ApiError>;
    async fn reject_event(&self, id: i64) -> Result<(), ApiError>;

    // --- Participation ---
    async fn register_for_event(&self, id: i64) -> Result<(), ApiError>;
    async fn submit_feedback(&self, id: i64, feedback: &str) -> Result<(), ApiError>;
    async fn registered_events(&self) -> Result<Vec<Registration>, ApiError>;

    // --- Administration ---
    async fn list_users(&self) -> Result<Vec<User>, ApiError>;
    async fn get_user(&self, id: i64) -> Result<User, ApiError>;
    async fn update_user(&self, id: i64, update: &AdminUserUpdate) -> Result<User, ApiError>;
    async fn delete_user(&self, id: i64) -> Result<(), ApiError>;
    async fn event_registrations(&self, id: i64) -> Result<Vec<Registration>, ApiError>;
    /// Raw CSV bytes of an event's participant list.
    async fn participants_csv(&self, id: i64) -> Result<Vec<u8>, ApiError>;
}

/// BackendState
///
/// The shared, thread-safe handle the screens depend on.
pub type BackendState = Arc<dyn EventsBackend>;

/// HttpEventsBackend
///
/// `EventsBackend` over the REST API. Every call goes out with the session's
/// bearer token, so a 401 anywhere here ends the session.
#[derive(Clone)]
pub struct HttpEventsBackend {
    transport: HttpTransport,
}

impl HttpEventsBackend {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl EventsBackend for HttpEventsBackend {
    async fn list_events(&self) -> Result<Vec<Event>, ApiError> {
        self.transport.get_json("/events", Credentials::Session).await
    }

    async fn list_approved_events(&self) -> Result<Vec<Event>, ApiError> {
        self.transport
            .get_json("/events/approved", Credentials::Session)
            .await
    }

    async fn get_event(&self, id: i64) -> Result<Event, ApiError> {
        self.transport
            .get_json(&format!("/events/{}", id), Credentials::Session)
            .await
    }

    async fn create_event(&self, req: &EventRequest) -> Result<Event, ApiError> {
        self.transport
            .send_json(Method::POST, "/admin/events", Credentials::Session, req)
            .await
    }

    async fn create_faculty_event(&self, req: &EventRequest) -> Result<Event, ApiError> {
        let req = EventRequest {
            approved: false,
            ..req.clone()
        };
        self.transport
            .send_json(Method::POST, "/faculty/events", Credentials::Session, &req)
            .await
    }

    async fn update_event(&self, id: i64, req: &EventRequest) -> Result<Event, ApiError> {
        self.transport
            .send_json(
                Method::PUT,
                &format!("/admin/events/{}", id),
                Credentials::Session,
                req,
            )
            .await
    }

    async fn delete_event(&self, id: i64) -> Result<(), ApiError> {
        self.transport
            .send_empty(
                Method::DELETE,
                &format!("/admin/events/{}", id),
                Credentials::Session,
            )
            .await
    }

    async fn upload_event_image(&self, id: i64, image: ImageUpload) -> Result<(), ApiError> {
        let size = image.bytes.len();
        let part = multipart::Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.content_type)
            .map_err(|e| ApiError::validation(format!("invalid content type: {}", e)))?;
        let form = multipart::Form::new().part("file", part);

        self.transport
            .post_multipart(&format!("/events/{}/image", id), Credentials::Session, form)
            .await?;
        tracing::debug!(event_id = id, size, "event image uploaded");
        Ok(())
    }

    fn event_image_url(&self, file_name: &str) -> String {
        format!("{}/events/image/{}", self.transport.base_url(), file_name)
    }

    async fn approve_event(&self, id: i64) -> Result<(), ApiError> {
        self.transport
            .send_empty(
                Method::PUT,
                &format!("/events/{}/approve", id),
                Credentials::Session,
            )
            .await
    }

    async fn reject_event(&self, id: i64) -> Result<(), ApiError> {
        self.transport
            .send_empty(
                Method::PUT,
                &format!("/events/{}/reject", id),
                Credentials::Session,
            )
            .await
    }

    async fn register_for_event(&self, id: i64) -> Result<(), ApiError> {
        self.transport
            .send_empty(
                Method::POST,
                &format!("/participation/events/{}/register", id),
                Credentials::Session,
            )
            .await
    }

    async fn submit_feedback(&self, id: i64, feedback: &str) -> Result<(), ApiError> {
        let body = FeedbackRequest {
            feedback: feedback.to_string(),
        };
        self.transport
            .send_json_discard(
                Method::POST,
                &format!("/participation/events/{}/feedback", id),
                Credentials::Session,
                &body,
            )
            .await
    }

    async fn registered_events(&self) -> Result<Vec<Registration>, ApiError> {
        self.transport
            .get_json("/participation/events/registered", Credentials::Session)
            .await
    }

    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.transport
            .get_json("/admin/users", Credentials::Session)
            .await
    }

    async fn get_user(&self, id: i64) -> Result<User, ApiError> {
        self.transport
            .get_json(&format!("/admin/users/{}", id), Credentials::Session)
            .await
    }

    async fn update_user(&self, id: i64, update: &AdminUserUpdate) -> Result<User, ApiError> {
        self.transport
            .send_json(
                Method::PUT,
                &format!("/admin/users/{}", id),
                Credentials::Session,
                update,
            )
            .await
    }

    async fn delete_user(&self, id: i64) -> Result<(), ApiError> {
        self.transport
            .send_empty(
                Method::DELETE,
                &format!("/admin/users/{}", id),
                Credentials::Session,
            )
            .await
    }

    async fn event_registrations(&self, id: i64) -> Result<Vec<Registration>, ApiError> {
        self.transport
            .get_json(
                &format!("/admin/events/{}/registrations", id),
                Credentials::Session,
            )
            .await
    }

    async fn participants_csv(&self, id: i64) -> Result<Vec<u8>, ApiError> {
        self.transport
            .get_bytes(
                &format!("/admin/events/{}/participants/csv", id),
                Credentials::Session,
            )
            .await
    }
}
