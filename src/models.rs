use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// --- Identity ---

/// Role
///
/// The closed set of actors the backend issues. Serialized exactly as the
/// backend spells it (`ADMIN`, `FACULTY`, `STUDENT`). A role is fixed for the
/// lifetime of a session; switching role means logging in again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Faculty,
    Student,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Faculty, Role::Student];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Faculty => "FACULTY",
            Role::Student => "STUDENT",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "FACULTY" => Ok(Role::Faculty),
            "STUDENT" => Ok(Role::Student),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// User
///
/// The current-user projection returned by `GET /users/me` and the admin
/// user endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub role: Role,
}

// --- Events ---

/// Event
///
/// An event as the backend reports it. Times are the backend's local
/// date-times (no zone offset on the wire).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub capacity: i32,
    #[serde(default)]
    pub organizer: String,
    #[serde(default)]
    pub approved: bool,
    /// File name of the uploaded image, resolved through the image endpoint.
    #[serde(rename = "imageUrl", default)]
    pub image_ref: Option<String>,
}

/// EventRequest
///
/// Payload for creating or updating an event. New events always start
/// unapproved; approval is a separate moderation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    pub name: String,
    pub description: String,
    pub organizer: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub venue: String,
    pub capacity: i32,
    pub approved: bool,
}

impl EventRequest {
    /// Pre-fills an edit form from an existing event.
    pub fn from_event(event: &Event) -> Self {
        Self {
            name: event.name.clone(),
            description: event.description.clone(),
            organizer: event.organizer.clone(),
            start_time: event.start_time,
            end_time: event.end_time,
            venue: event.venue.clone(),
            capacity: event.capacity,
            approved: event.approved,
        }
    }
}

/// ImageUpload
///
/// The file handed to `POST /events/{id}/image` as the multipart `file` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// EventStatusFilter
///
/// The approval filter offered on the event lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventStatusFilter {
    #[default]
    All,
    Approved,
    Pending,
}

impl FromStr for EventStatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(EventStatusFilter::All),
            "approved" => Ok(EventStatusFilter::Approved),
            "pending" => Ok(EventStatusFilter::Pending),
            other => Err(format!("unknown status filter '{}'", other)),
        }
    }
}

// --- Participation ---

/// Registration
///
/// A user's registration for an event. Older backends only send
/// `eventId`/`eventName`; newer ones embed the whole event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: i64,
    #[serde(default)]
    pub event: Option<Event>,
    #[serde(default)]
    pub event_id: Option<i64>,
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub registration_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub attended: bool,
    #[serde(default)]
    pub certificate_issued: bool,
}

impl Registration {
    pub fn event_id(&self) -> Option<i64> {
        self.event.as_ref().map(|e| e.id).or(self.event_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub feedback: String,
}

// --- Auth & Profile Payloads ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// RegisterRequest
///
/// Account creation payload. The role is optional; the backend decides the
/// default when it is omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Issued by both `/auth/login` and `/auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub full_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateEmailRequest {
    pub email: String,
}

/// ChangePasswordRequest
///
/// Only the current and new password go over the wire; the confirmation is
/// checked locally.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    #[serde(skip)]
    pub confirm_password: String,
}

/// AdminUserUpdate
///
/// Partial update for `PUT /admin/users/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

// --- Dashboard ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DashboardStats {
    pub total_events: usize,
    pub approved_events: usize,
    pub pending_events: usize,
    pub registered_events: usize,
}
