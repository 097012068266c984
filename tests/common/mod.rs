#![allow(dead_code)]

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::NaiveDate;
use college_events::{
    AppConfig, AppState, TokenStoreState,
    models::{Event, Role, User},
    notify::Notice,
};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

// --- FAKE BACKEND STATE ---

pub struct FakeState {
    pub users: Vec<(User, String)>,
    pub tokens: HashMap<String, i64>,
    pub events: Vec<Event>,
    // (user id, event id, feedback)
    pub registrations: Vec<(i64, i64, Option<String>)>,
    pub uploads: Vec<(i64, usize)>,
    /// Every request as "METHOD /path".
    pub requests: Vec<String>,
    /// The x-request-id of every request that carried one.
    pub request_ids: Vec<String>,
    /// Makes `GET /users/me` answer 500.
    pub fail_profile: bool,
    /// Makes `GET /events/{id}` answer 500 for these ids.
    pub broken_events: Vec<i64>,
    /// Makes `POST /events/{id}/image` answer 500.
    pub fail_uploads: bool,
    /// Holds `GET /events` for this long before checking the caller.
    pub events_delay: Option<Duration>,
    next_token: u64,
}

pub type Shared = Arc<Mutex<FakeState>>;

pub const ADMIN_EMAIL: &str = "admin@college.edu";
pub const ADMIN_PASSWORD: &str = "admin-pass";
pub const FACULTY_EMAIL: &str = "prof@college.edu";
pub const FACULTY_PASSWORD: &str = "faculty-pass";
pub const STUDENT_EMAIL: &str = "a@b.com";
pub const STUDENT_PASSWORD: &str = "pw";

fn at(day: u32, hour: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

pub fn sample_event(id: i64, name: &str, day: u32, approved: bool) -> Event {
    Event {
        id,
        name: name.to_string(),
        description: format!("{} description", name),
        start_time: at(day, 10),
        end_time: at(day, 12),
        venue: "Main Hall".to_string(),
        capacity: 100,
        organizer: "Student Council".to_string(),
        approved,
        image_ref: None,
    }
}

impl FakeState {
    fn seeded() -> Self {
        let user = |id, name: &str, email: &str, role| User {
            id,
            full_name: name.to_string(),
            email: email.to_string(),
            role,
        };
        Self {
            users: vec![
                (user(1, "Ada Admin", ADMIN_EMAIL, Role::Admin), ADMIN_PASSWORD.into()),
                (user(2, "Fay Faculty", FACULTY_EMAIL, Role::Faculty), FACULTY_PASSWORD.into()),
                (user(3, "Sam Student", STUDENT_EMAIL, Role::Student), STUDENT_PASSWORD.into()),
            ],
            tokens: HashMap::new(),
            events: vec![
                sample_event(1, "Tech Talk", 3, true),
                sample_event(2, "Hackathon", 9, true),
                sample_event(3, "Robotics Workshop", 6, false),
            ],
            registrations: Vec::new(),
            uploads: Vec::new(),
            requests: Vec::new(),
            request_ids: Vec::new(),
            fail_profile: false,
            broken_events: Vec::new(),
            fail_uploads: false,
            events_delay: None,
            next_token: 0,
        }
    }

    fn issue_token(&mut self, user_id: i64) -> String {
        self.next_token += 1;
        let token = format!("tok-{}-{}", user_id, self.next_token);
        self.tokens.insert(token.clone(), user_id);
        token
    }

    fn user(&self, id: i64) -> Option<User> {
        self.users.iter().find(|(u, _)| u.id == id).map(|(u, _)| u.clone())
    }

    /// Revokes every issued token, as if they all expired.
    pub fn expire_tokens(&mut self) {
        self.tokens.clear();
    }
}

// --- REQUEST HELPERS ---

fn record(state: &Shared, headers: &HeaderMap, line: String) {
    let mut s = state.lock();
    if let Some(id) = headers.get("x-request-id").and_then(|v| v.to_str().ok()) {
        s.request_ids.push(id.to_string());
    }
    s.requests.push(line);
}

fn caller(state: &Shared, headers: &HeaderMap) -> Result<User, Response> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| StatusCode::UNAUTHORIZED.into_response())?;
    let s = state.lock();
    s.tokens
        .get(token)
        .and_then(|id| s.user(*id))
        .ok_or_else(|| StatusCode::UNAUTHORIZED.into_response())
}

fn require_role(user: &User, roles: &[Role]) -> Result<(), Response> {
    if roles.contains(&user.role) {
        Ok(())
    } else {
        Err(StatusCode::FORBIDDEN.into_response())
    }
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "message": message }))).into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "message": "Event not found" }))).into_response()
}

fn event_from_body(id: i64, body: &Value) -> Option<Event> {
    let mut value = body.clone();
    value["id"] = json!(id);
    serde_json::from_value(value).ok()
}

// --- HANDLERS ---

async fn login(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    record(&state, &headers, "POST /auth/login".into());
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    let mut s = state.lock();
    let found = s
        .users
        .iter()
        .find(|(u, p)| u.email == email && p == password)
        .map(|(u, _)| u.id);
    match found {
        Some(id) => Json(json!({ "token": s.issue_token(id) })).into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn register(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    record(&state, &headers, "POST /auth/register".into());
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let mut s = state.lock();
    if s.users.iter().any(|(u, _)| u.email == email) {
        return bad_request("Email already registered");
    }
    let role = body
        .get("role")
        .and_then(|r| serde_json::from_value::<Role>(r.clone()).ok())
        .unwrap_or(Role::Student);
    let id = s.users.len() as i64 + 1;
    let user = User {
        id,
        full_name: body["fullName"].as_str().unwrap_or_default().to_string(),
        email,
        role,
    };
    let password = body["password"].as_str().unwrap_or_default().to_string();
    s.users.push((user, password));
    Json(json!({ "token": s.issue_token(id) })).into_response()
}

async fn me(State(state): State<Shared>, headers: HeaderMap) -> Response {
    record(&state, &headers, "GET /users/me".into());
    if state.lock().fail_profile {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    match caller(&state, &headers) {
        Ok(user) => Json(user).into_response(),
        Err(r) => r,
    }
}

async fn update_me(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    record(&state, &headers, "PUT /users/me".into());
    let user = match caller(&state, &headers) {
        Ok(u) => u,
        Err(r) => return r,
    };
    let mut s = state.lock();
    let Some((slot, _)) = s.users.iter_mut().find(|(u, _)| u.id == user.id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if let Some(name) = body["fullName"].as_str() {
        slot.full_name = name.to_string();
    }
    if let Some(email) = body["email"].as_str() {
        slot.email = email.to_string();
    }
    Json(slot.clone()).into_response()
}

async fn update_email(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    record(&state, &headers, "PUT /users/me/email".into());
    let user = match caller(&state, &headers) {
        Ok(u) => u,
        Err(r) => return r,
    };
    let mut s = state.lock();
    let Some((slot, _)) = s.users.iter_mut().find(|(u, _)| u.id == user.id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    slot.email = body["email"].as_str().unwrap_or_default().to_string();
    Json(slot.clone()).into_response()
}

async fn change_password(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    record(&state, &headers, "PUT /users/me/password".into());
    let user = match caller(&state, &headers) {
        Ok(u) => u,
        Err(r) => return r,
    };
    let mut s = state.lock();
    let Some((_, password)) = s.users.iter_mut().find(|(u, _)| u.id == user.id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if body["currentPassword"].as_str() != Some(password.as_str()) {
        return bad_request("Current password is incorrect");
    }
    *password = body["newPassword"].as_str().unwrap_or_default().to_string();
    StatusCode::OK.into_response()
}

async fn list_events(State(state): State<Shared>, headers: HeaderMap) -> Response {
    record(&state, &headers, "GET /events".into());
    let delay = state.lock().events_delay;
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    if let Err(r) = caller(&state, &headers) {
        return r;
    }
    Json(state.lock().events.clone()).into_response()
}

async fn approved_events(State(state): State<Shared>, headers: HeaderMap) -> Response {
    record(&state, &headers, "GET /events/approved".into());
    if let Err(r) = caller(&state, &headers) {
        return r;
    }
    let approved: Vec<Event> = state
        .lock()
        .events
        .iter()
        .filter(|e| e.approved)
        .cloned()
        .collect();
    Json(approved).into_response()
}

async fn get_event(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    record(&state, &headers, format!("GET /events/{}", id));
    if let Err(r) = caller(&state, &headers) {
        return r;
    }
    let s = state.lock();
    if s.broken_events.contains(&id) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    match s.events.iter().find(|e| e.id == id) {
        Some(e) => Json(e.clone()).into_response(),
        None => not_found(),
    }
}

async fn create_event(state: Shared, headers: HeaderMap, body: Value, path: &str, roles: &[Role]) -> Response {
    record(&state, &headers, format!("POST {}", path));
    let user = match caller(&state, &headers) {
        Ok(u) => u,
        Err(r) => return r,
    };
    if let Err(r) = require_role(&user, roles) {
        return r;
    }
    let mut s = state.lock();
    let id = s.events.iter().map(|e| e.id).max().unwrap_or(0) + 1;
    let Some(event) = event_from_body(id, &body) else {
        return bad_request("Invalid event");
    };
    s.events.push(event.clone());
    Json(event).into_response()
}

async fn admin_create_event(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    create_event(state, headers, body, "/admin/events", &[Role::Admin]).await
}

async fn faculty_create_event(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    create_event(state, headers, body, "/faculty/events", &[Role::Faculty]).await
}

async fn admin_update_event(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    record(&state, &headers, format!("PUT /admin/events/{}", id));
    let user = match caller(&state, &headers) {
        Ok(u) => u,
        Err(r) => return r,
    };
    if let Err(r) = require_role(&user, &[Role::Admin]) {
        return r;
    }
    let mut s = state.lock();
    let Some(updated) = event_from_body(id, &body) else {
        return bad_request("Invalid event");
    };
    match s.events.iter_mut().find(|e| e.id == id) {
        Some(slot) => {
            *slot = updated.clone();
            Json(updated).into_response()
        }
        None => not_found(),
    }
}

async fn admin_delete_event(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    record(&state, &headers, format!("DELETE /admin/events/{}", id));
    let user = match caller(&state, &headers) {
        Ok(u) => u,
        Err(r) => return r,
    };
    if let Err(r) = require_role(&user, &[Role::Admin]) {
        return r;
    }
    state.lock().events.retain(|e| e.id != id);
    StatusCode::NO_CONTENT.into_response()
}

async fn set_approval(state: Shared, headers: HeaderMap, id: i64, approved: bool) -> Response {
    let verb = if approved { "approve" } else { "reject" };
    record(&state, &headers, format!("PUT /events/{}/{}", id, verb));
    let user = match caller(&state, &headers) {
        Ok(u) => u,
        Err(r) => return r,
    };
    if let Err(r) = require_role(&user, &[Role::Admin, Role::Faculty]) {
        return r;
    }
    match state.lock().events.iter_mut().find(|e| e.id == id) {
        Some(e) => {
            e.approved = approved;
            StatusCode::OK.into_response()
        }
        None => not_found(),
    }
}

async fn approve(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    set_approval(state, headers, id, true).await
}

async fn reject(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    set_approval(state, headers, id, false).await
}

async fn upload_image(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i64>, body: Bytes) -> Response {
    record(&state, &headers, format!("POST /events/{}/image", id));
    if let Err(r) = caller(&state, &headers) {
        return r;
    }
    let mut s = state.lock();
    if s.fail_uploads {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    s.uploads.push((id, body.len()));
    if let Some(e) = s.events.iter_mut().find(|e| e.id == id) {
        e.image_ref = Some(format!("event-{}.png", id));
    }
    StatusCode::OK.into_response()
}

async fn register_for_event(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    record(&state, &headers, format!("POST /participation/events/{}/register", id));
    let user = match caller(&state, &headers) {
        Ok(u) => u,
        Err(r) => return r,
    };
    let mut s = state.lock();
    if s.registrations.iter().any(|(u, e, _)| *u == user.id && *e == id) {
        return bad_request("Already registered");
    }
    s.registrations.push((user.id, id, None));
    StatusCode::OK.into_response()
}

async fn feedback(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    record(&state, &headers, format!("POST /participation/events/{}/feedback", id));
    let user = match caller(&state, &headers) {
        Ok(u) => u,
        Err(r) => return r,
    };
    let mut s = state.lock();
    match s
        .registrations
        .iter_mut()
        .find(|(u, e, _)| *u == user.id && *e == id)
    {
        Some(reg) => {
            reg.2 = body["feedback"].as_str().map(str::to_string);
            StatusCode::OK.into_response()
        }
        None => bad_request("Not registered for this event"),
    }
}

async fn registered(State(state): State<Shared>, headers: HeaderMap) -> Response {
    record(&state, &headers, "GET /participation/events/registered".into());
    let user = match caller(&state, &headers) {
        Ok(u) => u,
        Err(r) => return r,
    };
    let s = state.lock();
    let list: Vec<Value> = s
        .registrations
        .iter()
        .enumerate()
        .filter(|(_, (u, _, _))| *u == user.id)
        .map(|(i, (_, event_id, feedback))| {
            let name = s
                .events
                .iter()
                .find(|e| e.id == *event_id)
                .map(|e| e.name.clone())
                .unwrap_or_else(|| "Removed event".to_string());
            json!({
                "id": i as i64 + 1,
                "eventId": event_id,
                "eventName": name,
                "feedback": feedback,
                "attended": false,
                "certificateIssued": false
            })
        })
        .collect();
    Json(list).into_response()
}

async fn admin_users(State(state): State<Shared>, headers: HeaderMap) -> Response {
    record(&state, &headers, "GET /admin/users".into());
    let user = match caller(&state, &headers) {
        Ok(u) => u,
        Err(r) => return r,
    };
    if let Err(r) = require_role(&user, &[Role::Admin]) {
        return r;
    }
    let users: Vec<User> = state.lock().users.iter().map(|(u, _)| u.clone()).collect();
    Json(users).into_response()
}

async fn admin_get_user(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    record(&state, &headers, format!("GET /admin/users/{}", id));
    let user = match caller(&state, &headers) {
        Ok(u) => u,
        Err(r) => return r,
    };
    if let Err(r) = require_role(&user, &[Role::Admin]) {
        return r;
    }
    match state.lock().user(id) {
        Some(u) => Json(u).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "message": "User not found" }))).into_response(),
    }
}

async fn admin_delete_user(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    record(&state, &headers, format!("DELETE /admin/users/{}", id));
    let user = match caller(&state, &headers) {
        Ok(u) => u,
        Err(r) => return r,
    };
    if let Err(r) = require_role(&user, &[Role::Admin]) {
        return r;
    }
    state.lock().users.retain(|(u, _)| u.id != id);
    StatusCode::NO_CONTENT.into_response()
}

async fn participants_csv(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    record(&state, &headers, format!("GET /admin/events/{}/participants/csv", id));
    let user = match caller(&state, &headers) {
        Ok(u) => u,
        Err(r) => return r,
    };
    if let Err(r) = require_role(&user, &[Role::Admin]) {
        return r;
    }
    let s = state.lock();
    let mut csv = String::from("userId,fullName,email\n");
    for (user_id, _, _) in s.registrations.iter().filter(|(_, e, _)| *e == id) {
        if let Some(u) = s.user(*user_id) {
            csv.push_str(&format!("{},{},{}\n", u.id, u.full_name, u.email));
        }
    }
    ([(header::CONTENT_TYPE, "text/csv")], csv).into_response()
}

// --- SPAWNING ---

pub struct TestBackend {
    /// API root, including `/api`.
    pub api_url: String,
    pub state: Shared,
}

impl TestBackend {
    pub fn requests(&self) -> Vec<String> {
        self.state.lock().requests.clone()
    }

    pub fn config(&self) -> AppConfig {
        AppConfig {
            api_url: self.api_url.clone(),
            request_timeout_secs: 5,
            ..AppConfig::default()
        }
    }

    /// A fully wired client pointed at this backend.
    pub fn client(&self, store: TokenStoreState) -> (AppState, mpsc::UnboundedReceiver<Notice>) {
        AppState::build(self.config(), store).expect("client should build")
    }
}

pub async fn spawn_backend() -> TestBackend {
    let state: Shared = Arc::new(Mutex::new(FakeState::seeded()));

    let api = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/users/me", get(me).put(update_me))
        .route("/users/me/email", put(update_email))
        .route("/users/me/password", put(change_password))
        .route("/events", get(list_events))
        .route("/events/approved", get(approved_events))
        .route("/events/{id}", get(get_event))
        .route("/events/{id}/approve", put(approve))
        .route("/events/{id}/reject", put(reject))
        .route("/events/{id}/image", post(upload_image))
        .route("/admin/events", post(admin_create_event))
        .route(
            "/admin/events/{id}",
            put(admin_update_event).delete(admin_delete_event),
        )
        .route("/admin/events/{id}/participants/csv", get(participants_csv))
        .route("/faculty/events", post(faculty_create_event))
        .route("/admin/users", get(admin_users))
        .route(
            "/admin/users/{id}",
            get(admin_get_user).delete(admin_delete_user),
        )
        .route("/participation/events/{id}/register", post(register_for_event))
        .route("/participation/events/{id}/feedback", post(feedback))
        .route("/participation/events/registered", get(registered))
        .with_state(state.clone());

    let router = Router::new().nest("/api", api);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let api_url = format!("http://127.0.0.1:{}/api", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestBackend { api_url, state }
}

/// Drains every notice emitted so far.
pub fn notices(rx: &mut mpsc::UnboundedReceiver<Notice>) -> Vec<Notice> {
    let mut out = Vec::new();
    while let Ok(n) = rx.try_recv() {
        out.push(n);
    }
    out
}
