mod common;

use college_events::{
    ApiError, AuthStatus, EventsBackend, FileTokenStore, MemoryTokenStore, Navigation, Session,
    models::{RegisterRequest, Role},
    routes::Screen,
    storage::TokenStore,
    views::events::EventsScreen,
};
use common::{STUDENT_EMAIL, STUDENT_PASSWORD, spawn_backend};
use std::sync::Arc;
use std::time::Duration;

fn arrived(nav: Navigation) -> String {
    match nav {
        Navigation::Arrived(location) => location.path,
        Navigation::Pending { requested } => panic!("still pending for {}", requested),
    }
}

// --- Login / Logout ---

#[tokio::test]
async fn test_login_then_logout_leaves_nothing_behind() {
    let backend = spawn_backend().await;
    let store = Arc::new(MemoryTokenStore::new());
    let (app, _notices) = backend.client(store.clone());

    let session = app.auth.login(STUDENT_EMAIL, STUDENT_PASSWORD).await.unwrap();
    assert_eq!(session.status(), AuthStatus::Authenticated);
    assert_eq!(session.role(), Some(Role::Student));
    assert!(store.current().is_some());

    app.auth.logout();
    assert_eq!(app.session.status(), AuthStatus::Unauthenticated);
    assert_eq!(store.current(), None);
    assert_eq!(app.session.snapshot(), Session::default());
}

#[tokio::test]
async fn test_wrong_password_is_invalid_credentials() {
    let backend = spawn_backend().await;
    let store = Arc::new(MemoryTokenStore::new());
    let (app, _notices) = backend.client(store.clone());
    app.auth.restore_session().await.unwrap();

    let err = app.auth.login(STUDENT_EMAIL, "nope").await.unwrap_err();
    assert_eq!(err, ApiError::InvalidCredentials);
    assert_eq!(app.session.status(), AuthStatus::Unauthenticated);
    assert_eq!(store.current(), None);
}

#[tokio::test]
async fn test_profile_failure_after_token_issue_leaves_no_session() {
    let backend = spawn_backend().await;
    backend.state.lock().fail_profile = true;
    let store = Arc::new(MemoryTokenStore::new());
    let (app, _notices) = backend.client(store.clone());

    let err = app.auth.login(STUDENT_EMAIL, STUDENT_PASSWORD).await.unwrap_err();
    assert!(matches!(err, ApiError::Rejected { status: 500, .. }));
    assert_eq!(app.session.status(), AuthStatus::Unauthenticated);
    assert!(app.session.snapshot().token.is_none());
    assert_eq!(store.current(), None);

    // The token exchange did happen; only the profile step failed.
    let requests = backend.requests();
    assert!(requests.contains(&"POST /auth/login".to_string()));
    assert!(requests.contains(&"GET /users/me".to_string()));
}

#[tokio::test]
async fn test_every_request_carries_a_request_id() {
    let backend = spawn_backend().await;
    let (app, _notices) = backend.client(Arc::new(MemoryTokenStore::new()));
    app.auth.login(STUDENT_EMAIL, STUDENT_PASSWORD).await.unwrap();

    let s = backend.state.lock();
    assert_eq!(s.request_ids.len(), s.requests.len());
    assert_ne!(s.request_ids[0], s.request_ids[1]);
}

// --- Registration ---

#[tokio::test]
async fn test_register_signs_in_and_persists_to_disk() {
    let backend = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let (app, _notices) = backend.client(Arc::new(FileTokenStore::new(path.clone())));

    let req = RegisterRequest {
        full_name: "Nina New".into(),
        email: "nina@college.edu".into(),
        password: "secret1".into(),
        role: Some(Role::Faculty),
    };
    let session = app.auth.register(req).await.unwrap();
    assert!(session.is_faculty());

    let on_disk = FileTokenStore::new(path).load().unwrap();
    assert_eq!(on_disk, session.token);
}

#[tokio::test]
async fn test_register_validates_before_calling_backend() {
    let backend = spawn_backend().await;
    let (app, _notices) = backend.client(Arc::new(MemoryTokenStore::new()));

    let req = RegisterRequest {
        full_name: "Short".into(),
        email: "short@college.edu".into(),
        password: "12345".into(),
        role: None,
    };
    let err = app.auth.register(req).await.unwrap_err();
    assert!(matches!(err, ApiError::ValidationFailure(_)));
    assert!(backend.requests().is_empty());
}

// --- Restore ---

#[tokio::test]
async fn test_restore_with_valid_token_authenticates() {
    let backend = spawn_backend().await;
    let store = Arc::new(MemoryTokenStore::new());

    let (first, _n1) = backend.client(store.clone());
    first.auth.login(STUDENT_EMAIL, STUDENT_PASSWORD).await.unwrap();

    // A fresh client over the same store, as after a restart.
    let (second, _n2) = backend.client(store.clone());
    assert_eq!(second.session.status(), AuthStatus::Loading);
    let restored = second.auth.restore_session().await.unwrap();
    assert_eq!(restored.status(), AuthStatus::Authenticated);
    assert_eq!(restored.user.unwrap().email, STUDENT_EMAIL);
}

#[tokio::test]
async fn test_restore_with_rejected_token_equals_no_token() {
    let backend = spawn_backend().await;

    let stale = Arc::new(MemoryTokenStore::with_token("tok-revoked"));
    let (with_stale, _n1) = backend.client(stale.clone());
    let from_stale = with_stale.auth.restore_session().await.unwrap();

    let (with_none, _n2) = backend.client(Arc::new(MemoryTokenStore::new()));
    let from_none = with_none.auth.restore_session().await.unwrap();

    assert_eq!(from_stale, from_none);
    assert_eq!(from_stale.status(), AuthStatus::Unauthenticated);
    assert_eq!(stale.current(), None);
}

#[tokio::test]
async fn test_restore_removes_corrupt_token_file() {
    let backend = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, b"not a session").unwrap();

    let (app, _notices) = backend.client(Arc::new(FileTokenStore::new(path.clone())));
    let restored = app.auth.restore_session().await.unwrap();

    assert_eq!(restored.status(), AuthStatus::Unauthenticated);
    assert!(!path.exists());
    assert!(backend.requests().is_empty());
}

// --- Role Routing ---

#[tokio::test]
async fn test_student_reaches_own_section_but_not_admin() {
    let backend = spawn_backend().await;
    let (app, _notices) = backend.client(Arc::new(MemoryTokenStore::new()));
    let mut navigator = app.navigator();

    app.auth.login("a@b.com", "pw").await.unwrap();

    assert_eq!(
        arrived(navigator.navigate("/student/dashboard").unwrap()),
        "/student/dashboard"
    );
    assert_eq!(arrived(navigator.navigate("/admin/users").unwrap()), "/dashboard");
    assert_eq!(navigator.current().unwrap().screen, Screen::Dashboard);
}

// --- Global 401 Handling ---

#[tokio::test]
async fn test_expired_token_on_data_call_signs_out_everywhere() {
    let backend = spawn_backend().await;
    let store = Arc::new(MemoryTokenStore::new());
    let (app, mut notices) = backend.client(store.clone());
    let mut navigator = app.navigator();

    app.auth.login(STUDENT_EMAIL, STUDENT_PASSWORD).await.unwrap();
    navigator.navigate("/student/events").unwrap();

    backend.state.lock().expire_tokens();

    let mut screen = EventsScreen::new(app.view_context());
    let err = screen.load().await.unwrap_err();
    assert_eq!(err, ApiError::Unauthorized);

    assert_eq!(app.session.status(), AuthStatus::Unauthenticated);
    assert_eq!(store.current(), None);

    let moved = navigator.sync().unwrap().expect("navigator should move");
    assert_eq!(arrived(moved), "/login");

    // The authorization failure is handled globally, not as a notice.
    assert!(common::notices(&mut notices).is_empty());
}

#[tokio::test]
async fn test_late_rejection_of_old_token_keeps_new_session() {
    let backend = spawn_backend().await;
    let store = Arc::new(MemoryTokenStore::new());
    let (app, mut notices) = backend.client(store.clone());

    app.auth.login(STUDENT_EMAIL, STUDENT_PASSWORD).await.unwrap();
    let old_token = app.session.bearer().unwrap();
    backend.state.lock().events_delay = Some(Duration::from_millis(300));

    // The list request leaves with the old token and is held server-side.
    let events = app.backend.clone();
    let in_flight = tokio::spawn(async move { events.list_events().await });
    while !backend.requests().contains(&"GET /events".to_string()) {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // Sign out and back in while it is held; the old token dies with it.
    app.auth.logout();
    backend.state.lock().expire_tokens();
    app.auth.login(STUDENT_EMAIL, STUDENT_PASSWORD).await.unwrap();
    let new_token = app.session.bearer().unwrap();
    assert_ne!(old_token, new_token);

    let late = in_flight.await.unwrap();
    assert_eq!(late.unwrap_err(), ApiError::Unauthorized);

    assert_eq!(app.session.status(), AuthStatus::Authenticated);
    assert_eq!(app.session.bearer(), Some(new_token.clone()));
    assert_eq!(store.current(), Some(new_token));
    assert!(common::notices(&mut notices).is_empty());
}

// --- Profile ---

#[tokio::test]
async fn test_profile_update_refreshes_cached_user() {
    let backend = spawn_backend().await;
    let (app, _notices) = backend.client(Arc::new(MemoryTokenStore::new()));
    app.auth.login(STUDENT_EMAIL, STUDENT_PASSWORD).await.unwrap();

    let req = college_events::models::UpdateProfileRequest {
        full_name: "Samira Student".into(),
        email: "samira@college.edu".into(),
    };
    let user = app.auth.update_profile(req).await.unwrap();
    assert_eq!(user.full_name, "Samira Student");
    assert_eq!(app.session.user().unwrap().email, "samira@college.edu");
    assert!(app.session.is_authenticated());
}

#[tokio::test]
async fn test_wrong_current_password_is_reported() {
    let backend = spawn_backend().await;
    let (app, _notices) = backend.client(Arc::new(MemoryTokenStore::new()));
    app.auth.login(STUDENT_EMAIL, STUDENT_PASSWORD).await.unwrap();

    let req = college_events::models::ChangePasswordRequest {
        current_password: "not-it".into(),
        new_password: "brand-new".into(),
        confirm_password: "brand-new".into(),
    };
    let err = app.auth.change_password(req).await.unwrap_err();
    assert_eq!(
        err,
        ApiError::ValidationFailure("Current password is incorrect".into())
    );
    assert!(app.session.is_authenticated());
}
