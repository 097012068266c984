use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;

use crate::error::ApiError;
use crate::models::{Role, User};
use crate::storage::TokenStoreState;

/// AuthStatus
///
/// The three observable states of the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// The startup restore has not finished; no access decision may be made.
    Loading,
    Unauthenticated,
    Authenticated,
}

/// Session
///
/// Point-in-time copy of the authentication state. `user` is only ever set
/// together with the `token` it was validated with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<User>,
    pub loading: bool,
}

impl Session {
    pub fn status(&self) -> AuthStatus {
        if self.loading {
            AuthStatus::Loading
        } else if self.token.is_some() && self.user.is_some() {
            AuthStatus::Authenticated
        } else {
            AuthStatus::Unauthenticated
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status() == AuthStatus::Authenticated
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }

    pub fn is_faculty(&self) -> bool {
        self.role() == Some(Role::Faculty)
    }

    pub fn is_student(&self) -> bool {
        self.role() == Some(Role::Student)
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    Logout,
    /// The backend rejected the token (401).
    Expired,
    /// Login, registration or restore could not complete.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Started(User),
    UserUpdated(User),
    Ended(EndReason),
}

struct Inner {
    state: RwLock<Session>,
    generation: AtomicU64,
    events: broadcast::Sender<SessionEvent>,
    store: TokenStoreState,
}

/// SessionHandle
///
/// The single owner of session state, shared by cloning. Everything outside
/// the crate only gets the read side; transitions are reserved for the auth
/// manager and the transport's 401 interceptor.
///
/// Every transition bumps `generation`, which screens capture with their
/// request tickets so responses that straddle a login/logout are dropped.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<Inner>,
}

impl SessionHandle {
    /// A session awaiting its startup restore (`loading` is set).
    pub fn new(store: TokenStoreState) -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(Session {
                    token: None,
                    user: None,
                    loading: true,
                }),
                generation: AtomicU64::new(0),
                events,
                store,
            }),
        }
    }

    // --- Read side ---

    pub fn snapshot(&self) -> Session {
        self.inner.state.read().clone()
    }

    pub fn status(&self) -> AuthStatus {
        self.inner.state.read().status()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.read().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.read().loading
    }

    pub fn user(&self) -> Option<User> {
        self.inner.state.read().user.clone()
    }

    pub fn role(&self) -> Option<Role> {
        self.inner.state.read().role()
    }

    pub fn is_admin(&self) -> bool {
        self.inner.state.read().is_admin()
    }

    pub fn is_faculty(&self) -> bool {
        self.inner.state.read().is_faculty()
    }

    pub fn is_student(&self) -> bool {
        self.inner.state.read().is_student()
    }

    /// Token to attach to outgoing requests. Only an authenticated session
    /// lends its token out.
    pub fn bearer(&self) -> Option<String> {
        let state = self.inner.state.read();
        if state.is_authenticated() {
            state.token.clone()
        } else {
            None
        }
    }

    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    pub(crate) fn store(&self) -> &TokenStoreState {
        &self.inner.store
    }

    // --- Write side (crate only) ---

    /// Persists the token and installs the validated user in one step. If
    /// the token cannot be persisted nothing changes.
    pub(crate) fn establish(&self, token: String, user: User) -> Result<Session, ApiError> {
        let snapshot = {
            // The store is written under the lock so a concurrent `end`
            // cannot clear it between the save and the state swap.
            let mut state = self.inner.state.write();
            self.inner.store.save(&token)?;
            *state = Session {
                token: Some(token),
                user: Some(user.clone()),
                loading: false,
            };
            state.clone()
        };
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        tracing::info!(user_id = user.id, role = %user.role, "session established");
        let _ = self.inner.events.send(SessionEvent::Started(user));
        Ok(snapshot)
    }

    /// Swaps the cached user projection. The identity and role must match
    /// the user the token was issued to.
    pub(crate) fn replace_user(&self, user: User) -> Result<(), ApiError> {
        {
            let mut state = self.inner.state.write();
            if !state.is_authenticated() {
                return Err(ApiError::Unauthorized);
            }
            match state.user.as_ref() {
                Some(current) if current.id != user.id => {
                    return Err(ApiError::validation("Profile belongs to a different user"));
                }
                Some(current) if current.role != user.role => {
                    tracing::warn!(from = %current.role, to = %user.role, "role change requires re-login");
                    return Err(ApiError::validation(
                        "Role changes take effect after logging in again",
                    ));
                }
                _ => {}
            }
            state.user = Some(user.clone());
        }
        let _ = self.inner.events.send(SessionEvent::UserUpdated(user));
        Ok(())
    }

    /// Marks the end of the startup restore when there was nothing to restore.
    pub(crate) fn finish_loading(&self) {
        self.inner.state.write().loading = false;
    }

    /// Drops token and user, removes the persisted token and notifies
    /// subscribers. Always leaves the session unauthenticated, even when the
    /// store cannot be cleared.
    pub(crate) fn end(&self, reason: EndReason) {
        self.end_when(reason, |_| true);
    }

    /// Ends the session only while it still holds `token`. Returns whether
    /// it did. A rejection of a token that has since been replaced leaves
    /// the newer session untouched.
    pub(crate) fn end_if_holds(&self, token: &str, reason: EndReason) -> bool {
        let ended = self.end_when(reason, |state| state.token.as_deref() == Some(token));
        if !ended {
            tracing::debug!(?reason, "ignoring rejection of a replaced token");
        }
        ended
    }

    fn end_when(&self, reason: EndReason, applies: impl FnOnce(&Session) -> bool) -> bool {
        let was_authenticated = {
            let mut state = self.inner.state.write();
            if !applies(&state) {
                return false;
            }
            let was = state.is_authenticated();
            *state = Session::default();
            if let Err(e) = self.inner.store.clear() {
                tracing::error!(error = %e, "failed to remove persisted token");
            }
            was
        };
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        tracing::info!(?reason, was_authenticated, "session ended");
        let _ = self.inner.events.send(SessionEvent::Ended(reason));
        true
    }
}
