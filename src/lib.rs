use std::sync::Arc;

// --- Module Structure ---

// Session core: state, persistence and the transitions that drive it.
pub mod auth;
pub mod config;
pub mod error;
pub mod session;
pub mod storage;

// Backend access.
pub mod api;
pub mod models;
pub mod transport;

// Access control and navigation.
pub mod guard;
pub mod navigator;
pub mod permissions;
pub mod routes;

// Screens and their support.
pub mod liveness;
pub mod notify;
pub mod validation;
pub mod views;

// --- Public Re-exports ---

pub use api::{BackendState, EventsBackend, HttpEventsBackend};
pub use auth::AuthManager;
pub use config::AppConfig;
pub use error::{ApiError, AuthError};
pub use navigator::{Navigation, Navigator};
pub use session::{AuthStatus, Session, SessionHandle};
pub use storage::{FileTokenStore, MemoryTokenStore, TokenStoreState};

use notify::{Notice, Notifier};
use routes::RouteTable;
use tokio::sync::mpsc;
use transport::HttpTransport;
use views::ViewContext;

/// AppState
///
/// The single container for every client service, built once at startup
/// and cloned wherever it is needed. All services share one session handle,
/// so a transition made anywhere is seen everywhere.
#[derive(Clone)]
pub struct AppState {
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
    pub session: SessionHandle,
    pub auth: AuthManager,
    /// Backend Layer: events, participation and admin calls.
    pub backend: BackendState,
    pub notifier: Notifier,
    pub routes: Arc<RouteTable>,
}

impl AppState {
    /// build
    ///
    /// Wires the session, transport, auth manager and backend around the
    /// given token store. Returns the receiving end of the notice channel for
    /// whatever displays notices.
    pub fn build(
        config: AppConfig,
        store: TokenStoreState,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Notice>), ApiError> {
        let session = SessionHandle::new(store);
        let transport = HttpTransport::new(&config, session.clone())?;
        let auth = AuthManager::new(transport.clone());
        let backend = Arc::new(HttpEventsBackend::new(transport)) as BackendState;
        let (notifier, notices) = Notifier::channel();

        let state = Self {
            config,
            session,
            auth,
            backend,
            notifier,
            routes: Arc::new(RouteTable::standard()),
        };
        Ok((state, notices))
    }

    pub fn view_context(&self) -> ViewContext {
        ViewContext::new(
            self.backend.clone(),
            self.session.clone(),
            self.notifier.clone(),
        )
    }

    pub fn navigator(&self) -> Navigator {
        Navigator::new(self.session.clone(), self.routes.clone())
    }
}
