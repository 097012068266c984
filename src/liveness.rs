use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::session::SessionHandle;

/// Ticket
///
/// Issued when a screen starts a request. It remembers which request it was
/// and which session it was made under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    seq: u64,
    generation: u64,
}

/// ScreenScope
///
/// Per-screen guard against late responses. A response is only applied if
/// its ticket is the latest one issued, the screen is still mounted and the
/// session has not changed since the request left. Clones share state, so
/// whoever tears the screen down can `unmount` a copy.
#[derive(Clone)]
pub struct ScreenScope {
    session: SessionHandle,
    seq: Arc<AtomicU64>,
    mounted: Arc<AtomicBool>,
}

impl ScreenScope {
    pub fn new(session: SessionHandle) -> Self {
        Self {
            session,
            seq: Arc::new(AtomicU64::new(0)),
            mounted: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Starts a new request, superseding every earlier ticket.
    pub fn issue(&self) -> Ticket {
        Ticket {
            seq: self.seq.fetch_add(1, Ordering::SeqCst) + 1,
            generation: self.session.generation(),
        }
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.mounted.load(Ordering::SeqCst)
            && self.seq.load(Ordering::SeqCst) == ticket.seq
            && self.session.generation() == ticket.generation
    }

    /// Hands the value back only if the ticket is still current.
    pub fn apply<T>(&self, ticket: &Ticket, value: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(value)
        } else {
            tracing::debug!(seq = ticket.seq, "discarding stale response");
            None
        }
    }

    /// Starts a user action (register, approve, ...). Unlike `issue` it
    /// does not supersede a load in flight; only mount state and session
    /// are checked for it.
    pub fn begin_action(&self) -> Ticket {
        Ticket {
            seq: self.seq.load(Ordering::SeqCst),
            generation: self.session.generation(),
        }
    }

    /// Whether an action's result may still be applied to this screen.
    pub fn is_live(&self, ticket: &Ticket) -> bool {
        self.mounted.load(Ordering::SeqCst) && self.session.generation() == ticket.generation
    }

    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }
}
