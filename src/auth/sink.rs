//! The session sink: where credentials live outside the client.
//!
//! The client reads the current session through [`SessionSink::current`],
//! hands renewed credentials to [`SessionSink::persist`], and forces a logout
//! through [`SessionSink::clear`]. It never touches the storage medium itself.

use std::sync::{PoisonError, RwLock};

use super::session::{PersistOptions, Session};

/// Storage for the signed-in session, owned by the UI layer.
///
/// Implementations must be cheap to call; the client reads the session on
/// every request.
pub trait SessionSink: Send + Sync {
    /// Returns the current session, if anyone is signed in.
    fn current(&self) -> Option<Session>;

    /// Stores renewed credentials.
    fn persist(&self, session: &Session, options: PersistOptions);

    /// Drops all credentials.
    fn clear(&self);
}

/// In-memory [`SessionSink`].
///
/// # Example
///
/// ```rust
/// use raffle_client::{MemorySessionStore, Session, SessionSink};
///
/// let store = MemorySessionStore::with_session(Session::new("token"));
/// assert!(store.current().is_some());
///
/// store.clear();
/// assert!(store.current().is_none());
/// ```
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: RwLock<Option<Session>>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `session`.
    #[must_use]
    pub fn with_session(session: Session) -> Self {
        Self {
            session: RwLock::new(Some(session)),
        }
    }

    /// Replaces the stored session, as a login screen would.
    pub fn set(&self, session: Session) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }
}

impl SessionSink for MemorySessionStore {
    fn current(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn persist(&self, session: &Session, options: PersistOptions) {
        let mut stored = session.clone();
        stored.remember = options.remember;
        self.set(stored);
    }

    fn clear(&self) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
