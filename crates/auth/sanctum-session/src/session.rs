//! Session state: who is signed in, and who is watching.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use serde::{Deserialize, Serialize, Serializer};
use tokio::sync::watch;

use crate::error::SessionError;

/// Tri-state authentication status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthenticationStatus {
    /// No check or action has completed yet
    #[default]
    Unknown,
    /// The backend confirmed a signed-in user
    Authenticated,
    /// The backend reported no signed-in user
    Unauthenticated,
}

impl AuthenticationStatus {
    /// `None` while unknown, otherwise whether a user is signed in
    #[must_use]
    pub const fn as_flag(self) -> Option<bool> {
        match self {
            Self::Unknown => None,
            Self::Authenticated => Some(true),
            Self::Unauthenticated => Some(false),
        }
    }
}

/// Opaque user record as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct User(serde_json::Value);

impl User {
    /// Wraps a backend record
    #[must_use]
    pub const fn new(record: serde_json::Value) -> Self {
        Self(record)
    }

    /// Field lookup on object records
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// The raw record
    #[must_use]
    pub const fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    /// Consumes the wrapper
    #[must_use]
    pub fn into_value(self) -> serde_json::Value {
        self.0
    }
}

/// User slot of the session.
///
/// Serializes as `null`, `false` or the record itself.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionUser {
    /// No user
    #[default]
    None,
    /// Explicit "signed out" marker left by a successful sign-out
    SignedOut,
    /// The signed-in user
    Known(User),
}

impl SessionUser {
    /// The user record, if one is present
    #[must_use]
    pub const fn known(&self) -> Option<&User> {
        match self {
            Self::Known(user) => Some(user),
            Self::None | Self::SignedOut => None,
        }
    }
}

impl Serialize for SessionUser {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::None => serializer.serialize_none(),
            Self::SignedOut => serializer.serialize_bool(false),
            Self::Known(user) => user.serialize(serializer),
        }
    }
}

/// Immutable snapshot of the session.
///
/// Only built through constructors that keep
/// `status == Authenticated` ⇔ `user` is [`SessionUser::Known`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    status: AuthenticationStatus,
    user: SessionUser,
    revision: u64,
}

impl Session {
    /// The initial session: status unknown, no user
    #[must_use]
    pub const fn unknown() -> Self {
        Self {
            status: AuthenticationStatus::Unknown,
            user: SessionUser::None,
            revision: 0,
        }
    }

    /// Authentication status
    #[must_use]
    pub const fn status(&self) -> AuthenticationStatus {
        self.status
    }

    /// User slot
    #[must_use]
    pub const fn user(&self) -> &SessionUser {
        &self.user
    }

    /// Whether a user is signed in
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self.status, AuthenticationStatus::Authenticated)
    }

    /// Number of published changes before this snapshot
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    fn same_state(&self, status: AuthenticationStatus, user: &SessionUser) -> bool {
        self.status == status && &self.user == user
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Changes that can be applied to the session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionMutation {
    /// The backend returned a user record
    Authenticate(User),
    /// The backend answered 401
    Deauthenticate,
    /// A sign-out succeeded
    SignOut,
    /// Caller-supplied state, e.g. hydrated from server-rendered markup
    Hydrate {
        /// User slot to publish
        user: SessionUser,
        /// Whether that user is signed in
        authenticated: bool,
    },
}

impl SessionMutation {
    /// Resolves this mutation to the `(status, user)` pair it publishes.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidSession`] for a hydration that would
    /// pair `authenticated` with a missing user or vice versa.
    pub fn resolve(self) -> Result<(AuthenticationStatus, SessionUser), SessionError> {
        match self {
            Self::Authenticate(user) => {
                Ok((AuthenticationStatus::Authenticated, SessionUser::Known(user)))
            }
            Self::Deauthenticate => Ok((AuthenticationStatus::Unauthenticated, SessionUser::None)),
            Self::SignOut => Ok((AuthenticationStatus::Unauthenticated, SessionUser::SignedOut)),
            Self::Hydrate {
                user: SessionUser::Known(user),
                authenticated: true,
            } => Ok((AuthenticationStatus::Authenticated, SessionUser::Known(user))),
            Self::Hydrate {
                user: user @ (SessionUser::None | SessionUser::SignedOut),
                authenticated: false,
            } => Ok((AuthenticationStatus::Unauthenticated, user)),
            Self::Hydrate {
                authenticated: true,
                ..
            } => Err(SessionError::InvalidSession(
                "an authenticated session needs a user record".into(),
            )),
            Self::Hydrate { .. } => Err(SessionError::InvalidSession(
                "a user record cannot be unauthenticated".into(),
            )),
        }
    }
}

/// Synchronous observer of published sessions
pub trait SessionObserver: Send {
    /// Called after every published change
    fn on_session(&mut self, session: &Session);
}

/// Unique subscriber identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

type ObserverMap = HashMap<SubscriberId, Box<dyn SessionObserver>>;

/// Single source of truth for the session.
///
/// The value lives in a [`watch`] channel, so async consumers can await
/// changes, and is also pushed to registered [`SessionObserver`]s right after
/// it changes. Mutations that leave `(status, user)` as it was publish nothing.
/// Concurrent writers are not serialized: the last completed mutation wins.
pub struct SessionStore {
    state: watch::Sender<Session>,
    observers: Mutex<ObserverMap>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &*self.state.borrow())
            .field("observers", &self.lock_observers().len())
            .finish()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Creates a store holding [`Session::unknown`]
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(Session::unknown());
        Self {
            state,
            observers: Mutex::new(HashMap::new()),
        }
    }

    /// Current snapshot
    #[must_use]
    pub fn current(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Receiver that wakes on every published change
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Applies a mutation. Returns whether a new snapshot was published.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidSession`] if the mutation would break
    /// the status/user invariant; nothing is published in that case.
    pub fn dispatch(&self, mutation: SessionMutation) -> Result<bool, SessionError> {
        let (status, user) = mutation.resolve()?;

        let changed = self.state.send_if_modified(|session| {
            if session.same_state(status, &user) {
                return false;
            }
            *session = Session {
                status,
                user,
                revision: session.revision + 1,
            };
            true
        });

        if changed {
            let mut observers = self.lock_observers();
            let snapshot = self.current();
            tracing::info!(
                status = ?snapshot.status(),
                revision = snapshot.revision(),
                "session changed"
            );
            for observer in observers.values_mut() {
                observer.on_session(&snapshot);
            }
        }
        Ok(changed)
    }

    /// Explicit setter for callers outside the standard actions
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidSession`] for inconsistent pairs.
    pub fn set_user(&self, user: SessionUser, authenticated: bool) -> Result<(), SessionError> {
        self.dispatch(SessionMutation::Hydrate {
            user,
            authenticated,
        })
        .map(|_| ())
    }

    /// Registers an observer and returns its ID.
    ///
    /// Observers run while the registry is locked and must not register,
    /// remove, or dispatch from inside the callback.
    pub fn add_observer(&self, observer: Box<dyn SessionObserver>) -> SubscriberId {
        let id = SubscriberId::new();
        self.lock_observers().insert(id, observer);
        id
    }

    /// Registers an observer after handing it the current snapshot.
    ///
    /// The first call and the registration happen under the same lock, so no
    /// change can slip in between them.
    pub fn attach(&self, mut observer: Box<dyn SessionObserver>) -> SubscriberId {
        let id = SubscriberId::new();
        let mut observers = self.lock_observers();
        observer.on_session(&self.current());
        observers.insert(id, observer);
        id
    }

    /// Removes an observer; returns whether it was registered
    pub fn remove_observer(&self, id: SubscriberId) -> bool {
        self.lock_observers().remove(&id).is_some()
    }

    fn lock_observers(&self) -> MutexGuard<'_, ObserverMap> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
