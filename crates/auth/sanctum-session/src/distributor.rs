//! Republishes the session and the bound actions to a set of subscribers.

use std::sync::{
    Arc, Weak,
    atomic::{AtomicBool, Ordering},
};

use sanctum_auth::SecureStore;
use serde::Serialize;
use tokio::sync::watch;

use crate::{
    SessionManager,
    actions::CredentialOutcome,
    error::SessionError,
    session::{AuthenticationStatus, Session, SessionObserver, SessionUser, SubscriberId, User},
};

/// What a subscriber sees: the published session plus every action.
///
/// Holds the manager weakly. Actions called after the manager is gone fail
/// with [`SessionError::InvalidSession`].
#[derive(Debug)]
pub struct SessionContext<S: SecureStore> {
    session: Session,
    manager: Weak<SessionManager<S>>,
}

impl<S: SecureStore> Clone for SessionContext<S> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            manager: Weak::clone(&self.manager),
        }
    }
}

impl<S: SecureStore> SessionContext<S> {
    fn new(session: Session, manager: Weak<SessionManager<S>>) -> Self {
        Self { session, manager }
    }

    /// The published snapshot
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Published user slot
    #[must_use]
    pub const fn user(&self) -> &SessionUser {
        self.session.user()
    }

    /// `None` until the first check or action completes
    #[must_use]
    pub const fn authenticated(&self) -> Option<bool> {
        self.session.status().as_flag()
    }

    /// Published status
    #[must_use]
    pub const fn status(&self) -> AuthenticationStatus {
        self.session.status()
    }

    fn manager(&self) -> Result<Arc<SessionManager<S>>, SessionError> {
        self.manager
            .upgrade()
            .ok_or_else(|| SessionError::InvalidSession("session manager was dropped".into()))
    }

    /// See [`SessionManager::sign_in`]
    ///
    /// # Errors
    ///
    /// As the manager method, or if the manager was dropped.
    pub async fn sign_in<P>(&self, credentials: &P) -> Result<CredentialOutcome, SessionError>
    where
        P: Serialize + ?Sized + Sync,
    {
        self.manager()?.sign_in(credentials).await
    }

    /// See [`SessionManager::sign_up`]
    ///
    /// # Errors
    ///
    /// As the manager method, or if the manager was dropped.
    pub async fn sign_up<P>(&self, details: &P) -> Result<CredentialOutcome, SessionError>
    where
        P: Serialize + ?Sized + Sync,
    {
        self.manager()?.sign_up(details).await
    }

    /// See [`SessionManager::sign_out`]
    ///
    /// # Errors
    ///
    /// As the manager method, or if the manager was dropped.
    pub async fn sign_out(&self) -> Result<bool, SessionError> {
        self.manager()?.sign_out().await
    }

    /// See [`SessionManager::forgot_password`]
    ///
    /// # Errors
    ///
    /// As the manager method, or if the manager was dropped.
    pub async fn forgot_password<P>(&self, payload: &P) -> Result<bool, SessionError>
    where
        P: Serialize + ?Sized + Sync,
    {
        self.manager()?.forgot_password(payload).await
    }

    /// See [`SessionManager::reset_password`]
    ///
    /// # Errors
    ///
    /// As the manager method, or if the manager was dropped.
    pub async fn reset_password<P>(&self, payload: &P) -> Result<bool, SessionError>
    where
        P: Serialize + ?Sized + Sync,
    {
        self.manager()?.reset_password(payload).await
    }

    /// See [`SessionManager::check_authentication`]
    ///
    /// # Errors
    ///
    /// As the manager method, or if the manager was dropped.
    pub async fn check_authentication(&self) -> Result<bool, SessionError> {
        self.manager()?.check_authentication().await
    }

    /// See [`SessionManager::confirm_session`]
    ///
    /// # Errors
    ///
    /// As the manager method, or if the manager was dropped.
    pub async fn confirm_session(&self) -> Result<Option<User>, SessionError> {
        self.manager()?.confirm_session().await
    }

    /// See [`SessionManager::set_user`]. Must not be called from inside a
    /// subscriber callback.
    ///
    /// # Errors
    ///
    /// As the manager method, or if the manager was dropped.
    pub fn set_user(&self, user: SessionUser, authenticated: bool) -> Result<(), SessionError> {
        self.manager()?.set_user(user, authenticated)
    }
}

/// Consumer re-rendered whenever the session changes
pub trait ContextSubscriber<S: SecureStore>: Send {
    /// Called on subscribe and after every published change
    fn render(&mut self, context: &SessionContext<S>);
}

impl<S, F> ContextSubscriber<S> for F
where
    S: SecureStore,
    F: FnMut(&SessionContext<S>) + Send,
{
    fn render(&mut self, context: &SessionContext<S>) {
        self(context);
    }
}

struct ContextForwarder<S: SecureStore, C> {
    manager: Weak<SessionManager<S>>,
    subscriber: C,
}

impl<S, C> SessionObserver for ContextForwarder<S, C>
where
    S: SecureStore,
    C: ContextSubscriber<S>,
{
    fn on_session(&mut self, session: &Session) {
        let context = SessionContext::new(session.clone(), Weak::clone(&self.manager));
        self.subscriber.render(&context);
    }
}

/// Owns the manager and fans its session out to subscribers
#[derive(Debug)]
pub struct ContextDistributor<S: SecureStore> {
    manager: Arc<SessionManager<S>>,
    mounted: AtomicBool,
}

impl<S: SecureStore> ContextDistributor<S> {
    /// Wraps a freshly built manager
    #[must_use]
    pub fn new(manager: SessionManager<S>) -> Self {
        Self::from_arc(Arc::new(manager))
    }

    /// Wraps a shared manager
    #[must_use]
    pub const fn from_arc(manager: Arc<SessionManager<S>>) -> Self {
        Self {
            manager,
            mounted: AtomicBool::new(false),
        }
    }

    /// The distributed manager
    #[must_use]
    pub const fn manager(&self) -> &Arc<SessionManager<S>> {
        &self.manager
    }

    /// Context for the current snapshot
    #[must_use]
    pub fn context(&self) -> SessionContext<S> {
        SessionContext::new(self.manager.session(), Arc::downgrade(&self.manager))
    }

    /// Renders `subscriber` now and after every published change.
    ///
    /// Subscribers run synchronously on the task that changed the session.
    /// They may spawn work that calls actions, but must not call
    /// [`SessionContext::set_user`] directly.
    pub fn subscribe<C>(&self, subscriber: C) -> SubscriberId
    where
        C: ContextSubscriber<S> + 'static,
    {
        let forwarder = ContextForwarder {
            manager: Arc::downgrade(&self.manager),
            subscriber,
        };
        let id = self.manager.store().attach(Box::new(forwarder));
        tracing::debug!(?id, "context subscriber attached");
        id
    }

    /// Stops rendering a subscriber; returns whether it was subscribed
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.manager.store().remove_observer(id)
    }

    /// Receiver for async consumers
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Session> {
        self.manager.watch()
    }

    /// Runs the initial authentication check.
    ///
    /// Only the first call does anything, and only when the route table
    /// enables `checkOnInit`. Returns the check's result, or `None` when
    /// skipped.
    ///
    /// # Errors
    ///
    /// Whatever [`SessionManager::check_authentication`] returns.
    pub async fn mount(&self) -> Result<Option<bool>, SessionError> {
        if !self.manager.config().check_on_init() {
            return Ok(None);
        }
        if self.mounted.swap(true, Ordering::AcqRel) {
            return Ok(None);
        }
        tracing::debug!("checking authentication on mount");
        self.manager.check_authentication().await.map(Some)
    }
}
