use std::sync::Arc;

use reqwest::cookie::Jar;
use sanctum_auth::{CredentialStore, SecureStore};
use tokio::sync::watch;

use crate::{
    client::{HttpTransport, default_http_client},
    config::RouteConfig,
    csrf::CsrfCoordinator,
    error::SessionError,
    session::{Session, SessionStore},
};

/// Session manager for one backend.
///
/// Owns the route table, the injected credential store, the HTTP client with
/// its cookie jar, and the [`SessionStore`]. The auth actions live in
/// [`crate::actions`].
#[derive(Debug)]
pub struct SessionManager<S: SecureStore> {
    pub(crate) transport: HttpTransport,
    pub(crate) credentials: CredentialStore<S>,
    pub(crate) session: Arc<SessionStore>,
}

impl<S: SecureStore> SessionManager<S> {
    /// Validates `config`, opens the credential store and builds the HTTP
    /// client. No network traffic happens here.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Config`] for an unusable route table or an
    /// unreachable storage backend.
    pub fn new(config: RouteConfig, store: S) -> Result<Self, SessionError> {
        config.validate()?;
        let credentials = CredentialStore::open(store)
            .map_err(|e| SessionError::Config(e.to_string()))?;
        let (http, jar) = default_http_client()?;

        tracing::debug!(api_url = config.api_url(), "session manager created");
        Ok(Self {
            transport: HttpTransport::new(http, jar, config),
            credentials,
            session: Arc::new(SessionStore::new()),
        })
    }

    /// Replaces the HTTP client. `jar` must be the cookie provider `http` was
    /// built with, or CSRF echoing will not see the backend's cookies.
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client, jar: Arc<Jar>) -> Self {
        self.transport = self.transport.with_http_client(http, jar);
        self
    }

    /// Route table this manager was built with
    #[must_use]
    pub const fn config(&self) -> &RouteConfig {
        self.transport.config()
    }

    /// Current session snapshot
    #[must_use]
    pub fn session(&self) -> Session {
        self.session.current()
    }

    /// Receiver woken on every published session change
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Session> {
        self.session.watch()
    }

    /// Shared session store
    #[must_use]
    pub const fn store(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Injected credential store
    #[must_use]
    pub const fn credentials(&self) -> &CredentialStore<S> {
        &self.credentials
    }

    /// CSRF coordinator sharing this manager's cookie jar
    #[must_use]
    pub const fn csrf(&self) -> CsrfCoordinator<'_> {
        CsrfCoordinator::new(&self.transport)
    }
}
