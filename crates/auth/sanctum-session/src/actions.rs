//! Authentication actions on [`SessionManager`].
//!
//! Every action follows the same failure rule: a 401 demotes the session to
//! unauthenticated and completes normally, anything else is returned to the
//! caller untouched. Nothing is retried.

use sanctum_auth::SecureStore;
use serde::Serialize;

use crate::{
    SessionManager,
    classify::{Classification, classify},
    client::parse_token,
    config::{Endpoint, SignOutTokenPolicy},
    error::{SessionError, map_deser},
    session::{SessionMutation, SessionUser, User},
};

/// Result of the credential step of sign-in/sign-up.
///
/// `Established` covers both a persisted bearer token and a cookie-only
/// session. Neither variant touches the user record; call
/// [`SessionManager::confirm_session`] to fetch it.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialOutcome {
    /// The backend accepted the credentials; confirmation pending
    Established,
    /// The backend answered 401; the session has been demoted
    Rejected,
}

impl CredentialOutcome {
    /// Whether the backend accepted the credentials
    #[must_use]
    pub const fn is_established(self) -> bool {
        matches!(self, Self::Established)
    }
}

impl<S: SecureStore> SessionManager<S> {
    /// Asks the backend who is signed in and publishes the answer.
    ///
    /// Returns `Ok(true)` when a user came back and `Ok(false)` on 401.
    ///
    /// # Errors
    ///
    /// Any failure other than 401.
    pub async fn check_authentication(&self) -> Result<bool, SessionError> {
        Ok(self.confirm_session().await?.is_some())
    }

    /// Second step of sign-in/sign-up: fetches the user with the stored
    /// token and publishes it.
    ///
    /// Returns `Ok(None)` on 401, after demoting the session.
    ///
    /// # Errors
    ///
    /// Any failure other than 401, including a success response without a
    /// user record.
    pub async fn confirm_session(&self) -> Result<Option<User>, SessionError> {
        match self.fetch_user().await {
            Ok(user) => {
                self.session
                    .dispatch(SessionMutation::Authenticate(user.clone()))?;
                Ok(Some(user))
            }
            Err(e) => {
                self.demote_or_raise(e)?;
                Ok(None)
            }
        }
    }

    /// Primes CSRF, then submits credentials and persists the issued token,
    /// if the response carries one.
    ///
    /// # Errors
    ///
    /// Any failure other than 401 from either request, a malformed token
    /// response, or a storage failure.
    pub async fn sign_in<P>(&self, credentials: &P) -> Result<CredentialOutcome, SessionError>
    where
        P: Serialize + ?Sized + Sync,
    {
        self.establish_credential(Endpoint::SignIn, credentials).await
    }

    /// Primes CSRF, then registers and persists the issued token, if any.
    ///
    /// # Errors
    ///
    /// Same as [`sign_in`](Self::sign_in); validation failures (422) come
    /// back as [`SessionError::Api`].
    pub async fn sign_up<P>(&self, details: &P) -> Result<CredentialOutcome, SessionError>
    where
        P: Serialize + ?Sized + Sync,
    {
        self.establish_credential(Endpoint::SignUp, details).await
    }

    /// Ends the session on the backend.
    ///
    /// On success publishes the signed-out marker and returns `Ok(true)`.
    /// A 401 demotes the session and returns `Ok(false)`. What happens to the
    /// stored token is governed by [`SignOutTokenPolicy`]; a failure to clear
    /// it is logged and does not change the outcome.
    ///
    /// # Errors
    ///
    /// Any failure other than 401; the session is left unchanged.
    pub async fn sign_out(&self) -> Result<bool, SessionError> {
        let token = self.credentials.get()?;
        let policy = self.config().sign_out_token_policy();

        let outcome = match self.transport.post_empty(Endpoint::SignOut, token.as_ref()).await {
            Ok(_) => {
                self.session.dispatch(SessionMutation::SignOut)?;
                tracing::info!("signed out");
                Ok(true)
            }
            Err(e) => self.demote_or_raise(e).map(|()| false),
        };

        match (policy, &outcome) {
            (SignOutTokenPolicy::ClearOnSuccess, Ok(true))
            | (SignOutTokenPolicy::ClearAlways, _) => {
                if let Err(e) = self.credentials.clear() {
                    tracing::warn!(error = %e, "failed to clear bearer token after sign-out");
                }
            }
            _ => {}
        }
        outcome
    }

    /// Requests a password reset link. Never touches the session.
    ///
    /// # Errors
    ///
    /// Any failure other than 401.
    pub async fn forgot_password<P>(&self, payload: &P) -> Result<bool, SessionError>
    where
        P: Serialize + ?Sized + Sync,
    {
        self.submit(Endpoint::ForgotPassword, payload).await
    }

    /// Completes a password reset. Never touches the session.
    ///
    /// # Errors
    ///
    /// Any failure other than 401.
    pub async fn reset_password<P>(&self, payload: &P) -> Result<bool, SessionError>
    where
        P: Serialize + ?Sized + Sync,
    {
        self.submit(Endpoint::ResetPassword, payload).await
    }

    /// Publishes a caller-supplied session, e.g. hydrated from a page render.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidSession`] if `authenticated` and `user` disagree.
    pub fn set_user(&self, user: SessionUser, authenticated: bool) -> Result<(), SessionError> {
        self.session.set_user(user, authenticated)
    }

    async fn fetch_user(&self) -> Result<User, SessionError> {
        let token = self.credentials.get()?;
        let body = self.transport.get(Endpoint::UserObject, token.as_ref()).await?;

        let record: serde_json::Value =
            serde_json::from_slice(&body).map_err(|e| map_deser(&e, &body))?;
        if record.is_null() {
            return Err(SessionError::Serde("backend returned no user record".into()));
        }
        Ok(User::new(record))
    }

    async fn establish_credential<P>(
        &self,
        endpoint: Endpoint,
        payload: &P,
    ) -> Result<CredentialOutcome, SessionError>
    where
        P: Serialize + ?Sized + Sync,
    {
        if let Err(e) = self.csrf().prime().await {
            self.demote_or_raise(e)?;
            return Ok(CredentialOutcome::Rejected);
        }

        match self.transport.post_json(endpoint, payload, None).await {
            Ok(body) => {
                match parse_token(&body)? {
                    Some(token) => self.credentials.set(&token)?,
                    None => {
                        tracing::debug!(?endpoint, "no token in response, relying on session cookie");
                    }
                }
                tracing::info!(?endpoint, "credential established");
                Ok(CredentialOutcome::Established)
            }
            Err(e) => {
                self.demote_or_raise(e)?;
                Ok(CredentialOutcome::Rejected)
            }
        }
    }

    async fn submit<P>(&self, endpoint: Endpoint, payload: &P) -> Result<bool, SessionError>
    where
        P: Serialize + ?Sized + Sync,
    {
        match self.transport.post_json(endpoint, payload, None).await {
            Ok(_) => Ok(true),
            Err(e) => match classify(e) {
                Classification::Deauthenticated => {
                    tracing::warn!(?endpoint, "backend answered 401");
                    Ok(false)
                }
                Classification::Fatal(e) => Err(e),
            },
        }
    }

    fn demote_or_raise(&self, error: SessionError) -> Result<(), SessionError> {
        match classify(error) {
            Classification::Deauthenticated => {
                tracing::warn!("backend answered 401, session demoted");
                self.session.dispatch(SessionMutation::Deauthenticate)?;
                Ok(())
            }
            Classification::Fatal(e) => Err(e),
        }
    }
}
