//! Bearer token persistence

use crate::{error::AuthError, store::SecureStore};
use secrecy::{ExposeSecret, SecretString};

/// Fixed key the bearer token is stored under
pub const TOKEN_KEY: &str = "access_token";

/// Opaque bearer token issued by the backend.
///
/// Contents are never interpreted. Debug output is redacted.
#[derive(Clone, Debug)]
pub struct Token(SecretString);

impl Token {
    /// Wrap a raw token string, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Token`] if nothing is left after trimming.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, AuthError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(AuthError::Token("empty token".into()));
        }
        Ok(Self(SecretString::from(trimmed.to_string())))
    }

    /// Raw token value, for building the `Authorization` header
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for Token {}

/// Owns the bearer token in a durable [`SecureStore`]
#[derive(Clone, Debug)]
pub struct CredentialStore<S: SecureStore> {
    store: S,
}

impl<S: SecureStore> CredentialStore<S> {
    /// Open the credential store, probing the backend once.
    ///
    /// An unreachable backend is reported here rather than on every call. A
    /// stored token that cannot be read back only logs a warning, so it can
    /// still be cleared or overwritten.
    pub fn open(store: S) -> Result<Self, AuthError> {
        match store.get_secret(TOKEN_KEY) {
            Ok(_) => {}
            Err(AuthError::Unreadable(e)) => {
                tracing::warn!(error = %e, "stored bearer token is unreadable, ignoring it");
            }
            Err(e) => {
                return Err(AuthError::Config(format!(
                    "credential storage unavailable: {e}"
                )));
            }
        }
        Ok(Self { store })
    }

    /// Current token, if one has been persisted.
    ///
    /// An unreadable token counts as absent.
    pub fn get(&self) -> Result<Option<Token>, AuthError> {
        let bytes = match self.store.get_secret(TOKEN_KEY) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Ok(None),
            Err(AuthError::Unreadable(e)) => {
                tracing::warn!(error = %e, "stored bearer token is unreadable, ignoring it");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let Ok(raw) = String::from_utf8(bytes) else {
            tracing::warn!("stored bearer token is not UTF-8, ignoring it");
            return Ok(None);
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        Token::parse(raw).map(Some)
    }

    /// Persist a token, replacing any previous one
    pub fn set(&self, token: &Token) -> Result<(), AuthError> {
        tracing::debug!("persisting bearer token");
        self.store
            .set_secret(TOKEN_KEY, token.expose().as_bytes())
    }

    /// Remove the persisted token
    pub fn clear(&self) -> Result<(), AuthError> {
        tracing::debug!("clearing bearer token");
        self.store.delete_secret(TOKEN_KEY)
    }

    /// Whether a token is currently persisted
    pub fn has_token(&self) -> bool {
        self.get().ok().flatten().is_some()
    }

    /// Underlying storage backend
    pub const fn backend(&self) -> &S {
        &self.store
    }
}
