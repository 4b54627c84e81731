//! Splits failed calls into "not authenticated" and everything else.

use crate::error::SessionError;

/// Outcome of classifying a failed backend call
#[derive(Debug)]
pub enum Classification {
    /// The backend answered 401; the session must be demoted
    Deauthenticated,
    /// Any other failure; must be returned to the caller untouched
    Fatal(SessionError),
}

impl Classification {
    /// Whether the failure only means "not signed in"
    #[must_use]
    pub const fn is_deauthenticated(&self) -> bool {
        matches!(self, Self::Deauthenticated)
    }
}

/// Classifies a failed call. Only HTTP 401 is recoverable.
#[must_use]
pub fn classify(error: SessionError) -> Classification {
    if error.is_unauthorized() {
        Classification::Deauthenticated
    } else {
        Classification::Fatal(error)
    }
}
