#![warn(missing_docs)]

//! Client-side session manager for Sanctum-style authentication backends.
//!
//! A [`SessionManager`] sequences CSRF priming, credential submission and
//! bearer-token persistence against a cookie/token backend, and keeps the
//! resulting "who is signed in" state in a [`SessionStore`]. A
//! [`ContextDistributor`] republishes that state, with the actions bound to
//! it, to any number of subscribers.
//!
//! ```no_run
//! use sanctum_session::prelude::*;
//! use sanctum_auth::MemoryStore;
//!
//! # async fn run() -> Result<(), SessionError> {
//! let config = RouteConfig::new("https://api.example.com");
//! let manager = SessionManager::new(config, MemoryStore::new())?;
//!
//! let creds = serde_json::json!({ "email": "a@example.com", "password": "secret" });
//! if manager.sign_in(&creds).await?.is_established() {
//!     manager.confirm_session().await?;
//! }
//! assert!(manager.session().is_authenticated());
//! # Ok(())
//! # }
//! ```

/// Authentication actions
pub mod actions;
/// Failure classification
pub mod classify;
/// HTTP transport and CSRF cookie handling
pub mod client;
/// Route table and policies
pub mod config;
/// CSRF pre-flight
pub mod csrf;
/// Subscriber fan-out
pub mod distributor;
/// Error types
pub mod error;
/// The session manager
pub mod manager;
/// Session state and its store
pub mod session;

pub use crate::actions::CredentialOutcome;
pub use crate::classify::{Classification, classify};
pub use crate::config::{Endpoint, RouteConfig, SignOutTokenPolicy};
pub use crate::csrf::CsrfCoordinator;
pub use crate::distributor::{ContextDistributor, ContextSubscriber, SessionContext};
pub use crate::error::{ApiErrorObject, SessionError};
pub use crate::manager::SessionManager;
pub use crate::session::{
    AuthenticationStatus, Session, SessionMutation, SessionObserver, SessionStore, SessionUser,
    SubscriberId, User,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        AuthenticationStatus, ContextDistributor, CredentialOutcome, RouteConfig, SessionError,
        SessionManager, SessionUser, SignOutTokenPolicy,
    };
}
