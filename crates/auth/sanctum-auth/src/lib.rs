//! Sanctum Auth - durable storage for the bearer token issued by a Sanctum backend

pub mod credentials;
pub mod error;
pub mod store;

pub use credentials::{CredentialStore, TOKEN_KEY, Token};
pub use error::AuthError;
pub use store::{KeyringStore, MemoryStore, SecureStore, XdgFileStore};
