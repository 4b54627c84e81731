//! Secure storage trait and implementations

mod keyring_store;
mod memory_store;
mod xdg_store;

pub use keyring_store::KeyringStore;
pub use memory_store::MemoryStore;
pub use xdg_store::XdgFileStore;

use crate::error::AuthError;

/// Trait for secure secret storage
pub trait SecureStore: Send + Sync + Clone + 'static {
    /// Store a secret value
    fn set_secret(&self, name: &str, value: &[u8]) -> Result<(), AuthError>;
    /// Retrieve a secret value.
    ///
    /// A secret that exists but cannot be decoded is [`AuthError::Unreadable`],
    /// not [`AuthError::Storage`].
    fn get_secret(&self, name: &str) -> Result<Option<Vec<u8>>, AuthError>;
    /// Delete a secret value; deleting a missing secret is not an error
    fn delete_secret(&self, name: &str) -> Result<(), AuthError>;
}
