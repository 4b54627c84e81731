//! In-process secret storage

use super::SecureStore;
use crate::error::AuthError;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

/// Secret storage kept in memory.
///
/// Clones share the same map, so a clone handed to a second session manager
/// sees what the first one persisted (a stand-in for an application reload).
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    secrets: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>, AuthError> {
        self.secrets
            .lock()
            .map_err(|_| AuthError::Storage("memory store lock poisoned".into()))
    }
}

impl SecureStore for MemoryStore {
    fn set_secret(&self, name: &str, value: &[u8]) -> Result<(), AuthError> {
        self.lock()?.insert(name.to_string(), value.to_vec());
        Ok(())
    }

    fn get_secret(&self, name: &str) -> Result<Option<Vec<u8>>, AuthError> {
        Ok(self.lock()?.get(name).cloned())
    }

    fn delete_secret(&self, name: &str) -> Result<(), AuthError> {
        self.lock()?.remove(name);
        Ok(())
    }
}
