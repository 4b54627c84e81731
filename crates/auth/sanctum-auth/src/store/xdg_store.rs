//! XDG file-based secure storage with encryption

use super::SecureStore;
use crate::error::AuthError;
use chacha20poly1305::{
    ChaCha20Poly1305, Key, Nonce,
    aead::{Aead, KeyInit, OsRng},
};
use rand::RngCore;
use std::{
    fs,
    path::{Path, PathBuf},
};

const NONCE_SIZE: usize = 12;

/// File-based secret storage under the XDG data directory.
///
/// Each secret lives in `<base>/<name>.secret`, encrypted with a key derived
/// from the machine id and the base path.
#[derive(Clone, Debug)]
pub struct XdgFileStore {
    base_path: PathBuf,
}

impl XdgFileStore {
    /// Create a store under `<data_dir>/<app_name>`
    pub fn new(app_name: &str) -> Result<Self, AuthError> {
        let base = dirs::data_dir()
            .ok_or_else(|| AuthError::Config("Could not determine data dir".into()))?
            .join(app_name);
        Self::with_base_path(base)
    }

    /// Create a store rooted at an explicit directory
    pub fn with_base_path(base: impl Into<PathBuf>) -> Result<Self, AuthError> {
        let base_path = base.into();
        fs::create_dir_all(&base_path).map_err(|e| {
            AuthError::Storage(format!("Failed to create {}: {e}", base_path.display()))
        })?;
        Ok(Self { base_path })
    }

    /// Directory holding the secret files
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_path.join(format!("{name}.secret"))
    }

    fn derive_key(&self) -> Key {
        let machine_id = fs::read_to_string("/etc/machine-id")
            .or_else(|_| fs::read_to_string("/var/lib/dbus/machine-id"))
            .unwrap_or_else(|_| "sanctum-fallback-machine-id".to_string());

        let mut hasher = blake3::Hasher::new();
        hasher.update(self.base_path.to_string_lossy().as_bytes());
        hasher.update(machine_id.trim().as_bytes());
        let hash = hasher.finalize();

        *Key::from_slice(hash.as_bytes())
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, AuthError> {
        let cipher = ChaCha20Poly1305::new(&self.derive_key());

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| AuthError::Storage(format!("Encryption failed: {e}")))?;

        // nonce || ciphertext
        let mut output = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        output.extend_from_slice(&nonce_bytes);
        output.extend_from_slice(&ciphertext);
        Ok(output)
    }

    fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, AuthError> {
        if data.len() < NONCE_SIZE {
            return Err(AuthError::Unreadable("Corrupt secret: too short".into()));
        }

        let (nonce_bytes, ciphertext) = data.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);
        let cipher = ChaCha20Poly1305::new(&self.derive_key());

        cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| AuthError::Unreadable(format!("Decryption failed: {e}")))
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), AuthError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .map_err(|e| AuthError::Storage(e.to_string()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), AuthError> {
    Ok(())
}

impl SecureStore for XdgFileStore {
    fn set_secret(&self, name: &str, value: &[u8]) -> Result<(), AuthError> {
        let path = self.file_path(name);
        let encrypted = self.encrypt(value)?;
        fs::write(&path, encrypted).map_err(|e| AuthError::Storage(e.to_string()))?;
        restrict_permissions(&path)
    }

    fn get_secret(&self, name: &str) -> Result<Option<Vec<u8>>, AuthError> {
        match fs::read(self.file_path(name)) {
            Ok(data) => Ok(Some(self.decrypt(&data)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AuthError::Storage(e.to_string())),
        }
    }

    fn delete_secret(&self, name: &str) -> Result<(), AuthError> {
        match fs::remove_file(self.file_path(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::Storage(e.to_string())),
        }
    }
}
