//! Durable storage for the bearer token.
//!
//! The token lives in a single file under the platform config dir and in a
//! zeroized in-memory cache, so it survives a restart and can be read
//! synchronously before any network call goes out. Validity is never
//! tracked client-side; only the backend's response to the token decides.

use parking_lot::RwLock;
use std::fs;
use std::path::PathBuf;
use zeroize::Zeroizing;

pub struct CredentialStore {
    path: PathBuf,
    token: RwLock<Option<Zeroizing<String>>>,
}

impl CredentialStore {
    /// Open the store at its default location, priming the cache from disk.
    pub fn open() -> Self {
        Self::at(Self::default_path())
    }

    /// Open the store at an explicit path.
    pub fn at(path: PathBuf) -> Self {
        let token = fs::read_to_string(&path)
            .ok()
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(Zeroizing::new);
        Self {
            path,
            token: RwLock::new(token),
        }
    }

    fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com.local", "Study Desk", "StudyDesk")
            .map(|p| p.config_dir().join("token"))
            .unwrap_or_else(|| PathBuf::from("./token"))
    }

    /// Persist a freshly issued token, replacing any previous one.
    pub fn save(&self, token: &str) {
        *self.token.write() = Some(Zeroizing::new(token.to_string()));
        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Err(err) = fs::write(&self.path, token) {
            tracing::warn!("could not persist token to {}: {err}", self.path.display());
        }
    }

    /// Current token, if one is stored. Presence does not imply the backend
    /// still accepts it.
    pub fn read(&self) -> Option<String> {
        self.token.read().as_ref().map(|t| t.to_string())
    }

    pub fn is_present(&self) -> bool {
        self.token.read().is_some()
    }

    /// Forget the token, in memory and on disk. Idempotent.
    pub fn clear(&self) {
        *self.token.write() = None;
        if self.path.exists() {
            if let Err(err) = fs::remove_file(&self.path) {
                tracing::warn!("could not remove token file {}: {err}", self.path.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");

        let store = CredentialStore::at(path.clone());
        assert_eq!(store.read(), None);

        store.save("jwt-abc");
        assert_eq!(store.read().as_deref(), Some("jwt-abc"));

        // A fresh store at the same path sees the saved token.
        let reopened = CredentialStore::at(path.clone());
        assert_eq!(reopened.read().as_deref(), Some("jwt-abc"));

        reopened.clear();
        assert_eq!(reopened.read(), None);
        assert!(!path.exists());

        // Clearing twice is fine.
        reopened.clear();
    }

    #[test]
    fn save_replaces_previous_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::at(dir.path().join("token"));
        store.save("first");
        store.save("second");
        assert_eq!(store.read().as_deref(), Some("second"));
    }

    #[test]
    fn blank_file_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        fs::write(&path, "\n").unwrap();
        let store = CredentialStore::at(path);
        assert!(!store.is_present());
    }
}
