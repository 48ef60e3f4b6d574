//! Credential file I/O and password checks.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::identity::{Role, SessionIdentity};

/// Accounts written on first run when no credential file exists.
pub const DEFAULT_ACCOUNTS: [(&str, &str, Role); 2] = [
    ("admin", "admin123", Role::Admin),
    ("user", "user123", Role::User),
];

/// Errors raised while reading or writing the credential file.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The file exists but could not be read.
    #[error("failed to read credential file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file is not a valid credential mapping.
    #[error("credential file {path} is corrupted: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The file could not be written.
    #[error("failed to write credential file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Serializing the in-memory records failed.
    #[error("failed to serialize credentials: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One stored account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Hex SHA-256 digest of the password.
    #[serde(rename = "password")]
    pub password_hash: String,
    pub role: Role,
}

impl CredentialRecord {
    /// Build a record from a plaintext secret.
    #[must_use]
    pub fn from_secret(secret: &str, role: Role) -> Self {
        Self {
            password_hash: hash_password(secret),
            role,
        }
    }
}

/// Hash a secret the way the credential file stores it.
#[must_use]
pub fn hash_password(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// In-memory view of the credential file.
///
/// Usernames are unique by construction (map keys). The store is read-only
/// after loading apart from the first-run seeding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialStore {
    users: BTreeMap<String, CredentialRecord>,
}

impl CredentialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding the two default accounts.
    #[must_use]
    pub fn seeded() -> Self {
        let users = DEFAULT_ACCOUNTS
            .iter()
            .map(|(name, secret, role)| {
                (name.to_string(), CredentialRecord::from_secret(secret, *role))
            })
            .collect();
        Self { users }
    }

    /// Load the credential file, seeding and writing defaults if it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if an existing file cannot be read or parsed, or
    /// if the seeded defaults cannot be written.
    pub fn load(path: &Path) -> Result<Self, AuthError> {
        if !path.exists() {
            log::info!(
                "No credential file at {}, seeding default accounts",
                path.display()
            );
            let store = Self::seeded();
            store.save(path)?;
            return Ok(store);
        }

        let content = fs::read_to_string(path).map_err(|source| AuthError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let users: BTreeMap<String, CredentialRecord> =
            serde_json::from_str(&content).map_err(|source| AuthError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        log::debug!("Loaded {} accounts from {}", users.len(), path.display());
        Ok(Self { users })
    }

    /// Load the credential file, degrading to an empty store on error.
    ///
    /// An empty store locks every user out, so the warning text is handed
    /// back and must be shown to the operator. When only writing the seeded
    /// defaults fails, the defaults stay usable in memory.
    pub fn load_or_empty(path: &Path) -> (Self, Option<String>) {
        match Self::load(path) {
            Ok(store) => (store, None),
            Err(e @ (AuthError::Write { .. } | AuthError::Serialize(_))) => {
                log::warn!("Default accounts were not saved: {}", e);
                let warning = format!("{e}. Default accounts work until the program exits.");
                (Self::seeded(), Some(warning))
            }
            Err(e) => {
                log::warn!("Credential store unavailable, nobody can sign in: {}", e);
                let warning = format!("{e}. No accounts are available until the file is fixed.");
                (Self::new(), Some(warning))
            }
        }
    }

    /// Write the store as pretty JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Write`] on any I/O failure.
    pub fn save(&self, path: &Path) -> Result<(), AuthError> {
        let write_err = |source| AuthError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(&self.users)?;
        fs::write(path, json).map_err(write_err)?;
        Ok(())
    }

    /// Check a username/secret pair.
    ///
    /// Returns the identity to sign in as, or `None` for an unknown user or
    /// a wrong secret.
    #[must_use]
    pub fn authenticate(&self, username: &str, secret: &str) -> Option<SessionIdentity> {
        let record = self.users.get(username)?;
        if record.password_hash == hash_password(secret) {
            log::info!("User '{}' signed in as {}", username, record.role);
            Some(SessionIdentity::new(username, record.role))
        } else {
            log::debug!("Rejected password for '{}'", username);
            None
        }
    }

    /// Add or replace an account in memory.
    pub fn insert(&mut self, username: impl Into<String>, record: CredentialRecord) {
        self.users.insert(username.into(), record);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
