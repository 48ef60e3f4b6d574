//! Local sign-in.
//!
//! Credentials live in a flat JSON file keyed by username. Passwords are
//! stored as lowercase hex SHA-256 digests, never in plaintext.
//!
//! # Architecture
//!
//! * [`identity`]: roles and the signed-in [`SessionIdentity`].
//! * [`store`]: loading, seeding, saving and checking credentials.
//!
//! # Example
//!
//! ```no_run
//! use endolog::auth::CredentialStore;
//! use std::path::Path;
//!
//! let store = CredentialStore::load(Path::new("users.json")).unwrap();
//! let identity = store.authenticate("admin", "admin123").unwrap();
//! assert!(identity.is_admin());
//! ```

pub mod identity;
pub mod store;

pub use identity::{Role, SessionIdentity};
pub use store::{hash_password, AuthError, CredentialRecord, CredentialStore, DEFAULT_ACCOUNTS};
