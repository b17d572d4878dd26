//! Core domain types for sonora, the persistence layer of a local-only
//! media-sharing app.
//!
//! This crate holds the I/O-free half of the design: the user record and its
//! invariants, the session state model, the store traits composed by the
//! repository, the platform capability flag, the credential seam, and the
//! shared error taxonomy. Concrete stores and services live in
//! `sonora-storage`.

pub mod capability;
pub mod credential;
pub mod error;
pub mod session;
pub mod store;
pub mod user;

pub use capability::Capabilities;
pub use credential::{CredentialScheme, PlainTextCredentials};
pub use error::{Result, SonoraError};
pub use session::SessionState;
pub use store::{FileStore, KeyValueStore};
pub use user::{NewUser, UserRecord, UserUpdate};
