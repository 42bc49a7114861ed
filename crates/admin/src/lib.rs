//! Admin REST client for the account management console.
//!
//! The e2e suites use this client to mutate server-side state out-of-band,
//! e.g. deleting a user's password credential before asserting the
//! "no password configured" UI branch. The console itself is a black box;
//! only the admin API surface the tests need is covered here.

pub mod client;
pub mod error;
pub mod types;

pub use client::{AdminClient, AdminConfig};
pub use error::{AdminError, AdminResult};
pub use types::{CredentialRepresentation, UserRepresentation};
