//! SQLite backend for Roster.
//!
//! One database file plays both external collaborators: the employee
//! document store ([`EmployeeStore`](roster_core::store::EmployeeStore)) and
//! the identity provider
//! ([`IdentityProvider`](roster_core::identity::IdentityProvider)).
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod accounts;
mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
