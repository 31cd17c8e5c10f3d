//! Core types, collaborator traits and record reconciliation rules for Roster.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! document store, identity provider and notification sender are reached
//! only through the traits in [`store`], [`identity`] and [`notify`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod attendance;
pub mod employee;
pub mod error;
pub mod identity;
pub mod leave;
pub mod notify;
pub mod password;
pub mod salary;
pub mod store;
pub mod upsert;

pub use error::{Error, Result};
