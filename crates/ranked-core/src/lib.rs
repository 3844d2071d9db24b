//! Core types and trait definitions for the Ranked profile service.
//!
//! This crate is free of HTTP and database dependencies. It owns the profile
//! record, identity claims, the reconciliation rule that merges the two, and
//! the [`store::ProfileStore`] abstraction every backend implements.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod elo;
pub mod error;
pub mod lazy;
pub mod profile;
pub mod reconcile;
pub mod store;

pub use error::{Error, Result};
