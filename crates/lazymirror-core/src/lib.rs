//! lazymirror core: request-path and traffic-state contracts plus the shared
//! error type.
//!
//! This crate defines how request paths map onto the local store and the
//! origin, and how the traffic counter is represented on disk and over HTTP.
//! It carries no runtime or HTTP dependencies so the server and tests can share
//! the same rules.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here.
//! Every fallible path surfaces as `MirrorError`/`Result`, so a hostile request
//! path cannot take the process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{Result, MirrorError};
