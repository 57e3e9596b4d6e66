//! lazymirror server library entry.
//!
//! Wires the traffic accountant, the static-file stage, and the origin-pull
//! fill into one axum router. Consumed by the binary (`main.rs`) and by
//! integration tests.

pub mod app_state;
pub mod config;
pub mod error;
pub mod fill;
pub mod ops;
pub mod router;
pub mod traffic;
