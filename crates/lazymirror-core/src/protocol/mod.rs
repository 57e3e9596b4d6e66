//! Mirror contracts shared by the server and its tests.
//!
//! - `resource`: request path -> store location / origin URL.
//! - `traffic`: counter state-file format and the `/stats` payload.
//!
//! Parsers here never panic; malformed input is reported as `MirrorError`.

pub mod resource;
pub mod traffic;

pub use resource::{ResourcePath, DEFAULT_INDEX_DOCUMENT};
pub use traffic::TrafficSnapshot;
