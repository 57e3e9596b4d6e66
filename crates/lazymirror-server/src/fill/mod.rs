//! Origin-pull cache fill.
//!
//! Reached only when the static-file stage found nothing under the store
//! root. Per request path:
//!
//! ```text
//! LOCAL_MISS_FETCHING --origin 2xx----> FILLED     (persist + serve)
//! LOCAL_MISS_FETCHING --origin 404----> MISS_404   (serve 404, nothing stored)
//! LOCAL_MISS_FETCHING --other error---> FETCH_ERROR (generic error response)
//! ```
//!
//! Entries are write-once: a fill that finds the entry already stored serves
//! it from disk without asking the origin.
//!
//! Concurrent misses for one path share a single origin fetch and a single
//! writer (see [`OriginFillCache`]).

pub mod cache;
pub mod handler;
pub mod origin;
pub mod store;

pub use cache::{FillOutcome, OriginFillCache};
pub use origin::{HttpOrigin, Origin, OriginFetch, OriginObject};
pub use store::LocalStore;
