//! Response byte accounting.
//!
//! Every response body is wrapped in a [`MeteredBody`]. When the body ends, its
//! byte count goes to the [`TrafficAccountant`], a single task that owns the
//! running total and rewrites the state file after each response. The body
//! only reports end-of-stream once that write has been attempted.

pub mod accountant;
pub mod metered;

pub use accountant::{PersistHandle, TrafficAccountant};
pub use metered::MeteredBody;

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

/// Middleware: wrap the outgoing body so its bytes are accounted on completion.
pub async fn meter(State(accountant): State<TrafficAccountant>, req: Request, next: Next) -> Response {
    let res = next.run(req).await;
    let (parts, body) = res.into_parts();
    Response::from_parts(parts, Body::new(MeteredBody::new(body, accountant)))
}
