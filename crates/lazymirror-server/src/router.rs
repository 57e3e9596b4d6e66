//! Axum router wiring.
//!
//! Stage order for every request:
//! traffic metering -> `/stats` | static files under the store root -> origin fill.

use axum::{handler::Handler, middleware, routing::get, Router};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{app_state::AppState, fill, ops, traffic};

pub fn build_router(state: AppState) -> Router {
    let origin_fill = fill::handler::origin_fill.with_state(state.clone());
    let static_files = ServeDir::new(state.cfg().store.root.clone())
        .append_index_html_on_directories(true)
        .fallback(origin_fill);

    Router::new()
        .route("/stats", get(ops::stats))
        .fallback_service(static_files)
        .layer(middleware::from_fn_with_state(state.traffic().clone(), traffic::meter))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
