//! Operational HTTP endpoints.
//!
//! - `/stats` : cumulative response bytes, `{"totalBytesSent": n}`

use axum::{extract::State, Json};

use lazymirror_core::protocol::TrafficSnapshot;

use crate::app_state::AppState;

pub async fn stats(State(state): State<AppState>) -> Json<TrafficSnapshot> {
    Json(state.traffic().snapshot())
}
