//! Fallback handler behind the static-file stage.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header::CONTENT_TYPE, Method, StatusCode},
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use lazymirror_core::error::MirrorError;

use crate::app_state::AppState;
use crate::error::ApiError;

use super::FillOutcome;

pub async fn origin_fill(State(app): State<AppState>, req: Request) -> Result<Response, ApiError> {
    if req.method() != Method::GET && req.method() != Method::HEAD {
        return Err(MirrorError::MethodNotAllowed.into());
    }

    let fill = app.fill();
    let res = fill.store().resolve(req.uri().path())?;

    // A fill for this path may have landed after the static stage looked,
    // or the index document is not the one the static stage probes for.
    if fill.store().contains(&res).await {
        let file = fill.store().path_of(&res);
        return Ok(serve_local(file, req).await);
    }

    match fill.fill(&res).await? {
        FillOutcome::Filled(obj) => {
            let mut resp = (StatusCode::OK, obj.body).into_response();
            if let Some(ct) = obj.content_type {
                resp.headers_mut().insert(CONTENT_TYPE, ct);
            }
            Ok(resp)
        }
        FillOutcome::NotFound => Ok((StatusCode::NOT_FOUND, "Not Found").into_response()),
        FillOutcome::Local => {
            let file = fill.store().path_of(&res);
            Ok(serve_local(file, req).await)
        }
    }
}

async fn serve_local(file: std::path::PathBuf, req: Request) -> Response {
    match ServeFile::new(file).oneshot(req).await {
        Ok(resp) => resp.map(Body::new),
        Err(never) => match never {},
    }
}
