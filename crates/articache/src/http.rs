//! HTTP surface of the cache: one GET route for every artifact path.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::gateway::{ArtifactCache, ArtifactResponse};

/// Build the artifact router.
///
/// Hits are streamed from disk with `200`, misses answer `303 See Other`
/// pointing at the upstream copy, unsafe paths answer `400`.
pub fn router(cache: Arc<ArtifactCache>) -> Router {
    Router::new()
        .route("/", get(serve_artifact))
        .route("/{*path}", get(serve_artifact))
        .with_state(cache)
}

async fn serve_artifact(State(cache): State<Arc<ArtifactCache>>, request: Request) -> Response {
    let path = request.uri().path().to_owned();

    match cache.handle_request(&path).await {
        ArtifactResponse::Hit { path } => match ServeFile::new(path).oneshot(request).await {
            Ok(response) => response.map(Body::new),
            Err(never) => match never {},
        },
        ArtifactResponse::Miss { location } => Redirect::to(&location).into_response(),
        ArtifactResponse::Rejected { .. } => {
            (StatusCode::BAD_REQUEST, "invalid artifact path").into_response()
        }
    }
}
