use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::application::ports::TranscriptionEngine;
use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{run_handler, status_handler, transcribe_handler};
use crate::presentation::state::AppState;

pub fn create_router<E>(state: AppState<E>, cors: CorsLayer) -> Router
where
    E: TranscriptionEngine,
{
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let body_limit = state.settings.transcription.max_request_body_bytes();

    Router::new()
        .route("/", get(status_handler))
        .route("/run", post(run_handler))
        .route("/transcribe", post(transcribe_handler::<E>))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
