use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub data: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunResponse {
    pub output: String,
}

pub async fn run_handler(Json(request): Json<RunRequest>) -> Json<RunResponse> {
    tracing::debug!(chars = request.data.len(), "Echoing run payload");
    Json(RunResponse {
        output: format!("You sent: {}", request.data),
    })
}
