use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

pub const API_VERSION: &str = "0.0.2";

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub api_version: String,
}

pub async fn status_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(StatusResponse {
            status: "online".to_string(),
            api_version: API_VERSION.to_string(),
        }),
    )
}
