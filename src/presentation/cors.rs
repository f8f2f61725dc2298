use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::CorsLayer;

use crate::presentation::config::CorsSettings;

#[derive(Debug, thiserror::Error)]
pub enum CorsConfigError {
    #[error("invalid allowed origin: {0}")]
    Origin(String),
    #[error("invalid allowed method: {0}")]
    Method(String),
    #[error("invalid allowed header: {0}")]
    Header(String),
}

/// Builds a CORS layer restricted to the configured origins, methods and headers.
pub fn build_cors_layer(settings: &CorsSettings) -> Result<CorsLayer, CorsConfigError> {
    let origins = settings
        .allowed_origins
        .iter()
        .map(|o| parse_origin(o))
        .collect::<Result<Vec<_>, _>>()?;

    let methods = settings
        .allowed_methods
        .iter()
        .map(|m| {
            Method::from_bytes(m.trim().to_uppercase().as_bytes())
                .map_err(|_| CorsConfigError::Method(m.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let headers = settings
        .allowed_headers
        .iter()
        .map(|h| {
            HeaderName::from_bytes(h.trim().as_bytes())
                .map_err(|_| CorsConfigError::Header(h.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(settings.allow_credentials))
}

/// Origins must be listed explicitly; a wildcard cannot be combined with
/// credentials or an origin list.
fn parse_origin(origin: &str) -> Result<HeaderValue, CorsConfigError> {
    if origin.trim() == "*" {
        return Err(CorsConfigError::Origin(origin.to_string()));
    }
    HeaderValue::from_str(origin).map_err(|_| CorsConfigError::Origin(origin.to_string()))
}
