use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

const PREFLIGHT_MAX_AGE_SECS: u64 = 86400;

/// CORS for the organizer dashboard; `origins` is a comma-separated list.
pub fn create_cors_layer(origins: Option<&str>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(allowed_origins(origins.unwrap_or(DEFAULT_ALLOWED_ORIGINS)))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .expose_headers([header::CONTENT_LENGTH, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(PREFLIGHT_MAX_AGE_SECS))
}

fn parse_origins(raw: &str) -> Vec<HeaderValue> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("CORS: Invalid origin '{}': {}", origin, e);
                None
            }
        })
        .collect()
}

fn allowed_origins(raw: &str) -> AllowOrigin {
    let mut origins = parse_origins(raw);
    if origins.is_empty() {
        tracing::warn!("CORS: No valid origins configured, falling back to localhost defaults");
        origins = parse_origins(DEFAULT_ALLOWED_ORIGINS);
    }
    tracing::info!("CORS: Configured with {} allowed origin(s)", origins.len());
    AllowOrigin::list(origins)
}
