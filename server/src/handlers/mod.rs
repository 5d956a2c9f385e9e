use axum::response::Response;
use serde::Serialize;

use crate::utils::response::success;

pub mod pricing;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "convention-crasher-api",
    };

    success(payload, "Health check successful")
}
