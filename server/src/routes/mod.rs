use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, with_security_headers, Config};
use crate::handlers::health_check;
use crate::handlers::pricing::{
    get_pricing, get_schedule, get_tier_price, preview_schedule, save_pricing, validate_pricing,
};
use crate::state::AppState;

pub fn create_routes(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .route("/health", get(health_check))
        .route("/pricing/validate", post(validate_pricing))
        .route("/pricing/preview", post(preview_schedule))
        .route(
            "/conventions/:convention_id/pricing",
            get(get_pricing).put(save_pricing),
        )
        .route(
            "/conventions/:convention_id/pricing/schedule",
            get(get_schedule),
        )
        .route(
            "/conventions/:convention_id/pricing/tiers/:tier_id/price",
            get(get_tier_price),
        )
        .with_state(state);

    with_security_headers(router, config.production)
        .layer(create_cors_layer(config.cors_allowed_origins.as_deref()))
        .layer(TraceLayer::new_for_http())
}
