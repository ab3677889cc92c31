use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::state::SharedState;

pub fn build_router(state: SharedState, cfg: &AppConfig) -> Router {
    let api = Router::new()
        .route("/upload/", post(crate::routes_upload::post_upload))
        .route("/summary/", get(crate::routes_datasets::get_summary))
        .route("/history/", get(crate::routes_datasets::get_history))
        .route("/pdf/", get(crate::routes_report::get_report))
        .route_layer(middleware::from_fn_with_state(state.clone(), crate::auth::require_basic_auth));

    let mut app = Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(cfg.max_upload_bytes))
        .layer(TraceLayer::new_for_http());

    if cfg.cors_permissive {
        app = app.layer(CorsLayer::permissive());
    }

    app.with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
