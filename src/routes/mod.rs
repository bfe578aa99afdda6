// src/routes/mod.rs
pub mod admin;
pub mod chat;
pub mod mortgage;
pub mod trends;

use crate::{error::AppError, state::SharedState};
use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post, put},
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub fn create_router(state: SharedState) -> Router {
    let admin_routes = Router::new()
        .route("/metrics", get(admin::get_metrics_handler))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/chat", post(chat::chat_handler))
        .route("/sessions", post(chat::create_session_handler))
        .route("/sessions/{id}/messages", get(chat::history_handler))
        .route("/sessions/{id}/location", put(chat::location_handler))
        .route("/sessions/{id}/mortgage", patch(mortgage::session_mortgage_handler))
        .route("/mortgage", post(mortgage::calculate_handler))
        .route("/trends", get(trends::trends_handler))
        .nest("/admin", admin_routes)
        .route("/health", get(|| async { "OK" }))
        .fallback_service(ServeDir::new(&state.config.static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn auth_middleware(
    State(state): State<SharedState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let expected = state.config.admin_key.as_deref().ok_or(AppError::Unauthorized)?;
    match req.headers().get("x-admin-key") {
        Some(val) if val == expected => Ok(next.run(req).await),
        _ => Err(AppError::Unauthorized),
    }
}
