// HTTP surface module
pub mod activity;
pub mod error;
pub mod leaderboard;
pub mod notifications;
pub mod stat;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::api::fcm::FcmClient;
use crate::api::firebase::FirebaseClient;
use crate::features::gamification::GamificationService;
use crate::features::local_reminder::ReminderTimers;

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub firebase: Arc<FirebaseClient>,
    pub fcm: Arc<FcmClient>,
    pub gamification: Arc<GamificationService>,
    pub timers: Arc<ReminderTimers>,
}

/// Assembles the application router.
///
/// * `/sendTestNotification` keeps its historical top-level path and exact
///   status contract for the existing clients.
/// * Everything else lives under `/api`.
/// * CORS is open to all origins, as the original endpoint was.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/users/{id}/activity", post(activity::record_activity))
        .route("/users/{id}/login", post(activity::login))
        .route("/users/{id}/progress", get(stat::progress))
        .route("/badges", get(stat::badges))
        .route("/leaderboard", get(leaderboard::leaderboard))
        .route(
            "/users/{id}/notifications",
            get(notifications::get_preferences).put(notifications::save_preferences),
        )
        .route("/users/{id}/devices", post(notifications::register_device));

    Router::new()
        .route(
            "/sendTestNotification",
            post(notifications::send_test_notification).options(notifications::preflight),
        )
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
