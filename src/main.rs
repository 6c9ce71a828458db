// Camply Backend - Rust Edition
// Gamification engine and reminder scheduling for the Camply journaling app

mod api;
mod features;
mod http;
mod models;
mod utils;

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::auth::ServiceAccount;
use crate::api::fcm::FcmClient;
use crate::api::firebase::FirebaseClient;
use crate::features::gamification::GamificationService;
use crate::features::local_reminder::ReminderTimers;
use crate::features::sweep::ReminderSweep;
use crate::http::AppState;
use crate::utils::config::Config;

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.rust_log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Camply Backend (Rust Edition)...");

    // Build HTTP client for API calls
    let http_client = reqwest::Client::builder()
        .user_agent("Camply-Backend/1.0")
        .build()
        .expect("Failed to create HTTP client");

    // One service account key drives both Firestore and FCM
    let service_account = ServiceAccount::from_file(&config.credentials_path)
        .expect("Failed to load Firebase credentials");

    let firebase = Arc::new(FirebaseClient::new(
        http_client.clone(),
        service_account.clone(),
    ));
    info!(
        "Firebase client initialized for project {}",
        firebase.project_id()
    );

    let fcm = Arc::new(FcmClient::new(http_client, service_account));

    let gamification = Arc::new(GamificationService::new(firebase.clone()));
    let timers = Arc::new(ReminderTimers::new(firebase.clone()));

    // Minute-cadence reminder fan-out
    let sweep = Arc::new(ReminderSweep::new(firebase.clone(), fcm.clone()));
    let sweep_handle = sweep.spawn();
    info!("Reminder sweep scheduled every 60s");

    let state = AppState {
        firebase,
        fcm,
        gamification,
        timers: timers.clone(),
    };
    let app = http::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind listener");
    info!("Listening on {}", config.bind_addr);

    let shutdown = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to register Ctrl+C handler");
        info!("Shutting down...");
    };

    if let Err(why) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
    {
        error!("Server error: {:?}", why);
    }

    sweep_handle.abort();
    timers.dispose();

    info!("Goodbye!");
}
