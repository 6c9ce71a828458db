// Centralized configuration for the Camply backend

use std::env;

/// XP awarded for creating a new diary entry.
pub const XP_DIARY_ENTRY_NEW: i64 = 10;

/// XP awarded for updating an existing diary entry.
pub const XP_DIARY_ENTRY_UPDATED: i64 = 5;

/// XP awarded for completing the daily reflection task.
pub const XP_TASK_COMPLETED: i64 = 50;

/// XP awarded for completing one weekly goal.
pub const XP_WEEKLY_GOAL: i64 = 30;

/// Completed-goal count that earns the goal_crusher badge.
pub const WEEKLY_GOALS_TARGET: u32 = 3;

/// Runtime configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the Google service account JSON key file.
    pub credentials_path: String,
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Self {
        let credentials_path = env::var("FIREBASE_CREDENTIALS")
            .unwrap_or_else(|_| "firebase-key.json".to_string());

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "camply_rs=info".to_string());

        Self {
            credentials_path,
            bind_addr,
            rust_log,
        }
    }
}
