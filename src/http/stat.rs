// Profile progress and badge catalog endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use super::error::AppError;
use super::AppState;
use crate::features::gamification::UserNotFound;
use crate::models::badge::{Badge, BADGES};
use crate::models::user::UserProfile;
use crate::utils::level::xp_for_next_level;

/// Read-side view of a user's progression, as the home and profile
/// screens render it.
#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    #[serde(rename = "totalXP")]
    pub total_xp: i64,
    pub level: i64,
    #[serde(rename = "xpIntoLevel")]
    pub xp_into_level: i64,
    #[serde(rename = "xpForNextLevel")]
    pub xp_for_next_level: i64,
    #[serde(rename = "xpToNextLevel")]
    pub xp_to_next_level: i64,
    #[serde(rename = "currentStreak")]
    pub current_streak: i64,
    #[serde(rename = "maxStreak")]
    pub max_streak: i64,
    #[serde(rename = "entriesCount")]
    pub entries_count: i64,
    #[serde(rename = "unlockedBadges")]
    pub unlocked_badges: Vec<String>,
}

/// `GET /api/users/{id}/progress`
pub async fn progress(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ProgressResponse>, AppError> {
    let doc = state
        .firebase
        .get_document(&UserProfile::doc_path(&user_id))
        .await?
        .ok_or_else(|| AppError::NotFound(UserNotFound(user_id.clone()).to_string()))?;
    let profile: UserProfile =
        serde_json::from_value(doc).map_err(|e| AppError::InternalServerError(e.to_string()))?;

    // Progress within the level, as the home screen has always computed it
    let threshold = xp_for_next_level(profile.level);
    let xp_into_level = profile.total_xp % threshold;

    Ok(Json(ProgressResponse {
        display_name: profile.display_name,
        total_xp: profile.total_xp,
        level: profile.level,
        xp_into_level,
        xp_for_next_level: threshold,
        xp_to_next_level: threshold - xp_into_level,
        current_streak: profile.current_streak,
        max_streak: profile.max_streak,
        entries_count: profile.entries_count,
        unlocked_badges: profile.unlocked_badges,
    }))
}

/// `GET /api/badges` — the static badge catalog.
pub async fn badges() -> Json<&'static [Badge]> {
    Json(&BADGES[..])
}
