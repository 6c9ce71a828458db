// Leaderboard endpoint - community XP rankings

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use super::error::AppError;
use super::AppState;
use crate::models::user::{LeaderboardEntry, UserProfile};

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<usize>,
}

/// `GET /api/leaderboard?limit=N` — users ranked by total XP.
pub async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);

    let users = state.firebase.list_collection("users").await?;

    let mut entries: Vec<LeaderboardEntry> = users
        .into_iter()
        .filter_map(|(user_id, data)| {
            let profile: UserProfile = serde_json::from_value(data).ok()?;
            Some(LeaderboardEntry {
                user_id,
                display_name: profile.display_name,
                total_xp: profile.total_xp,
                level: profile.level,
                current_streak: profile.current_streak,
            })
        })
        .collect();

    entries.sort_by(|a, b| b.total_xp.cmp(&a.total_xp));
    entries.truncate(limit);

    Ok(Json(entries))
}
