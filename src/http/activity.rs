// Activity endpoints: XP-awarding events and the daily login bonus

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use super::error::AppError;
use super::AppState;
use crate::features::gamification::{Activity, ActivityReport};

/// `POST /api/users/{id}/activity` — apply one activity event.
///
/// The body names the event kind plus its payload, e.g.
/// `{"kind": "weekly_goal_completed", "completedCount": 3}`.
pub async fn record_activity(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(activity): Json<Activity>,
) -> Result<Json<ActivityReport>, AppError> {
    let report = state.gamification.record_activity(&user_id, activity).await?;
    Ok(Json(report))
}

/// `POST /api/users/{id}/login` — daily login bonus check. Awards 5 XP on
/// the first login of a calendar day, 0 afterwards.
pub async fn login(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let bonus = state.gamification.check_daily_bonus(&user_id).await?;
    Ok(Json(json!({ "bonusXP": bonus })))
}
