// Notification endpoints: test push, preferences, device registration

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::error::AppError;
use super::AppState;
use crate::api::fcm::PushMessage;
use crate::models::notification::{DeviceToken, NotificationPreferences, PreferencesPatch};

/// `OPTIONS /sendTestNotification`
pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// `POST /sendTestNotification` — manually trigger a test notification.
///
/// 400 without a `userId`, 404 when the user has no usable tokens, 200
/// with per-token counts once the send attempt completes.
pub async fn send_test_notification(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let Some(user_id) = body.get("userId").and_then(|v| v.as_str()) else {
        return Err(AppError::BadRequest("userId is required".to_string()));
    };

    let token_docs = state
        .firebase
        .list_collection(&DeviceToken::collection_path(user_id))
        .await?;

    if token_docs.is_empty() {
        return Err(AppError::NotFound("No FCM tokens found for user".to_string()));
    }

    let tokens: Vec<String> = token_docs
        .into_iter()
        .filter_map(|(_, data)| {
            let record: DeviceToken = serde_json::from_value(data).ok()?;
            (!record.token.is_empty()).then_some(record.token)
        })
        .collect();

    if tokens.is_empty() {
        return Err(AppError::NotFound("No valid FCM tokens found".to_string()));
    }

    let mut data = HashMap::new();
    data.insert("type".to_string(), "test".to_string());
    data.insert("timestamp".to_string(), Utc::now().to_rfc3339());
    let message = PushMessage {
        title: "Test Notification 🎉".to_string(),
        body: "Your push notifications are working correctly!".to_string(),
        data,
    };

    let outcome = state
        .fcm
        .send_each(&tokens, &message)
        .await
        .map_err(|e| AppError::InternalServerError(format!("{:#}", e)))?;

    Ok(Json(json!({
        "success": true,
        "successCount": outcome.success_count(),
        "failureCount": outcome.failure_count(),
    })))
}

/// `GET /api/users/{id}/notifications` — preferences merged over defaults.
/// A user who never touched settings gets the default document.
pub async fn get_preferences(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<NotificationPreferences>, AppError> {
    let prefs = match state
        .firebase
        .get_document(&NotificationPreferences::doc_path(&user_id))
        .await?
    {
        Some(doc) => serde_json::from_value(doc)
            .map_err(|e| AppError::InternalServerError(e.to_string()))?,
        None => NotificationPreferences::default(),
    };
    Ok(Json(prefs))
}

/// `PUT /api/users/{id}/notifications` — partial preference update.
///
/// Creates the sub-document lazily from defaults on first write, and
/// re-arms the user's in-session reminder timer with the new settings.
pub async fn save_preferences(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(patch): Json<PreferencesPatch>,
) -> Result<Json<NotificationPreferences>, AppError> {
    let path = NotificationPreferences::doc_path(&user_id);
    let now = Utc::now().to_rfc3339();

    let existing = state.firebase.get_document(&path).await?;

    let mut prefs = match &existing {
        Some(doc) => serde_json::from_value(doc.clone())
            .map_err(|e| AppError::InternalServerError(e.to_string()))?,
        None => NotificationPreferences::default(),
    };
    patch.apply(&mut prefs);

    let fields = if existing.is_some() {
        // Only the supplied fields, plus the update stamp
        let mut fields = serde_json::Map::new();
        if let Some(enabled) = patch.enabled {
            fields.insert("enabled".to_string(), json!(enabled));
        }
        if let Some(daily) = patch.daily_reminders {
            fields.insert("dailyReminders".to_string(), json!(daily));
        }
        if let Some(weekly) = patch.weekly_insights {
            fields.insert("weeklyInsights".to_string(), json!(weekly));
        }
        if let Some(ref time) = patch.reminder_time {
            fields.insert("reminderTime".to_string(), json!(time));
        }
        fields.insert("updatedAt".to_string(), json!(&now));
        Value::Object(fields)
    } else {
        let mut fields = serde_json::to_value(&prefs)
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
        fields["createdAt"] = json!(&now);
        fields["updatedAt"] = json!(&now);
        fields
    };

    state.firebase.set_document(&path, &fields).await?;

    state.timers.arm(&user_id, &prefs);
    info!("Updated notification preferences for user {}", user_id);

    Ok(Json(prefs))
}

/// Device registration request from a client that obtained a push token.
#[derive(Debug, Deserialize)]
pub struct RegisterDeviceRequest {
    pub token: String,
    pub platform: Option<String>,
    #[serde(rename = "userAgent")]
    pub user_agent: Option<String>,
}

/// `POST /api/users/{id}/devices` — save a device token, keyed per
/// platform under the owning user.
pub async fn register_device(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<RegisterDeviceRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.token.is_empty() {
        return Err(AppError::BadRequest("token is required".to_string()));
    }

    let platform = req.platform.unwrap_or_else(|| "web".to_string());
    let now = Utc::now().to_rfc3339();

    let record = json!({
        "token": req.token,
        "platform": &platform,
        "userAgent": req.user_agent,
        "createdAt": &now,
        "updatedAt": &now,
    });

    state
        .firebase
        .set_document(&DeviceToken::doc_path(&user_id, &platform), &record)
        .await?;

    info!("Registered {} device token for user {}", platform, user_id);
    Ok(Json(json!({ "success": true })))
}
