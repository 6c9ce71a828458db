// Notification preference and device token models
// Stored under users/{userId}/settings/notifications and
// users/{userId}/fcmTokens/{deviceId}

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Per-user notification preferences sub-document. Missing fields fall back
/// to the defaults the client has always assumed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationPreferences {
    #[serde(default)]
    pub enabled: bool,
    #[serde(rename = "dailyReminders", default = "default_true")]
    pub daily_reminders: bool,
    #[serde(rename = "weeklyInsights", default)]
    pub weekly_insights: bool,
    #[serde(rename = "reminderTime", default = "default_reminder_time")]
    pub reminder_time: String,
    #[serde(
        rename = "lastReminderSent",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_reminder_sent: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_reminder_time() -> String {
    "21:00".to_string()
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            enabled: false,
            daily_reminders: true,
            weekly_insights: false,
            reminder_time: default_reminder_time(),
            last_reminder_sent: None,
        }
    }
}

impl NotificationPreferences {
    /// Firestore path of a user's notification settings sub-document.
    pub fn doc_path(user_id: &str) -> String {
        format!("users/{}/settings/notifications", user_id)
    }

    /// Whether the user has opted into daily reminders at all.
    pub fn wants_daily_reminder(&self) -> bool {
        self.enabled && self.daily_reminders
    }

    /// Calendar day the last reminder went out, local timezone.
    pub fn last_reminder_day(&self) -> Option<NaiveDate> {
        self.last_reminder_sent
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|dt| dt.with_timezone(&Local).date_naive())
    }
}

/// Partial preference update sent by the settings screen. Only the fields
/// present are written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferencesPatch {
    pub enabled: Option<bool>,
    #[serde(rename = "dailyReminders")]
    pub daily_reminders: Option<bool>,
    #[serde(rename = "weeklyInsights")]
    pub weekly_insights: Option<bool>,
    #[serde(rename = "reminderTime")]
    pub reminder_time: Option<String>,
}

impl PreferencesPatch {
    /// Apply this patch on top of existing preferences.
    pub fn apply(&self, prefs: &mut NotificationPreferences) {
        if let Some(enabled) = self.enabled {
            prefs.enabled = enabled;
        }
        if let Some(daily) = self.daily_reminders {
            prefs.daily_reminders = daily;
        }
        if let Some(weekly) = self.weekly_insights {
            prefs.weekly_insights = weekly;
        }
        if let Some(ref time) = self.reminder_time {
            prefs.reminder_time = time.clone();
        }
    }
}

/// One registered push target, keyed per device under the owning user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceToken {
    pub token: String,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(rename = "userAgent", default)]
    pub user_agent: Option<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: Option<String>,
}

impl DeviceToken {
    /// Firestore path of a user's device token sub-collection.
    pub fn collection_path(user_id: &str) -> String {
        format!("users/{}/fcmTokens", user_id)
    }

    /// Firestore path of one device token document.
    pub fn doc_path(user_id: &str, device_id: &str) -> String {
        format!("users/{}/fcmTokens/{}", user_id, device_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let prefs = NotificationPreferences::default();
        assert!(!prefs.enabled);
        assert!(prefs.daily_reminders);
        assert!(!prefs.weekly_insights);
        assert_eq!(prefs.reminder_time, "21:00");
        assert_eq!(prefs.last_reminder_sent, None);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let prefs: NotificationPreferences = serde_json::from_str(r#"{"enabled": true}"#).unwrap();
        assert!(prefs.enabled);
        assert!(prefs.daily_reminders);
        assert_eq!(prefs.reminder_time, "21:00");
    }

    #[test]
    fn test_wants_daily_reminder() {
        let mut prefs = NotificationPreferences {
            enabled: true,
            ..Default::default()
        };
        assert!(prefs.wants_daily_reminder());
        prefs.daily_reminders = false;
        assert!(!prefs.wants_daily_reminder());
    }

    #[test]
    fn test_patch_applies_only_present_fields() {
        let mut prefs = NotificationPreferences::default();
        let patch = PreferencesPatch {
            enabled: Some(true),
            reminder_time: Some("07:30".to_string()),
            ..Default::default()
        };
        patch.apply(&mut prefs);
        assert!(prefs.enabled);
        assert_eq!(prefs.reminder_time, "07:30");
        // Untouched fields keep their values
        assert!(prefs.daily_reminders);
    }

    #[test]
    fn test_device_token_wire_names() {
        let token = DeviceToken {
            token: "abc".to_string(),
            platform: Some("web".to_string()),
            user_agent: Some("Mozilla/5.0".to_string()),
            created_at: Some("2025-06-10T12:00:00Z".to_string()),
            updated_at: Some("2025-06-10T12:00:00Z".to_string()),
        };
        let json = serde_json::to_value(&token).unwrap();
        assert!(json.get("userAgent").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
    }
}
