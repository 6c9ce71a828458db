// User profile data model
// Matches the Firebase user document structure; field names are the
// persisted schema and must stay verbatim

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Per-user profile document at `users/{userId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
    #[serde(rename = "totalXP", default)]
    pub total_xp: i64,
    #[serde(default = "default_level")]
    pub level: i64,
    #[serde(rename = "currentStreak", default)]
    pub current_streak: i64,
    #[serde(rename = "maxStreak", default)]
    pub max_streak: i64,
    #[serde(rename = "entriesCount", default)]
    pub entries_count: i64,
    #[serde(rename = "unlockedBadges", default)]
    pub unlocked_badges: Vec<String>,
    #[serde(rename = "lastActive", default)]
    pub last_active: Option<String>,
    #[serde(rename = "lastLoginDate", default)]
    pub last_login_date: Option<String>,
    #[serde(rename = "hasAcceptedPrivacyPolicy", default)]
    pub has_accepted_privacy_policy: bool,
    #[serde(rename = "hasCompletedOnboarding", default)]
    pub has_completed_onboarding: bool,
    #[serde(rename = "emailVerificationEnabled", default)]
    pub email_verification_enabled: bool,
}

fn default_level() -> i64 {
    1
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            display_name: None,
            total_xp: 0,
            level: 1,
            current_streak: 0,
            max_streak: 0,
            entries_count: 0,
            unlocked_badges: Vec::new(),
            last_active: None,
            last_login_date: None,
            has_accepted_privacy_policy: false,
            has_completed_onboarding: false,
            email_verification_enabled: false,
        }
    }
}

impl UserProfile {
    /// Firestore path of a user's profile document.
    pub fn doc_path(user_id: &str) -> String {
        format!("users/{}", user_id)
    }

    pub fn has_badge(&self, badge_id: &str) -> bool {
        self.unlocked_badges.iter().any(|b| b == badge_id)
    }

    /// Calendar day of the last activity, in the server's local timezone.
    pub fn last_active_day(&self) -> Option<NaiveDate> {
        self.last_active.as_deref().and_then(parse_local_day)
    }

    /// Calendar day of the last login-bonus grant, local timezone.
    pub fn last_login_day(&self) -> Option<NaiveDate> {
        self.last_login_date.as_deref().and_then(parse_local_day)
    }
}

/// Date-truncate a stored ISO timestamp to a local calendar day.
fn parse_local_day(ts: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(ts)
        .ok()
        .map(|dt| dt.with_timezone(&Local).date_naive())
}

/// One row of the XP leaderboard.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    #[serde(rename = "totalXP")]
    pub total_xp: i64,
    pub level: i64,
    #[serde(rename = "currentStreak")]
    pub current_streak: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_sparse_document() {
        // Freshly created users carry only a couple of fields
        let profile: UserProfile =
            serde_json::from_str(r#"{"displayName": "Mika", "totalXP": 40}"#).unwrap();
        assert_eq!(profile.display_name.as_deref(), Some("Mika"));
        assert_eq!(profile.total_xp, 40);
        assert_eq!(profile.level, 1);
        assert!(profile.unlocked_badges.is_empty());
        assert!(profile.last_active_day().is_none());
    }

    #[test]
    fn test_wire_field_names() {
        let json = serde_json::to_value(UserProfile::default()).unwrap();
        for key in [
            "displayName",
            "totalXP",
            "level",
            "currentStreak",
            "maxStreak",
            "entriesCount",
            "unlockedBadges",
            "hasAcceptedPrivacyPolicy",
            "hasCompletedOnboarding",
            "emailVerificationEnabled",
        ] {
            assert!(json.get(key).is_some(), "missing field {key}");
        }
    }

    #[test]
    fn test_has_badge() {
        let profile = UserProfile {
            unlocked_badges: vec!["first_entry".to_string()],
            ..Default::default()
        };
        assert!(profile.has_badge("first_entry"));
        assert!(!profile.has_badge("week_streak"));
    }
}
