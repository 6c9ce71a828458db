// Gamification engine
// XP awards, level reconciliation, streaks, daily bonus and badge grants
// over per-user Firestore documents

use std::sync::Arc;

use anyhow::Result;
use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::api::firebase::{FieldTransform, FirebaseClient, WriteOp};
use crate::models::badge;
use crate::models::user::UserProfile;
use crate::utils::config::{
    WEEKLY_GOALS_TARGET, XP_DIARY_ENTRY_NEW, XP_DIARY_ENTRY_UPDATED, XP_TASK_COMPLETED,
    XP_WEEKLY_GOAL,
};
use crate::utils::level::reconcile_level;
use crate::utils::streak::{advance_streak, daily_bonus};

/// Raised when an operation targets a user document that does not exist.
/// Surfaced as a 404 at the HTTP boundary.
#[derive(Debug, thiserror::Error)]
#[error("user {0} not found")]
pub struct UserNotFound(pub String);

/// Result of one XP award, so the caller can trigger level-up UI.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct XpAward {
    #[serde(rename = "xpAwarded")]
    pub amount: i64,
    #[serde(rename = "levelUp")]
    pub level_up: bool,
    #[serde(rename = "oldLevel")]
    pub old_level: i64,
    #[serde(rename = "newLevel")]
    pub new_level: i64,
}

/// Result of one streak advance.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StreakOutcome {
    #[serde(rename = "currentStreak")]
    pub current: i64,
    /// Streak badge newly granted by this advance, if any.
    #[serde(rename = "badgeGranted", skip_serializing_if = "Option::is_none")]
    pub badge: Option<&'static str>,
}

/// An XP-awarding activity event reported by a client screen.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Activity {
    DiaryEntryCreated,
    DiaryEntryUpdated,
    TaskCompleted,
    WeeklyGoalCompleted {
        #[serde(rename = "completedCount")]
        completed_count: u32,
    },
    OnboardingCompleted { xp: i64 },
}

/// Everything that happened in response to one activity event.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityReport {
    pub xp: XpAward,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streak: Option<StreakOutcome>,
    #[serde(rename = "badgesGranted")]
    pub badges_granted: Vec<String>,
}

/// Gamification operations over the user profile document. No locking
/// spans the read-modify-write pairs; the XP increment itself is atomic
/// server-side and the level is re-derived on every award.
pub struct GamificationService {
    firebase: Arc<FirebaseClient>,
}

impl GamificationService {
    pub fn new(firebase: Arc<FirebaseClient>) -> Self {
        Self { firebase }
    }

    async fn load_profile(&self, user_id: &str) -> Result<UserProfile> {
        let doc = self
            .firebase
            .get_document(&UserProfile::doc_path(user_id))
            .await?
            .ok_or_else(|| UserNotFound(user_id.to_string()))?;
        Ok(serde_json::from_value(doc)?)
    }

    /// Increment `totalXP` and stamp `lastActive`, then reconcile the
    /// stored level against the new total. The level patch only ever moves
    /// up; a crash between the two round trips heals on the next award.
    pub async fn award_xp(&self, user_id: &str, amount: i64) -> Result<XpAward> {
        let path = UserProfile::doc_path(user_id);

        self.firebase
            .commit(vec![WriteOp::Update {
                path: path.clone(),
                fields: json!({ "lastActive": Utc::now().to_rfc3339() }),
                transforms: vec![FieldTransform::Increment {
                    field: "totalXP".to_string(),
                    amount,
                }],
            }])
            .await?;

        let profile = self.load_profile(user_id).await?;

        match reconcile_level(profile.total_xp, profile.level) {
            Some(up) => {
                self.firebase
                    .set_document(&path, &json!({ "level": up.new_level }))
                    .await?;
                info!(
                    "User {} leveled up: {} -> {}",
                    user_id, up.old_level, up.new_level
                );
                Ok(XpAward {
                    amount,
                    level_up: true,
                    old_level: up.old_level,
                    new_level: up.new_level,
                })
            }
            None => Ok(XpAward {
                amount,
                level_up: false,
                old_level: profile.level,
                new_level: profile.level,
            }),
        }
    }

    /// First login of a calendar day earns a fixed 5 XP bonus; later logins
    /// the same day earn nothing. Calendar days are server-local.
    pub async fn check_daily_bonus(&self, user_id: &str) -> Result<i64> {
        let profile = self.load_profile(user_id).await?;
        let today = Local::now().date_naive();

        let bonus = daily_bonus(profile.last_login_day(), today);
        if bonus == 0 {
            return Ok(0);
        }

        self.firebase
            .set_document(
                &UserProfile::doc_path(user_id),
                &json!({ "lastLoginDate": Utc::now().to_rfc3339() }),
            )
            .await?;
        self.award_xp(user_id, bonus).await?;

        Ok(bonus)
    }

    /// Grant a badge once. Returns false without writing when the user
    /// already holds it.
    pub async fn check_and_award_badge(&self, user_id: &str, badge_id: &str) -> Result<bool> {
        let profile = self.load_profile(user_id).await?;
        if profile.has_badge(badge_id) {
            return Ok(false);
        }

        self.firebase
            .commit(vec![WriteOp::Transform {
                path: UserProfile::doc_path(user_id),
                transforms: vec![FieldTransform::AppendMissing {
                    field: "unlockedBadges".to_string(),
                    values: vec![badge_id.to_string()],
                }],
            }])
            .await?;

        info!("User {} unlocked badge {}", user_id, badge_id);
        Ok(true)
    }

    /// Advance the consecutive-day streak for one activity event. Safe to
    /// call any number of times per day.
    pub async fn update_streak(&self, user_id: &str) -> Result<StreakOutcome> {
        let profile = self.load_profile(user_id).await?;
        let today = Local::now().date_naive();

        let update = advance_streak(
            profile.current_streak,
            profile.max_streak,
            profile.last_active_day(),
            today,
        );

        self.firebase
            .set_document(
                &UserProfile::doc_path(user_id),
                &json!({
                    "currentStreak": update.current,
                    "maxStreak": update.max,
                    "lastActive": Utc::now().to_rfc3339(),
                }),
            )
            .await?;

        let mut granted = None;
        if let Some(badge_id) = update.badge {
            if self.check_and_award_badge(user_id, badge_id).await? {
                granted = Some(badge_id);
            }
        }

        Ok(StreakOutcome {
            current: update.current,
            badge: granted,
        })
    }

    /// Apply the XP, streak and badge consequences of one activity event,
    /// mirroring what the app screens do when the user journals, completes
    /// tasks and goals, or finishes onboarding.
    pub async fn record_activity(&self, user_id: &str, activity: Activity) -> Result<ActivityReport> {
        let mut badges_granted = Vec::new();
        let mut streak = None;

        let xp = match activity {
            Activity::DiaryEntryCreated => {
                let xp = self.award_xp(user_id, XP_DIARY_ENTRY_NEW).await?;
                streak = Some(self.update_streak(user_id).await?);
                xp
            }
            Activity::DiaryEntryUpdated => {
                let xp = self.award_xp(user_id, XP_DIARY_ENTRY_UPDATED).await?;
                streak = Some(self.update_streak(user_id).await?);
                xp
            }
            Activity::TaskCompleted => {
                let xp = self.award_xp(user_id, XP_TASK_COMPLETED).await?;
                streak = Some(self.update_streak(user_id).await?);
                if self
                    .check_and_award_badge(user_id, badge::FIRST_ENTRY)
                    .await?
                {
                    badges_granted.push(badge::FIRST_ENTRY.to_string());
                }
                self.firebase
                    .commit(vec![WriteOp::Transform {
                        path: UserProfile::doc_path(user_id),
                        transforms: vec![FieldTransform::Increment {
                            field: "entriesCount".to_string(),
                            amount: 1,
                        }],
                    }])
                    .await?;
                xp
            }
            Activity::WeeklyGoalCompleted { completed_count } => {
                let xp = self.award_xp(user_id, XP_WEEKLY_GOAL).await?;
                if completed_count >= WEEKLY_GOALS_TARGET
                    && self
                        .check_and_award_badge(user_id, badge::GOAL_CRUSHER)
                        .await?
                {
                    badges_granted.push(badge::GOAL_CRUSHER.to_string());
                }
                xp
            }
            Activity::OnboardingCompleted { xp } => {
                let award = self.award_xp(user_id, xp).await?;
                if self
                    .check_and_award_badge(user_id, badge::GETTING_STARTED)
                    .await?
                {
                    badges_granted.push(badge::GETTING_STARTED.to_string());
                }
                self.firebase
                    .set_document(
                        &UserProfile::doc_path(user_id),
                        &json!({ "hasCompletedOnboarding": true }),
                    )
                    .await?;
                award
            }
        };

        if let Some(outcome) = streak {
            if let Some(badge_id) = outcome.badge {
                badges_granted.push(badge_id.to_string());
            }
        }

        Ok(ActivityReport {
            xp,
            streak,
            badges_granted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_deserializes_from_request_body() {
        let activity: Activity = serde_json::from_str(r#"{"kind": "diary_entry_created"}"#).unwrap();
        assert!(matches!(activity, Activity::DiaryEntryCreated));

        let activity: Activity =
            serde_json::from_str(r#"{"kind": "weekly_goal_completed", "completedCount": 3}"#)
                .unwrap();
        assert!(matches!(
            activity,
            Activity::WeeklyGoalCompleted { completed_count: 3 }
        ));

        let activity: Activity =
            serde_json::from_str(r#"{"kind": "onboarding_completed", "xp": 45}"#).unwrap();
        assert!(matches!(activity, Activity::OnboardingCompleted { xp: 45 }));
    }

    #[test]
    fn test_unknown_activity_kind_rejected() {
        assert!(serde_json::from_str::<Activity>(r#"{"kind": "teleported"}"#).is_err());
    }
}
