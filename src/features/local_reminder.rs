// In-session reminder timers
// Best-effort per-user repeating timers, layered on top of the
// authoritative server sweep; all state is lost on restart

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use dashmap::DashMap;
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api::firebase::FirebaseClient;
use crate::models::notification::NotificationPreferences;
use crate::utils::time::{delay_until_next, parse_reminder_time};

const ONE_DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Registry of per-user reminder timers with explicit lifecycle. Arming a
/// user always cancels their previous timer first, so at most one timer is
/// ever pending per user.
pub struct ReminderTimers {
    firebase: Arc<FirebaseClient>,
    timers: DashMap<String, JoinHandle<()>>,
}

impl ReminderTimers {
    pub fn new(firebase: Arc<FirebaseClient>) -> Self {
        Self {
            firebase,
            timers: DashMap::new(),
        }
    }

    /// Arm (or re-arm) the timer for a user from their current preferences.
    /// Does nothing when reminders are off or the time is unparseable.
    pub fn arm(&self, user_id: &str, prefs: &NotificationPreferences) {
        self.disarm(user_id);

        if !prefs.wants_daily_reminder() {
            return;
        }
        let Some(reminder) = parse_reminder_time(&prefs.reminder_time) else {
            warn!(
                "User {} has unparseable reminder time {:?}",
                user_id, prefs.reminder_time
            );
            return;
        };

        let firebase = self.firebase.clone();
        let user = user_id.to_string();
        let handle = tokio::spawn(async move {
            let first_delay = delay_until_next(Local::now().naive_local(), reminder)
                .to_std()
                .unwrap_or(ONE_DAY);
            tokio::time::sleep(first_delay).await;

            loop {
                info!("Daily reminder fired for user {}", user);
                let stamp = json!({ "lastReminderSent": chrono::Utc::now().to_rfc3339() });
                if let Err(e) = firebase
                    .set_document(&NotificationPreferences::doc_path(&user), &stamp)
                    .await
                {
                    warn!("Failed to record reminder for user {}: {:#}", user, e);
                }
                tokio::time::sleep(ONE_DAY).await;
            }
        });

        self.timers.insert(user_id.to_string(), handle);
    }

    /// Cancel a user's pending timer, if any.
    pub fn disarm(&self, user_id: &str) {
        if let Some((_, handle)) = self.timers.remove(user_id) {
            handle.abort();
        }
    }

    pub fn armed(&self, user_id: &str) -> bool {
        self.timers.contains_key(user_id)
    }

    /// Cancel every pending timer.
    pub fn dispose(&self) {
        self.timers.retain(|_, handle| {
            handle.abort();
            false
        });
    }
}

impl Drop for ReminderTimers {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::auth::ServiceAccount;

    fn test_timers() -> ReminderTimers {
        let account = ServiceAccount {
            project_id: "camply-test".to_string(),
            private_key: "unused".to_string(),
            client_email: "test@camply-test.iam.gserviceaccount.com".to_string(),
        };
        let firebase = Arc::new(FirebaseClient::new(reqwest::Client::new(), account));
        ReminderTimers::new(firebase)
    }

    fn enabled_prefs(time: &str) -> NotificationPreferences {
        NotificationPreferences {
            enabled: true,
            daily_reminders: true,
            reminder_time: time.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_arm_registers_one_timer() {
        let timers = test_timers();
        timers.arm("u1", &enabled_prefs("21:00"));
        assert!(timers.armed("u1"));

        // Re-arming replaces, never stacks
        timers.arm("u1", &enabled_prefs("07:00"));
        assert!(timers.armed("u1"));
        assert_eq!(timers.timers.len(), 1);
    }

    #[tokio::test]
    async fn test_disabled_prefs_disarm() {
        let timers = test_timers();
        timers.arm("u1", &enabled_prefs("21:00"));

        let mut off = enabled_prefs("21:00");
        off.enabled = false;
        timers.arm("u1", &off);
        assert!(!timers.armed("u1"));
    }

    #[tokio::test]
    async fn test_unparseable_time_not_armed() {
        let timers = test_timers();
        timers.arm("u1", &enabled_prefs("late evening"));
        assert!(!timers.armed("u1"));
    }

    #[tokio::test]
    async fn test_dispose_clears_all() {
        let timers = test_timers();
        timers.arm("u1", &enabled_prefs("21:00"));
        timers.arm("u2", &enabled_prefs("08:15"));
        timers.dispose();
        assert!(!timers.armed("u1"));
        assert!(!timers.armed("u2"));
    }
}
