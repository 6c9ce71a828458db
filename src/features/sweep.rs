// Server-side reminder sweep
// Scans every user once per minute and fans out due daily reminders

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::api::fcm::{FcmClient, PushMessage};
use crate::api::firebase::FirebaseClient;
use crate::models::notification::{DeviceToken, NotificationPreferences};
use crate::utils::time::minute_of;

const SWEEP_PERIOD: Duration = Duration::from_secs(60);

/// What one sweep pass did, for the log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct SweepStats {
    pub checked: usize,
    pub sent: usize,
    pub pruned: usize,
}

/// Decide whether a user is due a reminder this minute. Reminder times are
/// compared against the server's local wall clock; users in other timezones
/// receive reminders at the server-local reading of their preference.
pub fn reminder_due(
    prefs: &NotificationPreferences,
    current_minute: &str,
    today: NaiveDate,
) -> bool {
    if !prefs.wants_daily_reminder() {
        return false;
    }
    if prefs.reminder_time != current_minute {
        return false;
    }
    // At most one reminder per calendar day, even if the sweep fires twice
    // in the same minute
    prefs.last_reminder_day() != Some(today)
}

fn daily_reminder_message() -> PushMessage {
    let mut data = HashMap::new();
    data.insert("type".to_string(), "daily_reminder".to_string());
    data.insert("timestamp".to_string(), chrono::Utc::now().to_rfc3339());
    PushMessage {
        title: "Daily Journaling Reminder 📝".to_string(),
        body: "Time to reflect on your day! Open Camply to write your journal entry.".to_string(),
        data,
    }
}

/// The once-per-minute reminder fan-out over all users. An O(users) scan
/// each pass; fine at this product's scale.
pub struct ReminderSweep {
    firebase: Arc<FirebaseClient>,
    fcm: Arc<FcmClient>,
}

impl ReminderSweep {
    pub fn new(firebase: Arc<FirebaseClient>, fcm: Arc<FcmClient>) -> Self {
        Self { firebase, fcm }
    }

    /// Run the sweep loop until the task is aborted.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_PERIOD);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                match self.run_once().await {
                    Ok(stats) => {
                        if stats.sent > 0 || stats.pruned > 0 {
                            info!(
                                "Reminder sweep: {} users checked, {} reminders sent, {} tokens pruned",
                                stats.checked, stats.sent, stats.pruned
                            );
                        }
                    }
                    Err(e) => error!("Reminder sweep failed: {:#}", e),
                }
            }
        })
    }

    /// One sweep pass. Per-user failures are logged and skipped; a failure
    /// of the initial user scan aborts the pass and surfaces to the loop,
    /// which simply tries again next minute.
    pub async fn run_once(&self) -> Result<SweepStats> {
        let now = Local::now();
        let current_minute = minute_of(now.naive_local());
        let today = now.date_naive();

        let users = self.firebase.list_collection("users").await?;

        let mut stats = SweepStats {
            checked: users.len(),
            ..Default::default()
        };

        for (user_id, _) in users {
            match self.process_user(&user_id, &current_minute, today).await {
                Ok(Some(pruned)) => {
                    stats.sent += 1;
                    stats.pruned += pruned;
                }
                Ok(None) => {}
                Err(e) => error!("Error processing user {}: {:#}", user_id, e),
            }
        }

        Ok(stats)
    }

    /// Check one user and send their reminder when due. Returns the number
    /// of tokens pruned when a send happened, None when skipped.
    async fn process_user(
        &self,
        user_id: &str,
        current_minute: &str,
        today: NaiveDate,
    ) -> Result<Option<usize>> {
        let Some(doc) = self
            .firebase
            .get_document(&NotificationPreferences::doc_path(user_id))
            .await?
        else {
            return Ok(None);
        };
        let prefs: NotificationPreferences = serde_json::from_value(doc)?;

        if !reminder_due(&prefs, current_minute, today) {
            return Ok(None);
        }

        // Registered devices, keeping doc ids so dead tokens can be pruned
        let token_docs = self
            .firebase
            .list_collection(&DeviceToken::collection_path(user_id))
            .await?;

        let devices: Vec<(String, String)> = token_docs
            .into_iter()
            .filter_map(|(doc_id, data)| {
                let record: DeviceToken = serde_json::from_value(data).ok()?;
                (!record.token.is_empty()).then_some((doc_id, record.token))
            })
            .collect();

        if devices.is_empty() {
            return Ok(None);
        }

        let tokens: Vec<String> = devices.iter().map(|(_, t)| t.clone()).collect();
        let outcome = self.fcm.send_each(&tokens, &daily_reminder_message()).await?;

        info!(
            "Sent reminder to user {}: {} success, {} failures",
            user_id,
            outcome.success_count(),
            outcome.failure_count()
        );

        let mut pruned = 0;
        for idx in outcome.invalid_token_indices() {
            let (doc_id, _) = &devices[idx];
            self.firebase
                .delete_document(&DeviceToken::doc_path(user_id, doc_id))
                .await?;
            info!("Deleted invalid token for user {}", user_id);
            pruned += 1;
        }

        // Marked sent even when every token failed; the user is not retried
        // until tomorrow
        self.firebase
            .set_document(
                &NotificationPreferences::doc_path(user_id),
                &json!({ "lastReminderSent": chrono::Utc::now().to_rfc3339() }),
            )
            .await?;

        Ok(Some(pruned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn enabled_prefs(time: &str) -> NotificationPreferences {
        NotificationPreferences {
            enabled: true,
            daily_reminders: true,
            reminder_time: time.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_due_at_matching_minute() {
        assert!(reminder_due(&enabled_prefs("21:00"), "21:00", day("2025-06-10")));
    }

    #[test]
    fn test_skips_other_minutes() {
        assert!(!reminder_due(&enabled_prefs("21:00"), "21:01", day("2025-06-10")));
        assert!(!reminder_due(&enabled_prefs("21:00"), "09:00", day("2025-06-10")));
    }

    #[test]
    fn test_skips_disabled() {
        let mut prefs = enabled_prefs("21:00");
        prefs.enabled = false;
        assert!(!reminder_due(&prefs, "21:00", day("2025-06-10")));

        let mut prefs = enabled_prefs("21:00");
        prefs.daily_reminders = false;
        assert!(!reminder_due(&prefs, "21:00", day("2025-06-10")));
    }

    #[test]
    fn test_skips_when_already_sent_today() {
        let mut prefs = enabled_prefs("21:00");
        prefs.last_reminder_sent = Some(chrono::Utc::now().to_rfc3339());
        let today = prefs.last_reminder_day().unwrap();

        assert!(!reminder_due(&prefs, "21:00", today));
        // A new calendar day clears the guard
        assert!(reminder_due(&prefs, "21:00", today + chrono::Duration::days(1)));
    }

    #[test]
    fn test_daily_reminder_payload_tag() {
        let message = daily_reminder_message();
        assert_eq!(message.data.get("type").map(String::as_str), Some("daily_reminder"));
        assert!(message.data.contains_key("timestamp"));
    }
}
