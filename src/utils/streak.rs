// Streak and daily-bonus transitions
// Day-based counters driven by wall-clock comparison at call time

use chrono::NaiveDate;

use crate::models::badge;

/// XP granted for the first login of each calendar day.
pub const DAILY_LOGIN_BONUS_XP: i64 = 5;

/// Outcome of advancing a streak counter by one activity event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakUpdate {
    pub current: i64,
    pub max: i64,
    /// Badge earned by this exact streak value, if any.
    pub badge: Option<&'static str>,
}

/// Advance the streak counters given the stored state and the calendar
/// dates involved. Same-day activity leaves the counter alone (floored at 1
/// to repair a stored 0), the next calendar day increments it, and any gap
/// resets it to 1. `max` never moves on a reset.
pub fn advance_streak(
    current: i64,
    max: i64,
    last_active: Option<NaiveDate>,
    today: NaiveDate,
) -> StreakUpdate {
    let days_diff = last_active.map(|d| (today - d).num_days());

    match days_diff {
        Some(diff) if diff <= 0 => {
            let floored = current.max(1);
            StreakUpdate {
                current: floored,
                max: max.max(floored),
                badge: None,
            }
        }
        Some(1) => {
            let next = current + 1;
            let badge = match next {
                7 => Some(badge::WEEK_STREAK),
                30 => Some(badge::MONTH_STREAK),
                _ => None,
            };
            StreakUpdate {
                current: next,
                max: max.max(next),
                badge,
            }
        }
        // A gap of one or more missed days, or no prior activity
        _ => StreakUpdate {
            current: 1,
            max,
            badge: None,
        },
    }
}

/// Daily login bonus: 5 XP on the first login of a calendar day, 0 after.
pub fn daily_bonus(last_login: Option<NaiveDate>, today: NaiveDate) -> i64 {
    match last_login {
        Some(date) if date == today => 0,
        _ => DAILY_LOGIN_BONUS_XP,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_same_day_no_change() {
        let today = day("2025-06-10");
        let update = advance_streak(4, 9, Some(today), today);
        assert_eq!(update.current, 4);
        assert_eq!(update.max, 9);
        assert_eq!(update.badge, None);
    }

    #[test]
    fn test_same_day_floors_zero() {
        let today = day("2025-06-10");
        let update = advance_streak(0, 0, Some(today), today);
        assert_eq!(update.current, 1);
        assert_eq!(update.max, 1);
    }

    #[test]
    fn test_next_day_increments() {
        let today = day("2025-06-10");
        let update = advance_streak(4, 4, Some(today - Duration::days(1)), today);
        assert_eq!(update.current, 5);
        assert_eq!(update.max, 5);
        assert_eq!(update.badge, None);
    }

    #[test]
    fn test_next_day_keeps_larger_max() {
        let today = day("2025-06-10");
        let update = advance_streak(2, 12, Some(today - Duration::days(1)), today);
        assert_eq!(update.current, 3);
        assert_eq!(update.max, 12);
    }

    #[test]
    fn test_gap_resets() {
        let today = day("2025-06-10");
        let update = advance_streak(25, 25, Some(today - Duration::days(3)), today);
        assert_eq!(update.current, 1);
        assert_eq!(update.max, 25);
        assert_eq!(update.badge, None);
    }

    #[test]
    fn test_no_prior_activity_resets() {
        let today = day("2025-06-10");
        let update = advance_streak(0, 0, None, today);
        assert_eq!(update.current, 1);
        assert_eq!(update.max, 0);
    }

    #[test]
    fn test_week_streak_badge_on_exact_seven() {
        let today = day("2025-06-10");
        let yesterday = Some(today - Duration::days(1));
        assert_eq!(
            advance_streak(6, 6, yesterday, today).badge,
            Some(badge::WEEK_STREAK)
        );
        assert_eq!(advance_streak(7, 7, yesterday, today).badge, None);
    }

    #[test]
    fn test_month_streak_badge_on_exact_thirty() {
        let today = day("2025-06-10");
        let yesterday = Some(today - Duration::days(1));
        assert_eq!(
            advance_streak(29, 29, yesterday, today).badge,
            Some(badge::MONTH_STREAK)
        );
    }

    #[test]
    fn test_daily_bonus_once_per_day() {
        let today = day("2025-06-10");
        assert_eq!(daily_bonus(None, today), 5);
        assert_eq!(daily_bonus(Some(today - Duration::days(1)), today), 5);
        assert_eq!(daily_bonus(Some(today), today), 0);
    }
}
