// Wall-clock helpers for reminder scheduling
// Reminder times are "HH:MM" strings compared at minute granularity

use chrono::{Duration, NaiveDateTime, NaiveTime};

/// Parse a preference value like "21:05" into a time of day.
pub fn parse_reminder_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M").ok()
}

/// Current minute as the "HH:MM" string reminder times are matched against.
pub fn minute_of(now: NaiveDateTime) -> String {
    now.format("%H:%M").to_string()
}

/// Delay until the next occurrence of `reminder`. When today's occurrence
/// has already passed (or is this exact instant), the target is tomorrow.
pub fn delay_until_next(now: NaiveDateTime, reminder: NaiveTime) -> Duration {
    let mut scheduled = now.date().and_time(reminder);
    if scheduled <= now {
        scheduled += Duration::days(1);
    }
    scheduled - now
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_time(NaiveTime::parse_from_str(time, "%H:%M:%S").unwrap())
    }

    #[test]
    fn test_parse_reminder_time() {
        assert_eq!(
            parse_reminder_time("21:00"),
            Some(NaiveTime::from_hms_opt(21, 0, 0).unwrap())
        );
        assert_eq!(parse_reminder_time("25:00"), None);
        assert_eq!(parse_reminder_time("not a time"), None);
    }

    #[test]
    fn test_minute_of_pads() {
        assert_eq!(minute_of(at("2025-06-10", "09:05:30")), "09:05");
        assert_eq!(minute_of(at("2025-06-10", "21:00:00")), "21:00");
    }

    #[test]
    fn test_delay_targets_today_when_upcoming() {
        let now = at("2025-06-10", "20:00:00");
        let delay = delay_until_next(now, NaiveTime::from_hms_opt(21, 0, 0).unwrap());
        assert_eq!(delay, Duration::hours(1));
    }

    #[test]
    fn test_delay_targets_tomorrow_when_passed() {
        let now = at("2025-06-10", "21:30:00");
        let delay = delay_until_next(now, NaiveTime::from_hms_opt(21, 0, 0).unwrap());
        assert_eq!(delay, Duration::hours(23) + Duration::minutes(30));
    }

    #[test]
    fn test_delay_always_positive_and_bounded() {
        let now = at("2025-06-10", "21:00:00");
        let delay = delay_until_next(now, NaiveTime::from_hms_opt(21, 0, 0).unwrap());
        assert!(delay > Duration::zero());
        assert!(delay <= Duration::days(1));
    }
}
