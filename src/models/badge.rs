// Badge catalog
// One-time achievements stored per user as a set of ids

use serde::Serialize;

pub const FIRST_ENTRY: &str = "first_entry";
pub const WEEK_STREAK: &str = "week_streak";
pub const MONTH_STREAK: &str = "month_streak";
pub const MOOD_TRACKER: &str = "mood_tracker";
pub const GOAL_CRUSHER: &str = "goal_crusher";
pub const GETTING_STARTED: &str = "getting_started";

/// A badge as shown on the profile screen. Awards are triggered
/// imperatively by the call site matching each achievement; the catalog is
/// display metadata only.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Badge {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

pub const BADGES: [Badge; 6] = [
    Badge {
        id: FIRST_ENTRY,
        name: "Newbie",
        description: "Complete your first journal entry",
        icon: "🎯",
    },
    Badge {
        id: WEEK_STREAK,
        name: "Consistency Champion",
        description: "Maintain a 7-day journaling streak",
        icon: "🔥",
    },
    Badge {
        id: MONTH_STREAK,
        name: "Dedication Master",
        description: "Maintain a 30-day journaling streak",
        icon: "⭐",
    },
    Badge {
        id: MOOD_TRACKER,
        name: "Mood Tracker",
        description: "Log your mood for 7 consecutive days",
        icon: "😊",
    },
    Badge {
        id: GOAL_CRUSHER,
        name: "Goal Crusher",
        description: "Complete all 3 weekly goals",
        icon: "🏆",
    },
    Badge {
        id: GETTING_STARTED,
        name: "Getting Started",
        description: "Complete your onboarding journey",
        icon: "🌱",
    },
];

/// Look up a badge by id.
pub fn find(id: &str) -> Option<&'static Badge> {
    BADGES.iter().find(|b| b.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_six_badges() {
        assert_eq!(BADGES.len(), 6);
    }

    #[test]
    fn test_ids_are_unique() {
        for (i, a) in BADGES.iter().enumerate() {
            for b in &BADGES[i + 1..] {
                assert_ne!(a.id, b.id);
            }
        }
    }

    #[test]
    fn test_find() {
        assert_eq!(find(WEEK_STREAK).unwrap().name, "Consistency Champion");
        assert!(find("no_such_badge").is_none());
    }
}
