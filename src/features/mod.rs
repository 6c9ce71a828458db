// Feature modules
pub mod gamification;
pub mod local_reminder;
pub mod sweep;
