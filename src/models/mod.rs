// Data models module
pub mod badge;
pub mod notification;
pub mod user;
