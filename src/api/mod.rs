// External service clients module
pub mod auth;
pub mod fcm;
pub mod firebase;
