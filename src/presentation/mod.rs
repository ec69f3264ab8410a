// Presentation layer - HTTP surface over the live session
pub mod app_state;
pub mod handlers;
