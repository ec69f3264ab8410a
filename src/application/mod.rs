// Application layer - Polling session, viewport interaction and chart pipeline
pub mod chart_service;
pub mod live_buffer;
pub mod live_session;
pub mod log_source;
pub mod viewport;
