// Field telemetry - live charting of a plain-text sensor log
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
