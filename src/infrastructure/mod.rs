// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod http_log_source;
pub mod log_parser;
