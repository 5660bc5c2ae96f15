pub mod activity;
pub mod config;
pub mod error;
pub mod telemetry;
