pub mod auth;
pub mod config;
pub mod error;
pub mod notify;
pub mod prospects;
pub mod storage;
pub mod telemetry;
