pub mod analytics;
pub mod config;
pub mod models;
pub mod resolve;
pub mod shortcode;
pub mod shorten;
pub mod storage;
pub mod telemetry;
pub mod validate;

pub mod api;
pub mod redirect;
