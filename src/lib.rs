pub mod analytics;
pub mod config;
pub mod engine;
pub mod logging;
pub mod source;
pub mod version;
