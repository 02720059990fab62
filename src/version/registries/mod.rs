//! Transport implementations of the versions service

pub mod versions_service;

pub use versions_service::HttpVersionService;
