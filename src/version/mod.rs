//! Version state layer of the compatibility engine
//!
//! This module owns everything the engine reads when it decides on an update
//! status: value types, persisted thresholds, debug overrides, the remote
//! thresholds fetch and the store staleness probe.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │   Fetcher    │────▶│  LocalCache  │────▶│   Settings   │
//! │ (remote, rpc)│     │ (thresholds) │     │  (snapshot)  │
//! └──────────────┘     └──────────────┘     └──────────────┘
//!        │                    │
//!        ▼                    ▼
//! ┌──────────────┐     ┌──────────────┐
//! │   Service    │     │ Preferences  │
//! │ (transport)  │     │   (SQLite)   │
//! └──────────────┘     └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`types`]: `Version`, `UpdateStatus`, `RemoteVersioningSettingResult`
//! - [`settings`]: static configuration plus the latest remote thresholds
//! - [`cache`]: SQLite-backed preference store
//! - [`local_cache`]: persisted thresholds and recommendation scheduling
//! - [`debug_state`]: developer overrides and the mandatory debug lock
//! - [`registry`]: transport trait of the versions service
//! - [`registries`]: HTTP implementation of the versions service
//! - [`document`]: response envelope decoding and threshold mapping
//! - [`network`]: connectivity monitor
//! - [`fetcher`]: remote fetch with retries and an in-flight guard
//! - [`staleness`]: platform store staleness probe and policy
//! - [`error`]: error types of storage, fetch and probe

pub mod cache;
pub mod debug_state;
pub mod document;
pub mod error;
pub mod fetcher;
pub mod local_cache;
pub mod network;
pub mod registries;
pub mod registry;
pub mod settings;
pub mod staleness;
pub mod types;
