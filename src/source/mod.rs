//! Update channels and the actions that open them
//!
//! - [`update_source`]: channel enumeration with package ids and URI templates
//! - [`detector`]: prioritised discovery of channels available on the device
//! - [`command`]: ordered launch actions and the launcher seam
//! - [`factory`]: builds commands for the current or another application
//! - [`deeplink`]: QR authorisation link to application id mapping
//! - [`installer`]: redirects QR links to their target application

pub mod command;
pub mod deeplink;
pub mod detector;
pub mod factory;
pub mod installer;
pub mod update_source;
