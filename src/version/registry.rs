//! Transport seam for fetching the versions document

#[cfg(test)]
use mockall::automock;

use crate::version::error::FetchError;

/// Trait for requesting the raw versions report from the versions service
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait VersionService: Send + Sync {
    /// Requests the versions report
    ///
    /// # Returns
    /// * `Ok(String)` - Raw response body containing the report envelope
    /// * `Err(FetchError)` - Transport failure, classified as connectivity
    ///   related where possible
    async fn request_versions_report(&self) -> Result<String, FetchError>;
}
