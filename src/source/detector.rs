//! Prioritised discovery of update channels available on the device

use std::collections::HashSet;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;
use tracing::debug;

use crate::source::update_source::UpdateSource;

/// Device stores in their fixed sub-order
const DEVICE_STORES: [UpdateSource; 6] = [
    UpdateSource::AppGallery,
    UpdateSource::GetApps,
    UpdateSource::GalaxyStore,
    UpdateSource::RuStore,
    UpdateSource::NashStore,
    UpdateSource::SunmiStore,
];

/// Package queries answered by the device
#[cfg_attr(test, automock)]
pub trait PackageInspector: Send + Sync {
    /// Package that installed the current application, if known
    fn installer_package(&self) -> Option<String>;

    fn is_installed(&self, package_id: &str) -> bool;
}

/// [`PackageInspector`] over a fixed set of installed packages
#[derive(Debug, Clone, Default)]
pub struct StaticPackageInspector {
    installed: HashSet<String>,
    installer: Option<String>,
}

impl StaticPackageInspector {
    pub fn new(
        installed: impl IntoIterator<Item = impl Into<String>>,
        installer: Option<String>,
    ) -> Self {
        Self {
            installed: installed.into_iter().map(Into::into).collect(),
            installer,
        }
    }
}

impl PackageInspector for StaticPackageInspector {
    fn installer_package(&self) -> Option<String> {
        self.installer.clone()
    }

    fn is_installed(&self, package_id: &str) -> bool {
        self.installed.contains(package_id)
    }
}

/// Resolves update channels in priority order:
///
/// 1. the channel that installed the application
/// 2. the family market
/// 3. Google Play
/// 4. device stores
/// 5. the web portal, always present
///
/// A store is viable only if it is allow-listed and installed.
pub struct UpdateSourceResolver {
    inspector: Arc<dyn PackageInspector>,
    allowed: Vec<UpdateSource>,
}

impl UpdateSourceResolver {
    pub fn new(inspector: Arc<dyn PackageInspector>, allowed: Vec<UpdateSource>) -> Self {
        Self { inspector, allowed }
    }

    pub fn inspector(&self) -> &Arc<dyn PackageInspector> {
        &self.inspector
    }

    pub fn locate_all(&self) -> Vec<UpdateSource> {
        let candidates = std::iter::once(self.installer_source())
            .chain(std::iter::once(self.viable(UpdateSource::FamilyMarket)))
            .chain(std::iter::once(self.viable(UpdateSource::GooglePlay)))
            .chain(DEVICE_STORES.into_iter().map(|store| self.viable(store)))
            .chain(std::iter::once(Some(UpdateSource::WebPortal)))
            .flatten();

        let mut sources = Vec::new();
        for source in candidates {
            if !sources.contains(&source) {
                sources.push(source);
            }
        }
        debug!("Located update sources {:?}", sources);
        sources
    }

    fn installer_source(&self) -> Option<UpdateSource> {
        let installer = self.inspector.installer_package()?;
        // installer may have been disabled or removed since
        UpdateSource::find_by_package(&installer).and_then(|source| self.viable(source))
    }

    fn viable(&self, source: UpdateSource) -> Option<UpdateSource> {
        if !self.allowed.contains(&source) {
            return None;
        }
        self.inspector
            .is_installed(source.package_id())
            .then_some(source)
    }
}
