//! Update channels and their launch templates

use serde::Deserialize;
use tracing::debug;

/// Placeholder replaced with the target application id in URI templates
pub const PACKAGE_NAME_PLACEHOLDER: &str = "<package_name>";

/// Distribution channel able to install or update an application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateSource {
    /// Store operated by the application family
    FamilyMarket,
    GooglePlay,
    /// Huawei
    AppGallery,
    /// Xiaomi
    GetApps,
    /// Samsung
    GalaxyStore,
    RuStore,
    NashStore,
    /// Sunmi POS terminals
    SunmiStore,
    /// Application catalogue on the web portal
    WebPortal,
}

impl UpdateSource {
    pub const ALL: [UpdateSource; 9] = [
        UpdateSource::FamilyMarket,
        UpdateSource::GooglePlay,
        UpdateSource::AppGallery,
        UpdateSource::GetApps,
        UpdateSource::GalaxyStore,
        UpdateSource::RuStore,
        UpdateSource::NashStore,
        UpdateSource::SunmiStore,
        UpdateSource::WebPortal,
    ];

    /// Stable identifier, also reported to analytics
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateSource::FamilyMarket => "family_market",
            UpdateSource::GooglePlay => "google_play",
            UpdateSource::AppGallery => "app_gallery",
            UpdateSource::GetApps => "get_apps",
            UpdateSource::GalaxyStore => "galaxy_store",
            UpdateSource::RuStore => "ru_store",
            UpdateSource::NashStore => "nash_store",
            UpdateSource::SunmiStore => "sunmi_store",
            UpdateSource::WebPortal => "web_portal",
        }
    }

    /// Package of the store application, empty for the web portal
    pub fn package_id(&self) -> &'static str {
        match self {
            UpdateSource::FamilyMarket => "ru.tensor.sbis.appmarket",
            UpdateSource::GooglePlay => "com.android.vending",
            UpdateSource::GalaxyStore => "com.sec.android.app.samsungapps",
            UpdateSource::AppGallery => "com.huawei.appmarket",
            UpdateSource::GetApps => "com.xiaomi.mipicks",
            UpdateSource::RuStore => "ru.vk.store",
            UpdateSource::NashStore => "com.nashstore",
            UpdateSource::SunmiStore => "woyou.market",
            UpdateSource::WebPortal => "",
        }
    }

    pub fn uri_template(&self) -> &'static str {
        match self {
            UpdateSource::FamilyMarket => "sabymarket://details?id=<package_name>",
            UpdateSource::GooglePlay | UpdateSource::RuStore => {
                "market://details?id=<package_name>"
            }
            UpdateSource::GalaxyStore => "samsungapps://ProductDetail/<package_name>",
            UpdateSource::AppGallery => "appmarket://details?id=<package_name>",
            UpdateSource::GetApps => {
                "mimarket://details?id=<package_name>&back=true|false&ref=refstr&startDownload=true"
            }
            UpdateSource::WebPortal => "https://sbis.ru/apps#<package_name>",
            UpdateSource::NashStore => "nashstore://details?id=<package_name>",
            UpdateSource::SunmiStore => {
                "market://woyou.market/appDetail?packageName=<package_name>&isUpdate=true"
            }
        }
    }

    /// Source whose store application has the given package id
    pub fn find_by_package(package_id: &str) -> Option<UpdateSource> {
        Self::ALL
            .into_iter()
            .find(|source| !source.package_id().is_empty() && source.package_id() == package_id)
    }

    /// Store URI opening the page of `app_id`
    pub fn build_uri(&self, app_id: &str) -> String {
        self.uri_template().replace(PACKAGE_NAME_PLACEHOLDER, app_id)
    }

    /// Portal URL anchored at the entry of `app_id`
    pub fn build_url(&self, app_id: &str) -> String {
        self.uri_template()
            .replace(PACKAGE_NAME_PLACEHOLDER, web_portal_anchor(app_id))
    }
}

impl std::str::FromStr for UpdateSource {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|source| source.as_str() == s)
            .ok_or(())
    }
}

impl std::fmt::Display for UpdateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anchor of an application on the web portal catalogue, empty if the
/// application is not published there
pub fn web_portal_anchor(app_id: &str) -> &'static str {
    match app_id {
        "ru.tensor.sbis.droid" | "ru.tensor.sbis.droid.saby" => "sbis",
        "ru.tensor.waiter" | "ru.tensor.sbis.waiter" | "ru.tensor.sbis.waiter.saby" => "waiter",
        "ru.tensor.sbis.courier" | "ru.tensor.sbis.courier.saby" => "courier",
        "ru.tensor.sbis.retail_app" => "cashbox",
        "ru.tensor.sbis.appmarket" => "sabyappmarket",
        "ru.tensor.sbis.business" => "bussiness",
        "ru.tensor.cookscreen" => "cookscreen",
        "ru.tensor.hallscreen" => "hallscreen",
        "ru.tensor.sbis.presto" => "presto",
        "ru.tensor.showcase" => "sabyget",
        "ru.tensor.saby.tasks" => "sabytasks",
        "ru.tensor.sbis.sms" => "sms",
        "ru.tensor.sbis.storekeeper" => "docs",
        "ru.tensor.saby.my" => "sabyMy",
        "ru.tensor.sbis.sabyadmin" => "SbisSabyAdminMobile",
        _ => {
            debug!("No web portal anchor for {}", app_id);
            ""
        }
    }
}
