//! Mapping of QR authorisation links to target applications
//!
//! Links look like `https://online.sbis.ru/auth/qrcode/sbis/?token=...`, the
//! segment before the query names the application the token belongs to.

use crate::version::settings::APP_DEBUG_SUFFIX;

const AUTH_SEGMENT: &str = "/auth/qrcode/";
const TOKEN_PARAM: &str = "?token=";

pub struct DeepLinkConverter {
    debug_build: bool,
}

impl DeepLinkConverter {
    pub fn new(debug_build: bool) -> Self {
        Self { debug_build }
    }

    /// Application id the link is addressed to, with the debug suffix in
    /// debug builds
    pub fn parse(&self, url: &str) -> Option<String> {
        if url.trim().is_empty() || !url.contains(AUTH_SEGMENT) || !url.contains(TOKEN_PARAM) {
            return None;
        }
        let segments: Vec<&str> = url.split('/').collect();
        let alias = segments.iter().rev().nth(1)?;
        let clean_id = app_id_for_alias(alias)?;
        if self.debug_build {
            Some(format!("{clean_id}{APP_DEBUG_SUFFIX}"))
        } else {
            Some(clean_id.to_string())
        }
    }
}

/// Clean application id of a link alias
pub fn app_id_for_alias(alias: &str) -> Option<&'static str> {
    let app_id = match alias {
        "sbis" | "SbisCommunicatorMobile" => "ru.tensor.sbis.droid.saby",
        "sbisRetail" | "SbisRetailMobile" => "ru.tensor.sbis.retail",
        "sbisPresto" | "SbisPrestoMobile" => "ru.tensor.sbis.presto",
        "sbisBusiness" | "SbisBusinessMobile" => "ru.tensor.sbis.business",
        "sbisCourier" | "SbisCourierMobile" => "ru.tensor.sbis.courier.saby",
        "sbisStorekeeper" | "SbisStorekeeperMobile" => "ru.tensor.sbis.storekeeper",
        "sbisSabyget" | "SbisShowcaseMobile" => "ru.tensor.showcase",
        "sbisWaiter" | "SbisWaiterMobile" => "ru.tensor.waiter.saby",
        "sbisCookScreen" | "SbisCookScreenMobile" => "ru.tensor.cookscreen",
        "sbisSms" | "SbisSmsMobile" => "ru.tensor.sbis.sms",
        "sbisSabyMy" | "SbisMySabyMobile" => "ru.tensor.saby.my",
        "sbisSabyKnow" | "SbisSabyKnowMobile" => "ru.tensor.saby.know",
        "SbisHallScreenMobile" => "ru.tensor.hallscreen",
        "SbisSabyLiteMobile" => "ru.tensor.saby.lite",
        "SbisSabyDiskMobile" => "ru.tensor.saby.disk",
        "SbisSabyAdminMobile" => "ru.tensor.sbis.sabyadmin",
        _ => return None,
    };
    Some(app_id)
}
