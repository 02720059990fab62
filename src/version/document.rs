//! Decoding of the versions service response
//!
//! The service answers with an envelope whose `result` names the delivered
//! artifact and carries it base64-encoded:
//!
//! ```json
//! {"result": {"ИмяФайла": "android_versions.json", "Данные": "eyJ2ZXJzaW9ucyI6..."}}
//! ```
//!
//! The decoded artifact holds two dictionaries keyed by application id:
//! `versions` (minimum compatible versions) and `published_versions`
//! (latest published versions).

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::version::error::FetchError;
use crate::version::types::{RemoteVersioningSettingResult, Version};

/// Name of the artifact the service must deliver
pub const VERSION_FILE_NAME: &str = "android_versions.json";

/// Dictionary of critically compatible versions, e.g. `"ru.tensor.sbis.droid": "21.3119"`
pub const CRITICAL_DICTIONARY_KEY: &str = "versions";

/// Dictionary of versions published to the stores
pub const MARKET_DICTIONARY_KEY: &str = "published_versions";

#[derive(Debug, Deserialize)]
struct Envelope {
    result: Option<VersionFile>,
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct VersionFile {
    #[serde(rename = "ИмяФайла", default)]
    file_name: String,
    #[serde(rename = "Данные", default)]
    data: String,
}

/// Validate the envelope and decode the embedded versions document
pub fn decode_document(body: &str) -> Result<Value, FetchError> {
    let envelope: Envelope = serde_json::from_str(body.trim())?;
    let Some(file) = envelope.result else {
        let message = envelope
            .error
            .as_ref()
            .and_then(|error| error.get("message"))
            .and_then(Value::as_str)
            .unwrap_or("response has no result");
        return Err(FetchError::Service(message.to_string()));
    };

    if file.file_name != VERSION_FILE_NAME {
        return Err(FetchError::UnexpectedArtifact {
            found: file.file_name,
            expected: VERSION_FILE_NAME.to_string(),
        });
    }

    let encoded: String = file.data.split_whitespace().collect();
    let decoded = STANDARD.decode(encoded)?;
    let text = String::from_utf8_lossy(&decoded);
    let text = text.trim();
    if text.is_empty() {
        return Err(FetchError::EmptyPayload);
    }

    debug!("Decoded versions document: {}", text);
    Ok(serde_json::from_str(text)?)
}

/// Maps the versions document onto thresholds of one application
pub struct VersionMapper {
    clean_app_id: String,
}

impl VersionMapper {
    pub fn new(clean_app_id: impl Into<String>) -> Self {
        Self {
            clean_app_id: clean_app_id.into(),
        }
    }

    /// Missing dictionaries or application entries yield `None` thresholds
    pub fn map(&self, document: &Value) -> RemoteVersioningSettingResult {
        RemoteVersioningSettingResult::new(
            self.extract(document, CRITICAL_DICTIONARY_KEY),
            self.extract(document, MARKET_DICTIONARY_KEY),
        )
    }

    fn extract(&self, document: &Value, dictionary: &str) -> Option<Version> {
        let entry = document.get(dictionary)?.as_object()?.get(&self.clean_app_id)?;
        match entry {
            Value::String(version) => Some(Version::new(version.as_str())),
            Value::Number(version) => Some(Version::new(version.to_string())),
            other => {
                warn!(
                    "Unexpected {} entry for {}: {}",
                    dictionary, self.clean_app_id, other
                );
                None
            }
        }
    }
}
