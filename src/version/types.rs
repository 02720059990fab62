//! Value types shared by the compatibility engine

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

const VERSION_DELIMITER: char = '.';

static VERSION_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(\.[0-9]+)*$").expect("valid version pattern"));

/// Dot-delimited application version such as `"23.4117"` or `"1.2.0"`.
///
/// Comparison is component-wise on numeric values of any length; missing
/// trailing components count as zero, so `1.2` and `1.2.0` are equal.
/// Malformed input never panics: it is logged on construction, reported as
/// unspecified and its unparseable components compare as zero.
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    well_formed: bool,
}

impl Version {
    pub fn new(version: impl Into<String>) -> Self {
        let raw = version.into();
        let well_formed = VERSION_FORMAT.is_match(raw.trim());
        if raw.is_empty() {
            warn!("Version can not be an empty string");
        } else if !well_formed {
            warn!("Invalid version format: {:?}", raw);
        }
        Self { raw, well_formed }
    }

    /// The original textual representation
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True when the version carries no meaningful value: blank, malformed
    /// or consisting of zero components only (`0.0`, `0.0.0`).
    pub fn is_unspecified(&self) -> bool {
        !self.well_formed || self.components().all(|component| component.is_zero())
    }

    fn components(&self) -> impl Iterator<Item = Component<'_>> {
        self.raw
            .trim()
            .split(VERSION_DELIMITER)
            .map(Component::parse)
    }

    /// Components with trailing zeros removed; equal versions normalize equally.
    fn normalized(&self) -> Vec<Component<'_>> {
        let mut parts: Vec<Component<'_>> = self.components().collect();
        while parts.last().is_some_and(|part| part.is_zero()) {
            parts.pop();
        }
        parts
    }
}

/// Digits of one version component without leading zeros, empty for zero.
/// Kept as text so components wider than any integer still compare exactly.
#[derive(Debug, PartialEq, Eq, Hash)]
struct Component<'a>(&'a str);

impl<'a> Component<'a> {
    /// Non-numeric parts count as zero
    fn parse(part: &'a str) -> Self {
        if part.bytes().all(|b| b.is_ascii_digit()) {
            Component(part.trim_start_matches('0'))
        } else {
            Component("")
        }
    }

    fn is_zero(&self) -> bool {
        self.0.is_empty()
    }
}

impl Ord for Component<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(other.0))
    }
}

impl PartialOrd for Component<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<&str> for Version {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Version {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        // After trimming trailing zeros, lexicographic order equals the
        // zero-padded component-wise order.
        self.normalized().cmp(&other.normalized())
    }
}

/// Outcome of a compatibility check, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum UpdateStatus {
    /// No update is required
    #[default]
    Empty,
    /// A newer build is available, the user is nagged
    Recommended,
    /// The installed build is too old to keep running
    Mandatory,
}

impl UpdateStatus {
    /// Stable identifier used for persistence
    pub fn id(self) -> i64 {
        match self {
            UpdateStatus::Empty => 0,
            UpdateStatus::Recommended => 1,
            UpdateStatus::Mandatory => 2,
        }
    }

    /// Unknown identifiers map to [`UpdateStatus::Empty`]
    pub fn from_id(id: i64) -> Self {
        match id {
            1 => UpdateStatus::Recommended,
            2 => UpdateStatus::Mandatory,
            _ => UpdateStatus::Empty,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateStatus::Empty => "empty",
            UpdateStatus::Recommended => "recommended",
            UpdateStatus::Mandatory => "mandatory",
        }
    }
}

impl std::str::FromStr for UpdateStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "empty" => Ok(UpdateStatus::Empty),
            "recommended" => Ok(UpdateStatus::Recommended),
            "mandatory" => Ok(UpdateStatus::Mandatory),
            _ => Err(()),
        }
    }
}

impl fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thresholds published by the versions service for the current application
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteVersioningSettingResult {
    /// Minimum compatible version
    pub critical: Option<Version>,
    /// Latest published version
    pub recommended: Option<Version>,
}

impl RemoteVersioningSettingResult {
    pub fn new(critical: Option<Version>, recommended: Option<Version>) -> Self {
        Self {
            critical,
            recommended,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// No thresholds are known for this application
    pub fn is_empty(&self) -> bool {
        self.critical.is_none() && self.recommended.is_none()
    }
}
