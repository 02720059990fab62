use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Preference store lock poisoned")]
    LockPoisoned,
}

/// Failure classes that mean "the device is offline or the host refuses us"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityKind {
    ConnectionLimit,
    NoInternet,
    Timeout,
    Unauthorized,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Connectivity error: {0:?}")]
    Connectivity(ConnectivityKind),

    #[error("Unexpected status: {0}")]
    Status(u16),

    #[error("Service error: {0}")]
    Service(String),

    #[error("Unexpected artifact {found:?}, expected {expected:?}")]
    UnexpectedArtifact { found: String, expected: String },

    #[error("Decoded versions document is empty")]
    EmptyPayload,

    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl FetchError {
    /// Failure caused by missing connectivity rather than by the payload
    pub fn is_connectivity(&self) -> bool {
        match self {
            FetchError::Connectivity(_) => true,
            FetchError::Network(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Store is unavailable: {0}")]
    Unavailable(String),

    #[error("Store request failed: {0}")]
    Request(String),
}
