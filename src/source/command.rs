//! Ordered launch actions of an update

#[cfg(test)]
use mockall::automock;
use thiserror::Error;
use tracing::{debug, warn};

use crate::source::update_source::UpdateSource;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("No handler for {0}")]
    NoHandler(String),

    #[error("Launch rejected: {0}")]
    Rejected(String),
}

/// What the host platform should open
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchTarget {
    /// Store application `package` opened at `uri`
    Store { package: String, uri: String },
    /// Web page, in the embedded viewer when `embedded` is set
    WebPage { url: String, embedded: bool },
    /// Another installed application, optionally handed the link that led there
    InstalledApp { package: String, data: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateAction {
    pub source: UpdateSource,
    pub target: LaunchTarget,
}

/// Platform seam that actually opens a [`LaunchTarget`]
#[cfg_attr(test, automock)]
pub trait ActionLauncher: Send + Sync {
    fn launch(&self, target: &LaunchTarget) -> Result<(), LaunchError>;
}

/// Update actions in descending priority
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateCommand {
    actions: Vec<UpdateAction>,
}

impl UpdateCommand {
    pub fn new(actions: Vec<UpdateAction>) -> Self {
        Self { actions }
    }

    pub fn actions(&self) -> &[UpdateAction] {
        &self.actions
    }

    /// Launch actions in order until one succeeds.
    ///
    /// Returns the identifier of the source that was opened, `None` if every
    /// launch failed.
    pub fn run(&self, launcher: &dyn ActionLauncher) -> Option<String> {
        for action in &self.actions {
            match launcher.launch(&action.target) {
                Ok(()) => {
                    debug!("Opened update source {}", action.source);
                    return Some(action.source.as_str().to_string());
                }
                Err(e) => warn!("Failed to open update source {}: {}", action.source, e),
            }
        }
        None
    }
}
