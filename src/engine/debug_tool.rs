//! Developer hooks for exercising the update flow on a test device

use crate::version::types::UpdateStatus;

pub trait VersioningDebugTool {
    /// Installed application version
    fn real_version(&self) -> String;

    /// Version the engine currently judges compatibility by
    fn debug_version(&self) -> String;

    /// Status under test
    fn debug_status(&self) -> UpdateStatus;

    fn apply_debug_version(&self, version: &str);

    fn apply_update_status(&self, status: UpdateStatus);

    /// Apply a pending version and status edit at once.
    ///
    /// Ignored when `version` is blank or equals the installed version.
    fn apply_debug_settings(&self, version: &str, status: UpdateStatus) {
        if version.trim().is_empty() || version == self.real_version() {
            return;
        }
        self.apply_update_status(status);
        self.apply_debug_version(version);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTool {
        calls: Mutex<Vec<String>>,
    }

    impl VersioningDebugTool for RecordingTool {
        fn real_version(&self) -> String {
            "23.1".to_string()
        }

        fn debug_version(&self) -> String {
            "23.1".to_string()
        }

        fn debug_status(&self) -> UpdateStatus {
            UpdateStatus::Recommended
        }

        fn apply_debug_version(&self, version: &str) {
            self.calls.lock().unwrap().push(format!("version {version}"));
        }

        fn apply_update_status(&self, status: UpdateStatus) {
            self.calls.lock().unwrap().push(format!("status {status}"));
        }
    }

    #[test]
    fn apply_debug_settings_applies_status_before_version() {
        let tool = RecordingTool::default();

        tool.apply_debug_settings("20.0", UpdateStatus::Mandatory);

        assert_eq!(
            *tool.calls.lock().unwrap(),
            vec!["status mandatory".to_string(), "version 20.0".to_string()]
        );
    }

    #[test]
    fn apply_debug_settings_ignores_blank_or_real_version() {
        let tool = RecordingTool::default();

        tool.apply_debug_settings("  ", UpdateStatus::Mandatory);
        tool.apply_debug_settings("23.1", UpdateStatus::Mandatory);

        assert!(tool.calls.lock().unwrap().is_empty());
    }
}
