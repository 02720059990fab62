//! Turns resolved update sources into launchable commands

use std::sync::Arc;

use crate::source::command::{LaunchTarget, UpdateAction, UpdateCommand};
use crate::source::detector::UpdateSourceResolver;
use crate::source::update_source::UpdateSource;
use crate::version::settings::SettingsHolder;

pub struct UpdateCommandBuilder {
    settings: Arc<SettingsHolder>,
    resolver: UpdateSourceResolver,
}

impl UpdateCommandBuilder {
    pub fn new(settings: Arc<SettingsHolder>, resolver: UpdateSourceResolver) -> Self {
        Self { settings, resolver }
    }

    pub fn resolver(&self) -> &UpdateSourceResolver {
        &self.resolver
    }

    /// Command updating the current application. The flag tells whether
    /// Google Play is among the sources.
    pub fn create(&self) -> (UpdateCommand, bool) {
        let sources = self.resolver.locate_all();
        let has_google_play = sources.contains(&UpdateSource::GooglePlay);
        let command = self.build(&sources, self.settings.clean_app_id());
        (command, has_google_play)
    }

    /// Command installing or updating another application of the family
    pub fn create_for(&self, clean_app_id: &str) -> UpdateCommand {
        self.build(&self.resolver.locate_all(), clean_app_id)
    }

    fn build(&self, sources: &[UpdateSource], app_id: &str) -> UpdateCommand {
        let actions = sources
            .iter()
            .map(|&source| UpdateAction {
                source,
                target: self.target(source, app_id),
            })
            .collect();
        UpdateCommand::new(actions)
    }

    fn target(&self, source: UpdateSource, app_id: &str) -> LaunchTarget {
        match source {
            UpdateSource::WebPortal => LaunchTarget::WebPage {
                url: source.build_url(app_id),
                embedded: self.settings.config().embedded_web_viewer,
            },
            store => LaunchTarget::Store {
                package: store.package_id().to_string(),
                uri: store.build_uri(app_id),
            },
        }
    }
}
