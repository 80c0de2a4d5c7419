use std::path::PathBuf;

use crate::client::{GitHubClient, Governor, PortClient};
use crate::config::{load_config, Config, Settings};
use crate::error::SyncResult;
use crate::pipeline::Pipeline;

/// Central context for CLI operations: resolved settings and the clients built from them
pub struct CliContext {
    settings: Settings,
}

impl CliContext {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn github_client(&self) -> SyncResult<GitHubClient> {
        GitHubClient::new(
            &self.settings.github_api_url,
            &self.settings.token,
            self.settings.include_email,
            self.settings.request_timeout,
            Governor::new(self.settings.policy.clone()),
        )
    }

    pub fn port_client(&self) -> SyncResult<PortClient> {
        PortClient::new(
            &self.settings.port_api_url,
            &self.settings.blueprint,
            self.settings.request_timeout,
            Governor::new(self.settings.policy.clone()),
        )
    }

    /// Build the sync pipeline for the configured organization
    pub fn pipeline(&self) -> SyncResult<Pipeline> {
        Ok(Pipeline::new(
            self.github_client()?,
            self.port_client()?,
            &self.settings.org,
            self.settings.credentials.clone(),
        ))
    }
}

/// Builder for CLI contexts: config file, then environment, then explicit overrides
pub struct CliContextBuilder {
    config_path: Option<PathBuf>,
    use_env: bool,
    overrides: Config,
}

impl CliContextBuilder {
    pub fn new() -> Self {
        Self {
            config_path: None,
            use_env: true,
            overrides: Config::default(),
        }
    }

    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Skip the environment layer (used by tests).
    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    pub fn with_overrides(mut self, overrides: Config) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn build(self) -> SyncResult<CliContext> {
        let mut config = load_config(self.config_path.as_deref())?;
        if self.use_env {
            config = config.merge(Config::from_env());
        }
        let settings = config.merge(self.overrides).resolve()?;

        Ok(CliContext::new(settings))
    }
}

impl Default for CliContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
