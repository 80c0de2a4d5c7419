use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::client::{LimitAction, RateLimitPolicy};
use crate::constants::{
    CONFIG_FILE, DEFAULT_BLUEPRINT, DEFAULT_MAX_RETRIES, DEFAULT_REQUEST_TIMEOUT_SECS,
    GITHUB_GRAPHQL_URL, PORT_API_URL,
};
use crate::error::{SyncError, SyncResult};
use crate::models::PortCredentials;
use crate::sync_error;

/// One configuration layer. Every field is optional so layers can be merged.
#[derive(Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub token: Option<String>,
    pub org: Option<String>,
    pub port_client_id: Option<String>,
    pub port_client_secret: Option<String>,
    pub github_api_url: Option<String>,
    pub port_api_url: Option<String>,
    pub blueprint: Option<String>,
    pub include_email: Option<bool>,
    pub max_retries: Option<u32>,
    pub secondary_limit: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .field("org", &self.org)
            .field("port_client_id", &self.port_client_id.as_ref().map(|_| "[redacted]"))
            .field("port_client_secret", &self.port_client_secret.as_ref().map(|_| "[redacted]"))
            .field("github_api_url", &self.github_api_url)
            .field("port_api_url", &self.port_api_url)
            .field("blueprint", &self.blueprint)
            .field("include_email", &self.include_email)
            .field("max_retries", &self.max_retries)
            .field("secondary_limit", &self.secondary_limit)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Config {
    /// Read the layer provided by the environment.
    ///
    /// `INPUT_*` names are how an Actions runner exposes step inputs.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |names: &[&str]| {
            names
                .iter()
                .filter_map(|name| lookup(*name))
                .find(|value| !value.trim().is_empty())
        };

        Config {
            token: first(&["INPUT_TOKEN", "GITHUB_TOKEN"]),
            org: first(&["INPUT_ORG", "GITHUB_ORG"]),
            port_client_id: first(&["INPUT_PORT_CLIENT_ID", "PORT_CLIENT_ID"]),
            port_client_secret: first(&["INPUT_PORT_CLIENT_SECRET", "PORT_CLIENT_SECRET"]),
            github_api_url: first(&["TEAM_SYNC_GITHUB_API_URL"]),
            port_api_url: first(&["TEAM_SYNC_PORT_API_URL"]),
            blueprint: first(&["INPUT_BLUEPRINT"]),
            include_email: first(&["INPUT_INCLUDE_EMAIL"]).map(|v| parse_flag(&v)),
            max_retries: first(&["INPUT_MAX_RETRIES"]).and_then(|v| v.trim().parse().ok()),
            secondary_limit: first(&["INPUT_SECONDARY_LIMIT"]),
            request_timeout_secs: None,
        }
    }

    /// Overlay `other` on top of `self`; values set in `other` win.
    pub fn merge(self, other: Config) -> Config {
        Config {
            token: other.token.or(self.token),
            org: other.org.or(self.org),
            port_client_id: other.port_client_id.or(self.port_client_id),
            port_client_secret: other.port_client_secret.or(self.port_client_secret),
            github_api_url: other.github_api_url.or(self.github_api_url),
            port_api_url: other.port_api_url.or(self.port_api_url),
            blueprint: other.blueprint.or(self.blueprint),
            include_email: other.include_email.or(self.include_email),
            max_retries: other.max_retries.or(self.max_retries),
            secondary_limit: other.secondary_limit.or(self.secondary_limit),
            request_timeout_secs: other.request_timeout_secs.or(self.request_timeout_secs),
        }
    }

    /// Validate the merged layers into the settings a run needs.
    pub fn resolve(self) -> SyncResult<Settings> {
        let token = required(self.token, "token")?;
        let org = required(self.org, "org")?;
        let client_id = required(self.port_client_id, "port_client_id")?;
        let client_secret = required(self.port_client_secret, "port_client_secret")?;

        let secondary = match self.secondary_limit {
            Some(value) => value.parse::<LimitAction>()?,
            None => LimitAction::Abort,
        };
        let policy = RateLimitPolicy::default()
            .with_max_retries(self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES))
            .with_secondary_limit(secondary);

        Ok(Settings {
            token,
            org,
            credentials: PortCredentials {
                client_id,
                client_secret,
            },
            github_api_url: self
                .github_api_url
                .unwrap_or_else(|| GITHUB_GRAPHQL_URL.to_string()),
            port_api_url: self.port_api_url.unwrap_or_else(|| PORT_API_URL.to_string()),
            blueprint: self.blueprint.unwrap_or_else(|| DEFAULT_BLUEPRINT.to_string()),
            include_email: self.include_email.unwrap_or(false),
            policy,
            request_timeout: Duration::from_secs(
                self.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
        })
    }
}

/// Fully resolved configuration for one sync run.
#[derive(Clone)]
pub struct Settings {
    pub token: String,
    pub org: String,
    pub credentials: PortCredentials,
    pub github_api_url: String,
    pub port_api_url: String,
    pub blueprint: String,
    pub include_email: bool,
    pub policy: RateLimitPolicy,
    pub request_timeout: Duration,
}

impl Settings {
    /// Settings as JSON with every credential masked.
    pub fn redacted(&self) -> Value {
        json!({
            "token": mask(&self.token),
            "org": self.org,
            "port_client_id": mask(&self.credentials.client_id),
            "port_client_secret": "********",
            "github_api_url": self.github_api_url,
            "port_api_url": self.port_api_url,
            "blueprint": self.blueprint,
            "include_email": self.include_email,
            "max_retries": self.policy.max_retries,
            "secondary_limit": self.policy.on_secondary_limit.to_string(),
            "request_timeout_secs": self.request_timeout.as_secs(),
        })
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Settings({})", self.redacted())
    }
}

fn required(value: Option<String>, name: &str) -> SyncResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(sync_error!(ConfigError, "Input required and not supplied: {}", name)),
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        "********".to_string()
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 2..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_FILE))
}

/// Load a config file layer.
///
/// An explicitly given path must exist; the default path is optional.
pub fn load_config(path: Option<&Path>) -> SyncResult<Config> {
    let (config_path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => match default_config_path() {
            Some(p) => (p, false),
            None => return Ok(Config::default()),
        },
    };

    if !config_path.exists() {
        if explicit {
            return Err(SyncError::ConfigError(format!(
                "config file not found: {}",
                config_path.display()
            )));
        }
        return Ok(Config::default());
    }

    let config_str = fs::read_to_string(&config_path)?;
    serde_json::from_str(&config_str).map_err(|e| {
        SyncError::ConfigError(format!("invalid config file {}: {}", config_path.display(), e))
    })
}
