use crate::integration::IntegrationConfig;
use crate::theme::ThemeVariant;
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const LOCAL_CONFIG: &str = "config.toml";
const ENV_PREFIX: &str = "INTEGRATIONS_";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid configuration: {0}")]
    Extract(#[from] Box<figment::Error>),
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to write settings: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub base_url: String,
    pub default_user: String,
    pub default_org: String,
    pub theme: ThemeVariant,
    pub request_timeout_secs: u64,
    pub notification_ttl_secs: u64,
    pub discard_stale_responses: bool,
    pub log_file: String,
    pub integrations: Vec<IntegrationConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            default_user: "TestUser".to_string(),
            default_org: "TestOrg".to_string(),
            theme: ThemeVariant::default(),
            request_timeout_secs: 30,
            notification_ttl_secs: 6,
            discard_stale_responses: true,
            log_file: "integrations.log".to_string(),
            integrations: Vec::new(),
        }
    }
}

impl Settings {
    /// Loads `config.toml` from the working directory, or from the per-user
    /// config directory when there is none, then applies `INTEGRATIONS_*`
    /// environment overrides. A missing file writes out the defaults.
    pub fn new() -> Result<Self, SettingsError> {
        let path = Self::config_path();
        if !path.exists() {
            Self::default().save_to(&path).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "could not write default settings");
            });
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        Self::figment(path)
            .extract()
            .map_err(|e| SettingsError::Extract(Box::new(e)))
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn config_path() -> PathBuf {
        let local = PathBuf::from(LOCAL_CONFIG);
        if local.exists() {
            return local;
        }
        ProjectDirs::from("dev", "integrations", "integrations")
            .map(|dirs| dirs.config_dir().join(LOCAL_CONFIG))
            .unwrap_or(local)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_secs(self.notification_ttl_secs)
    }
}
