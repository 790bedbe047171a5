use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::CondaEnvironment;
use crate::registry::anaconda::{DEFAULT_PY2_URL, DEFAULT_PY3_URL};
use crate::registry::pypi::DEFAULT_PYPI_URL;

/// Root configuration structure, deserialized from `.license-annotate/config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Package registry used for per-release lookups.
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Bulk license catalog pages for `environment.yml` mode.
    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Deserialize)]
pub struct RegistryConfig {
    /// Base URL of the PyPI JSON API.
    #[serde(default = "default_registry_url")]
    pub url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Number of manifest lines resolved concurrently.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_registry_url() -> String {
    DEFAULT_PYPI_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_batch_size() -> usize {
    32
}

fn default_user_agent() -> String {
    format!("license-annotate/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: default_registry_url(),
            timeout_secs: default_timeout_secs(),
            batch_size: default_batch_size(),
            user_agent: default_user_agent(),
        }
    }
}

impl RegistryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Batch size, never zero.
    pub fn batch_size(&self) -> usize {
        self.batch_size.max(1)
    }
}

#[derive(Debug, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_py2_url")]
    pub py2: String,
    #[serde(default = "default_py3_url")]
    pub py3: String,
}

fn default_py2_url() -> String {
    DEFAULT_PY2_URL.to_string()
}

fn default_py3_url() -> String {
    DEFAULT_PY3_URL.to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            py2: default_py2_url(),
            py3: default_py3_url(),
        }
    }
}

impl CatalogConfig {
    pub fn url_for(&self, environment: CondaEnvironment) -> &str {
        match environment {
            CondaEnvironment::Py2 => &self.py2,
            CondaEnvironment::Py3 => &self.py3,
        }
    }
}

/// Load the configuration, searching in order:
///
/// 1. `config_override` — path passed via `--config`
/// 2. `<manifest dir>/.license-annotate/config.toml`
/// 3. `~/.config/license-annotate/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(manifest_path: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let manifest_dir = manifest_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let project_config = manifest_dir.join(".license-annotate").join("config.toml");
    if project_config.exists() {
        return read_config(&project_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home
            .join(".config")
            .join("license-annotate")
            .join("config.toml");
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("invalid config {}", path.display()))
}
