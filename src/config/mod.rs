//! Configuration management for `iterion`.
//!
//! Configuration is loaded from YAML files and merged in order, later
//! layers winning:
//! - Built-in defaults
//! - User config (`$XDG_CONFIG_HOME/iterion/config.yaml`, falling back to
//!   `~/.config/iterion/config.yaml`)
//! - Workspace config (`.iterion/config.yaml` in the working directory)
//! - Environment (`ITERION_ORG`, `ITERION_MODEL`, `ITERION_SEED`)
//! - Command-line overrides

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use iterion_lib::assistant::{DEFAULT_API_KEY_ENV, DEFAULT_ENDPOINT, DEFAULT_MODEL};
use iterion_lib::metrics::DEFAULT_DELIVERY_LIMIT;

pub const WORKSPACE_CONFIG: &str = ".iterion/config.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Invalid config value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssistantConfig {
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub endpoint: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardConfig {
    pub delivery_limit: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            delivery_limit: DEFAULT_DELIVERY_LIMIT,
        }
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Config {
    /// Organization id or name used when `--org` is not given.
    pub default_org: Option<String>,
    /// JSON fixture to load instead of the demo workspace.
    pub seed: Option<PathBuf>,
    pub assistant: AssistantConfig,
    pub dashboard: DashboardConfig,
}

/// One config file, every key optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    pub default_org: Option<String>,
    pub seed: Option<PathBuf>,
    pub assistant: AssistantLayer,
    pub dashboard: DashboardLayer,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssistantLayer {
    pub model: Option<String>,
    pub api_key_env: Option<String>,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardLayer {
    pub delivery_limit: Option<usize>,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub org: Option<String>,
    pub seed: Option<PathBuf>,
    pub model: Option<String>,
}

impl Config {
    /// Load configuration for the current process.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read or
    /// parsed, or a value is out of range.
    pub fn load(overrides: &CliOverrides) -> Result<Self, ConfigError> {
        let workspace = std::env::current_dir()
            .ok()
            .map(|dir| dir.join(WORKSPACE_CONFIG));
        Self::load_from(
            user_config_path().as_deref(),
            workspace.as_deref(),
            |key| std::env::var(key).ok(),
            overrides,
        )
    }

    /// Load with explicit file locations and environment lookup.
    ///
    /// Missing files are skipped.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`].
    pub fn load_from<F>(
        user: Option<&Path>,
        workspace: Option<&Path>,
        env: F,
        overrides: &CliOverrides,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        for path in [user, workspace].into_iter().flatten() {
            if let Some(layer) = read_layer(path)? {
                debug!(path = %path.display(), "applying config file");
                config.apply(layer);
            }
        }
        config.apply_env(env);
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn apply(&mut self, layer: ConfigLayer) {
        if layer.default_org.is_some() {
            self.default_org = layer.default_org;
        }
        if layer.seed.is_some() {
            self.seed = layer.seed;
        }
        if let Some(model) = layer.assistant.model {
            self.assistant.model = model;
        }
        if let Some(var) = layer.assistant.api_key_env {
            self.assistant.api_key_env = var;
        }
        if let Some(endpoint) = layer.assistant.endpoint {
            self.assistant.endpoint = endpoint;
        }
        if let Some(limit) = layer.dashboard.delivery_limit {
            self.dashboard.delivery_limit = limit;
        }
    }

    fn apply_env<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        if let Some(org) = non_empty("ITERION_ORG") {
            self.default_org = Some(org);
        }
        if let Some(model) = non_empty("ITERION_MODEL") {
            self.assistant.model = model;
        }
        if let Some(seed) = non_empty("ITERION_SEED") {
            self.seed = Some(PathBuf::from(seed));
        }
    }

    fn apply_overrides(&mut self, overrides: &CliOverrides) {
        if let Some(ref org) = overrides.org {
            self.default_org = Some(org.clone());
        }
        if let Some(ref seed) = overrides.seed {
            self.seed = Some(seed.clone());
        }
        if let Some(ref model) = overrides.model {
            self.assistant.model.clone_from(model);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.dashboard.delivery_limit == 0 {
            return Err(ConfigError::Invalid {
                key: "dashboard.delivery_limit",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.assistant.model.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "assistant.model",
                reason: "cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// `$XDG_CONFIG_HOME/iterion/config.yaml` or `~/.config/iterion/config.yaml`.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(base.join("iterion").join("config.yaml"))
}

fn read_layer(path: &Path) -> Result<Option<ConfigLayer>, ConfigError> {
    if !path.is_file() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if raw.trim().is_empty() {
        return Ok(Some(ConfigLayer::default()));
    }
    serde_yaml::from_str(&raw)
        .map(Some)
        .map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = Config::load_from(None, None, no_env, &CliOverrides::default()).unwrap();
        assert_eq!(config.assistant.model, "gemini-3-pro-preview");
        assert_eq!(config.assistant.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.dashboard.delivery_limit, 6);
        assert!(config.default_org.is_none());
    }

    #[test]
    fn test_workspace_overrides_user() {
        let dir = TempDir::new().unwrap();
        let user = write(
            &dir,
            "user.yaml",
            "default_org: p_1\nassistant:\n  model: user-model\n",
        );
        let workspace = write(&dir, "ws.yaml", "default_org: p_2\ndashboard:\n  delivery_limit: 3\n");

        let config =
            Config::load_from(Some(&user), Some(&workspace), no_env, &CliOverrides::default())
                .unwrap();
        assert_eq!(config.default_org.as_deref(), Some("p_2"));
        assert_eq!(config.assistant.model, "user-model");
        assert_eq!(config.dashboard.delivery_limit, 3);
    }

    #[test]
    fn test_env_then_cli_precedence() {
        let dir = TempDir::new().unwrap();
        let user = write(&dir, "user.yaml", "default_org: p_1\n");
        let env: HashMap<&str, &str> = [("ITERION_ORG", "p_2"), ("ITERION_MODEL", "env-model")]
            .into_iter()
            .collect();
        let lookup = |key: &str| env.get(key).map(|v| (*v).to_string());

        let config =
            Config::load_from(Some(&user), None, lookup, &CliOverrides::default()).unwrap();
        assert_eq!(config.default_org.as_deref(), Some("p_2"));
        assert_eq!(config.assistant.model, "env-model");

        let overrides = CliOverrides {
            org: Some("DataOps Core".into()),
            model: Some("cli-model".into()),
            ..Default::default()
        };
        let config = Config::load_from(Some(&user), None, lookup, &overrides).unwrap();
        assert_eq!(config.default_org.as_deref(), Some("DataOps Core"));
        assert_eq!(config.assistant.model, "cli-model");
    }

    #[test]
    fn test_missing_and_empty_files_are_fine() {
        let dir = TempDir::new().unwrap();
        let empty = write(&dir, "empty.yaml", "");
        let missing = dir.path().join("missing.yaml");
        let config =
            Config::load_from(Some(&missing), Some(&empty), no_env, &CliOverrides::default())
                .unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_yaml_reports_path() {
        let dir = TempDir::new().unwrap();
        let bad = write(&dir, "bad.yaml", "dashboard: [not, a, map]\n");
        let err =
            Config::load_from(Some(&bad), None, no_env, &CliOverrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
        assert!(err.to_string().contains("bad.yaml"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let dir = TempDir::new().unwrap();
        let bad = write(&dir, "typo.yaml", "defualt_org: p_1\n");
        assert!(Config::load_from(Some(&bad), None, no_env, &CliOverrides::default()).is_err());
    }

    #[test]
    fn test_zero_delivery_limit_rejected() {
        let dir = TempDir::new().unwrap();
        let bad = write(&dir, "zero.yaml", "dashboard:\n  delivery_limit: 0\n");
        let err =
            Config::load_from(Some(&bad), None, no_env, &CliOverrides::default()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "dashboard.delivery_limit",
                ..
            }
        ));
    }
}
