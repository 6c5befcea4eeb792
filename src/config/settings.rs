//! Configuration file support for kube-aws itself

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub colors: Colors,

    #[serde(default)]
    pub behavior: Behavior,
}

/// Default locations and formats for commands
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Defaults {
    #[serde(default = "default_cluster_config")]
    pub cluster_config: String,

    #[serde(default = "default_node_pools_dir")]
    pub node_pools_dir: String,

    #[serde(default)]
    pub output: OutputFormat,
}

/// Color and theme settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Colors {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Behavior settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Behavior {
    /// Validate node pools on separate threads
    #[serde(default = "default_true")]
    pub parallel_validation: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Yaml,
    Json,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Yaml
    }
}

// Default value functions
fn default_cluster_config() -> String {
    "cluster.yaml".to_string()
}

fn default_node_pools_dir() -> String {
    "node-pools".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            cluster_config: default_cluster_config(),
            node_pools_dir: default_node_pools_dir(),
            output: OutputFormat::default(),
        }
    }
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            enabled: default_true(),
        }
    }
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            parallel_validation: default_true(),
        }
    }
}

impl Settings {
    /// Load settings from file or return defaults
    pub fn load() -> Self {
        match Self::find_config_file() {
            Some(path) => Self::load_from_file(&path).unwrap_or_else(|e| {
                crate::log_warn!("Ignoring settings file: {:#}", e);
                Self::default()
            }),
            None => Self::default(),
        }
    }

    /// Load settings from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        let settings: Settings = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;

        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Find settings file in standard locations
    /// Priority:
    /// 1. .kube-aws.toml in current directory
    /// 2. ~/.config/kube-aws/config.toml (XDG config directory)
    fn find_config_file() -> Option<PathBuf> {
        let local_config = PathBuf::from(".kube-aws.toml");
        if local_config.exists() {
            return Some(local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("kube-aws").join("config.toml");
            if xdg_config.exists() {
                return Some(xdg_config);
            }
        }

        None
    }

    /// Save settings to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize settings")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write settings file: {}", path.display()))?;

        Ok(())
    }

    /// Write default settings to `path`, refusing to replace an existing file unless `force`
    pub fn init(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            anyhow::bail!(
                "Settings file already exists: {} (use --force to overwrite)",
                path.display()
            );
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        Settings::default().save(path)
    }

    /// Generate example settings file content
    pub fn example_config() -> Result<String> {
        let header = "# kube-aws settings file\n\
                      # Place this file at ~/.config/kube-aws/config.toml or .kube-aws.toml in your project\n\n";
        let body = toml::to_string_pretty(&Settings::default())
            .context("Failed to serialize default settings")?;

        Ok(format!("{}{}", header, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.defaults.cluster_config, "cluster.yaml");
        assert_eq!(settings.defaults.node_pools_dir, "node-pools");
        assert_eq!(settings.defaults.output, OutputFormat::Yaml);
        assert!(settings.colors.enabled);
        assert!(settings.behavior.parallel_validation);
    }

    #[test]
    fn test_settings_deserialization() {
        let toml_str = r#"
[defaults]
cluster_config = "prod/cluster.yaml"
output = "json"

[colors]
enabled = false

[behavior]
parallel_validation = false
"#;
        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.defaults.cluster_config, "prod/cluster.yaml");
        assert_eq!(settings.defaults.node_pools_dir, "node-pools");
        assert_eq!(settings.defaults.output, OutputFormat::Json);
        assert!(!settings.colors.enabled);
        assert!(!settings.behavior.parallel_validation);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.defaults.node_pools_dir = "pools".to_string();
        settings.save(&path).unwrap();

        let loaded = Settings::load_from_file(&path).unwrap();
        assert_eq!(loaded.defaults.node_pools_dir, "pools");
    }

    #[test]
    fn test_init_writes_defaults_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kube-aws").join("config.toml");

        Settings::init(&path, false).unwrap();
        let loaded = Settings::load_from_file(&path).unwrap();
        assert_eq!(loaded.defaults.cluster_config, "cluster.yaml");

        fs::write(&path, "[colors]\nenabled = false\n").unwrap();
        assert!(Settings::init(&path, false).is_err());
        assert!(!Settings::load_from_file(&path).unwrap().colors.enabled);

        Settings::init(&path, true).unwrap();
        assert!(Settings::load_from_file(&path).unwrap().colors.enabled);
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[defaults\n").unwrap();
        assert!(Settings::load_from_file(&path).is_err());
    }

    #[test]
    fn test_example_config() {
        let example = Settings::example_config().unwrap();
        assert!(example.contains("kube-aws settings"));
        assert!(example.contains("[defaults]"));
        assert!(example.contains("[colors]"));
        assert!(example.contains("[behavior]"));
    }
}
