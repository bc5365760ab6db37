use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// What happens to the fences of a build-artifact block once its script
/// has been handed to the build tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClosingFence {
    /// Keep both fences; only the script body disappears.
    #[default]
    Verbatim,
    /// Remove the whole block from the page.
    Suppress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Extract and run `.build-artifact` blocks.
    pub enabled: bool,
    /// Program and leading arguments; the script path is appended.
    pub command: Vec<String>,
    pub script_name: String,
    pub closing_fence: ClosingFence,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            command: vec!["make".to_string(), "-f".to_string()],
            script_name: "Makefile".to_string(),
            closing_fence: ClosingFence::Verbatim,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplConfig {
    /// Append recorded session output after `.repl` blocks.
    pub enabled: bool,
    /// Replaces the extension of the session file to locate its output.
    pub output_suffix: String,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            output_suffix: ".out.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub enabled: bool,
    pub command: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: vec!["entangled".to_string(), "sync".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory session files and build commands are resolved against.
    pub project_root: PathBuf,
    pub docs_dir: PathBuf,
    pub site_dir: PathBuf,
    pub build: BuildConfig,
    pub repl: ReplConfig,
    pub sync: SyncConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            docs_dir: PathBuf::from("docs"),
            site_dir: PathBuf::from("site"),
            build: BuildConfig::default(),
            repl: ReplConfig::default(),
            sync: SyncConfig::default(),
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        config.expand_paths();

        Ok(Some(config))
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/markdown-entangled");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Resolve a path relative to `project_root`, leaving absolute paths alone.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    pub fn docs_path(&self) -> PathBuf {
        self.resolve(&self.docs_dir)
    }

    pub fn site_path(&self) -> PathBuf {
        self.resolve(&self.site_dir)
    }

    fn expand_paths(&mut self) {
        for path in [
            &mut self.project_root,
            &mut self.docs_dir,
            &mut self.site_dir,
        ] {
            if let Some(expanded) = Self::expand_path(path) {
                *path = expanded;
            }
        }
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
