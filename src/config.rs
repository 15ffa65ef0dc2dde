//! Engine configuration, persisted as TOML.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::rank::DEFAULT_TOP_N;

/// Which backend holds claims, counters and the ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FastBackend {
    /// Process memory; lost on exit.
    Memory,
    /// `fast.redb` in the data directory.
    #[default]
    Redb,
}

impl std::fmt::Display for FastBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FastBackend::Memory => write!(f, "memory"),
            FastBackend::Redb => write!(f, "redb"),
        }
    }
}

/// Configuration for the likerank engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Data directory for persistence. `None` for memory-only mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// Fast store backend when a data directory is set.
    #[serde(default)]
    pub fast_store: FastBackend,
    /// Upper bound on every store call, in milliseconds.
    #[serde(default = "default_op_timeout_ms")]
    pub op_timeout_ms: u64,
    /// Page size for top-N requests that do not name one.
    #[serde(default = "default_top_n")]
    pub default_top_n: usize,
    /// Threads serving store calls.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_op_timeout_ms() -> u64 {
    2_000
}
fn default_top_n() -> usize {
    DEFAULT_TOP_N
}
fn default_workers() -> usize {
    4
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            fast_store: FastBackend::default(),
            op_timeout_ms: default_op_timeout_ms(),
            default_top_n: default_top_n(),
            workers: default_workers(),
        }
    }
}

impl EngineConfig {
    /// A persistent config rooted at `data_dir` (other fields default).
    pub fn persistent(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
            ..Default::default()
        }
    }

    /// Per-call store timeout.
    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.op_timeout_ms == 0 {
            return Err(EngineError::InvalidConfig {
                message: "op_timeout_ms must be > 0".into(),
            });
        }
        if self.workers == 0 {
            return Err(EngineError::InvalidConfig {
                message: "workers must be > 0".into(),
            });
        }
        if self.default_top_n == 0 {
            return Err(EngineError::InvalidConfig {
                message: "default_top_n must be > 0".into(),
            });
        }
        Ok(())
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path).map_err(|e| EngineError::ConfigRead {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| EngineError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), EngineError> {
        let content = toml::to_string_pretty(self).map_err(|e| EngineError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| EngineError::ConfigWrite {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| EngineError::ConfigWrite {
            path: path.display().to_string(),
            source: e,
        })
    }
}

/// Where the CLI looks for its config file and keeps its data.
///
/// `LIKERANK_HOME` puts both under one directory. Otherwise the XDG base
/// directories are used, and without `HOME` everything goes to `.likerank`
/// under the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locations {
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
}

impl Locations {
    /// Resolve from the process environment.
    pub fn from_env() -> Self {
        Self::resolve(|key| std::env::var(key).ok())
    }

    /// Resolve using `lookup` to read environment variables.
    pub fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Self {
        // Empty values count as unset.
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty()).map(PathBuf::from);

        if let Some(home) = var("LIKERANK_HOME") {
            return Self::rooted(home);
        }
        let Some(home) = var("HOME") else {
            return Self::rooted(PathBuf::from(".likerank"));
        };
        let config_base = var("XDG_CONFIG_HOME").unwrap_or_else(|| home.join(".config"));
        let data_base = var("XDG_DATA_HOME").unwrap_or_else(|| home.join(".local/share"));
        Self {
            config_file: config_base.join("likerank").join("config.toml"),
            data_dir: data_base.join("likerank"),
        }
    }

    fn rooted(root: PathBuf) -> Self {
        Self {
            config_file: root.join("config.toml"),
            data_dir: root.join("data"),
        }
    }

    /// The config stored at `config_file`, or a persistent default rooted at
    /// `data_dir` when the file does not exist yet.
    pub fn load_config(&self) -> Result<EngineConfig, EngineError> {
        if self.config_file.exists() {
            EngineConfig::load(&self.config_file)
        } else {
            Ok(EngineConfig::persistent(&self.data_dir))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_top_n, 10);
        assert_eq!(config.fast_store, FastBackend::Redb);
        assert_eq!(config.op_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn zero_values_rejected() {
        for config in [
            EngineConfig {
                op_timeout_ms: 0,
                ..Default::default()
            },
            EngineConfig {
                workers: 0,
                ..Default::default()
            },
            EngineConfig {
                default_top_n: 0,
                ..Default::default()
            },
        ] {
            assert!(matches!(
                config.validate(),
                Err(EngineError::InvalidConfig { .. })
            ));
        }
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: EngineConfig = toml::from_str("fast_store = \"memory\"\n").unwrap();
        assert_eq!(config.fast_store, FastBackend::Memory);
        assert_eq!(config.op_timeout_ms, 2_000);
        assert_eq!(config.workers, 4);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = EngineConfig {
            op_timeout_ms: 500,
            ..EngineConfig::persistent(dir.path().join("data"))
        };
        config.save(&path).unwrap();
        assert_eq!(EngineConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "workers = \"many\"").unwrap();
        assert!(matches!(
            EngineConfig::load(&path),
            Err(EngineError::ConfigParse { .. })
        ));
    }

    fn env<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn likerank_home_roots_everything() {
        let locations = Locations::resolve(env(&[
            ("LIKERANK_HOME", "/srv/likerank"),
            ("HOME", "/home/ada"),
            ("XDG_CONFIG_HOME", "/home/ada/cfg"),
        ]));
        assert_eq!(
            locations,
            Locations {
                config_file: PathBuf::from("/srv/likerank/config.toml"),
                data_dir: PathBuf::from("/srv/likerank/data"),
            }
        );
    }

    #[test]
    fn xdg_dirs_with_home_fallbacks() {
        let locations = Locations::resolve(env(&[
            ("HOME", "/home/ada"),
            ("XDG_DATA_HOME", "/var/data"),
            ("XDG_CONFIG_HOME", ""),
        ]));
        assert_eq!(
            locations.config_file,
            PathBuf::from("/home/ada/.config/likerank/config.toml")
        );
        assert_eq!(locations.data_dir, PathBuf::from("/var/data/likerank"));
    }

    #[test]
    fn no_home_falls_back_to_working_dir() {
        let locations = Locations::resolve(env(&[]));
        assert_eq!(locations.config_file, PathBuf::from(".likerank/config.toml"));
        assert_eq!(locations.data_dir, PathBuf::from(".likerank/data"));
    }

    #[test]
    fn missing_config_file_means_persistent_default() {
        let dir = tempfile::TempDir::new().unwrap();
        let locations = Locations::rooted(dir.path().to_path_buf());
        assert_eq!(
            locations.load_config().unwrap(),
            EngineConfig::persistent(dir.path().join("data"))
        );

        let saved = EngineConfig {
            workers: 2,
            ..EngineConfig::default()
        };
        saved.save(&locations.config_file).unwrap();
        assert_eq!(locations.load_config().unwrap(), saved);
    }
}
