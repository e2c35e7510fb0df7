//! Application configuration loaded from TOML.
//!
//! ```toml
//! [data]
//! default_dataset = "data/Amazon Sale Report.csv"
//! uploaded_dataset = "data/uploaded_data.csv"
//!
//! [knowledge]
//! source = "data/Cloud Warehouse Compersion Chart.csv"
//! index_path = "data/knowledge_index.json"
//! chunk_size = 600
//! chunk_overlap = 100
//!
//! [routing]
//! routes = "routes.toml"   # optional; built-in routes otherwise
//!
//! [logging]
//! filter = "warn"          # RUST_LOG takes precedence
//! ```
//!
//! Every key is optional.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use biznavi_contracts::error::{NaviError, NaviResult};
use biznavi_data::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};

/// Read when `--config` is not given and the file exists.
pub const DEFAULT_CONFIG_FILE: &str = "biznavi.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub data: DataConfig,
    pub knowledge: KnowledgeConfig,
    pub routing: RoutingSection,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    pub default_dataset: PathBuf,
    /// Where `/upload` stores the replacement; wins over the default when present.
    pub uploaded_dataset: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            default_dataset: PathBuf::from("data/Amazon Sale Report.csv"),
            uploaded_dataset: PathBuf::from("data/uploaded_data.csv"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KnowledgeConfig {
    pub source: PathBuf,
    pub index_path: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("data/Cloud Warehouse Compersion Chart.csv"),
            index_path: PathBuf::from("data/knowledge_index.json"),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoutingSection {
    pub routes: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "warn".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> NaviResult<Self> {
        let config: AppConfig = toml::from_str(s).map_err(|e| NaviError::Config {
            reason: format!("failed to parse config TOML: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given (it must exist), else `biznavi.toml` in the
    /// working directory if present, else the built-in defaults.
    pub fn load(path: Option<&Path>) -> NaviResult<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => PathBuf::from(DEFAULT_CONFIG_FILE),
            None => return Ok(Self::default()),
        };
        let contents = std::fs::read_to_string(&path).map_err(|e| NaviError::Config {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    fn validate(&self) -> NaviResult<()> {
        let k = &self.knowledge;
        if k.chunk_size == 0 {
            return Err(NaviError::Config {
                reason: "knowledge.chunk_size must be greater than zero".to_string(),
            });
        }
        if k.chunk_overlap >= k.chunk_size {
            return Err(NaviError::Config {
                reason: format!(
                    "knowledge.chunk_overlap ({}) must be smaller than knowledge.chunk_size ({})",
                    k.chunk_overlap, k.chunk_size
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf};

    use biznavi_contracts::error::NaviError;

    use super::AppConfig;

    #[test]
    fn empty_document_gives_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.knowledge.chunk_size, 600);
        assert_eq!(config.knowledge.chunk_overlap, 100);
        assert_eq!(config.logging.filter, "warn");
        assert!(config.routing.routes.is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [data]
            default_dataset = "/srv/sales.csv"

            [routing]
            routes = "my-routes.toml"
            "#,
        )
        .unwrap();
        assert_eq!(config.data.default_dataset, PathBuf::from("/srv/sales.csv"));
        assert_eq!(config.data.uploaded_dataset, PathBuf::from("data/uploaded_data.csv"));
        assert_eq!(config.routing.routes, Some(PathBuf::from("my-routes.toml")));
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk() {
        let err = AppConfig::from_toml_str("[knowledge]\nchunk_size = 100\nchunk_overlap = 100\n")
            .unwrap_err();
        assert!(matches!(err, NaviError::Config { .. }));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(AppConfig::from_toml_str("[data]\ndefault = \"x.csv\"\n").is_err());
    }

    #[test]
    fn explicit_file_is_loaded_and_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("biznavi.toml");
        fs::write(&path, "[logging]\nfilter = \"debug\"\n").unwrap();
        assert_eq!(AppConfig::load(Some(&path)).unwrap().logging.filter, "debug");

        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            AppConfig::load(Some(&missing)),
            Err(NaviError::Config { .. })
        ));
    }
}
