//! Configuration for provenance-cli

use provenance::ContractConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

fn default_store_path() -> PathBuf {
    PathBuf::from("provenance.sled")
}

/// CLI configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Directory of the sled record store
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Contract behaviour
    #[serde(default)]
    pub contract: ContractConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            contract: ContractConfig::default(),
        }
    }
}

impl CliConfig {
    /// Load config from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use provenance::KeyLayout;
    use tempfile::TempDir;

    #[test]
    fn test_load_nested_contract_section() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("provenance.yaml");
        std::fs::write(
            &path,
            "store_path: /var/lib/provenance\ncontract:\n  key_layout: namespaced\n",
        )
        .unwrap();

        let config = CliConfig::load(&path).unwrap();
        assert_eq!(config.store_path, PathBuf::from("/var/lib/provenance"));
        assert_eq!(config.contract.key_layout, KeyLayout::Namespaced);
        assert!(config.contract.reject_duplicate_members);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = CliConfig::load("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
