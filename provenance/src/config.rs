//! Configuration for the ledger contract.

use serde::{Deserialize, Serialize};

use crate::keys::KeyLayout;

/// Label recorded for bean code `b`.
pub const DEFAULT_ORIGIN_LABEL: &str = "Ethiopian Natural Yirgacheffe";

/// How repeated pours of one cup id affect `count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PourCounting {
    /// Every pour stores `count = 1`
    #[default]
    Reset,
    /// Every pour stores the previous count plus one
    Accumulate,
}

/// Contract behaviour switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractConfig {
    /// Mapping of entity ids to store keys
    pub key_layout: KeyLayout,
    /// Fail `addMember` with AlreadyExists instead of overwriting
    pub reject_duplicate_members: bool,
    /// Check that named participants are registered with the expected role
    pub verify_participants: bool,
    /// Pour count policy
    pub pour_counting: PourCounting,
    /// Origin label for bean code `b`
    pub known_origin_label: String,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            key_layout: KeyLayout::Flat,
            reject_duplicate_members: true,
            verify_participants: false,
            pour_counting: PourCounting::Reset,
            known_origin_label: DEFAULT_ORIGIN_LABEL.to_string(),
        }
    }
}

impl ContractConfig {
    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config = ContractConfig::from_yaml("key_layout: namespaced\npour_counting: accumulate\n").unwrap();
        assert_eq!(config.key_layout, KeyLayout::Namespaced);
        assert_eq!(config.pour_counting, PourCounting::Accumulate);
        assert!(config.reject_duplicate_members);
        assert!(!config.verify_participants);
        assert_eq!(config.known_origin_label, DEFAULT_ORIGIN_LABEL);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = ContractConfig {
            verify_participants: true,
            ..Default::default()
        };
        let yaml = config.to_yaml().unwrap();
        assert_eq!(ContractConfig::from_yaml(&yaml).unwrap(), config);
    }
}
