//! Settings shared by the builder and the server, stored as YAML.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use crate::error::Error;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SplitterKind {
    #[default]
    Midpoint,
    Mean,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TreeConfig {
    pub max_leaf_size: usize,
    pub splitter: SplitterKind,
    /// Levels kept when saving; 0 keeps the whole tree.
    pub save_depth: usize,
    /// Addresses of HTTP workers, in worker order.
    pub workers: Vec<String>,
    pub result_timeout_ms: Option<u64>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_leaf_size: 20,
            splitter: SplitterKind::Midpoint,
            save_depth: 0,
            workers: Vec::new(),
            result_timeout_ms: None,
        }
    }
}

impl TreeConfig {

    pub fn from_file<P: AsRef<Path>>(filename: P) -> Result<Self, Error> {

        let serialized = std::fs::read_to_string(filename)?;
        let deserialized: Self = serde_yaml::from_str(&serialized)?;

        deserialized.validate()?;

        Ok(deserialized)
    }

    pub fn to_file<P: AsRef<Path>>(&self, filename: P) -> Result<(), Error> {

        let serialized = serde_yaml::to_string(&self)?;
        let mut file = File::create(filename)?;

        file.write_all(serialized.as_bytes())?;

        Ok(())
    }

    pub fn validate(&self) -> Result<(), Error> {

        if self.max_leaf_size == 0 {
            return Err(Error::Config("max_leaf_size must be at least 1".to_string()));
        }

        Ok(())
    }

    pub fn result_timeout(&self) -> Option<Duration> {
        self.result_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_round_trip() {

        let config = TreeConfig {
            max_leaf_size: 7,
            splitter: SplitterKind::Mean,
            save_depth: 3,
            workers: vec!["127.0.0.1:7001".to_string(), "127.0.0.1:7002".to_string()],
            result_timeout_ms: Some(2500),
        };

        let filename = std::env::temp_dir().join(format!("space_tree_config_{}.yaml", std::process::id()));
        config.to_file(&filename).unwrap();
        let loaded = TreeConfig::from_file(&filename).unwrap();
        std::fs::remove_file(&filename).unwrap();

        assert_eq!(loaded, config);
        assert_eq!(loaded.result_timeout(), Some(Duration::from_millis(2500)));
    }

    #[test]
    fn missing_fields_take_defaults() {

        let config: TreeConfig = serde_yaml::from_str("splitter: mean\n").unwrap();

        assert_eq!(config.splitter, SplitterKind::Mean);
        assert_eq!(config.max_leaf_size, 20);
        assert_eq!(config.save_depth, 0);
        assert!(config.workers.is_empty());
        assert_eq!(config.result_timeout(), None);
    }

    #[test]
    fn zero_leaf_size_is_rejected() {

        let filename = std::env::temp_dir().join(format!("space_tree_bad_config_{}.yaml", std::process::id()));
        std::fs::write(&filename, "max_leaf_size: 0\n").unwrap();
        let loaded = TreeConfig::from_file(&filename);
        std::fs::remove_file(&filename).unwrap();

        assert!(matches!(loaded, Err(Error::Config(_))));
    }
}
