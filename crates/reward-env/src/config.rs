// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Environment configuration loaded from JSON (`config.txt`) or TOML files,
//! or constructed programmatically.
//!
//! # JSON Format
//! ```json
//! {
//!   "devices": ["/job:tge/replica:0/task:0/device:GPU:0",
//!               "/job:tge/replica:0/task:1/device:GPU:0"],
//!   "device_mems": [1.6e11, "16G"],
//!   "bandwidth": ["5000", 1250]
//! }
//! ```
//!
//! # TOML Format
//! ```toml
//! devices = ["dev0", "dev1"]
//! device_mems = ["8G", "8G"]
//! bandwidth = [10000, 2500]
//! sinks = ["loss/Mean"]
//! cache_capacity = 4096
//! ```

use crate::ConstructionError;
use cluster::{default_device_names, Bandwidth, ClusterError, DeviceList, MemoryBudget};
use std::path::Path;

/// Conventional configuration filename.
pub const CONFIG_FILE: &str = "config.txt";

/// Default per-device memory budget in bytes.
pub const DEFAULT_DEVICE_MEM: u64 = 160_000_000_000;

/// Sink used when neither the configuration nor the dataset names one.
pub const DEFAULT_SINK: &str = "GradientDescent";

/// Datasets whose graphs end in something other than the default sink.
const DATASET_SINKS: &[(&str, &[&str])] = &[(
    "graph7",
    &["group_deps_1", "loss/Mean", "global_step/add"],
)];

/// Configuration for a reward [`crate::Environment`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    /// Ordered device addresses; strategies refer to devices by position.
    pub devices: Vec<String>,
    /// Memory budget per device, aligned with `devices`.
    pub device_mems: Vec<MemoryBudget>,
    /// `[intra, inter]` bandwidth; defaults to 5000 / 1250 when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bandwidth: Option<Bandwidth>,
    /// Synchronisation nodes; derived from the dataset when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sinks: Option<Vec<String>>,
    /// Reward cache bound; unbounded when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_capacity: Option<usize>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        let devices = default_device_names();
        let device_mems = vec![MemoryBudget::from_bytes(DEFAULT_DEVICE_MEM); devices.len()];
        Self {
            devices,
            device_mems,
            bandwidth: None,
            sinks: None,
            cache_capacity: None,
        }
    }
}

impl EnvConfig {
    /// Loads configuration from a file: TOML for `*.toml`, JSON otherwise.
    pub fn from_file(path: &Path) -> Result<Self, ConstructionError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConstructionError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&content)?,
            _ => Self::from_json(&content)?,
        };
        tracing::info!(path = %path.display(), devices = config.devices.len(), "configuration loaded");
        Ok(config)
    }

    /// Loads `path` when given, else `config.txt` in the working directory
    /// when present, else the defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self, ConstructionError> {
        match path {
            Some(p) => Self::from_file(p),
            None if Path::new(CONFIG_FILE).is_file() => Self::from_file(Path::new(CONFIG_FILE)),
            None => Ok(Self::default()),
        }
    }

    /// Parses configuration from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self, ConstructionError> {
        serde_json::from_str(json_str)
            .map_err(|e| ConstructionError::Config(format!("JSON parse error: {e}")))
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConstructionError> {
        toml::from_str(toml_str).map_err(|e| ConstructionError::Config(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, ConstructionError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConstructionError::Config(format!("TOML serialise error: {e}")))
    }

    /// Checks devices, budgets, bandwidth and cache bound, returning the
    /// parsed device list.
    pub fn validate(&self) -> Result<DeviceList, ConstructionError> {
        let devices = DeviceList::new(&self.devices)?;
        if self.device_mems.len() != devices.len() {
            return Err(ClusterError::BudgetMismatch {
                devices: devices.len(),
                budgets: self.device_mems.len(),
            }
            .into());
        }
        if let Some(bw) = self.bandwidth {
            Bandwidth::new(bw.intra, bw.inter)?;
        }
        if self.cache_capacity == Some(0) {
            return Err(ConstructionError::Config("cache_capacity must be positive".into()));
        }
        Ok(devices)
    }

    /// Resolves the bandwidth pair, applying the defaults.
    pub fn resolve_bandwidth(&self) -> Bandwidth {
        Bandwidth::resolve(self.bandwidth)
    }

    /// Sinks for the dataset in `folder`: the configured list if any, else
    /// the dataset's known sinks, else [`DEFAULT_SINK`].
    pub fn sinks_for(&self, folder: &Path) -> Vec<String> {
        if let Some(sinks) = &self.sinks {
            return sinks.clone();
        }
        let dataset = folder.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        DATASET_SINKS
            .iter()
            .find(|(name, _)| *name == dataset)
            .map(|(_, sinks)| sinks.iter().map(|s| s.to_string()).collect())
            .unwrap_or_else(|| vec![DEFAULT_SINK.to_string()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default() {
        let c = EnvConfig::default();
        assert_eq!(c.devices.len(), 4);
        assert_eq!(c.device_mems, vec![MemoryBudget::from_bytes(DEFAULT_DEVICE_MEM); 4]);
        assert_eq!(c.resolve_bandwidth(), Bandwidth { intra: 5000, inter: 1250 });
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_from_json_config_txt() {
        let json = r#"{
            "devices": ["/job:worker/replica:0/task:0/device:GPU:0",
                        "/job:worker/replica:0/task:1/device:GPU:0"],
            "device_mems": [1.6e11, 8000000000],
            "bandwidth": ["10000", "2500"]
        }"#;
        let c = EnvConfig::from_json(json).unwrap();
        assert_eq!(c.devices.len(), 2);
        assert_eq!(c.device_mems[1].as_bytes(), 8_000_000_000);
        assert_eq!(c.bandwidth, Some(Bandwidth { intra: 10000, inter: 2500 }));
        assert_eq!(c.validate().unwrap().num_tasks(), 2);
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
devices = ["dev0", "dev1"]
device_mems = ["8G", "8G"]
bandwidth = [100, 50]
sinks = ["C"]
cache_capacity = 16
"#;
        let c = EnvConfig::from_toml(toml).unwrap();
        assert_eq!(c.device_mems[0], MemoryBudget::from_gb(8));
        assert_eq!(c.sinks, Some(vec!["C".to_string()]));
        assert_eq!(c.cache_capacity, Some(16));
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let c = EnvConfig {
            bandwidth: Some(Bandwidth { intra: 9, inter: 3 }),
            cache_capacity: Some(8),
            ..Default::default()
        };
        let back = EnvConfig::from_toml(&c.to_toml().unwrap()).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_from_file_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join(CONFIG_FILE);
        std::fs::write(&json, r#"{"devices": ["a"], "device_mems": [10]}"#).unwrap();
        assert_eq!(EnvConfig::from_file(&json).unwrap().devices, vec!["a"]);

        let toml = dir.path().join("env.toml");
        std::fs::write(&toml, "devices = [\"b\"]\ndevice_mems = [10]\n").unwrap();
        assert_eq!(EnvConfig::from_file(&toml).unwrap().devices, vec!["b"]);

        let missing = EnvConfig::from_file(&dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(missing, ConstructionError::ConfigRead { .. }));
    }

    #[test]
    fn test_validate_budget_mismatch() {
        let c = EnvConfig {
            devices: vec!["dev0".into(), "dev1".into()],
            ..Default::default()
        };
        let err = c.validate().unwrap_err();
        assert!(matches!(
            err,
            ConstructionError::Cluster(ClusterError::BudgetMismatch { devices: 2, budgets: 4 })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let empty = EnvConfig {
            devices: vec![],
            device_mems: vec![],
            ..Default::default()
        };
        assert!(empty.validate().is_err());

        let zero_bw = EnvConfig {
            bandwidth: Some(Bandwidth { intra: 0, inter: 1 }),
            ..Default::default()
        };
        assert!(zero_bw.validate().is_err());

        let zero_cache = EnvConfig {
            cache_capacity: Some(0),
            ..Default::default()
        };
        assert!(zero_cache.validate().is_err());

        assert!(EnvConfig::from_json(r#"{"bandwidth": [0, 1]}"#).is_err());
    }

    #[test]
    fn test_sinks_for_dataset() {
        let c = EnvConfig::default();
        assert_eq!(c.sinks_for(&PathBuf::from("data/graph1")), vec![DEFAULT_SINK]);
        assert_eq!(
            c.sinks_for(&PathBuf::from("data/graph7")),
            vec!["group_deps_1", "loss/Mean", "global_step/add"]
        );

        let configured = EnvConfig {
            sinks: Some(vec!["X".into()]),
            ..Default::default()
        };
        assert_eq!(configured.sinks_for(&PathBuf::from("data/graph7")), vec!["X"]);
    }
}
