// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-node placement descriptors.
//!
//! A [`Descriptor`] is what a search policy emits for one node. It comes in
//! two wire forms:
//!
//! ```text
//! 3                  one full replica on device 3
//! [mode, r0, .., rn] ri replicas on device i;
//!                    mode 0 = replicate (every replica runs the whole op)
//!                    mode 1 = partition (each replica runs 1/k of the op)
//! ```
//!
//! [`Descriptor::to_form`] checks a descriptor against the device count and
//! expands it into a [`Form`]: the concrete list of replica placements.

use crate::StrategyError;
use std::fmt;

/// Upper bound on the replicas a single descriptor may request.
pub const MAX_REPLICAS: u64 = 1024;

/// One node's placement, as written by a search policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Descriptor {
    /// A single full replica on this device.
    Device(u32),
    /// `[mode, r0, r1, ..]`: mode followed by per-device replica counts.
    Replicas(Vec<u32>),
}

impl Default for Descriptor {
    fn default() -> Self {
        Descriptor::Device(0)
    }
}

impl From<u32> for Descriptor {
    fn from(device: u32) -> Self {
        Descriptor::Device(device)
    }
}

impl From<Vec<u32>> for Descriptor {
    fn from(list: Vec<u32>) -> Self {
        Descriptor::Replicas(list)
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Descriptor::Device(d) => write!(f, "{d}"),
            Descriptor::Replicas(list) => {
                f.write_str("[")?;
                for (i, v) in list.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// How the replicas of a node share its work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Every replica computes (and holds) the full output.
    Replicate,
    /// Each replica computes an equal slice of the output.
    Partition,
}

impl Mode {
    fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Mode::Replicate),
            1 => Some(Mode::Partition),
            _ => None,
        }
    }
}

/// A validated, expanded descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Form {
    /// Work-sharing mode.
    pub mode: Mode,
    /// Device index of each replica, ascending.
    pub placements: Vec<usize>,
}

impl Form {
    /// One full replica on `device`.
    pub fn single(device: usize) -> Self {
        Self {
            mode: Mode::Replicate,
            placements: vec![device],
        }
    }

    /// Returns the number of replicas.
    pub fn num_replicas(&self) -> usize {
        self.placements.len()
    }

    /// Returns `true` if the op's work is split across replicas.
    pub fn is_partitioned(&self) -> bool {
        self.mode == Mode::Partition && self.placements.len() > 1
    }

    /// Returns the fraction of the full op each replica performs.
    pub fn work_share(&self) -> f64 {
        if self.is_partitioned() {
            1.0 / self.placements.len() as f64
        } else {
            1.0
        }
    }

    /// Returns the index of a replica hosted on `device`, if any.
    pub fn replica_on(&self, device: usize) -> Option<usize> {
        self.placements.iter().position(|&d| d == device)
    }

    /// Compact code such as `full_0_1` or `part_0_0_2`.
    pub fn code(&self) -> String {
        let mut s = String::from(if self.is_partitioned() { "part" } else { "full" });
        for d in &self.placements {
            s.push('_');
            s.push_str(&d.to_string());
        }
        s
    }
}

impl Descriptor {
    /// Validates the descriptor against `num_devices` and expands it.
    ///
    /// `node` names the owning node in error messages.
    pub fn to_form(&self, node: &str, num_devices: usize) -> Result<Form, StrategyError> {
        let invalid = |detail: String| StrategyError::InvalidDescriptor {
            node: node.to_string(),
            detail,
        };

        match self {
            Descriptor::Device(d) => {
                let d = *d as usize;
                if d >= num_devices {
                    return Err(invalid(format!(
                        "device {d} out of range for {num_devices} devices"
                    )));
                }
                Ok(Form::single(d))
            }
            Descriptor::Replicas(list) => {
                if list.len() != num_devices + 1 {
                    return Err(invalid(format!(
                        "expected {} entries (mode + one count per device), got {}",
                        num_devices + 1,
                        list.len()
                    )));
                }
                let mode = Mode::from_code(list[0])
                    .ok_or_else(|| invalid(format!("unknown mode {}", list[0])))?;
                let total: u64 = list[1..].iter().map(|&c| u64::from(c)).sum();
                if total > MAX_REPLICAS {
                    return Err(invalid(format!("{total} replicas exceeds the limit of {MAX_REPLICAS}")));
                }
                let placements: Vec<usize> = list[1..]
                    .iter()
                    .enumerate()
                    .flat_map(|(device, &count)| std::iter::repeat(device).take(count as usize))
                    .collect();
                if placements.is_empty() {
                    return Err(invalid("descriptor places no replicas".into()));
                }
                Ok(Form { mode, placements })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_descriptor() {
        let f = Descriptor::Device(2).to_form("a", 4).unwrap();
        assert_eq!(f.placements, vec![2]);
        assert!(!f.is_partitioned());
        assert_eq!(f.code(), "full_2");
    }

    #[test]
    fn test_replica_list() {
        let f = Descriptor::Replicas(vec![1, 1, 0, 2, 0]).to_form("a", 4).unwrap();
        assert_eq!(f.mode, Mode::Partition);
        assert_eq!(f.placements, vec![0, 2, 2]);
        assert!(f.is_partitioned());
        assert!((f.work_share() - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(f.code(), "part_0_2_2");
        assert_eq!(f.replica_on(2), Some(1));
        assert_eq!(f.replica_on(1), None);
    }

    #[test]
    fn test_single_partition_is_full() {
        let f = Descriptor::Replicas(vec![1, 0, 1]).to_form("a", 2).unwrap();
        assert!(!f.is_partitioned());
        assert_eq!(f.work_share(), 1.0);
    }

    #[test]
    fn test_invalid_descriptors() {
        assert!(Descriptor::Device(4).to_form("a", 4).is_err());
        assert!(Descriptor::Replicas(vec![0, 1]).to_form("a", 4).is_err());
        assert!(Descriptor::Replicas(vec![2, 1, 1]).to_form("a", 2).is_err());
        assert!(Descriptor::Replicas(vec![0, 0, 0]).to_form("a", 2).is_err());
    }

    #[test]
    fn test_json_forms() {
        let d: Vec<Descriptor> = serde_json::from_str("[3, [0, 1, 1]]").unwrap();
        assert_eq!(d[0], Descriptor::Device(3));
        assert_eq!(d[1], Descriptor::Replicas(vec![0, 1, 1]));
        assert_eq!(serde_json::to_string(&d).unwrap(), "[3,[0,1,1]]");
    }

    #[test]
    fn test_display() {
        assert_eq!(Descriptor::Device(7).to_string(), "7");
        assert_eq!(Descriptor::Replicas(vec![0, 2]).to_string(), "[0, 2]");
    }
}
