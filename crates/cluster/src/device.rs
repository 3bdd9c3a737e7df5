// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Device addresses and ordered device lists.
//!
//! Devices are named with TensorFlow-style addresses such as
//! `/job:tge/replica:0/task:1/device:GPU:0`. Everything before the last `/`
//! identifies the *task* (host); devices sharing a task communicate over the
//! intra-node link, all others over the inter-node link.
//!
//! Names without a leading `/` are accepted as opaque identifiers; each such
//! device forms a task of its own.

use crate::ClusterError;
use std::collections::BTreeMap;
use std::fmt;

/// A parsed device address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceAddress {
    raw: String,
    /// `job:` component.
    pub job: Option<String>,
    /// `replica:` component.
    pub replica: Option<u32>,
    /// `task:` component.
    pub task: Option<u32>,
    /// Device kind from `device:KIND:N` (e.g. `GPU`).
    pub kind: Option<String>,
    /// Device ordinal from `device:KIND:N`.
    pub index: Option<u32>,
}

impl DeviceAddress {
    /// Parses a device address.
    pub fn parse(raw: &str) -> Result<Self, ClusterError> {
        let invalid = |detail: String| ClusterError::InvalidDevice {
            device: raw.to_string(),
            detail,
        };

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty device name".into()));
        }
        if trimmed != raw {
            return Err(invalid("leading or trailing whitespace".into()));
        }

        let mut addr = Self {
            raw: raw.to_string(),
            job: None,
            replica: None,
            task: None,
            kind: None,
            index: None,
        };

        let Some(path) = raw.strip_prefix('/') else {
            return Ok(addr);
        };

        for component in path.split('/') {
            let (key, value) = component
                .split_once(':')
                .ok_or_else(|| invalid(format!("component '{component}' is not 'key:value'")))?;
            let number = |v: &str| {
                v.parse::<u32>()
                    .map_err(|_| invalid(format!("'{key}' expects an integer, got '{v}'")))
            };
            match key {
                "job" if !value.is_empty() => addr.job = Some(value.to_string()),
                "replica" => addr.replica = Some(number(value)?),
                "task" => addr.task = Some(number(value)?),
                "device" => {
                    let (kind, index) = value
                        .rsplit_once(':')
                        .ok_or_else(|| invalid(format!("'device:{value}' lacks an ordinal")))?;
                    if kind.is_empty() {
                        return Err(invalid("empty device kind".into()));
                    }
                    addr.kind = Some(kind.to_string());
                    addr.index = Some(number(index)?);
                }
                _ => return Err(invalid(format!("unrecognised component '{component}'"))),
            }
        }

        Ok(addr)
    }

    /// Returns the address as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the task (host) part: everything before the last `/`, or the
    /// whole name for opaque identifiers.
    pub fn task_name(&self) -> &str {
        match self.raw.rfind('/') {
            Some(pos) if pos > 0 => &self.raw[..pos],
            _ => &self.raw,
        }
    }

    /// Returns `true` for `GPU` devices.
    pub fn is_gpu(&self) -> bool {
        self.kind.as_deref().is_some_and(|k| k.eq_ignore_ascii_case("gpu"))
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// The default layout: two tasks with two GPUs each.
pub fn default_device_names() -> Vec<String> {
    let mut names = Vec::with_capacity(4);
    for task in 0..2 {
        for gpu in 0..2 {
            names.push(format!("/job:tge/replica:0/task:{task}/device:GPU:{gpu}"));
        }
    }
    names
}

// ── DeviceList ─────────────────────────────────────────────────────

/// An ordered, duplicate-free list of devices.
///
/// Order is significant: strategies refer to devices by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceList {
    devices: Vec<DeviceAddress>,
    /// Task id per device, numbered by first appearance.
    task_of: Vec<usize>,
    task_names: Vec<String>,
}

impl DeviceList {
    /// Parses and validates a list of device names.
    pub fn new<S: AsRef<str>>(names: &[S]) -> Result<Self, ClusterError> {
        if names.is_empty() {
            return Err(ClusterError::EmptyDeviceList);
        }

        let mut devices = Vec::with_capacity(names.len());
        for name in names {
            let addr = DeviceAddress::parse(name.as_ref())?;
            if devices.iter().any(|d: &DeviceAddress| d.raw == addr.raw) {
                return Err(ClusterError::DuplicateDevice(addr.raw));
            }
            devices.push(addr);
        }

        let mut task_ids: BTreeMap<String, usize> = BTreeMap::new();
        let mut task_names = Vec::new();
        let mut task_of = Vec::with_capacity(devices.len());
        for d in &devices {
            let name = d.task_name().to_string();
            let next = task_ids.len();
            let id = *task_ids.entry(name.clone()).or_insert_with(|| {
                task_names.push(name);
                next
            });
            task_of.push(id);
        }

        tracing::debug!(
            devices = devices.len(),
            tasks = task_names.len(),
            "device list parsed"
        );

        Ok(Self {
            devices,
            task_of,
            task_names,
        })
    }

    /// Returns the number of devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Always `false`; construction rejects empty lists.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Returns a device by position.
    pub fn get(&self, index: usize) -> Option<&DeviceAddress> {
        self.devices.get(index)
    }

    /// Iterates over devices in order.
    pub fn iter(&self) -> impl Iterator<Item = &DeviceAddress> {
        self.devices.iter()
    }

    /// Returns the device names in order.
    pub fn names(&self) -> Vec<String> {
        self.devices.iter().map(|d| d.raw.clone()).collect()
    }

    /// Returns the task id of device `index`.
    pub fn task_of(&self, index: usize) -> Option<usize> {
        self.task_of.get(index).copied()
    }

    /// Returns the number of distinct tasks.
    pub fn num_tasks(&self) -> usize {
        self.task_names.len()
    }

    /// Returns the task names in id order.
    pub fn task_names(&self) -> &[String] {
        &self.task_names
    }

    /// Returns `true` if both devices belong to the same task.
    pub fn same_task(&self, a: usize, b: usize) -> bool {
        matches!((self.task_of(a), self.task_of(b)), (Some(x), Some(y)) if x == y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_address() {
        let a = DeviceAddress::parse("/job:tge/replica:0/task:1/device:GPU:3").unwrap();
        assert_eq!(a.job.as_deref(), Some("tge"));
        assert_eq!(a.replica, Some(0));
        assert_eq!(a.task, Some(1));
        assert_eq!(a.kind.as_deref(), Some("GPU"));
        assert_eq!(a.index, Some(3));
        assert!(a.is_gpu());
        assert_eq!(a.task_name(), "/job:tge/replica:0/task:1");
    }

    #[test]
    fn test_parse_opaque_name() {
        let a = DeviceAddress::parse("dev0").unwrap();
        assert_eq!(a.task_name(), "dev0");
        assert!(a.kind.is_none());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(DeviceAddress::parse("").is_err());
        assert!(DeviceAddress::parse(" gpu0").is_err());
        assert!(DeviceAddress::parse("/job:tge/task:x").is_err());
        assert!(DeviceAddress::parse("/job:tge/device:GPU").is_err());
        assert!(DeviceAddress::parse("/job:tge/rack:1").is_err());
    }

    #[test]
    fn test_default_layout() {
        let list = DeviceList::new(&default_device_names()).unwrap();
        assert_eq!(list.len(), 4);
        assert_eq!(list.num_tasks(), 2);
        assert!(list.same_task(0, 1));
        assert!(!list.same_task(1, 2));
        assert_eq!(list.task_of(3), Some(1));
    }

    #[test]
    fn test_opaque_devices_are_separate_tasks() {
        let list = DeviceList::new(&["dev0", "dev1"]).unwrap();
        assert_eq!(list.num_tasks(), 2);
        assert!(!list.same_task(0, 1));
    }

    #[test]
    fn test_rejects_empty_and_duplicates() {
        let empty: [&str; 0] = [];
        assert!(matches!(DeviceList::new(&empty), Err(ClusterError::EmptyDeviceList)));
        assert!(matches!(
            DeviceList::new(&["a", "a"]),
            Err(ClusterError::DuplicateDevice(_))
        ));
    }

    #[test]
    fn test_names_preserve_order() {
        let names = default_device_names();
        let list = DeviceList::new(&names).unwrap();
        assert_eq!(list.names(), names);
    }
}
