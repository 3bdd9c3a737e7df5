// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Bandwidth resolution and the link topology derived from it.
//!
//! A [`Bandwidth`] pair gives the throughput of intra-node links (devices in
//! the same task) and inter-node links (devices in different tasks), in
//! bytes per microsecond. [`LinkTopology`] turns a [`DeviceList`] and a
//! bandwidth pair into concrete links:
//!
//! ```text
//!   task 0                 task 1
//!  ┌──────────────┐       ┌──────────────┐
//!  │ GPU:0 ⇄ GPU:1 │ ════ │ GPU:0 ⇄ GPU:1 │
//!  └──────────────┘       └──────────────┘
//!   dedicated intra link   one shared inter link
//!   per ordered pair       per ordered task pair
//! ```

use crate::{ClusterError, DeviceList};
use std::fmt;

/// Default intra-node bandwidth.
pub const DEFAULT_INTRA_BANDWIDTH: u64 = 5000;

/// Default inter-node bandwidth.
pub const DEFAULT_INTER_BANDWIDTH: u64 = 1250;

/// An (intra, inter) bandwidth pair.
///
/// Serialises as a two-element array; each element may be a number or a
/// numeric string (`["5000", "1250"]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bandwidth {
    /// Throughput between devices of the same task.
    pub intra: u64,
    /// Throughput between devices of different tasks.
    pub inter: u64,
}

impl Default for Bandwidth {
    fn default() -> Self {
        Self {
            intra: DEFAULT_INTRA_BANDWIDTH,
            inter: DEFAULT_INTER_BANDWIDTH,
        }
    }
}

impl Bandwidth {
    /// Creates a bandwidth pair, rejecting zero values.
    pub fn new(intra: u64, inter: u64) -> Result<Self, ClusterError> {
        for v in [intra, inter] {
            if v == 0 {
                return Err(ClusterError::InvalidBandwidth(v.to_string()));
            }
        }
        Ok(Self { intra, inter })
    }

    /// Resolves the bandwidth to use: the configured pair, or the defaults
    /// (intra 5000, inter 1250) when none is configured.
    pub fn resolve(configured: Option<Bandwidth>) -> Self {
        configured.unwrap_or_default()
    }

    /// Parses `"intra:inter"` (e.g. `"5000:1250"`).
    pub fn parse_pair(s: &str) -> Result<Self, ClusterError> {
        let (intra, inter) = s
            .split_once(':')
            .ok_or_else(|| ClusterError::InvalidBandwidth(s.to_string()))?;
        Self::new(parse_value(intra)?, parse_value(inter)?)
    }
}

impl fmt::Display for Bandwidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "intra={} inter={}", self.intra, self.inter)
    }
}

fn parse_value(s: &str) -> Result<u64, ClusterError> {
    let s = s.trim();
    let v = match s.parse::<u64>() {
        Ok(v) => v,
        Err(_) => {
            let f: f64 = s.parse().map_err(|_| ClusterError::InvalidBandwidth(s.to_string()))?;
            if !f.is_finite() || f < 1.0 {
                return Err(ClusterError::InvalidBandwidth(s.to_string()));
            }
            f.round() as u64
        }
    };
    if v == 0 {
        return Err(ClusterError::InvalidBandwidth(s.to_string()));
    }
    Ok(v)
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum RawValue {
    Int(u64),
    Float(f64),
    Text(String),
}

impl RawValue {
    fn into_u64(self) -> Result<u64, ClusterError> {
        match self {
            RawValue::Int(v) => parse_value(&v.to_string()),
            RawValue::Float(v) => parse_value(&v.to_string()),
            RawValue::Text(s) => parse_value(&s),
        }
    }
}

impl serde::Serialize for Bandwidth {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.intra, self.inter].serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for Bandwidth {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (intra, inter) = <(RawValue, RawValue)>::deserialize(deserializer)?;
        let intra = intra.into_u64().map_err(serde::de::Error::custom)?;
        let inter = inter.into_u64().map_err(serde::de::Error::custom)?;
        Ok(Self { intra, inter })
    }
}

// ── LinkTopology ───────────────────────────────────────────────────

/// Whether a link connects devices inside one task or across tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    Intra,
    Inter,
}

/// One directed communication link.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Link {
    pub kind: LinkKind,
    /// Bytes per microsecond.
    pub bandwidth: u64,
    /// Source task id (inter) or device index (intra).
    pub from: usize,
    /// Destination task id (inter) or device index (intra).
    pub to: usize,
}

/// The links between every ordered pair of devices.
#[derive(Debug, Clone)]
pub struct LinkTopology {
    links: Vec<Link>,
    /// `route[a][b]` is the link from device `a` to device `b`.
    route: Vec<Vec<Option<usize>>>,
}

impl LinkTopology {
    /// Builds the topology for `devices` under `bandwidth`.
    pub fn new(devices: &DeviceList, bandwidth: Bandwidth) -> Self {
        let n = devices.len();
        let tasks = devices.num_tasks();
        let mut links = Vec::new();

        let mut inter_link = vec![vec![None; tasks]; tasks];
        for (a, row) in inter_link.iter_mut().enumerate() {
            for (b, slot) in row.iter_mut().enumerate() {
                if a != b {
                    *slot = Some(links.len());
                    links.push(Link {
                        kind: LinkKind::Inter,
                        bandwidth: bandwidth.inter,
                        from: a,
                        to: b,
                    });
                }
            }
        }

        let mut route = vec![vec![None; n]; n];
        for (a, row) in route.iter_mut().enumerate() {
            for (b, slot) in row.iter_mut().enumerate() {
                if a == b {
                    continue;
                }
                match (devices.task_of(a), devices.task_of(b)) {
                    (Some(ta), Some(tb)) if ta == tb => {
                        *slot = Some(links.len());
                        links.push(Link {
                            kind: LinkKind::Intra,
                            bandwidth: bandwidth.intra,
                            from: a,
                            to: b,
                        });
                    }
                    (Some(ta), Some(tb)) => *slot = inter_link[ta][tb],
                    _ => {}
                }
            }
        }

        Self { links, route }
    }

    /// Returns every link.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Returns the number of links.
    pub fn num_links(&self) -> usize {
        self.links.len()
    }

    /// Returns the link id carrying traffic from device `from` to `to`.
    /// `None` for the same device or out-of-range indices.
    pub fn link_between(&self, from: usize, to: usize) -> Option<usize> {
        self.route.get(from).and_then(|row| row.get(to)).copied().flatten()
    }

    /// Returns the bandwidth of a link.
    pub fn bandwidth_of(&self, link: usize) -> Option<u64> {
        self.links.get(link).map(|l| l.bandwidth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::default_device_names;

    #[test]
    fn test_resolve_defaults() {
        let bw = Bandwidth::resolve(None);
        assert_eq!(bw.intra, 5000);
        assert_eq!(bw.inter, 1250);

        let custom = Bandwidth::new(100, 10).unwrap();
        assert_eq!(Bandwidth::resolve(Some(custom)), custom);
    }

    #[test]
    fn test_parse_pair() {
        assert_eq!(Bandwidth::parse_pair("10000:2500").unwrap(), Bandwidth::new(10000, 2500).unwrap());
        assert!(Bandwidth::parse_pair("10000").is_err());
        assert!(Bandwidth::parse_pair("0:1").is_err());
        assert!(Bandwidth::parse_pair("a:b").is_err());
    }

    #[test]
    fn test_deserialize_strings_and_numbers() {
        let bw: Bandwidth = serde_json::from_str(r#"["5000", 1250]"#).unwrap();
        assert_eq!(bw, Bandwidth::default());
        assert!(serde_json::from_str::<Bandwidth>(r#"["0", 1]"#).is_err());
        assert!(serde_json::from_str::<Bandwidth>(r#"[1]"#).is_err());
    }

    #[test]
    fn test_serialize_as_pair() {
        assert_eq!(serde_json::to_string(&Bandwidth::default()).unwrap(), "[5000,1250]");
    }

    #[test]
    fn test_topology_default_layout() {
        let devices = DeviceList::new(&default_device_names()).unwrap();
        let topo = LinkTopology::new(&devices, Bandwidth::default());
        // 2 inter links (one per ordered task pair) + 2 × 2 intra links.
        assert_eq!(topo.num_links(), 6);

        let intra = topo.link_between(0, 1).unwrap();
        assert_eq!(topo.bandwidth_of(intra), Some(5000));
        assert_ne!(topo.link_between(0, 1), topo.link_between(1, 0));

        let inter = topo.link_between(0, 2).unwrap();
        assert_eq!(topo.bandwidth_of(inter), Some(1250));
        assert_eq!(topo.link_between(1, 3), Some(inter));
        assert_ne!(topo.link_between(2, 0), Some(inter));

        assert_eq!(topo.link_between(2, 2), None);
        assert_eq!(topo.link_between(0, 9), None);
    }
}
