// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-device memory budgets and parsing.
//!
//! A [`MemoryBudget`] is the capacity a device may use before a strategy is
//! considered infeasible. Configuration files written by different tools
//! spell these as integers (`160000000000`), floats (`1.6e11`) or
//! human-readable strings (`"16G"`), so all three are accepted.

use crate::ClusterError;
use std::fmt;

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;
const GB: u64 = 1024 * MB;

/// Memory capacity of one device, in bytes.
///
/// # Parsing
/// - `"512M"` or `"512MB"` → 512 × 1024² bytes
/// - `"16G"` or `"16GB"` → 16 × 1024³ bytes
/// - `"2048K"` or `"2048KB"` → 2048 × 1024 bytes
/// - `"1.6e11"` or `"160000000000"` → raw byte count
///
/// # Examples
/// ```
/// use cluster::MemoryBudget;
///
/// let b = MemoryBudget::parse("1G").unwrap();
/// assert_eq!(b.as_mb(), 1024);
/// assert!(b.is_exceeded_by(b.as_bytes() + 1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(transparent)]
pub struct MemoryBudget {
    bytes: u64,
}

impl MemoryBudget {
    /// Creates a budget from a byte count.
    pub fn from_bytes(bytes: u64) -> Self {
        Self { bytes }
    }

    /// Creates a budget from megabytes.
    pub fn from_mb(mb: u64) -> Self {
        Self { bytes: mb * MB }
    }

    /// Creates a budget from gigabytes.
    pub fn from_gb(gb: u64) -> Self {
        Self { bytes: gb * GB }
    }

    /// Returns the budget in bytes.
    pub fn as_bytes(&self) -> u64 {
        self.bytes
    }

    /// Returns the budget in megabytes (truncated).
    pub fn as_mb(&self) -> u64 {
        self.bytes / MB
    }

    /// Returns `true` if `used` bytes would not fit.
    pub fn is_exceeded_by(&self, used: u64) -> bool {
        used > self.bytes
    }

    /// Parses a human-readable budget string.
    ///
    /// Case-insensitive. The numeric part may be fractional (`"1.5G"`) or
    /// use exponent notation (`"1.6e11"`).
    pub fn parse(s: &str) -> Result<Self, ClusterError> {
        let s = s.trim();
        let invalid = |detail: &str| ClusterError::InvalidBudget {
            value: s.to_string(),
            detail: detail.to_string(),
        };
        if s.is_empty() {
            return Err(invalid("empty string"));
        }

        let upper = s.to_uppercase();
        let (num_str, multiplier) = if upper.ends_with("GB") {
            (&s[..s.len() - 2], GB)
        } else if upper.ends_with('G') {
            (&s[..s.len() - 1], GB)
        } else if upper.ends_with("MB") {
            (&s[..s.len() - 2], MB)
        } else if upper.ends_with('M') {
            (&s[..s.len() - 1], MB)
        } else if upper.ends_with("KB") {
            (&s[..s.len() - 2], KB)
        } else if upper.ends_with('K') {
            (&s[..s.len() - 1], KB)
        } else if upper.ends_with('B') {
            (&s[..s.len() - 1], 1)
        } else {
            (s, 1)
        };

        let num_str = num_str.trim();
        if let Ok(value) = num_str.parse::<u64>() {
            let bytes = value
                .checked_mul(multiplier)
                .ok_or_else(|| invalid("budget overflows 64 bits"))?;
            return Self::checked(bytes).ok_or_else(|| invalid("budget must be positive"));
        }

        let value: f64 = num_str
            .parse()
            .map_err(|_| invalid("expected a number followed by an optional suffix (K, M, G)"))?;
        Self::from_f64(value * multiplier as f64).ok_or_else(|| invalid("budget must be a positive finite number"))
    }

    /// Converts a floating-point byte count, rounding to the nearest byte.
    pub fn from_f64(bytes: f64) -> Option<Self> {
        if !bytes.is_finite() || bytes < 1.0 || bytes > u64::MAX as f64 {
            return None;
        }
        Self::checked(bytes.round() as u64)
    }

    fn checked(bytes: u64) -> Option<Self> {
        (bytes > 0).then_some(Self { bytes })
    }
}

impl fmt::Display for MemoryBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bytes >= GB && self.bytes % GB == 0 {
            write!(f, "{} GB", self.bytes / GB)
        } else if self.bytes >= MB && self.bytes % MB == 0 {
            write!(f, "{} MB", self.bytes / MB)
        } else if self.bytes >= KB && self.bytes % KB == 0 {
            write!(f, "{} KB", self.bytes / KB)
        } else {
            write!(f, "{} B", self.bytes)
        }
    }
}

/// Wire forms accepted for a budget.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum RawBudget {
    Int(u64),
    Float(f64),
    Text(String),
}

impl<'de> serde::Deserialize<'de> for MemoryBudget {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let parsed = match RawBudget::deserialize(deserializer)? {
            RawBudget::Int(bytes) => Self::checked(bytes).ok_or_else(|| ClusterError::InvalidBudget {
                value: bytes.to_string(),
                detail: "budget must be positive".into(),
            }),
            RawBudget::Float(bytes) => Self::from_f64(bytes).ok_or_else(|| ClusterError::InvalidBudget {
                value: bytes.to_string(),
                detail: "budget must be a positive finite number".into(),
            }),
            RawBudget::Text(s) => Self::parse(&s),
        };
        parsed.map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_mb() {
        let b = MemoryBudget::from_mb(512);
        assert_eq!(b.as_bytes(), 512 * 1024 * 1024);
        assert_eq!(b.as_mb(), 512);
    }

    #[test]
    fn test_parse_suffixes() {
        assert_eq!(MemoryBudget::parse("512M").unwrap().as_mb(), 512);
        assert_eq!(MemoryBudget::parse("512mb").unwrap().as_mb(), 512);
        assert_eq!(MemoryBudget::parse("16G").unwrap(), MemoryBudget::from_gb(16));
        assert_eq!(MemoryBudget::parse("1024K").unwrap().as_bytes(), 1024 * 1024);
        assert_eq!(MemoryBudget::parse("100B").unwrap().as_bytes(), 100);
    }

    #[test]
    fn test_parse_fractional_and_exponent() {
        assert_eq!(MemoryBudget::parse("1.5G").unwrap().as_mb(), 1536);
        assert_eq!(MemoryBudget::parse("1.6e11").unwrap().as_bytes(), 160_000_000_000);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(MemoryBudget::parse("").is_err());
        assert!(MemoryBudget::parse("abc").is_err());
        assert!(MemoryBudget::parse("0M").is_err());
        assert!(MemoryBudget::parse("-5G").is_err());
    }

    #[test]
    fn test_exceeded() {
        let b = MemoryBudget::from_bytes(100);
        assert!(!b.is_exceeded_by(100));
        assert!(b.is_exceeded_by(101));
    }

    #[test]
    fn test_display() {
        assert_eq!(MemoryBudget::from_gb(1).to_string(), "1 GB");
        assert_eq!(MemoryBudget::from_mb(512).to_string(), "512 MB");
        assert_eq!(MemoryBudget::from_bytes(2048).to_string(), "2 KB");
        assert_eq!(MemoryBudget::from_bytes(100).to_string(), "100 B");
    }

    #[test]
    fn test_deserialize_mixed_forms() {
        let budgets: Vec<MemoryBudget> =
            serde_json::from_str(r#"[100, 1.6e11, "16G"]"#).unwrap();
        assert_eq!(budgets[0].as_bytes(), 100);
        assert_eq!(budgets[1].as_bytes(), 160_000_000_000);
        assert_eq!(budgets[2], MemoryBudget::from_gb(16));
    }

    #[test]
    fn test_deserialize_rejects_zero() {
        assert!(serde_json::from_str::<MemoryBudget>("0").is_err());
    }

    #[test]
    fn test_serialize_as_bytes() {
        let json = serde_json::to_string(&MemoryBudget::from_bytes(42)).unwrap();
        assert_eq!(json, "42");
    }
}
