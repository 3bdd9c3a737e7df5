// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Canonical identity of a dense strategy.
//!
//! Every descriptor is written as a fixed-width token, so the encoding is
//! injective: equal sequences give equal keys and any change at any position
//! gives a different key.
//!
//! ```text
//! Device(d)          D{d:08x}
//! Replicas([a, b])   R{len:08x}{a:08x}{b:08x}
//! ```

use crate::Descriptor;
use std::fmt;

/// Cache key of a dense strategy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StrategyKey(String);

impl StrategyKey {
    /// Encodes a descriptor sequence.
    pub fn of(descriptors: &[Descriptor]) -> Self {
        let mut s = String::with_capacity(descriptors.len() * 9);
        for d in descriptors {
            match d {
                Descriptor::Device(v) => s.push_str(&format!("D{v:08x}")),
                Descriptor::Replicas(list) => {
                    s.push_str(&format!("R{:08x}", list.len()));
                    for v in list {
                        s.push_str(&format!("{v:08x}"));
                    }
                }
            }
        }
        Self(s)
    }

    /// Returns the encoded key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StrategyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key_of(devices: &[u32]) -> StrategyKey {
        StrategyKey::of(&devices.iter().copied().map(Descriptor::Device).collect::<Vec<_>>())
    }

    #[test]
    fn test_equal_sequences_equal_keys() {
        assert_eq!(key_of(&[1, 2, 3]), key_of(&[1, 2, 3]));
    }

    #[test]
    fn test_no_concatenation_ambiguity() {
        // "1,12" vs "11,2" style collisions.
        assert_ne!(key_of(&[1, 12]), key_of(&[11, 2]));
        assert_ne!(key_of(&[1]), key_of(&[1, 0]));
    }

    #[test]
    fn test_list_and_device_differ() {
        let a = StrategyKey::of(&[Descriptor::Replicas(vec![0, 1])]);
        let b = StrategyKey::of(&[Descriptor::Device(0), Descriptor::Device(1)]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_fixed_width() {
        assert_eq!(key_of(&[255]).as_str(), "D000000ff");
        let k = StrategyKey::of(&[Descriptor::Replicas(vec![1, 2])]);
        assert_eq!(k.as_str(), "R000000020000000100000002");
    }

    fn descriptor() -> impl Strategy<Value = Descriptor> {
        prop_oneof![
            (0u32..8).prop_map(Descriptor::Device),
            prop::collection::vec(0u32..4, 1..6).prop_map(Descriptor::Replicas),
        ]
    }

    proptest! {
        #[test]
        fn prop_single_position_change_changes_key(
            seq in prop::collection::vec(descriptor(), 1..32),
            pos in any::<prop::sample::Index>(),
            replacement in descriptor(),
        ) {
            let i = pos.index(seq.len());
            prop_assume!(seq[i] != replacement);
            let mut changed = seq.clone();
            changed[i] = replacement;
            prop_assert_ne!(StrategyKey::of(&seq), StrategyKey::of(&changed));
        }

        #[test]
        fn prop_key_is_deterministic(seq in prop::collection::vec(descriptor(), 0..32)) {
            prop_assert_eq!(StrategyKey::of(&seq), StrategyKey::of(&seq.clone()));
        }
    }
}
