//! # Guardian Set
//!
//! The ordered list of guardian addresses used to map a recovered signer to
//! its slot index for quorum counting.

use serde::{Deserialize, Serialize};

use crate::entities::Address;

/// Number of matching signatures needed out of `num_guardians`.
///
/// Strict super-majority: `floor(2n/3) + 1`.
pub fn quorum(num_guardians: usize) -> usize {
    num_guardians * 2 / 3 + 1
}

/// A versioned, ordered guardian set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GuardianSet {
    /// Guardian addresses; position is the guardian index.
    pub keys: Vec<Address>,
    /// Guardian set index (version).
    pub index: u32,
}

impl GuardianSet {
    /// Create a guardian set.
    pub fn new(keys: Vec<Address>, index: u32) -> Self {
        Self { keys, index }
    }

    /// Slot index of `address`, if it belongs to the set.
    pub fn key_index(&self, address: &Address) -> Option<usize> {
        self.keys.iter().position(|k| k == address)
    }

    /// Quorum for this set.
    pub fn quorum(&self) -> usize {
        quorum(self.keys.len())
    }

    /// Number of guardians.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True if the set has no guardians.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quorum_values() {
        assert_eq!(quorum(1), 1);
        assert_eq!(quorum(3), 3);
        assert_eq!(quorum(4), 3);
        assert_eq!(quorum(7), 5);
        assert_eq!(quorum(19), 13);
    }

    #[test]
    fn test_quorum_is_strict_super_majority() {
        for n in 1..=100usize {
            let q = quorum(n);
            assert!(q <= n, "quorum({n}) exceeds set size");
            // 3q > 2n
            assert!(3 * q > 2 * n, "quorum({n}) = {q} is not a super-majority");
            // one fewer signature is not enough
            assert!(3 * (q - 1) <= 2 * n);
        }
    }

    #[test]
    fn test_key_index() {
        let set = GuardianSet::new(vec![[1u8; 20], [2u8; 20], [3u8; 20]], 4);
        assert_eq!(set.key_index(&[2u8; 20]), Some(1));
        assert_eq!(set.key_index(&[9u8; 20]), None);
        assert_eq!(set.quorum(), 3);
    }
}
