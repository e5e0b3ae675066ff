use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use strum::{Display, EnumString};

use crate::models::Partition;

/// Decides which partition receives a new user
#[cfg_attr(test, mockall::automock)]
pub trait PlacementPolicy: Send + Sync {
    fn choose_partition(&self, username: &str, email: &str) -> Partition;
}

/// Always places into the same partition
#[derive(Debug, Clone, Copy)]
pub struct FixedPlacement(pub Partition);

impl PlacementPolicy for FixedPlacement {
    fn choose_partition(&self, _username: &str, _email: &str) -> Partition {
        self.0
    }
}

/// Spreads users by a stable hash of the lower-cased username
#[derive(Debug, Clone, Copy, Default)]
pub struct HashedPlacement;

impl PlacementPolicy for HashedPlacement {
    fn choose_partition(&self, username: &str, _email: &str) -> Partition {
        let digest = Sha256::digest(username.to_lowercase().as_bytes());
        if digest[0] & 1 == 0 {
            Partition::A
        } else {
            Partition::B
        }
    }
}

/// Configured placement, parsed from `a`, `b` or `hashed`
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PlacementStrategy {
    #[default]
    A,
    B,
    Hashed,
}

impl PlacementStrategy {
    pub fn into_policy(self) -> Arc<dyn PlacementPolicy> {
        match self {
            PlacementStrategy::A => Arc::new(FixedPlacement(Partition::A)),
            PlacementStrategy::B => Arc::new(FixedPlacement(Partition::B)),
            PlacementStrategy::Hashed => Arc::new(HashedPlacement),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_fixed_placement_ignores_input() {
        let policy = FixedPlacement(Partition::B);
        assert_eq!(policy.choose_partition("alice", "a@example.com"), Partition::B);
        assert_eq!(policy.choose_partition("bob", "b@example.com"), Partition::B);
    }

    #[test]
    fn test_hashed_placement_is_stable_and_case_insensitive() {
        let policy = HashedPlacement;
        let first = policy.choose_partition("Alice", "a@example.com");

        assert_eq!(policy.choose_partition("alice", "other@example.com"), first);
        assert_eq!(policy.choose_partition("ALICE", "a@example.com"), first);
    }

    #[test]
    fn test_hashed_placement_uses_both_partitions() {
        let policy = HashedPlacement;
        let chosen: Vec<Partition> = (0..32)
            .map(|i| policy.choose_partition(&format!("user{}", i), ""))
            .collect();

        assert!(chosen.contains(&Partition::A));
        assert!(chosen.contains(&Partition::B));
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!(PlacementStrategy::from_str("a").unwrap(), PlacementStrategy::A);
        assert_eq!(PlacementStrategy::from_str("B").unwrap(), PlacementStrategy::B);
        assert_eq!(
            PlacementStrategy::from_str("Hashed").unwrap(),
            PlacementStrategy::Hashed
        );
        assert!(PlacementStrategy::from_str("round-robin").is_err());
        assert_eq!(PlacementStrategy::default().to_string(), "a");
    }

    #[test]
    fn test_strategy_builds_matching_policy() {
        let policy = PlacementStrategy::B.into_policy();
        assert_eq!(policy.choose_partition("alice", "a@example.com"), Partition::B);
    }
}
