//! Static per-chain dispatch configuration.
//!
//! A chain missing from the table does not support queries. Every listed
//! chain must have at least one watcher worker.

use serde::{Deserialize, Serialize};
use shared_types::ChainId;
use std::collections::HashMap;

/// Dispatch settings for one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerChainConfig {
    /// Watcher tasks draining this chain's query channel.
    pub num_workers: usize,
    /// Whether the chain's watcher may answer timestamp queries from a cache.
    pub timestamp_cache_supported: bool,
}

impl PerChainConfig {
    /// Config with `num_workers` workers and timestamp caching enabled.
    pub const fn new(num_workers: usize) -> Self {
        Self {
            num_workers,
            timestamp_cache_supported: true,
        }
    }

    /// True if the chain can serve queries at all.
    pub fn queries_supported(&self) -> bool {
        self.num_workers > 0
    }

    /// Whether timestamp queries may be served from a block-time cache.
    ///
    /// Currently true for every chain; a per-tier rollout has not been decided.
    pub fn supports_timestamp_caching(&self) -> bool {
        true
    }
}

/// Per-chain dispatch settings, keyed by chain id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PerChainConfigTable(pub HashMap<ChainId, PerChainConfig>);

impl PerChainConfigTable {
    /// Settings for `chain_id`, or `None` if queries are not supported there.
    pub fn get(&self, chain_id: ChainId) -> Option<PerChainConfig> {
        self.0.get(&chain_id).copied()
    }

    /// Configured chains.
    pub fn chains(&self) -> impl Iterator<Item = ChainId> + '_ {
        self.0.keys().copied()
    }

    /// Add or replace the entry for `chain_id`.
    pub fn insert(&mut self, chain_id: ChainId, config: PerChainConfig) {
        self.0.insert(chain_id, config);
    }
}

impl Default for PerChainConfigTable {
    fn default() -> Self {
        let busy = [
            (ChainId::SOLANA, 10),
            (ChainId::ETHEREUM, 5),
            (ChainId::POLYGON, 5),
            (ChainId::ARBITRUM, 5),
            (ChainId::OPTIMISM, 5),
            (ChainId::BASE, 5),
            (ChainId::FOGO, 10),
        ];
        let single = [
            ChainId::BSC,
            ChainId::AVALANCHE,
            ChainId::FANTOM,
            ChainId::KLAYTN,
            ChainId::CELO,
            ChainId::MOONBEAM,
            ChainId::SCROLL,
            ChainId::MANTLE,
            ChainId::XLAYER,
            ChainId::LINEA,
            ChainId::BERACHAIN,
            ChainId::UNICHAIN,
            ChainId::WORLDCHAIN,
            ChainId::INK,
            ChainId::SEPOLIA,
            ChainId::HOLESKY,
            ChainId::ARBITRUM_SEPOLIA,
            ChainId::BASE_SEPOLIA,
            ChainId::OPTIMISM_SEPOLIA,
            ChainId::POLYGON_SEPOLIA,
            ChainId::HYPEREVM,
            ChainId::MONAD,
            ChainId::SEIEVM,
            ChainId::MEZO,
        ];

        let table = busy
            .into_iter()
            .chain(single.into_iter().map(|chain| (chain, 1)))
            .map(|(chain, workers)| (chain, PerChainConfig::new(workers)))
            .collect();
        Self(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_worker_counts() {
        let table = PerChainConfigTable::default();
        assert_eq!(table.get(ChainId::SOLANA).map(|c| c.num_workers), Some(10));
        assert_eq!(table.get(ChainId::ETHEREUM).map(|c| c.num_workers), Some(5));
        assert_eq!(table.get(ChainId::BSC).map(|c| c.num_workers), Some(1));
        assert_eq!(table.get(ChainId::FOGO).map(|c| c.num_workers), Some(10));
        assert_eq!(table.get(ChainId::TERRA), None);
    }

    #[test]
    fn test_every_default_entry_supports_queries() {
        let table = PerChainConfigTable::default();
        for chain in table.chains() {
            let config = table.get(chain).unwrap();
            assert!(config.queries_supported(), "{chain} has no workers");
            assert!(config.supports_timestamp_caching());
        }
    }

    #[test]
    fn test_zero_workers_does_not_support_queries() {
        assert!(!PerChainConfig::new(0).queries_supported());
    }
}
