//! Outbound (Driven) ports for the query dispatcher.
//!
//! The dispatcher never blocks on a peer: every hand-off is a `try_*` that
//! either succeeds at once or reports back-pressure.

use async_trait::async_trait;
use ccq_01_wire_format::QueryResponsePublication;
use shared_types::ChainId;

use crate::domain::{PerChainQueryInternal, PerChainQueryResponseInternal};

/// Why a sub-query could not be handed to a watcher.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// No watcher is registered for the chain.
    #[error("no watcher route for chain {0}")]
    NoRoute(ChainId),
    /// The watcher's queue is full.
    #[error("watcher queue for chain {0} is full")]
    ChannelFull(ChainId),
    /// The watcher has shut down.
    #[error("watcher for chain {0} has shut down")]
    Closed(ChainId),
}

/// Routes sub-queries to per-chain watcher queues.
pub trait ChainRouter: Send + Sync {
    /// Chains with a registered watcher.
    fn routes(&self) -> Vec<ChainId>;

    /// True if `chain_id` has a registered watcher.
    fn has_route(&self, chain_id: ChainId) -> bool;

    /// Hand `query` to its chain's watcher without waiting.
    fn try_send(&self, query: PerChainQueryInternal) -> Result<(), RouteError>;
}

/// Why a publication was not accepted. The publication is handed back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    /// The outbound queue is full; retry later.
    #[error("publication queue is full")]
    Full(QueryResponsePublication),
    /// The consumer has shut down.
    #[error("publication queue is closed")]
    Closed(QueryResponsePublication),
}

impl PublishError {
    /// Recover the rejected publication.
    pub fn into_inner(self) -> QueryResponsePublication {
        match self {
            PublishError::Full(p) | PublishError::Closed(p) => p,
        }
    }
}

/// Consumer of completed publications (signing and gossip live behind it).
pub trait PublishSink: Send + Sync {
    /// Offer a publication without waiting.
    fn try_publish(&self, publication: QueryResponsePublication) -> Result<(), PublishError>;
}

/// A chain watcher able to execute one sub-query.
#[async_trait]
pub trait QueryWatcher: Send + Sync {
    /// Execute `query` and report the outcome.
    async fn handle_query(&self, query: PerChainQueryInternal) -> PerChainQueryResponseInternal;
}

/// Test doubles.
#[cfg(test)]
pub mod mocks {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashSet;

    /// Router that records every hand-off.
    pub struct MockRouter {
        routes: HashSet<ChainId>,
        full: Mutex<HashSet<ChainId>>,
        pub sent: Mutex<Vec<PerChainQueryInternal>>,
    }

    impl MockRouter {
        pub fn new(routes: &[ChainId]) -> Self {
            Self {
                routes: routes.iter().copied().collect(),
                full: Mutex::new(HashSet::new()),
                sent: Mutex::new(Vec::new()),
            }
        }

        /// Make `try_send` to `chain_id` report a full queue.
        pub fn set_full(&self, chain_id: ChainId, full: bool) {
            let mut set = self.full.lock();
            if full {
                set.insert(chain_id);
            } else {
                set.remove(&chain_id);
            }
        }

        pub fn sent_to(&self, chain_id: ChainId) -> usize {
            self.sent
                .lock()
                .iter()
                .filter(|q| q.chain_id() == chain_id)
                .count()
        }
    }

    impl ChainRouter for MockRouter {
        fn routes(&self) -> Vec<ChainId> {
            self.routes.iter().copied().collect()
        }

        fn has_route(&self, chain_id: ChainId) -> bool {
            self.routes.contains(&chain_id)
        }

        fn try_send(&self, query: PerChainQueryInternal) -> Result<(), RouteError> {
            let chain_id = query.chain_id();
            if !self.routes.contains(&chain_id) {
                return Err(RouteError::NoRoute(chain_id));
            }
            if self.full.lock().contains(&chain_id) {
                return Err(RouteError::ChannelFull(chain_id));
            }
            self.sent.lock().push(query);
            Ok(())
        }
    }

    /// Sink that can be toggled between accepting and full.
    #[derive(Default)]
    pub struct MockSink {
        full: Mutex<bool>,
        pub published: Mutex<Vec<QueryResponsePublication>>,
    }

    impl MockSink {
        pub fn set_full(&self, full: bool) {
            *self.full.lock() = full;
        }
    }

    impl PublishSink for MockSink {
        fn try_publish(&self, publication: QueryResponsePublication) -> Result<(), PublishError> {
            if *self.full.lock() {
                return Err(PublishError::Full(publication));
            }
            self.published.lock().push(publication);
            Ok(())
        }
    }
}
