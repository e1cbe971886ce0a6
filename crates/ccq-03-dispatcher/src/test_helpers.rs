//! Scripted watcher for dispatcher tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use ccq_01_wire_format::test_helpers::response_for;
use parking_lot::Mutex;
use shared_types::ChainId;

use crate::domain::{PerChainQueryInternal, PerChainQueryResponseInternal, QueryStatus};
use crate::ports::QueryWatcher;

/// Watcher whose answers are scripted per chain.
///
/// By default every query succeeds with [`response_for`]. A chain can be made
/// to answer `RetryNeeded` a fixed number of times first, forever, or to fail
/// fatally. Invocations are counted per chain.
#[derive(Default)]
pub struct ScriptedWatcher {
    retries: HashMap<ChainId, usize>,
    fatal: HashSet<ChainId>,
    invocations: Mutex<HashMap<ChainId, usize>>,
}

impl ScriptedWatcher {
    /// Watcher that answers everything successfully.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `RetryNeeded` for the first `count` queries on `chain_id`.
    pub fn with_retries(mut self, chain_id: ChainId, count: usize) -> Self {
        self.retries.insert(chain_id, count);
        self
    }

    /// Never succeed on `chain_id`.
    pub fn always_retry(self, chain_id: ChainId) -> Self {
        self.with_retries(chain_id, usize::MAX)
    }

    /// Answer `FatalError` on `chain_id`.
    pub fn fatal(mut self, chain_id: ChainId) -> Self {
        self.fatal.insert(chain_id);
        self
    }

    /// Queries seen for `chain_id`.
    pub fn invocations(&self, chain_id: ChainId) -> usize {
        self.invocations.lock().get(&chain_id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl QueryWatcher for ScriptedWatcher {
    async fn handle_query(&self, query: PerChainQueryInternal) -> PerChainQueryResponseInternal {
        let chain_id = query.chain_id();
        let seen = {
            let mut invocations = self.invocations.lock();
            let count = invocations.entry(chain_id).or_insert(0);
            *count += 1;
            *count
        };

        if self.fatal.contains(&chain_id) {
            return PerChainQueryResponseInternal::new(&query, QueryStatus::FatalError, None);
        }
        if seen <= self.retries.get(&chain_id).copied().unwrap_or(0) {
            return PerChainQueryResponseInternal::new(&query, QueryStatus::RetryNeeded, None);
        }

        let response = response_for(&query.request).response;
        PerChainQueryResponseInternal::new(&query, QueryStatus::Success, Some(response))
    }
}
