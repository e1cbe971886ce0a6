//! Bounded tokio channels behind [`ChainRouter`] and [`PublishSink`].

use std::collections::HashMap;

use ccq_01_wire_format::QueryResponsePublication;
use shared_types::ChainId;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::domain::{PerChainQueryInternal, PER_CHAIN_QUERY_CHANNEL_SIZE};
use crate::ports::{ChainRouter, PublishError, PublishSink, RouteError};

/// One bounded queue per watched chain.
#[derive(Debug, Clone, Default)]
pub struct ChannelRouter {
    senders: HashMap<ChainId, mpsc::Sender<PerChainQueryInternal>>,
}

impl ChannelRouter {
    /// Start building a router.
    pub fn builder() -> ChannelRouterBuilder {
        ChannelRouterBuilder::default()
    }

    /// Router over existing senders.
    pub fn from_senders(senders: HashMap<ChainId, mpsc::Sender<PerChainQueryInternal>>) -> Self {
        Self { senders }
    }
}

impl ChainRouter for ChannelRouter {
    fn routes(&self) -> Vec<ChainId> {
        self.senders.keys().copied().collect()
    }

    fn has_route(&self, chain_id: ChainId) -> bool {
        self.senders.contains_key(&chain_id)
    }

    fn try_send(&self, query: PerChainQueryInternal) -> Result<(), RouteError> {
        let chain_id = query.chain_id();
        let sender = self
            .senders
            .get(&chain_id)
            .ok_or(RouteError::NoRoute(chain_id))?;
        sender.try_send(query).map_err(|e| match e {
            TrySendError::Full(_) => RouteError::ChannelFull(chain_id),
            TrySendError::Closed(_) => RouteError::Closed(chain_id),
        })
    }
}

/// Creates per-chain queues and hands back their receiving ends.
#[derive(Debug, Default)]
pub struct ChannelRouterBuilder {
    capacity: Option<usize>,
    senders: HashMap<ChainId, mpsc::Sender<PerChainQueryInternal>>,
    receivers: HashMap<ChainId, mpsc::Receiver<PerChainQueryInternal>>,
}

impl ChannelRouterBuilder {
    /// Queue capacity for chains added after this call.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Add a queue for `chain_id`. Re-adding a chain replaces its queue.
    pub fn chain(mut self, chain_id: ChainId) -> Self {
        let (tx, rx) = mpsc::channel(self.capacity.unwrap_or(PER_CHAIN_QUERY_CHANNEL_SIZE));
        self.senders.insert(chain_id, tx);
        self.receivers.insert(chain_id, rx);
        self
    }

    /// Finish, returning the router and one receiver per chain.
    pub fn build(
        self,
    ) -> (
        ChannelRouter,
        HashMap<ChainId, mpsc::Receiver<PerChainQueryInternal>>,
    ) {
        (ChannelRouter::from_senders(self.senders), self.receivers)
    }
}

/// Publishes into a bounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelPublishSink {
    tx: mpsc::Sender<QueryResponsePublication>,
}

impl ChannelPublishSink {
    /// Wrap `tx`.
    pub fn new(tx: mpsc::Sender<QueryResponsePublication>) -> Self {
        Self { tx }
    }
}

impl PublishSink for ChannelPublishSink {
    fn try_publish(&self, publication: QueryResponsePublication) -> Result<(), PublishError> {
        self.tx.try_send(publication).map_err(|e| match e {
            TrySendError::Full(p) => PublishError::Full(p),
            TrySendError::Closed(p) => PublishError::Closed(p),
        })
    }
}
