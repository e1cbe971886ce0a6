//! Bounded tokio channel behind [`RequestPublisher`].

use ccq_01_wire_format::SignedQueryRequest;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::domain::AggregatorError;
use crate::ports::RequestPublisher;

/// Publishes requests into a bounded channel drained by the gossip layer.
#[derive(Debug, Clone)]
pub struct ChannelRequestPublisher {
    tx: mpsc::Sender<SignedQueryRequest>,
}

impl ChannelRequestPublisher {
    /// Wrap `tx`.
    pub fn new(tx: mpsc::Sender<SignedQueryRequest>) -> Self {
        Self { tx }
    }
}

impl RequestPublisher for ChannelRequestPublisher {
    fn publish_request(&self, request: SignedQueryRequest) -> Result<(), AggregatorError> {
        self.tx.try_send(request).map_err(|e| match e {
            TrySendError::Full(_) => AggregatorError::Busy,
            TrySendError::Closed(_) => AggregatorError::Closed,
        })
    }
}
