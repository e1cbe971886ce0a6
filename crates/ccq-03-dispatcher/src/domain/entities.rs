//! # Dispatcher Entities
//!
//! Messages exchanged with watchers, and the per-request state owned by the
//! dispatcher actor.

use ccq_01_wire_format::{
    ChainSpecificResponse, PerChainQueryRequest, PerChainQueryResponse, QueryRequest,
    QueryResponsePublication, SignedQueryRequest,
};
use shared_types::ChainId;
use tokio::time::Instant;

/// One sub-query handed to a chain watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerChainQueryInternal {
    /// Identity of the parent request.
    pub request_id: String,
    /// Position of this sub-query in the parent request.
    pub request_idx: usize,
    /// The sub-query itself.
    pub request: PerChainQueryRequest,
}

impl PerChainQueryInternal {
    /// Chain this sub-query targets.
    pub fn chain_id(&self) -> ChainId {
        self.request.chain_id
    }
}

/// Outcome a watcher reports for one sub-query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// The query ran and a response is attached.
    Success,
    /// Transient failure; the dispatcher resends after the retry interval.
    RetryNeeded,
    /// Permanent failure; the whole request is abandoned.
    FatalError,
    /// A status code this dispatcher does not recognise. Handled as fatal.
    Unknown(u8),
}

impl From<u8> for QueryStatus {
    fn from(code: u8) -> Self {
        match code {
            1 => QueryStatus::Success,
            2 => QueryStatus::RetryNeeded,
            3 => QueryStatus::FatalError,
            other => QueryStatus::Unknown(other),
        }
    }
}

/// A watcher's answer to a [`PerChainQueryInternal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerChainQueryResponseInternal {
    /// Identity of the parent request.
    pub request_id: String,
    /// Position of the answered sub-query.
    pub request_idx: usize,
    /// Chain the query ran against.
    pub chain_id: ChainId,
    /// Outcome.
    pub status: QueryStatus,
    /// Result, present on success.
    pub response: Option<ChainSpecificResponse>,
}

impl PerChainQueryResponseInternal {
    /// Build a response for `query`.
    pub fn new(
        query: &PerChainQueryInternal,
        status: QueryStatus,
        response: Option<ChainSpecificResponse>,
    ) -> Self {
        Self {
            request_id: query.request_id.clone(),
            request_idx: query.request_idx,
            chain_id: query.chain_id(),
            status,
            response,
        }
    }
}

/// A sub-query slot of a pending request.
#[derive(Debug, Clone)]
pub struct PerChainSlot {
    /// What is sent to the watcher.
    pub query: PerChainQueryInternal,
    /// Last successful hand-off to the watcher. `None` until the first one.
    pub last_update_time: Option<Instant>,
}

impl PerChainSlot {
    /// True if the slot has never been handed off, or has been idle past `retry_interval`.
    pub fn needs_resend(&self, now: Instant, retry_interval: std::time::Duration) -> bool {
        match self.last_update_time {
            None => true,
            Some(last) => now.saturating_duration_since(last) > retry_interval,
        }
    }
}

/// A validated request in flight on this guardian.
///
/// `slots` and `responses` are parallel and have one entry per per-chain query.
#[derive(Debug, Clone)]
pub struct PendingQuery {
    /// The request exactly as received.
    pub signed_request: SignedQueryRequest,
    /// Its decoded form.
    pub request: QueryRequest,
    /// `hex(signature):0x<digest>`.
    pub request_id: String,
    /// When the request was accepted.
    pub receive_time: Instant,
    /// Sub-query hand-off state.
    pub slots: Vec<PerChainSlot>,
    /// Watcher results, `None` until filled.
    pub responses: Vec<Option<PerChainQueryResponse>>,
    /// Set only when publishing hit back-pressure.
    pub cached_publication: Option<QueryResponsePublication>,
}

impl PendingQuery {
    /// Create the pending entry with one empty slot per sub-query.
    pub fn new(
        signed_request: SignedQueryRequest,
        request: QueryRequest,
        request_id: String,
        receive_time: Instant,
    ) -> Self {
        let slots: Vec<PerChainSlot> = request
            .per_chain_queries
            .iter()
            .enumerate()
            .map(|(request_idx, pcq)| PerChainSlot {
                query: PerChainQueryInternal {
                    request_id: request_id.clone(),
                    request_idx,
                    request: pcq.clone(),
                },
                last_update_time: None,
            })
            .collect();
        let responses = vec![None; slots.len()];

        Self {
            signed_request,
            request,
            request_id,
            receive_time,
            slots,
            responses,
            cached_publication: None,
        }
    }

    /// Number of sub-queries still awaiting a result.
    pub fn num_pending(&self) -> usize {
        self.responses.iter().filter(|r| r.is_none()).count()
    }

    /// Assemble the publication once every slot is filled, in request order.
    pub fn publication(&self) -> Option<QueryResponsePublication> {
        let per_chain_responses = self
            .responses
            .iter()
            .cloned()
            .collect::<Option<Vec<_>>>()?;
        Some(QueryResponsePublication {
            request: self.signed_request.clone(),
            per_chain_responses,
        })
    }
}
