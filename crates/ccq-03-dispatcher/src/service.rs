//! # Query Dispatcher Service
//!
//! Single-task actor that owns every pending request on this guardian.
//!
//! ## Event Loop
//!
//! Each iteration handles exactly one of:
//!
//! 1. an inbound signed request (verify, validate, fan out)
//! 2. a watcher response (fill a slot, publish when complete)
//! 3. an audit tick (timeouts, publish retries, sub-query resends)
//! 4. the shutdown signal
//!
//! All state lives in [`QueryDispatcher::pending`]; no locks are taken. Sends
//! to watchers and to the publish sink never block. A refused send is left
//! for the next audit tick.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use ccq_01_wire_format::{
    PerChainQueryResponse, QueryRequest, SignedQueryRequest, WireError,
};
use ccq_02_query_signing::{query_request_digest, recover_query_request_signer, request_id};
use ccq_telemetry::CcqMetrics;
use shared_types::{address_hex, ChainId};
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::domain::{
    DispatchError, DispatcherConfig, InvalidReason, PendingQuery, PerChainQueryResponseInternal,
    PerChainSlot, QueryStatus,
};
use crate::ports::{ChainRouter, PublishError, PublishSink};

/// The query dispatcher actor.
pub struct QueryDispatcher {
    config: DispatcherConfig,
    router: Arc<dyn ChainRouter>,
    publisher: Arc<dyn PublishSink>,
    metrics: Arc<CcqMetrics>,
    supported_chains: HashSet<ChainId>,
    pending: HashMap<String, PendingQuery>,
}

impl QueryDispatcher {
    /// Create a dispatcher.
    ///
    /// Supported chains are the configured chains that also have a watcher
    /// route. Routes without a config entry are ignored.
    pub fn new(
        config: DispatcherConfig,
        router: Arc<dyn ChainRouter>,
        publisher: Arc<dyn PublishSink>,
        metrics: Arc<CcqMetrics>,
    ) -> Result<Self, DispatchError> {
        config.validate()?;

        let mut supported_chains = HashSet::new();
        for chain_id in config.per_chain.chains() {
            if router.has_route(chain_id) {
                info!(
                    component = "ccq_dispatcher",
                    chain = %chain_id,
                    "Queries supported on chain"
                );
                metrics.register_chain(chain_id);
                supported_chains.insert(chain_id);
            }
        }

        for chain_id in router.routes() {
            if !supported_chains.contains(&chain_id) {
                debug!(
                    component = "ccq_dispatcher",
                    chain = %chain_id,
                    "Watcher route has no per chain config entry, ignoring"
                );
            }
        }

        Ok(Self {
            config,
            router,
            publisher,
            metrics,
            supported_chains,
            pending: HashMap::new(),
        })
    }

    /// Chains this dispatcher will accept sub-queries for.
    pub fn supported_chains(&self) -> &HashSet<ChainId> {
        &self.supported_chains
    }

    /// Number of requests in flight.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// True if `request_id` is in flight.
    pub fn is_pending(&self, request_id: &str) -> bool {
        self.pending.contains_key(request_id)
    }

    /// Dispatcher configuration.
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    // =========================================================================
    // INBOUND REQUESTS
    // =========================================================================

    /// Accept a signed request and fan its sub-queries out to watchers.
    ///
    /// A rejection creates no state and is counted under its reason.
    pub fn handle_signed_request(
        &mut self,
        signed: SignedQueryRequest,
        now: Instant,
    ) -> Result<(), DispatchError> {
        self.metrics.record_request_received();

        match self.accept(signed, now) {
            Ok(request_id) => {
                debug!(
                    component = "ccq_dispatcher",
                    request_id = %request_id,
                    "Received query request"
                );
                Ok(())
            }
            Err(err) => {
                if let Some(reason) = err.reason() {
                    self.metrics.record_invalid_request(reason.label());
                }
                warn!(component = "ccq_dispatcher", error = %err, "Rejected query request");
                Err(err)
            }
        }
    }

    fn accept(&mut self, signed: SignedQueryRequest, now: Instant) -> Result<String, DispatchError> {
        let env = self.config.environment;
        let digest = query_request_digest(env, &signed.query_request);
        let request_id = request_id(env, &signed);

        let signer = recover_query_request_signer(&digest, &signed.signature)
            .map_err(|e| DispatchError::rejected(InvalidReason::FailedToRecoverSigner, e))?;

        if !self.config.is_allowed(&signer) {
            return Err(DispatchError::rejected(
                InvalidReason::UnauthorizedRequestor,
                format!("signer {} is not allowed", address_hex(&signer)),
            ));
        }

        if self.pending.contains_key(&request_id) {
            return Err(DispatchError::rejected(
                InvalidReason::DuplicateRequest,
                format!("request {request_id} is already pending"),
            ));
        }

        let request = QueryRequest::unmarshal(&signed.query_request).map_err(|e| match e {
            WireError::Invalid(v) => DispatchError::rejected(InvalidReason::InvalidRequest, v),
            other => DispatchError::rejected(InvalidReason::FailedToUnmarshalRequest, other),
        })?;

        // Nothing is dispatched unless every sub-query can be.
        for pcq in &request.per_chain_queries {
            if !self.supported_chains.contains(&pcq.chain_id) {
                return Err(DispatchError::rejected(
                    InvalidReason::ChainDoesNotSupportCcq,
                    format!("chain {} does not support queries", pcq.chain_id),
                ));
            }
            if !self.router.has_route(pcq.chain_id) {
                return Err(DispatchError::rejected(
                    InvalidReason::FailedToLookUpChannel,
                    format!("no watcher channel for chain {}", pcq.chain_id),
                ));
            }
        }

        self.metrics.record_valid_request();

        let mut pq = PendingQuery::new(signed, request, request_id.clone(), now);
        for slot in pq.slots.iter_mut() {
            forward_slot(self.router.as_ref(), &self.metrics, slot, now);
        }
        self.pending.insert(request_id.clone(), pq);

        Ok(request_id)
    }

    // =========================================================================
    // WATCHER RESPONSES
    // =========================================================================

    /// Apply one watcher response.
    pub fn handle_response(&mut self, response: PerChainQueryResponseInternal) {
        let chain_id = response.chain_id;

        match response.status {
            QueryStatus::Success => {
                self.metrics.record_success_response(chain_id);
                self.store_response(response);
            }
            QueryStatus::RetryNeeded => {
                self.metrics.record_retry_response(chain_id);
                debug!(
                    component = "ccq_dispatcher",
                    request_id = %response.request_id,
                    request_idx = response.request_idx,
                    chain = %chain_id,
                    "Watcher asked for a retry"
                );
            }
            QueryStatus::FatalError | QueryStatus::Unknown(_) => {
                self.metrics.record_fatal_response(chain_id);
                if self.pending.remove(&response.request_id).is_some() {
                    error!(
                        component = "ccq_dispatcher",
                        request_id = %response.request_id,
                        request_idx = response.request_idx,
                        chain = %chain_id,
                        status = ?response.status,
                        "Fatal query response, dropping request"
                    );
                }
            }
        }
    }

    fn store_response(&mut self, response: PerChainQueryResponseInternal) {
        let request_id = response.request_id;
        let idx = response.request_idx;

        let Some(result) = response.response else {
            warn!(
                component = "ccq_dispatcher",
                request_id = %request_id,
                request_idx = idx,
                "Successful response without a payload, ignoring"
            );
            return;
        };

        let Some(pq) = self.pending.get_mut(&request_id) else {
            debug!(
                component = "ccq_dispatcher",
                request_id = %request_id,
                "Response for an unknown request, ignoring"
            );
            return;
        };

        let Some(pcq) = pq.request.per_chain_queries.get(idx) else {
            warn!(
                component = "ccq_dispatcher",
                request_id = %request_id,
                request_idx = idx,
                "Response index out of range, ignoring"
            );
            return;
        };

        if pcq.chain_id != response.chain_id {
            warn!(
                component = "ccq_dispatcher",
                request_id = %request_id,
                request_idx = idx,
                expected = %pcq.chain_id,
                actual = %response.chain_id,
                "Response from the wrong chain, ignoring"
            );
            return;
        }

        if pq.responses[idx].is_some() {
            debug!(
                component = "ccq_dispatcher",
                request_id = %request_id,
                request_idx = idx,
                "Duplicate response, ignoring"
            );
            return;
        }

        let expected = pcq.query.query_type();
        let actual = result.response_type();
        if expected != actual {
            error!(
                component = "ccq_dispatcher",
                request_id = %request_id,
                request_idx = idx,
                expected = ?expected,
                actual = ?actual,
                "Watcher response type does not match query type, dropping request"
            );
            self.pending.remove(&request_id);
            return;
        }

        pq.responses[idx] = Some(PerChainQueryResponse {
            chain_id: pcq.chain_id,
            response: result,
        });

        if pq.num_pending() == 0 {
            self.publish(&request_id);
        }
    }

    /// Offer the completed publication of `request_id` to the sink.
    ///
    /// On back-pressure the publication is cached on the pending entry.
    fn publish(&mut self, request_id: &str) {
        let Some(pq) = self.pending.get_mut(request_id) else {
            return;
        };
        let Some(publication) = pq.cached_publication.take().or_else(|| pq.publication()) else {
            return;
        };

        match self.publisher.try_publish(publication) {
            Ok(()) => {
                self.metrics.record_published();
                info!(
                    component = "ccq_dispatcher",
                    request_id = %request_id,
                    "Query response published"
                );
                self.pending.remove(request_id);
            }
            Err(PublishError::Full(publication)) => {
                warn!(
                    component = "ccq_dispatcher",
                    request_id = %request_id,
                    "Publication queue full, will retry on audit"
                );
                pq.cached_publication = Some(publication);
            }
            Err(PublishError::Closed(publication)) => {
                error!(
                    component = "ccq_dispatcher",
                    request_id = %request_id,
                    "Publication queue closed"
                );
                pq.cached_publication = Some(publication);
            }
        }
    }

    // =========================================================================
    // AUDIT
    // =========================================================================

    /// Expire old requests, retry cached publications, and resend idle sub-queries.
    pub fn audit(&mut self, now: Instant) {
        let request_timeout = self.config.request_timeout;
        let retry_interval = self.config.retry_interval;
        let mut timed_out = Vec::new();
        let mut unpublished = Vec::new();

        for (request_id, pq) in self.pending.iter_mut() {
            if now.saturating_duration_since(pq.receive_time) > request_timeout {
                timed_out.push(request_id.clone());
                continue;
            }

            if pq.cached_publication.is_some() {
                unpublished.push(request_id.clone());
                continue;
            }

            for (slot, response) in pq.slots.iter_mut().zip(pq.responses.iter()) {
                if response.is_none() && slot.needs_resend(now, retry_interval) {
                    debug!(
                        component = "ccq_dispatcher",
                        request_id = %request_id,
                        request_idx = slot.query.request_idx,
                        chain = %slot.query.chain_id(),
                        "Resending query"
                    );
                    forward_slot(self.router.as_ref(), &self.metrics, slot, now);
                }
            }
        }

        for request_id in timed_out {
            self.pending.remove(&request_id);
            self.metrics.record_timed_out();
            warn!(
                component = "ccq_dispatcher",
                request_id = %request_id,
                "Query request timed out"
            );
        }

        for request_id in unpublished {
            self.publish(&request_id);
        }
    }

    // =========================================================================
    // EVENT LOOP
    // =========================================================================

    /// Run until `shutdown` changes or its sender is dropped.
    ///
    /// In-flight requests are discarded on exit.
    pub async fn run(
        mut self,
        mut signed_rx: mpsc::Receiver<SignedQueryRequest>,
        mut response_rx: mpsc::Receiver<PerChainQueryResponseInternal>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut audit_interval = tokio::time::interval(self.config.audit_interval);
        audit_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            component = "ccq_dispatcher",
            chains = self.supported_chains.len(),
            "Query dispatcher started"
        );

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!(component = "ccq_dispatcher", "Shutdown signal received");
                    break;
                }
                Some(signed) = signed_rx.recv() => {
                    // Rejections are logged and counted in handle_signed_request.
                    let _ = self.handle_signed_request(signed, Instant::now());
                }
                Some(response) = response_rx.recv() => {
                    self.handle_response(response);
                }
                _ = audit_interval.tick() => {
                    self.audit(Instant::now());
                }
            }
        }

        info!(
            component = "ccq_dispatcher",
            dropped = self.pending.len(),
            "Query dispatcher stopped"
        );
    }
}

/// Hand one slot to its watcher. `last_update_time` moves only on success.
fn forward_slot(
    router: &dyn ChainRouter,
    metrics: &CcqMetrics,
    slot: &mut PerChainSlot,
    now: Instant,
) {
    let chain_id = slot.query.chain_id();
    match router.try_send(slot.query.clone()) {
        Ok(()) => {
            slot.last_update_time = Some(now);
            metrics.record_forwarded(chain_id);
        }
        Err(e) => {
            warn!(
                component = "ccq_dispatcher",
                request_id = %slot.query.request_id,
                request_idx = slot.query.request_idx,
                chain = %chain_id,
                error = %e,
                "Failed to forward query to watcher, will retry on audit"
            );
        }
    }
}
