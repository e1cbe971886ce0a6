//! Prometheus metrics for the cross-chain query actors.
//!
//! All metrics follow the naming convention `ccq_<role>_<metric>`, where the
//! role is `guardian` (dispatcher side) or `server` (aggregator side).
//!
//! Each [`CcqMetrics`] owns its registry, so two dispatchers in one process
//! (or two tests in one binary) never share counters.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use shared_types::ChainId;

use crate::TelemetryError;

/// Counters for one CCQ process.
pub struct CcqMetrics {
    registry: Registry,

    // Dispatcher (guardian side)
    all_query_requests_received: IntCounter,
    invalid_query_requests_received: IntCounterVec,
    valid_query_requests_received: IntCounter,
    total_requests_by_chain: IntCounterVec,
    successful_responses_by_chain: IntCounterVec,
    retry_needed_responses_by_chain: IntCounterVec,
    fatal_responses_by_chain: IntCounterVec,
    query_responses_published: IntCounter,
    query_requests_timed_out: IntCounter,

    // Aggregator (server side)
    query_responses_received: IntCounter,
    inbound_p2p_errors: IntCounterVec,
    quorum_reached: IntCounter,
    quorum_not_met: IntCounter,
}

fn counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter, TelemetryError> {
    let c = IntCounter::new(name, help)?;
    registry.register(Box::new(c.clone()))?;
    Ok(c)
}

fn counter_vec(
    registry: &Registry,
    name: &str,
    help: &str,
    label: &str,
) -> Result<IntCounterVec, TelemetryError> {
    let c = IntCounterVec::new(Opts::new(name, help), &[label])?;
    registry.register(Box::new(c.clone()))?;
    Ok(c)
}

impl CcqMetrics {
    /// Create and register every counter in a fresh registry.
    pub fn new() -> Result<Self, TelemetryError> {
        let registry = Registry::new();

        Ok(Self {
            all_query_requests_received: counter(
                &registry,
                "ccq_guardian_total_query_requests_received",
                "Total number of query requests received, valid and invalid",
            )?,
            invalid_query_requests_received: counter_vec(
                &registry,
                "ccq_guardian_invalid_query_requests_received_by_reason",
                "Total number of invalid query requests received by reason",
                "reason",
            )?,
            valid_query_requests_received: counter(
                &registry,
                "ccq_guardian_total_valid_query_requests_received",
                "Total number of valid query requests received",
            )?,
            total_requests_by_chain: counter_vec(
                &registry,
                "ccq_guardian_total_requests_by_chain",
                "Total number of requests forwarded to each watcher",
                "chain_name",
            )?,
            successful_responses_by_chain: counter_vec(
                &registry,
                "ccq_guardian_total_successful_query_responses_received_by_chain",
                "Total number of successful query responses received by chain",
                "chain_name",
            )?,
            retry_needed_responses_by_chain: counter_vec(
                &registry,
                "ccq_guardian_total_retry_needed_query_responses_received_by_chain",
                "Total number of retry needed query responses received by chain",
                "chain_name",
            )?,
            fatal_responses_by_chain: counter_vec(
                &registry,
                "ccq_guardian_total_fatal_query_responses_received_by_chain",
                "Total number of fatal query responses received by chain",
                "chain_name",
            )?,
            query_responses_published: counter(
                &registry,
                "ccq_guardian_total_query_responses_published",
                "Total number of query responses handed to the publisher",
            )?,
            query_requests_timed_out: counter(
                &registry,
                "ccq_guardian_total_query_requests_timed_out",
                "Total number of query requests that timed out",
            )?,
            query_responses_received: counter(
                &registry,
                "ccq_server_query_responses_received",
                "Total number of signed query responses received from gossip",
            )?,
            inbound_p2p_errors: counter_vec(
                &registry,
                "ccq_server_inbound_p2p_errors_by_reason",
                "Total number of discarded gossip responses by reason",
                "reason",
            )?,
            quorum_reached: counter(
                &registry,
                "ccq_server_quorum_reached",
                "Total number of requests answered with a quorum of signatures",
            )?,
            quorum_not_met: counter(
                &registry,
                "ccq_server_quorum_not_met",
                "Total number of requests for which quorum became unreachable",
            )?,
            registry,
        })
    }

    /// Touch the per-chain counter so enabled chains show up at zero.
    pub fn register_chain(&self, chain_id: ChainId) {
        self.total_requests_by_chain
            .with_label_values(&[chain_id.to_string().as_str()])
            .inc_by(0);
    }

    /// Record an inbound signed request, before any validation.
    pub fn record_request_received(&self) {
        self.all_query_requests_received.inc();
    }

    /// Record a rejected request under a reason label.
    pub fn record_invalid_request(&self, reason: &str) {
        self.invalid_query_requests_received
            .with_label_values(&[reason])
            .inc();
    }

    /// Record a request that passed every accept-path check.
    pub fn record_valid_request(&self) {
        self.valid_query_requests_received.inc();
    }

    /// Record a sub-query handed to a watcher channel.
    pub fn record_forwarded(&self, chain_id: ChainId) {
        self.total_requests_by_chain
            .with_label_values(&[chain_id.to_string().as_str()])
            .inc();
    }

    /// Record a `Success` watcher response.
    pub fn record_success_response(&self, chain_id: ChainId) {
        self.successful_responses_by_chain
            .with_label_values(&[chain_id.to_string().as_str()])
            .inc();
    }

    /// Record a `RetryNeeded` watcher response.
    pub fn record_retry_response(&self, chain_id: ChainId) {
        self.retry_needed_responses_by_chain
            .with_label_values(&[chain_id.to_string().as_str()])
            .inc();
    }

    /// Record a `FatalError` (or unknown status) watcher response.
    pub fn record_fatal_response(&self, chain_id: ChainId) {
        self.fatal_responses_by_chain
            .with_label_values(&[chain_id.to_string().as_str()])
            .inc();
    }

    /// Record a publication accepted by the publish sink.
    pub fn record_published(&self) {
        self.query_responses_published.inc();
    }

    /// Record a request dropped by the audit tick.
    pub fn record_timed_out(&self) {
        self.query_requests_timed_out.inc();
    }

    /// Record a gossiped signed response reaching the aggregator.
    pub fn record_response_received(&self) {
        self.query_responses_received.inc();
    }

    /// Record a discarded gossiped response under a reason label.
    pub fn record_inbound_error(&self, reason: &str) {
        self.inbound_p2p_errors.with_label_values(&[reason]).inc();
    }

    /// Record a quorum-backed answer.
    pub fn record_quorum_reached(&self) {
        self.quorum_reached.inc();
    }

    /// Record a request whose quorum can no longer be reached.
    pub fn record_quorum_not_met(&self) {
        self.quorum_not_met.inc();
    }

    /// Invalid requests counted under `reason`.
    pub fn invalid_requests(&self, reason: &str) -> u64 {
        self.invalid_query_requests_received
            .with_label_values(&[reason])
            .get()
    }

    /// Sub-queries forwarded to the watcher of `chain_id`.
    pub fn forwarded(&self, chain_id: ChainId) -> u64 {
        self.total_requests_by_chain
            .with_label_values(&[chain_id.to_string().as_str()])
            .get()
    }

    /// Discarded gossip responses counted under `reason`.
    pub fn inbound_errors(&self, reason: &str) -> u64 {
        self.inbound_p2p_errors.with_label_values(&[reason]).get()
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_received: self.all_query_requests_received.get(),
            valid_requests: self.valid_query_requests_received.get(),
            responses_published: self.query_responses_published.get(),
            requests_timed_out: self.query_requests_timed_out.get(),
            responses_received: self.query_responses_received.get(),
            quorum_reached: self.quorum_reached.get(),
            quorum_not_met: self.quorum_not_met.get(),
        }
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn gather_text(&self) -> Result<String, TelemetryError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// All inbound signed requests
    pub requests_received: u64,
    /// Requests that created a pending query
    pub valid_requests: u64,
    /// Publications accepted by the sink
    pub responses_published: u64,
    /// Requests dropped after the absolute timeout
    pub requests_timed_out: u64,
    /// Gossiped responses seen by the aggregator
    pub responses_received: u64,
    /// Quorum-backed answers delivered
    pub quorum_reached: u64,
    /// Requests failed early because quorum became unreachable
    pub quorum_not_met: u64,
}
