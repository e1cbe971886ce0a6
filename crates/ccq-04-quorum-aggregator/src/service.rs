//! # Quorum Aggregator Service
//!
//! Single-task actor consuming guardian-signed publications from gossip.
//!
//! For each pending request it keeps `digest -> [GuardianSignature]`. Guardians
//! can observe different chain state (e.g. across a rollback), so each digest
//! accumulates on its own. The first digest to reach quorum is delivered; if
//! no digest can reach quorum any more, `QuorumNotMet` is delivered instead.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use ccq_01_wire_format::{QueryResponsePublication, SignedQueryResponse};
use ccq_02_query_signing::{
    query_response_digest, recover_prefixed_signer, recover_query_request_signer,
};
use ccq_telemetry::CcqMetrics;
use shared_types::{address_hex, Address, GuardianSet, Hash};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::domain::{
    AggregatorConfig, AggregatorError, Aggregation, GuardianSignature, InboundError,
    PendingResponseRegistry, QueryOutcome, SignedResponse,
};
use crate::ports::GuardianSetProvider;

type SignaturesByDigest = HashMap<Hash, Vec<GuardianSignature>>;

/// The quorum aggregator actor.
pub struct QuorumAggregator {
    config: AggregatorConfig,
    registry: Arc<PendingResponseRegistry>,
    guardians: Arc<dyn GuardianSetProvider>,
    metrics: Arc<CcqMetrics>,
    responses: HashMap<String, SignaturesByDigest>,
}

impl QuorumAggregator {
    /// Create an aggregator over `registry`.
    pub fn new(
        config: AggregatorConfig,
        registry: Arc<PendingResponseRegistry>,
        guardians: Arc<dyn GuardianSetProvider>,
        metrics: Arc<CcqMetrics>,
    ) -> Result<Self, AggregatorError> {
        config.validate()?;
        Ok(Self {
            config,
            registry,
            guardians,
            metrics,
            responses: HashMap::new(),
        })
    }

    /// Requests with at least one recorded signature.
    pub fn num_tracked(&self) -> usize {
        self.responses.len()
    }

    /// Apply one gossiped response.
    pub fn handle_response(
        &mut self,
        signed: &SignedQueryResponse,
    ) -> Result<Aggregation, InboundError> {
        self.metrics.record_response_received();

        let result = self.aggregate(signed);
        if let Err(e) = &result {
            self.metrics.record_inbound_error(e.label());
            match e {
                InboundError::UnknownGuardian(_) => warn!(
                    component = "ccq_aggregator",
                    error = %e,
                    "Received response from unknown guardian, is the guardian set outdated?"
                ),
                _ => warn!(component = "ccq_aggregator", error = %e, "Discarded query response"),
            }
        }
        result
    }

    fn aggregate(&mut self, signed: &SignedQueryResponse) -> Result<Aggregation, InboundError> {
        let response = QueryResponsePublication::unmarshal(&signed.query_response)
            .map_err(InboundError::FailedToUnmarshalResponse)?;
        let request_signature = response.request_signature_hex();

        let Some(pending) = self.registry.get(&request_signature) else {
            // Normal for responses arriving after quorum.
            debug!(
                component = "ccq_aggregator",
                request_signature = %request_signature,
                "Skipping response for unknown request"
            );
            return Ok(Aggregation::Ignored);
        };
        if pending.is_completed() {
            return Ok(Aggregation::Ignored);
        }

        if response.request != pending.signed_request {
            return Err(InboundError::RequestMismatch);
        }

        let digest = query_response_digest(&signed.query_response);
        let guardian_set = self.guardians.current();
        let index = recover_guardian_index(&guardian_set, &digest, &signed.signature)?;
        let quorum = guardian_set.quorum();

        let by_digest = self.responses.entry(request_signature.clone()).or_default();
        let signers = by_digest.entry(digest).or_default();
        if signers.iter().any(|s| s.index == index) {
            return Ok(Aggregation::DuplicateSigner);
        }
        signers.push(GuardianSignature {
            index,
            signature: signed.signature.clone(),
        });
        let num_signers = signers.len();

        if num_signers >= quorum {
            let signatures = std::mem::take(signers);
            self.responses.remove(&request_signature);

            let outcome = QueryOutcome::Answered(SignedResponse {
                response,
                response_bytes: signed.query_response.clone(),
                signatures,
            });
            if pending.try_deliver(outcome) {
                self.metrics.record_quorum_reached();
                info!(
                    component = "ccq_aggregator",
                    request_signature = %request_signature,
                    num_signers,
                    quorum,
                    "Quorum reached, forwarded query response"
                );
            } else {
                error!(
                    component = "ccq_aggregator",
                    request_signature = %request_signature,
                    "Failed to hand over query response, dropping it"
                );
            }
            return Ok(Aggregation::QuorumReached);
        }

        let responded: HashSet<usize> = by_digest.values().flatten().map(|s| s.index).collect();
        let max_matching = by_digest.values().map(Vec::len).max().unwrap_or(0);
        let outstanding = guardian_set.len().saturating_sub(responded.len());

        if max_matching + outstanding < quorum {
            self.responses.remove(&request_signature);
            if pending.try_deliver(QueryOutcome::QuorumNotMet) {
                self.metrics.record_quorum_not_met();
                info!(
                    component = "ccq_aggregator",
                    request_signature = %request_signature,
                    max_matching,
                    outstanding,
                    quorum,
                    "Query failed, quorum not met"
                );
            } else {
                error!(
                    component = "ccq_aggregator",
                    request_signature = %request_signature,
                    "Failed to hand over quorum failure, dropping it"
                );
            }
            return Ok(Aggregation::QuorumNotMet);
        }

        debug!(
            component = "ccq_aggregator",
            request_signature = %request_signature,
            num_signers,
            max_matching,
            outstanding,
            quorum,
            "Waiting for more query responses"
        );
        Ok(Aggregation::Waiting {
            num_signers,
            max_matching,
            outstanding,
            quorum,
        })
    }

    /// Drop expired registry entries and the bookkeeping of requests no longer pending.
    pub fn prune(&mut self) {
        let expired = self
            .registry
            .remove_expired(self.config.response_wait_timeout());
        let registry = &self.registry;
        let before = self.responses.len();
        self.responses
            .retain(|request_signature, _| registry.contains(request_signature));
        let pruned = before - self.responses.len();
        if expired > 0 || pruned > 0 {
            debug!(
                component = "ccq_aggregator",
                expired,
                pruned,
                "Pruned stale aggregation state"
            );
        }
    }

    /// Run until `shutdown` changes or the gossip channel closes.
    pub async fn run(
        mut self,
        mut responses: mpsc::Receiver<SignedQueryResponse>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut cleanup = tokio::time::interval(self.config.cleanup_interval);
        cleanup.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(component = "ccq_aggregator", "Quorum aggregator started");

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!(component = "ccq_aggregator", "Shutdown signal received");
                    break;
                }
                next = responses.recv() => {
                    let Some(signed) = next else {
                        warn!(component = "ccq_aggregator", "Gossip channel closed");
                        break;
                    };
                    // Failures are logged and counted in handle_response.
                    let _ = self.handle_response(&signed);
                }
                _ = cleanup.tick() => {
                    self.prune();
                }
            }
        }
    }
}

/// Map the signer of `signature` over `digest` to a guardian slot.
///
/// Tries a raw signature first and then an EIP-191 `personal_sign` one.
/// Slots above `u8::MAX` count as unknown: the answer encodes the index in one byte.
fn recover_guardian_index(
    guardian_set: &GuardianSet,
    digest: &Hash,
    signature: &[u8],
) -> Result<usize, InboundError> {
    let slot = |address: &Address| {
        guardian_set
            .key_index(address)
            .filter(|&index| index <= usize::from(u8::MAX))
    };

    let raw = recover_query_request_signer(digest, signature);
    if let Some(index) = raw.as_ref().ok().and_then(slot) {
        return Ok(index);
    }

    let prefixed = recover_prefixed_signer(digest, signature);
    if let Some(index) = prefixed.as_ref().ok().and_then(slot) {
        return Ok(index);
    }

    match (raw, prefixed) {
        (Ok(address), _) | (Err(_), Ok(address)) => {
            Err(InboundError::UnknownGuardian(address_hex(&address)))
        }
        (Err(e), Err(_)) => Err(InboundError::FailedToVerifySignature(e)),
    }
}
