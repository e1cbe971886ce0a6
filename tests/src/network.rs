//! # In-Process Guardian Network
//!
//! Wires real components together over tokio channels:
//!
//! ```text
//! QueryHandler ──► request gossip ──► N × [QueryDispatcher ─► workers ─► watcher]
//!      ▲                                          │
//!      │                                    sign publication
//!      │                                          ▼
//!      └──── QuorumAggregator ◄────────── response gossip
//! ```

use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use ccq_01_wire_format::{ChainSpecificResponse, SignedQueryRequest, SignedQueryResponse};
use ccq_02_query_signing::sign_query_response;
use ccq_02_query_signing::test_helpers::guardian_keys;
use ccq_03_dispatcher::{
    spawn_workers, ChannelPublishSink, ChannelRouter, DispatcherConfig, PerChainConfig,
    PerChainQueryInternal, PerChainQueryResponseInternal, QueryDispatcher, QueryStatus,
    QueryWatcher, QUERY_RESPONSE_CHANNEL_SIZE, QUERY_RESPONSE_PUBLICATION_CHANNEL_SIZE,
    SIGNED_QUERY_REQUEST_CHANNEL_SIZE,
};
use ccq_04_quorum_aggregator::{
    AggregatorConfig, ChannelRequestPublisher, PendingResponseRegistry, QueryHandler,
    QuorumAggregator, StaticGuardianSet, SIGNED_QUERY_RESPONSE_CHANNEL_SIZE,
};
use ccq_telemetry::CcqMetrics;
use k256::ecdsa::SigningKey;
use shared_types::{Address, ChainId, GuardianSet};
use tokio::sync::{mpsc, watch};
use tracing::warn;

/// Boxed setup error.
pub type SetupError = Box<dyn Error + Send + Sync>;

/// A running network of guardians and one client-side aggregator.
pub struct GuardianNetwork {
    /// Client accept path.
    pub client: QueryHandler,
    /// Aggregator metrics.
    pub aggregator_metrics: Arc<CcqMetrics>,
    /// Metrics of each guardian's dispatcher, in guardian index order.
    pub guardian_metrics: Vec<Arc<CcqMetrics>>,
    /// Guardian addresses, in index order.
    pub guardians: Vec<Address>,
    shutdown: watch::Sender<bool>,
}

impl GuardianNetwork {
    /// Start one guardian per watcher, each serving `chains`.
    pub fn start(
        watchers: Vec<Arc<dyn QueryWatcher>>,
        chains: &[ChainId],
        dispatcher_config: DispatcherConfig,
        aggregator_config: AggregatorConfig,
    ) -> Result<Self, SetupError> {
        let (keys, addresses) = guardian_keys(watchers.len());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (gossip_tx, gossip_rx) = mpsc::channel(SIGNED_QUERY_RESPONSE_CHANNEL_SIZE);

        let mut guardian_inboxes = Vec::new();
        let mut guardian_metrics = Vec::new();
        for (key, watcher) in keys.into_iter().zip(watchers) {
            let metrics = Arc::new(CcqMetrics::new()?);
            let inbox = spawn_guardian(
                key,
                watcher,
                chains,
                dispatcher_config.clone(),
                metrics.clone(),
                gossip_tx.clone(),
                shutdown_rx.clone(),
            )?;
            guardian_inboxes.push(inbox);
            guardian_metrics.push(metrics);
        }

        // Request gossip: every guardian sees every request.
        let (request_tx, mut request_rx) = mpsc::channel::<SignedQueryRequest>(16);
        tokio::spawn(async move {
            while let Some(request) = request_rx.recv().await {
                for inbox in &guardian_inboxes {
                    let _ = inbox.send(request.clone()).await;
                }
            }
        });

        let registry = Arc::new(PendingResponseRegistry::new());
        let aggregator_metrics = Arc::new(CcqMetrics::new()?);
        let aggregator = QuorumAggregator::new(
            aggregator_config.clone(),
            registry.clone(),
            Arc::new(StaticGuardianSet::new(GuardianSet::new(addresses.clone(), 0))),
            aggregator_metrics.clone(),
        )?;
        tokio::spawn(aggregator.run(gossip_rx, shutdown_rx));

        let client = QueryHandler::new(
            aggregator_config,
            registry,
            Arc::new(ChannelRequestPublisher::new(request_tx)),
        );

        Ok(Self {
            client,
            aggregator_metrics,
            guardian_metrics,
            guardians: addresses,
            shutdown: shutdown_tx,
        })
    }

    /// Stop every actor.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}

impl Drop for GuardianNetwork {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// One guardian: dispatcher, worker pools, and a publication signer.
///
/// Returns the guardian's request inbox.
fn spawn_guardian(
    key: SigningKey,
    watcher: Arc<dyn QueryWatcher>,
    chains: &[ChainId],
    config: DispatcherConfig,
    metrics: Arc<CcqMetrics>,
    gossip: mpsc::Sender<SignedQueryResponse>,
    shutdown: watch::Receiver<bool>,
) -> Result<mpsc::Sender<SignedQueryRequest>, SetupError> {
    let mut builder = ChannelRouter::builder();
    for chain_id in chains {
        builder = builder.chain(*chain_id);
    }
    let (router, receivers) = builder.build();

    let (response_tx, response_rx) = mpsc::channel(QUERY_RESPONSE_CHANNEL_SIZE);
    for (chain_id, rx) in receivers {
        spawn_workers(
            chain_id,
            watcher.clone(),
            rx,
            PerChainConfig::new(2),
            response_tx.clone(),
            shutdown.clone(),
        );
    }

    let (publication_tx, mut publication_rx) =
        mpsc::channel(QUERY_RESPONSE_PUBLICATION_CHANNEL_SIZE);
    let (request_tx, request_rx) = mpsc::channel(SIGNED_QUERY_REQUEST_CHANNEL_SIZE);

    let dispatcher = QueryDispatcher::new(
        config,
        Arc::new(router),
        Arc::new(ChannelPublishSink::new(publication_tx)),
        metrics,
    )?;
    tokio::spawn(dispatcher.run(request_rx, response_rx, shutdown));

    tokio::spawn(async move {
        while let Some(publication) = publication_rx.recv().await {
            let signed = publication
                .marshal()
                .map_err(|e| e.to_string())
                .and_then(|bytes| sign_query_response(&key, bytes).map_err(|e| e.to_string()));
            match signed {
                Ok(signed) => {
                    if gossip.send(signed).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!(error = %e, "Failed to sign publication"),
            }
        }
    });

    Ok(request_tx)
}

/// Watcher that reports different chain state than its peers.
///
/// Overwrites the first byte of the first EVM call result with `marker`, so
/// guardians with different markers sign different digests.
pub struct DivergentWatcher<W> {
    inner: W,
    marker: u8,
}

impl<W> DivergentWatcher<W> {
    /// Wrap `inner`.
    pub fn new(inner: W, marker: u8) -> Self {
        Self { inner, marker }
    }
}

#[async_trait]
impl<W: QueryWatcher> QueryWatcher for DivergentWatcher<W> {
    async fn handle_query(&self, query: PerChainQueryInternal) -> PerChainQueryResponseInternal {
        let mut response = self.inner.handle_query(query).await;
        if response.status == QueryStatus::Success {
            let results = match &mut response.response {
                Some(ChainSpecificResponse::EthCall(r)) => Some(&mut r.results),
                Some(ChainSpecificResponse::EthCallByTimestamp(r)) => Some(&mut r.results),
                Some(ChainSpecificResponse::EthCallWithFinality(r)) => Some(&mut r.results),
                _ => None,
            };
            if let Some(first) = results.and_then(|r| r.first_mut()).and_then(|r| r.first_mut()) {
                *first = self.marker;
            }
        }
        response
    }
}
