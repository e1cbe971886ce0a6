//! # Watcher Worker Pool
//!
//! `num_workers` tasks share one per-chain queue. Each takes the next
//! sub-query, runs it through the chain's [`QueryWatcher`], and sends the
//! answer on the response channel shared by all chains.

use std::sync::Arc;

use shared_types::ChainId;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::domain::{PerChainConfig, PerChainQueryInternal, PerChainQueryResponseInternal};
use crate::ports::QueryWatcher;

/// Start the workers for one chain.
///
/// Workers exit when `shutdown` changes, when the query queue closes, or when
/// the response channel closes.
pub fn spawn_workers(
    chain_id: ChainId,
    watcher: Arc<dyn QueryWatcher>,
    queries: mpsc::Receiver<PerChainQueryInternal>,
    config: PerChainConfig,
    responses: mpsc::Sender<PerChainQueryResponseInternal>,
    shutdown: watch::Receiver<bool>,
) -> Vec<JoinHandle<()>> {
    let queries = Arc::new(Mutex::new(queries));

    info!(
        component = "ccq_watcher",
        chain = %chain_id,
        workers = config.num_workers,
        "Starting query workers"
    );

    (0..config.num_workers)
        .map(|worker| {
            let watcher = Arc::clone(&watcher);
            let queries = Arc::clone(&queries);
            let responses = responses.clone();
            let mut shutdown = shutdown.clone();

            tokio::spawn(async move {
                loop {
                    let next = tokio::select! {
                        _ = shutdown.changed() => None,
                        query = async { queries.lock().await.recv().await } => query,
                    };
                    let Some(query) = next else {
                        break;
                    };

                    let response = watcher.handle_query(query).await;
                    if responses.send(response).await.is_err() {
                        break;
                    }
                }
                debug!(
                    component = "ccq_watcher",
                    chain = %chain_id,
                    worker,
                    "Query worker stopped"
                );
            })
        })
        .collect()
}
