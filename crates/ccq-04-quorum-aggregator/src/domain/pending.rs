//! Pending Response Registry - bridge between the accept path and the aggregator.
//!
//! The accept path registers a [`PendingResponse`] before publishing a request
//! and waits on it. The aggregator looks it up by request signature and hands
//! over the outcome. Both sides run concurrently, so the map sits behind a mutex.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use ccq_01_wire_format::SignedQueryRequest;
use parking_lot::Mutex;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tracing::{debug, warn};

use super::entities::QueryOutcome;
use super::errors::AggregatorError;

/// A client request waiting for a quorum answer.
#[derive(Debug)]
pub struct PendingResponse {
    /// The request as submitted.
    pub signed_request: SignedQueryRequest,
    /// Registry key, `hex(signature)`.
    pub request_signature: String,
    created_at: Instant,
    completed: AtomicBool,
    tx: mpsc::Sender<QueryOutcome>,
    rx: AsyncMutex<mpsc::Receiver<QueryOutcome>>,
}

impl PendingResponse {
    /// Create an entry for `signed_request`.
    pub fn new(signed_request: SignedQueryRequest) -> Arc<Self> {
        let (tx, rx) = mpsc::channel(1);
        Arc::new(Self {
            request_signature: signed_request.signature_hex(),
            signed_request,
            created_at: Instant::now(),
            completed: AtomicBool::new(false),
            tx,
            rx: AsyncMutex::new(rx),
        })
    }

    /// Time since the entry was created.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// True once an outcome has been handed over.
    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    /// Hand over the outcome without waiting. Returns false if one was already
    /// delivered or the slot is occupied.
    pub fn try_deliver(&self, outcome: QueryOutcome) -> bool {
        if self.is_completed() {
            return false;
        }
        match self.tx.try_send(outcome) {
            Ok(()) => {
                self.completed.store(true, Ordering::Release);
                true
            }
            Err(_) => false,
        }
    }

    /// Wait up to `timeout` for the outcome.
    pub async fn wait(&self, timeout: Duration) -> Result<QueryOutcome, AggregatorError> {
        let mut rx = self.rx.lock().await;
        match tokio::time::timeout(timeout, rx.recv()).await {
            Ok(Some(outcome)) => Ok(outcome),
            Ok(None) => Err(AggregatorError::Closed),
            Err(_) => Err(AggregatorError::Timeout),
        }
    }
}

/// Registry statistics
#[derive(Debug, Default)]
pub struct RegistryStats {
    /// Entries added
    pub registered: AtomicU64,
    /// Entries removed (answered, abandoned, or expired)
    pub removed: AtomicU64,
    /// Adds refused because the key was taken
    pub rejected_duplicates: AtomicU64,
}

/// In-flight client requests keyed by `hex(signature)`.
#[derive(Debug, Default)]
pub struct PendingResponseRegistry {
    pending: Mutex<HashMap<String, Arc<PendingResponse>>>,
    stats: RegistryStats,
}

impl PendingResponseRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `entry`. Returns false, leaving the registry unchanged, if its
    /// key is already present.
    pub fn add(&self, entry: Arc<PendingResponse>) -> bool {
        let mut pending = self.pending.lock();
        if pending.contains_key(&entry.request_signature) {
            self.stats.rejected_duplicates.fetch_add(1, Ordering::Relaxed);
            debug!(
                request_signature = %entry.request_signature,
                "Request already pending"
            );
            return false;
        }
        pending.insert(entry.request_signature.clone(), entry);
        self.stats.registered.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Look up by `hex(signature)`.
    pub fn get(&self, request_signature: &str) -> Option<Arc<PendingResponse>> {
        self.pending.lock().get(request_signature).cloned()
    }

    /// Remove `entry`. Returns false if it was not registered.
    pub fn remove(&self, entry: &PendingResponse) -> bool {
        let removed = self
            .pending
            .lock()
            .remove(&entry.request_signature)
            .is_some();
        if removed {
            self.stats.removed.fetch_add(1, Ordering::Relaxed);
        }
        removed
    }

    /// Remove entries older than `max_age`. Returns the number removed.
    pub fn remove_expired(&self, max_age: Duration) -> usize {
        let mut removed = 0;
        self.pending.lock().retain(|signature, entry| {
            if entry.age() > max_age {
                warn!(
                    request_signature = %signature,
                    age_ms = entry.age().as_millis() as u64,
                    "Removing expired pending response"
                );
                removed += 1;
                false
            } else {
                true
            }
        });
        self.stats
            .removed
            .fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    /// Number of entries.
    pub fn num_pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// True if `request_signature` is registered.
    pub fn contains(&self, request_signature: &str) -> bool {
        self.pending.lock().contains_key(request_signature)
    }

    /// Get statistics
    pub fn stats(&self) -> &RegistryStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(tag: u8) -> SignedQueryRequest {
        SignedQueryRequest {
            query_request: vec![tag],
            signature: vec![tag; 65],
        }
    }

    #[test]
    fn test_add_get_remove() {
        let registry = PendingResponseRegistry::new();
        let entry = PendingResponse::new(request(1));

        assert!(registry.add(entry.clone()));
        assert_eq!(registry.num_pending(), 1);
        let found = registry.get(&hex::encode([1u8; 65])).unwrap();
        assert!(Arc::ptr_eq(&found, &entry));

        assert!(registry.remove(&entry));
        assert!(!registry.remove(&entry));
        assert!(registry.get(&entry.request_signature).is_none());
        assert_eq!(registry.stats().removed.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_duplicate_add_is_refused() {
        let registry = PendingResponseRegistry::new();
        let first = PendingResponse::new(request(1));
        let second = PendingResponse::new(request(1));

        assert!(registry.add(first.clone()));
        assert!(!registry.add(second));
        assert!(Arc::ptr_eq(
            &registry.get(&first.request_signature).unwrap(),
            &first
        ));
        assert_eq!(
            registry.stats().rejected_duplicates.load(Ordering::Relaxed),
            1
        );
    }

    #[test]
    fn test_remove_expired() {
        let registry = PendingResponseRegistry::new();
        registry.add(PendingResponse::new(request(1)));
        registry.add(PendingResponse::new(request(2)));

        assert_eq!(registry.remove_expired(Duration::from_secs(60)), 0);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(registry.remove_expired(Duration::from_millis(1)), 2);
        assert_eq!(registry.num_pending(), 0);
    }

    #[tokio::test]
    async fn test_deliver_once_then_wait() {
        let entry = PendingResponse::new(request(1));
        assert!(entry.try_deliver(QueryOutcome::QuorumNotMet));
        assert!(entry.is_completed());
        assert!(!entry.try_deliver(QueryOutcome::QuorumNotMet));

        let outcome = entry.wait(Duration::from_millis(100)).await.unwrap();
        assert_eq!(outcome, QueryOutcome::QuorumNotMet);
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let entry = PendingResponse::new(request(1));
        assert_eq!(
            entry.wait(Duration::from_millis(10)).await,
            Err(AggregatorError::Timeout)
        );
    }

    #[test]
    fn test_registry_shared_across_threads() {
        let registry = Arc::new(PendingResponseRegistry::new());
        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.add(PendingResponse::new(request(i % 4))))
            })
            .collect();
        let added = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|added| *added)
            .count();
        assert_eq!(added, 4);
        assert_eq!(registry.num_pending(), 4);
    }
}
