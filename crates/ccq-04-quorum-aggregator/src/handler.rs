//! # Query Accept Path
//!
//! What the HTTP endpoint does per client request: decode and verify the
//! body, register it, publish it to the guardians, wait for the aggregator's
//! outcome, and always unregister on the way out.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{
    AggregatorConfig, AggregatorError, PendingResponse, PendingResponseRegistry, QueryOutcome,
    QueryRequestBody, QueryResponseBody,
};
use crate::ports::RequestPublisher;

/// Serves client query requests.
pub struct QueryHandler {
    config: AggregatorConfig,
    registry: Arc<PendingResponseRegistry>,
    publisher: Arc<dyn RequestPublisher>,
}

impl QueryHandler {
    /// Create a handler sharing `registry` with the aggregator.
    pub fn new(
        config: AggregatorConfig,
        registry: Arc<PendingResponseRegistry>,
        publisher: Arc<dyn RequestPublisher>,
    ) -> Self {
        Self {
            config,
            registry,
            publisher,
        }
    }

    /// Handle one client request end to end.
    pub async fn handle(
        &self,
        body: &QueryRequestBody,
    ) -> Result<QueryResponseBody, AggregatorError> {
        let (signed, signer) = body.decode(self.config.environment)?;

        let entry = PendingResponse::new(signed.clone());
        if !self.registry.add(entry.clone()) {
            return Err(AggregatorError::AlreadyPending(entry.request_signature.clone()));
        }

        info!(
            component = "ccq_server",
            request_signature = %entry.request_signature,
            signer = %shared_types::address_hex(&signer),
            "Publishing query request"
        );

        let outcome = match self.publisher.publish_request(signed) {
            Ok(()) => entry.wait(self.config.response_wait_timeout()).await,
            Err(e) => Err(e),
        };
        self.registry.remove(&entry);

        match outcome {
            Ok(QueryOutcome::Answered(response)) => Ok(response.to_http_response()),
            Ok(QueryOutcome::QuorumNotMet) => Err(AggregatorError::QuorumNotMet),
            Err(e) => {
                warn!(
                    component = "ccq_server",
                    request_signature = %entry.request_signature,
                    error = %e,
                    "Query request failed"
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ChannelRequestPublisher;
    use ccq_01_wire_format::test_helpers::simple_request;
    use ccq_02_query_signing::sign_query_request;
    use ccq_02_query_signing::test_helpers::generate_keypair;
    use shared_types::ChainId;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn body() -> QueryRequestBody {
        let (key, _) = generate_keypair();
        let bytes = simple_request(ChainId::ETHEREUM).marshal().unwrap();
        QueryRequestBody::from_signed(
            &sign_query_request(&key, Default::default(), bytes).unwrap(),
        )
    }

    fn short_config() -> AggregatorConfig {
        AggregatorConfig {
            request_timeout: Duration::from_millis(20),
            response_grace_period: Duration::from_millis(10),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_timeout_unregisters_request() {
        let registry = Arc::new(PendingResponseRegistry::new());
        let (tx, mut rx) = mpsc::channel(4);
        let handler = QueryHandler::new(
            short_config(),
            registry.clone(),
            Arc::new(ChannelRequestPublisher::new(tx)),
        );

        let result = handler.handle(&body()).await;
        assert_eq!(result, Err(AggregatorError::Timeout));
        assert!(rx.try_recv().is_ok());
        assert_eq!(registry.num_pending(), 0);
    }

    #[tokio::test]
    async fn test_same_request_in_flight_twice_rejected() {
        let registry = Arc::new(PendingResponseRegistry::new());
        let (tx, _rx) = mpsc::channel(4);
        let handler = Arc::new(QueryHandler::new(
            AggregatorConfig::default(),
            registry.clone(),
            Arc::new(ChannelRequestPublisher::new(tx)),
        ));

        let body = body();
        let first = {
            let handler = handler.clone();
            let body = body.clone();
            tokio::spawn(async move { handler.handle(&body).await })
        };
        while registry.num_pending() == 0 {
            tokio::task::yield_now().await;
        }

        let second = handler.handle(&body).await;
        assert!(matches!(second, Err(AggregatorError::AlreadyPending(_))));
        first.abort();
    }

    #[tokio::test]
    async fn test_closed_publisher_unregisters_request() {
        let registry = Arc::new(PendingResponseRegistry::new());
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        let handler = QueryHandler::new(
            AggregatorConfig::default(),
            registry.clone(),
            Arc::new(ChannelRequestPublisher::new(tx)),
        );

        assert_eq!(handler.handle(&body()).await, Err(AggregatorError::Closed));
        assert_eq!(registry.num_pending(), 0);
    }

    #[tokio::test]
    async fn test_invalid_body_rejected_before_registration() {
        let registry = Arc::new(PendingResponseRegistry::new());
        let (tx, _rx) = mpsc::channel(4);
        let handler = QueryHandler::new(
            AggregatorConfig::default(),
            registry.clone(),
            Arc::new(ChannelRequestPublisher::new(tx)),
        );

        let mut body = body();
        body.signature.truncate(128);
        let err = handler.handle(&body).await.unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(registry.num_pending(), 0);
    }
}
