//! # End-to-End Query Flow
//!
//! A client request travels through real dispatchers on every guardian, gets
//! signed by each guardian, and is answered by the aggregator once a quorum of
//! matching signatures arrives.
//!
//! ## Test Categories
//!
//! 1. **Happy Path**: single chain and multi-chain batches
//! 2. **Partial Failure**: guardians failing fatally or retrying
//! 3. **Disagreement**: guardians observing different chain state

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use ccq_01_wire_format::test_helpers::{
        eth_call_by_timestamp_query, eth_call_query, eth_call_with_finality_query, response_for,
        simple_request,
    };
    use ccq_01_wire_format::{QueryRequest, QueryResponsePublication};
    use ccq_02_query_signing::test_helpers::generate_keypair;
    use ccq_02_query_signing::{recover_response_signer, sign_query_request};
    use ccq_03_dispatcher::test_helpers::ScriptedWatcher;
    use ccq_03_dispatcher::{DispatcherConfig, QueryWatcher};
    use ccq_04_quorum_aggregator::{AggregatorConfig, AggregatorError, QueryRequestBody};
    use shared_types::{quorum, ChainId, Environment};

    use crate::network::{DivergentWatcher, GuardianNetwork};

    const CHAINS: &[ChainId] = &[
        ChainId::ETHEREUM,
        ChainId::POLYGON,
        ChainId::BSC,
        ChainId::ARBITRUM,
    ];

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    fn dispatcher_config() -> DispatcherConfig {
        DispatcherConfig {
            request_timeout: Duration::from_millis(500),
            retry_interval: Duration::from_millis(10),
            audit_interval: Duration::from_millis(10),
            ..Default::default()
        }
    }

    fn aggregator_config() -> AggregatorConfig {
        AggregatorConfig {
            request_timeout: Duration::from_millis(500),
            response_grace_period: Duration::from_millis(200),
            cleanup_interval: Duration::from_millis(50),
            ..Default::default()
        }
    }

    fn start(watchers: Vec<Arc<dyn QueryWatcher>>) -> GuardianNetwork {
        GuardianNetwork::start(watchers, CHAINS, dispatcher_config(), aggregator_config())
            .unwrap()
    }

    fn honest(n: usize) -> Vec<Arc<dyn QueryWatcher>> {
        (0..n)
            .map(|_| Arc::new(ScriptedWatcher::new()) as Arc<dyn QueryWatcher>)
            .collect()
    }

    fn body(request: &QueryRequest) -> QueryRequestBody {
        let (key, _) = generate_keypair();
        let signed =
            sign_query_request(&key, Environment::Testnet, request.marshal().unwrap()).unwrap();
        QueryRequestBody::from_signed(&signed)
    }

    /// Decode the answer and check every signature against the guardian set.
    fn verify_answer(
        network: &GuardianNetwork,
        bytes: &str,
        signatures: &[String],
    ) -> QueryResponsePublication {
        let response_bytes = hex::decode(bytes).unwrap();
        let publication = QueryResponsePublication::unmarshal(&response_bytes).unwrap();

        assert!(signatures.len() >= quorum(network.guardians.len()));
        let mut last_index = None;
        for signature in signatures {
            let raw = hex::decode(signature).unwrap();
            assert_eq!(raw.len(), 66);
            let index = raw[65] as usize;
            assert!(last_index.map_or(true, |last| index > last), "not ascending");
            last_index = Some(index);

            let signer = recover_response_signer(&response_bytes, &raw[..65]).unwrap();
            assert_eq!(signer, network.guardians[index]);
        }
        publication
    }

    // =========================================================================
    // HAPPY PATH
    // =========================================================================

    #[tokio::test]
    async fn test_single_chain_query_answered_by_quorum() {
        let network = start(honest(4));
        let request = simple_request(ChainId::POLYGON);

        let answer = network.client.handle(&body(&request)).await.unwrap();
        let publication = verify_answer(&network, &answer.bytes, &answer.signatures);

        assert_eq!(publication.per_chain_responses.len(), 1);
        assert_eq!(
            publication.per_chain_responses[0],
            response_for(&request.per_chain_queries[0])
        );
        assert_eq!(publication.request.query_request, request.marshal().unwrap());
        assert_eq!(network.aggregator_metrics.snapshot().quorum_reached, 1);
    }

    #[tokio::test]
    async fn test_multi_chain_batch_in_request_order() {
        let network = start(honest(4));
        let request = QueryRequest {
            nonce: 42,
            per_chain_queries: vec![
                eth_call_query(ChainId::POLYGON, "0x28d9630", 2),
                eth_call_by_timestamp_query(ChainId::BSC, 1_697_216_322_000_000, 1),
                eth_call_with_finality_query(ChainId::ARBITRUM, "0x28d9630", "safe", 3),
            ],
        };

        let answer = network.client.handle(&body(&request)).await.unwrap();
        let publication = verify_answer(&network, &answer.bytes, &answer.signatures);

        let chains: Vec<ChainId> = publication
            .per_chain_responses
            .iter()
            .map(|r| r.chain_id)
            .collect();
        assert_eq!(chains, vec![ChainId::POLYGON, ChainId::BSC, ChainId::ARBITRUM]);
        for (response, query) in publication
            .per_chain_responses
            .iter()
            .zip(&request.per_chain_queries)
        {
            assert_eq!(response, &response_for(query));
        }
    }

    #[tokio::test]
    async fn test_independent_requests_answered_concurrently() {
        let network = Arc::new(start(honest(4)));

        let handles: Vec<_> = [ChainId::ETHEREUM, ChainId::POLYGON, ChainId::BSC]
            .into_iter()
            .map(|chain_id| {
                let network = network.clone();
                tokio::spawn(async move {
                    network.client.handle(&body(&simple_request(chain_id))).await
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
        assert_eq!(network.aggregator_metrics.snapshot().quorum_reached, 3);
    }

    // =========================================================================
    // PARTIAL FAILURE
    // =========================================================================

    #[tokio::test]
    async fn test_one_fatal_guardian_still_reaches_quorum() {
        let mut watchers = honest(3);
        watchers.push(Arc::new(ScriptedWatcher::new().fatal(ChainId::ETHEREUM)));
        let network = start(watchers);

        let answer = network
            .client
            .handle(&body(&simple_request(ChainId::ETHEREUM)))
            .await
            .unwrap();
        verify_answer(&network, &answer.bytes, &answer.signatures);
        assert_eq!(answer.signatures.len(), 3);
        assert!(!answer
            .signatures
            .iter()
            .any(|s| s.ends_with("03")));
    }

    #[tokio::test]
    async fn test_retrying_guardians_still_answer() {
        let watchers: Vec<Arc<dyn QueryWatcher>> = (0..4)
            .map(|i| {
                Arc::new(ScriptedWatcher::new().with_retries(ChainId::BSC, i))
                    as Arc<dyn QueryWatcher>
            })
            .collect();
        let network = start(watchers);

        let answer = network
            .client
            .handle(&body(&simple_request(ChainId::BSC)))
            .await
            .unwrap();
        verify_answer(&network, &answer.bytes, &answer.signatures);
    }

    #[tokio::test]
    async fn test_too_many_fatal_guardians_time_out() {
        let mut watchers = honest(2);
        watchers.push(Arc::new(ScriptedWatcher::new().fatal(ChainId::ETHEREUM)));
        watchers.push(Arc::new(ScriptedWatcher::new().fatal(ChainId::ETHEREUM)));
        let network = start(watchers);

        let result = network
            .client
            .handle(&body(&simple_request(ChainId::ETHEREUM)))
            .await;
        assert_eq!(result, Err(AggregatorError::Timeout));
        assert_eq!(network.aggregator_metrics.snapshot().quorum_reached, 0);
    }

    #[tokio::test]
    async fn test_unsupported_chain_rejected_by_every_guardian() {
        let network = start(honest(4));

        let result = network
            .client
            .handle(&body(&simple_request(ChainId::SOLANA)))
            .await;
        assert_eq!(result, Err(AggregatorError::Timeout));
        for metrics in &network.guardian_metrics {
            assert_eq!(metrics.invalid_requests("chain_does_not_support_ccq"), 1);
        }
    }

    // =========================================================================
    // DISAGREEMENT
    // =========================================================================

    #[tokio::test]
    async fn test_split_guardians_fail_fast_with_quorum_not_met() {
        let watchers: Vec<Arc<dyn QueryWatcher>> = (0..4u8)
            .map(|i| {
                Arc::new(DivergentWatcher::new(ScriptedWatcher::new(), 0xa0 + i % 2))
                    as Arc<dyn QueryWatcher>
            })
            .collect();
        let network = start(watchers);

        let started = tokio::time::Instant::now();
        let result = network
            .client
            .handle(&body(&simple_request(ChainId::ETHEREUM)))
            .await;

        assert_eq!(result, Err(AggregatorError::QuorumNotMet));
        assert!(started.elapsed() < Duration::from_millis(500));
        assert_eq!(network.aggregator_metrics.snapshot().quorum_not_met, 1);
    }

    #[tokio::test]
    async fn test_single_divergent_guardian_outvoted() {
        let mut watchers = honest(3);
        watchers.push(Arc::new(DivergentWatcher::new(ScriptedWatcher::new(), 0xee)));
        let network = start(watchers);
        let request = simple_request(ChainId::ETHEREUM);

        let answer = network.client.handle(&body(&request)).await.unwrap();
        let publication = verify_answer(&network, &answer.bytes, &answer.signatures);
        assert_eq!(
            publication.per_chain_responses[0],
            response_for(&request.per_chain_queries[0])
        );
    }
}
