//! # Cross-Chain Query Benchmarks
//!
//! Hot paths on every guardian and aggregator:
//!
//! | Path | Runs on |
//! |------|---------|
//! | Request unmarshal + validate | every guardian, per request |
//! | Request signer recovery | every guardian, per request |
//! | Publication marshal | every guardian, per publication |
//! | Publication unmarshal | aggregator, per gossiped signature |
//! | Response signer recovery | aggregator, per gossiped signature |

use ccq_01_wire_format::test_helpers::{
    eth_call_query, response_for, simple_request, solana_pda_query,
};
use ccq_01_wire_format::{QueryRequest, QueryResponsePublication};
use ccq_02_query_signing::test_helpers::generate_keypair;
use ccq_02_query_signing::{
    query_request_digest, recover_query_request_signer, recover_response_signer,
    sign_query_request, sign_query_response,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use shared_types::{ChainId, Environment};

fn batch_request(n: usize) -> QueryRequest {
    let chains = [ChainId::ETHEREUM, ChainId::POLYGON, ChainId::ARBITRUM];
    QueryRequest {
        nonce: 7,
        per_chain_queries: (0..n)
            .map(|i| eth_call_query(chains[i % chains.len()], "0x28d9630", 5))
            .collect(),
    }
}

fn publication(request: &QueryRequest) -> QueryResponsePublication {
    let (key, _) = generate_keypair();
    let signed = sign_query_request(&key, Environment::Mainnet, request.marshal().unwrap()).unwrap();
    QueryResponsePublication {
        request: signed,
        per_chain_responses: request.per_chain_queries.iter().map(response_for).collect(),
    }
}

// ============================================================================
// Wire format
// ============================================================================

fn bench_request_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("ccq-01-request");

    for size in [1usize, 10, 100] {
        let bytes = batch_request(size).marshal().unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::new("unmarshal", size), &bytes, |b, bytes| {
            b.iter(|| QueryRequest::unmarshal(black_box(bytes)).unwrap())
        });
    }

    let solana = QueryRequest {
        nonce: 1,
        per_chain_queries: vec![solana_pda_query(10)],
    };
    group.bench_function("marshal_solana_pda", |b| {
        b.iter(|| black_box(&solana).marshal().unwrap())
    });

    group.finish();
}

fn bench_publication_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("ccq-01-publication");

    for size in [1usize, 10, 100] {
        let publication = publication(&batch_request(size));
        let bytes = publication.marshal().unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::new("marshal", size), &publication, |b, p| {
            b.iter(|| black_box(p).marshal().unwrap())
        });
        group.bench_with_input(BenchmarkId::new("unmarshal", size), &bytes, |b, bytes| {
            b.iter(|| QueryResponsePublication::unmarshal(black_box(bytes)).unwrap())
        });
    }

    group.finish();
}

// ============================================================================
// Signing
// ============================================================================

fn bench_signer_recovery(c: &mut Criterion) {
    let mut group = c.benchmark_group("ccq-02-recovery");
    let (key, _) = generate_keypair();

    let request = simple_request(ChainId::ETHEREUM).marshal().unwrap();
    let signed = sign_query_request(&key, Environment::Mainnet, request).unwrap();
    let digest = query_request_digest(Environment::Mainnet, &signed.query_request);
    group.bench_function("request_signer", |b| {
        b.iter(|| recover_query_request_signer(black_box(&digest), &signed.signature).unwrap())
    });

    let response = publication(&simple_request(ChainId::ETHEREUM))
        .marshal()
        .unwrap();
    let signed_response = sign_query_response(&key, response).unwrap();
    group.bench_function("response_signer", |b| {
        b.iter(|| {
            recover_response_signer(
                black_box(&signed_response.query_response),
                &signed_response.signature,
            )
            .unwrap()
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_request_codec,
    bench_publication_codec,
    bench_signer_recovery
);
criterion_main!(benches);
