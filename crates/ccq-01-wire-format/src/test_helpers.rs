//! Canned requests and responses for tests.
//!
//! Every builder is deterministic so responses computed by independent
//! guardians in a test produce identical digests.

use shared_types::ChainId;

use crate::domain::{
    CallData, ChainSpecificQuery, ChainSpecificResponse, EthCallByTimestampQueryRequest,
    EthCallByTimestampQueryResponse, EthCallQueryRequest, EthCallQueryResponse,
    EthCallWithFinalityQueryRequest, EthCallWithFinalityQueryResponse, EvmBlockInfo,
    PerChainQueryRequest, PerChainQueryResponse, QueryRequest, SolanaAccountQueryRequest,
    SolanaAccountQueryResponse, SolanaAccountResult, SolanaPdaEntry, SolanaPdaQueryRequest,
    SolanaPdaQueryResponse, SolanaPdaResult, SolanaSlotInfo,
};

/// `balanceOf(address)` selector.
const BALANCE_OF: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];

/// `n` calls against distinct contracts.
pub fn call_data(n: usize) -> Vec<CallData> {
    (0..n)
        .map(|i| {
            let mut data = BALANCE_OF.to_vec();
            data.extend_from_slice(&(i as u32).to_be_bytes());
            CallData::new([i as u8; 20], data)
        })
        .collect()
}

/// Deterministic result for the call at `call_idx`.
pub fn call_result(chain_id: ChainId, call_idx: usize) -> Vec<u8> {
    let mut result = vec![0u8; 32];
    result[28..30].copy_from_slice(&chain_id.0.to_be_bytes());
    result[30..32].copy_from_slice(&(call_idx as u16).to_be_bytes());
    result
}

/// `EthCall` with `n` calls.
pub fn eth_call_query(chain_id: ChainId, block_id: &str, n: usize) -> PerChainQueryRequest {
    PerChainQueryRequest {
        chain_id,
        query: ChainSpecificQuery::EthCall(EthCallQueryRequest {
            block_id: block_id.to_string(),
            call_data: call_data(n),
        }),
    }
}

/// `EthCallByTimestamp` without block hints.
pub fn eth_call_by_timestamp_query(
    chain_id: ChainId,
    target_timestamp: u64,
    n: usize,
) -> PerChainQueryRequest {
    PerChainQueryRequest {
        chain_id,
        query: ChainSpecificQuery::EthCallByTimestamp(EthCallByTimestampQueryRequest {
            target_timestamp,
            target_block_id_hint: String::new(),
            following_block_id_hint: String::new(),
            call_data: call_data(n),
        }),
    }
}

/// `EthCallWithFinality` with `n` calls.
pub fn eth_call_with_finality_query(
    chain_id: ChainId,
    block_id: &str,
    finality: &str,
    n: usize,
) -> PerChainQueryRequest {
    PerChainQueryRequest {
        chain_id,
        query: ChainSpecificQuery::EthCallWithFinality(EthCallWithFinalityQueryRequest {
            block_id: block_id.to_string(),
            finality: finality.to_string(),
            call_data: call_data(n),
        }),
    }
}

/// Solana account read of `n` accounts.
pub fn solana_account_query(n: usize) -> PerChainQueryRequest {
    PerChainQueryRequest {
        chain_id: ChainId::SOLANA,
        query: ChainSpecificQuery::SolanaAccount(SolanaAccountQueryRequest {
            commitment: "finalized".to_string(),
            min_context_slot: 0,
            data_slice_offset: 0,
            data_slice_length: 0,
            accounts: (0..n).map(|i| [i as u8 + 1; 32]).collect(),
        }),
    }
}

/// Solana PDA read of `n` PDAs, two seeds each.
pub fn solana_pda_query(n: usize) -> PerChainQueryRequest {
    PerChainQueryRequest {
        chain_id: ChainId::SOLANA,
        query: ChainSpecificQuery::SolanaPda(SolanaPdaQueryRequest {
            commitment: "finalized".to_string(),
            min_context_slot: 0,
            data_slice_offset: 0,
            data_slice_length: 0,
            pdas: (0..n)
                .map(|i| SolanaPdaEntry {
                    program_address: [0x02; 32],
                    seeds: vec![b"GuardianSet".to_vec(), vec![i as u8]],
                })
                .collect(),
        }),
    }
}

/// Single `EthCall` request with two calls.
pub fn simple_request(chain_id: ChainId) -> QueryRequest {
    QueryRequest {
        nonce: 0,
        per_chain_queries: vec![eth_call_query(chain_id, "0x28d9630", 2)],
    }
}

fn block_info(chain_id: ChainId, offset: u64) -> EvmBlockInfo {
    EvmBlockInfo {
        number: 42_000_000 + offset,
        hash: [chain_id.0 as u8; 32],
        time_micros: 1_697_216_322_000_000 + offset as i64,
    }
}

fn slot_info() -> SolanaSlotInfo {
    SolanaSlotInfo {
        slot_number: 250_000_000,
        block_time_micros: 1_697_216_322_000_000,
        block_hash: [0x50; 32],
    }
}

/// Deterministic, valid response of the matching variant for `pcq`.
pub fn response_for(pcq: &PerChainQueryRequest) -> PerChainQueryResponse {
    let chain_id = pcq.chain_id;
    let response = match &pcq.query {
        ChainSpecificQuery::EthCall(q) => ChainSpecificResponse::EthCall(EthCallQueryResponse {
            block: block_info(chain_id, 0),
            results: (0..q.call_data.len())
                .map(|i| call_result(chain_id, i))
                .collect(),
        }),
        ChainSpecificQuery::EthCallByTimestamp(q) => {
            ChainSpecificResponse::EthCallByTimestamp(EthCallByTimestampQueryResponse {
                target_block: block_info(chain_id, 0),
                following_block: block_info(chain_id, 1),
                results: (0..q.call_data.len())
                    .map(|i| call_result(chain_id, i))
                    .collect(),
            })
        }
        ChainSpecificQuery::EthCallWithFinality(q) => {
            ChainSpecificResponse::EthCallWithFinality(EthCallWithFinalityQueryResponse {
                block: block_info(chain_id, 0),
                results: (0..q.call_data.len())
                    .map(|i| call_result(chain_id, i))
                    .collect(),
            })
        }
        ChainSpecificQuery::SolanaAccount(q) => {
            ChainSpecificResponse::SolanaAccount(SolanaAccountQueryResponse {
                header: slot_info(),
                results: q
                    .accounts
                    .iter()
                    .map(|account| SolanaAccountResult {
                        lamports: 1_000_000,
                        rent_epoch: 361,
                        executable: false,
                        owner: *account,
                        data: account[..4].to_vec(),
                    })
                    .collect(),
            })
        }
        ChainSpecificQuery::SolanaPda(q) => ChainSpecificResponse::SolanaPda(SolanaPdaQueryResponse {
            header: slot_info(),
            results: q
                .pdas
                .iter()
                .enumerate()
                .map(|(i, pda)| SolanaPdaResult {
                    account: [i as u8 + 0x10; 32],
                    bump: 255,
                    lamports: 1_000_000,
                    rent_epoch: 361,
                    executable: false,
                    owner: pda.program_address,
                    data: vec![i as u8; 8],
                })
                .collect(),
        }),
    };
    PerChainQueryResponse { chain_id, response }
}
