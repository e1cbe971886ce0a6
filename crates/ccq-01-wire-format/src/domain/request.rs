//! # Query Requests
//!
//! `QueryRequest` is the client-signed payload of a `SignedQueryRequest`:
//!
//! ```text
//! version:u8 | nonce:u32 | count:u8 | count × PerChainQueryRequest
//! PerChainQueryRequest = chainId:u16 | queryType:u8 | queryLen:u32 | payload
//! ```
//!
//! The chain-specific payload is a closed sum type, [`ChainSpecificQuery`],
//! dispatched on [`QueryType`].

use bytes::BufMut;
use shared_types::ChainId;

use super::codec::{put_count, put_len_prefixed, WireReader};
use super::errors::{ValidationError, WireError};

/// The only supported request / publication version.
pub const MSG_VERSION: u8 = 1;

/// Cap on a decoded block id or block hint.
pub const MAX_BLOCK_ID_LEN: usize = 256;
/// Cap on a decoded finality string.
pub const MAX_FINALITY_LEN: usize = 128;
/// Cap on decoded call data (64 KiB per call).
pub const MAX_CALL_DATA_LEN: usize = 65536;
/// Cap on a decoded PDA seed.
pub const MAX_SEED_LEN: usize = 256;

/// Maximum number of repeated elements behind a one-byte count.
pub const MAX_COUNT: usize = u8::MAX as usize;
/// EVM contract address length.
pub const ETH_ADDRESS_LENGTH: usize = 20;

/// Solana public keys are fixed length.
pub const SOLANA_PUBLIC_KEY_LENGTH: usize = 32;
/// Longest Solana commitment string accepted.
pub const SOLANA_MAX_COMMITMENT_LENGTH: usize = 12;
/// Maximum accounts (or PDAs) per Solana query.
pub const SOLANA_MAX_ACCOUNTS_PER_QUERY: usize = 100;
/// Maximum seeds per PDA.
pub const SOLANA_MAX_SEEDS: usize = 16;
/// Maximum length of a single PDA seed.
pub const SOLANA_MAX_SEED_LEN: usize = 32;

/// A Solana public key.
pub type SolanaPublicKey = [u8; SOLANA_PUBLIC_KEY_LENGTH];

// =============================================================================
// QUERY TYPE
// =============================================================================

/// Discriminant of a chain-specific query or response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum QueryType {
    /// EVM `eth_call` at a block id.
    EthCall = 1,
    /// EVM `eth_call` at the block bracketing a timestamp.
    EthCallByTimestamp = 2,
    /// EVM `eth_call` at a block that has reached a finality level.
    EthCallWithFinality = 3,
    /// Solana account read.
    SolanaAccount = 4,
    /// Solana program-derived address read.
    SolanaPda = 5,
}

impl QueryType {
    /// Wire discriminant.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for QueryType {
    type Error = WireError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(QueryType::EthCall),
            2 => Ok(QueryType::EthCallByTimestamp),
            3 => Ok(QueryType::EthCallWithFinality),
            4 => Ok(QueryType::SolanaAccount),
            5 => Ok(QueryType::SolanaPda),
            other => Err(WireError::UnsupportedQueryType(other)),
        }
    }
}

// =============================================================================
// QUERY REQUEST
// =============================================================================

/// A batched cross-chain query request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    /// Client-chosen nonce, making otherwise identical requests distinct.
    pub nonce: u32,
    /// Ordered per-chain queries (1..=255).
    pub per_chain_queries: Vec<PerChainQueryRequest>,
}

impl QueryRequest {
    /// Validate, then serialize.
    pub fn marshal(&self) -> Result<Vec<u8>, WireError> {
        self.validate()?;

        let mut buf = Vec::new();
        buf.put_u8(MSG_VERSION);
        buf.put_u32(self.nonce);
        put_count(&mut buf, self.per_chain_queries.len(), "per chain queries")?;
        for pcq in &self.per_chain_queries {
            pcq.write_to(&mut buf)?;
        }
        Ok(buf)
    }

    /// Deserialize and validate. Trailing bytes are an error.
    pub fn unmarshal(data: &[u8]) -> Result<Self, WireError> {
        let mut reader = WireReader::new(data);
        let request = Self::read_from(&mut reader)?;
        reader.finish()?;
        request.validate()?;
        Ok(request)
    }

    pub(crate) fn read_from(reader: &mut WireReader<'_>) -> Result<Self, WireError> {
        let version = reader.read_u8("message version")?;
        if version != MSG_VERSION {
            return Err(WireError::UnsupportedVersion(version));
        }

        let nonce = reader.read_u32("request nonce")?;
        let count = reader.read_u8("number of per chain queries")?;

        let mut per_chain_queries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            per_chain_queries.push(PerChainQueryRequest::read_from(reader)?);
        }

        Ok(Self {
            nonce,
            per_chain_queries,
        })
    }

    /// Check every structural rule.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.per_chain_queries.is_empty() {
            return Err(ValidationError::NoPerChainQueries);
        }
        if self.per_chain_queries.len() > MAX_COUNT {
            return Err(ValidationError::TooManyPerChainQueries(
                self.per_chain_queries.len(),
            ));
        }
        for (idx, pcq) in self.per_chain_queries.iter().enumerate() {
            pcq.validate()
                .map_err(|e| ValidationError::at_query(idx, e))?;
        }
        Ok(())
    }

    /// Chain ids in request order.
    pub fn chain_ids(&self) -> Vec<ChainId> {
        self.per_chain_queries.iter().map(|q| q.chain_id).collect()
    }
}

// =============================================================================
// PER-CHAIN QUERY REQUEST
// =============================================================================

/// One sub-query addressed to a single chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerChainQueryRequest {
    /// Target chain.
    pub chain_id: ChainId,
    /// Chain-specific query.
    pub query: ChainSpecificQuery,
}

impl PerChainQueryRequest {
    /// Validate, then serialize this entry on its own.
    pub fn marshal(&self) -> Result<Vec<u8>, WireError> {
        self.validate()?;
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    /// Deserialize a single entry. Trailing bytes are an error.
    pub fn unmarshal(data: &[u8]) -> Result<Self, WireError> {
        let mut reader = WireReader::new(data);
        let pcq = Self::read_from(&mut reader)?;
        reader.finish()?;
        Ok(pcq)
    }

    fn write_to(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        buf.put_u16(self.chain_id.0);
        buf.put_u8(self.query.query_type().as_u8());

        let mut payload = Vec::new();
        self.query.write_to(&mut payload)?;
        put_len_prefixed(buf, &payload, "query")
    }

    pub(crate) fn read_from(reader: &mut WireReader<'_>) -> Result<Self, WireError> {
        let chain_id = ChainId(reader.read_u16("request chain")?);
        let query_type = QueryType::try_from(reader.read_u8("request type")?)?;
        let declared = reader.read_u32("query length")?;

        let start = reader.position();
        let query = ChainSpecificQuery::read_from(query_type, reader)?;
        let actual = reader.position() - start;

        if actual != declared as usize {
            return Err(WireError::QueryLengthMismatch { declared, actual });
        }

        Ok(Self { chain_id, query })
    }

    /// Check the chain id and the chain-specific rules.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.chain_id.is_known() {
            return Err(ValidationError::InvalidChainId(self.chain_id.0));
        }
        self.query.validate()
    }
}

// =============================================================================
// CHAIN-SPECIFIC QUERY
// =============================================================================

/// Chain-specific query payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainSpecificQuery {
    /// See [`EthCallQueryRequest`].
    EthCall(EthCallQueryRequest),
    /// See [`EthCallByTimestampQueryRequest`].
    EthCallByTimestamp(EthCallByTimestampQueryRequest),
    /// See [`EthCallWithFinalityQueryRequest`].
    EthCallWithFinality(EthCallWithFinalityQueryRequest),
    /// See [`SolanaAccountQueryRequest`].
    SolanaAccount(SolanaAccountQueryRequest),
    /// See [`SolanaPdaQueryRequest`].
    SolanaPda(SolanaPdaQueryRequest),
}

impl ChainSpecificQuery {
    /// Wire discriminant of this variant.
    pub fn query_type(&self) -> QueryType {
        match self {
            ChainSpecificQuery::EthCall(_) => QueryType::EthCall,
            ChainSpecificQuery::EthCallByTimestamp(_) => QueryType::EthCallByTimestamp,
            ChainSpecificQuery::EthCallWithFinality(_) => QueryType::EthCallWithFinality,
            ChainSpecificQuery::SolanaAccount(_) => QueryType::SolanaAccount,
            ChainSpecificQuery::SolanaPda(_) => QueryType::SolanaPda,
        }
    }

    /// Check the variant's rules.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            ChainSpecificQuery::EthCall(q) => q.validate(),
            ChainSpecificQuery::EthCallByTimestamp(q) => q.validate(),
            ChainSpecificQuery::EthCallWithFinality(q) => q.validate(),
            ChainSpecificQuery::SolanaAccount(q) => q.validate(),
            ChainSpecificQuery::SolanaPda(q) => q.validate(),
        }
    }

    /// Call data for the EVM variants, `None` for Solana.
    pub fn call_data_list(&self) -> Option<&[CallData]> {
        match self {
            ChainSpecificQuery::EthCall(q) => Some(&q.call_data),
            ChainSpecificQuery::EthCallByTimestamp(q) => Some(&q.call_data),
            ChainSpecificQuery::EthCallWithFinality(q) => Some(&q.call_data),
            ChainSpecificQuery::SolanaAccount(_) | ChainSpecificQuery::SolanaPda(_) => None,
        }
    }

    fn write_to(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        match self {
            ChainSpecificQuery::EthCall(q) => q.write_to(buf),
            ChainSpecificQuery::EthCallByTimestamp(q) => q.write_to(buf),
            ChainSpecificQuery::EthCallWithFinality(q) => q.write_to(buf),
            ChainSpecificQuery::SolanaAccount(q) => q.write_to(buf),
            ChainSpecificQuery::SolanaPda(q) => q.write_to(buf),
        }
    }

    fn read_from(query_type: QueryType, reader: &mut WireReader<'_>) -> Result<Self, WireError> {
        Ok(match query_type {
            QueryType::EthCall => ChainSpecificQuery::EthCall(EthCallQueryRequest::read_from(reader)?),
            QueryType::EthCallByTimestamp => ChainSpecificQuery::EthCallByTimestamp(
                EthCallByTimestampQueryRequest::read_from(reader)?,
            ),
            QueryType::EthCallWithFinality => ChainSpecificQuery::EthCallWithFinality(
                EthCallWithFinalityQueryRequest::read_from(reader)?,
            ),
            QueryType::SolanaAccount => {
                ChainSpecificQuery::SolanaAccount(SolanaAccountQueryRequest::read_from(reader)?)
            }
            QueryType::SolanaPda => {
                ChainSpecificQuery::SolanaPda(SolanaPdaQueryRequest::read_from(reader)?)
            }
        })
    }
}

// =============================================================================
// EVM QUERIES
// =============================================================================

/// A single `eth_call` target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallData {
    /// Contract address (20 bytes).
    pub to: Vec<u8>,
    /// ABI-encoded call data.
    pub data: Vec<u8>,
}

impl CallData {
    /// Build a call against a fixed-size address.
    pub fn new(to: [u8; ETH_ADDRESS_LENGTH], data: Vec<u8>) -> Self {
        Self {
            to: to.to_vec(),
            data,
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.to.is_empty() {
            return Err(ValidationError::CallDataToMissing);
        }
        if self.to.len() != ETH_ADDRESS_LENGTH {
            return Err(ValidationError::InvalidToLength(self.to.len()));
        }
        if self.data.is_empty() {
            return Err(ValidationError::CallDataEmpty);
        }
        if self.data.len() > MAX_CALL_DATA_LEN {
            return Err(ValidationError::CallDataTooLong);
        }
        Ok(())
    }
}

fn validate_call_data(call_data: &[CallData]) -> Result<(), ValidationError> {
    if call_data.is_empty() {
        return Err(ValidationError::NoCallData);
    }
    if call_data.len() > MAX_COUNT {
        return Err(ValidationError::TooManyCallData(call_data.len()));
    }
    call_data.iter().try_for_each(CallData::validate)
}

fn write_call_data(buf: &mut Vec<u8>, call_data: &[CallData]) -> Result<(), WireError> {
    put_count(buf, call_data.len(), "call data entries")?;
    for cd in call_data {
        buf.put_slice(&cd.to);
        put_len_prefixed(buf, &cd.data, "call data")?;
    }
    Ok(())
}

fn read_call_data(reader: &mut WireReader<'_>) -> Result<Vec<CallData>, WireError> {
    let count = reader.read_u8("number of call data entries")?;
    let mut call_data = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let to = reader.read_bytes(ETH_ADDRESS_LENGTH, "call To")?;
        let data = reader.read_len_prefixed(Some(MAX_CALL_DATA_LEN), "call data")?;
        call_data.push(CallData { to, data });
    }
    Ok(call_data)
}

fn validate_block_id(block_id: &str) -> Result<(), ValidationError> {
    if block_id.len() > MAX_BLOCK_ID_LEN {
        return Err(ValidationError::BlockIdTooLong);
    }
    if block_id.is_empty() {
        return Err(ValidationError::BlockIdRequired);
    }
    if !block_id.starts_with("0x") {
        return Err(ValidationError::BlockIdMissingPrefix);
    }
    Ok(())
}

/// `eth_call` against a block number or hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthCallQueryRequest {
    /// `0x`-prefixed block number or hash.
    pub block_id: String,
    /// Calls to execute (1..=255).
    pub call_data: Vec<CallData>,
}

impl EthCallQueryRequest {
    fn write_to(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        put_len_prefixed(buf, self.block_id.as_bytes(), "block id")?;
        write_call_data(buf, &self.call_data)
    }

    fn read_from(reader: &mut WireReader<'_>) -> Result<Self, WireError> {
        let block_id = reader.read_string(MAX_BLOCK_ID_LEN, "block id")?;
        let call_data = read_call_data(reader)?;
        Ok(Self {
            block_id,
            call_data,
        })
    }

    /// Check the block id and call data.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_block_id(&self.block_id)?;
        validate_call_data(&self.call_data)
    }
}

/// `eth_call` at the block whose window contains a target timestamp.
///
/// The optional hints name the target block and the block after it; they are
/// either both set or both empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthCallByTimestampQueryRequest {
    /// Target time in microseconds since the Unix epoch.
    pub target_timestamp: u64,
    /// Optional `0x`-prefixed target block id.
    pub target_block_id_hint: String,
    /// Optional `0x`-prefixed following block id.
    pub following_block_id_hint: String,
    /// Calls to execute (1..=255).
    pub call_data: Vec<CallData>,
}

impl EthCallByTimestampQueryRequest {
    fn write_to(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        buf.put_u64(self.target_timestamp);
        put_len_prefixed(buf, self.target_block_id_hint.as_bytes(), "target block id hint")?;
        put_len_prefixed(
            buf,
            self.following_block_id_hint.as_bytes(),
            "following block id hint",
        )?;
        write_call_data(buf, &self.call_data)
    }

    fn read_from(reader: &mut WireReader<'_>) -> Result<Self, WireError> {
        let target_timestamp = reader.read_u64("timestamp")?;
        let target_block_id_hint = reader.read_string(MAX_BLOCK_ID_LEN, "target block id hint")?;
        let following_block_id_hint =
            reader.read_string(MAX_BLOCK_ID_LEN, "following block id hint")?;
        let call_data = read_call_data(reader)?;
        Ok(Self {
            target_timestamp,
            target_block_id_hint,
            following_block_id_hint,
            call_data,
        })
    }

    /// Check the timestamp, the hint pair, and call data.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.target_timestamp == 0 {
            return Err(ValidationError::TargetTimestampZero);
        }
        if self.target_block_id_hint.len() > MAX_BLOCK_ID_LEN {
            return Err(ValidationError::TargetBlockHintTooLong);
        }
        if self.following_block_id_hint.len() > MAX_BLOCK_ID_LEN {
            return Err(ValidationError::FollowingBlockHintTooLong);
        }
        if self.target_block_id_hint.is_empty() != self.following_block_id_hint.is_empty() {
            return Err(ValidationError::BlockHintsMismatch);
        }
        if !self.target_block_id_hint.is_empty() && !self.target_block_id_hint.starts_with("0x") {
            return Err(ValidationError::TargetBlockHintMissingPrefix);
        }
        if !self.following_block_id_hint.is_empty()
            && !self.following_block_id_hint.starts_with("0x")
        {
            return Err(ValidationError::FollowingBlockHintMissingPrefix);
        }
        validate_call_data(&self.call_data)
    }
}

/// `eth_call` that is only answered once the block reaches `finality`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthCallWithFinalityQueryRequest {
    /// `0x`-prefixed block number or hash.
    pub block_id: String,
    /// `"finalized"` or `"safe"`.
    pub finality: String,
    /// Calls to execute (1..=255).
    pub call_data: Vec<CallData>,
}

impl EthCallWithFinalityQueryRequest {
    fn write_to(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        put_len_prefixed(buf, self.block_id.as_bytes(), "block id")?;
        put_len_prefixed(buf, self.finality.as_bytes(), "finality")?;
        write_call_data(buf, &self.call_data)
    }

    fn read_from(reader: &mut WireReader<'_>) -> Result<Self, WireError> {
        let block_id = reader.read_string(MAX_BLOCK_ID_LEN, "target block id")?;
        let finality = reader.read_string(MAX_FINALITY_LEN, "finality")?;
        let call_data = read_call_data(reader)?;
        Ok(Self {
            block_id,
            finality,
            call_data,
        })
    }

    /// Check the block id, finality level, and call data.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_block_id(&self.block_id)?;
        if self.finality.len() > MAX_FINALITY_LEN {
            return Err(ValidationError::FinalityTooLong);
        }
        if self.finality.is_empty() {
            return Err(ValidationError::FinalityRequired);
        }
        if self.finality != "finalized" && self.finality != "safe" {
            return Err(ValidationError::InvalidFinality(self.finality.clone()));
        }
        validate_call_data(&self.call_data)
    }
}

// =============================================================================
// SOLANA QUERIES
// =============================================================================

fn validate_solana_header(
    commitment: &str,
    data_slice_offset: u64,
    data_slice_length: u64,
) -> Result<(), ValidationError> {
    if commitment.len() > SOLANA_MAX_COMMITMENT_LENGTH {
        return Err(ValidationError::CommitmentTooLong);
    }
    if commitment != "finalized" {
        return Err(ValidationError::InvalidCommitment);
    }
    if data_slice_length == 0 && data_slice_offset != 0 {
        return Err(ValidationError::DataSliceOffsetWithoutLength);
    }
    Ok(())
}

/// Read one or more Solana accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolanaAccountQueryRequest {
    /// Commitment level; only `"finalized"` is accepted.
    pub commitment: String,
    /// Minimum slot the read may be evaluated at. Zero means unused.
    pub min_context_slot: u64,
    /// Offset of the returned data slice. Unused if the length is zero.
    pub data_slice_offset: u64,
    /// Length of the returned data slice. Zero returns all data.
    pub data_slice_length: u64,
    /// Accounts to read (1..=100).
    pub accounts: Vec<SolanaPublicKey>,
}

impl SolanaAccountQueryRequest {
    /// Accounts in request order.
    pub fn account_list(&self) -> &[SolanaPublicKey] {
        &self.accounts
    }

    fn write_to(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        put_len_prefixed(buf, self.commitment.as_bytes(), "commitment")?;
        buf.put_u64(self.min_context_slot);
        buf.put_u64(self.data_slice_offset);
        buf.put_u64(self.data_slice_length);
        put_count(buf, self.accounts.len(), "accounts")?;
        for account in &self.accounts {
            buf.put_slice(account);
        }
        Ok(())
    }

    fn read_from(reader: &mut WireReader<'_>) -> Result<Self, WireError> {
        let commitment = reader.read_string(SOLANA_MAX_COMMITMENT_LENGTH, "commitment")?;
        let min_context_slot = reader.read_u64("min slot")?;
        let data_slice_offset = reader.read_u64("data slice offset")?;
        let data_slice_length = reader.read_u64("data slice length")?;
        let count = reader.read_u8("number of account entries")?;
        let mut accounts = Vec::with_capacity(count as usize);
        for _ in 0..count {
            accounts.push(reader.read_array("account")?);
        }
        Ok(Self {
            commitment,
            min_context_slot,
            data_slice_offset,
            data_slice_length,
            accounts,
        })
    }

    /// Check the commitment, data slice, and account count.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_solana_header(&self.commitment, self.data_slice_offset, self.data_slice_length)?;
        if self.accounts.is_empty() {
            return Err(ValidationError::NoAccounts);
        }
        if self.accounts.len() > SOLANA_MAX_ACCOUNTS_PER_QUERY {
            return Err(ValidationError::TooManyAccounts {
                max: SOLANA_MAX_ACCOUNTS_PER_QUERY,
            });
        }
        Ok(())
    }
}

/// A program-derived address: program id plus seeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolanaPdaEntry {
    /// Owning program.
    pub program_address: SolanaPublicKey,
    /// Seeds (1..=16, each 1..=32 bytes).
    pub seeds: Vec<Vec<u8>>,
}

/// Read the accounts behind one or more PDAs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolanaPdaQueryRequest {
    /// Commitment level; only `"finalized"` is accepted.
    pub commitment: String,
    /// Minimum slot the read may be evaluated at. Zero means unused.
    pub min_context_slot: u64,
    /// Offset of the returned data slice. Unused if the length is zero.
    pub data_slice_offset: u64,
    /// Length of the returned data slice. Zero returns all data.
    pub data_slice_length: u64,
    /// PDAs to resolve and read (1..=100).
    pub pdas: Vec<SolanaPdaEntry>,
}

impl SolanaPdaQueryRequest {
    /// PDAs in request order.
    pub fn pda_list(&self) -> &[SolanaPdaEntry] {
        &self.pdas
    }

    fn write_to(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        put_len_prefixed(buf, self.commitment.as_bytes(), "commitment")?;
        buf.put_u64(self.min_context_slot);
        buf.put_u64(self.data_slice_offset);
        buf.put_u64(self.data_slice_length);
        put_count(buf, self.pdas.len(), "PDAs")?;
        for pda in &self.pdas {
            buf.put_slice(&pda.program_address);
            put_count(buf, pda.seeds.len(), "seeds")?;
            for seed in &pda.seeds {
                put_len_prefixed(buf, seed, "seed")?;
            }
        }
        Ok(())
    }

    fn read_from(reader: &mut WireReader<'_>) -> Result<Self, WireError> {
        let commitment = reader.read_string(SOLANA_MAX_COMMITMENT_LENGTH, "commitment")?;
        let min_context_slot = reader.read_u64("min slot")?;
        let data_slice_offset = reader.read_u64("data slice offset")?;
        let data_slice_length = reader.read_u64("data slice length")?;

        let count = reader.read_u8("number of PDAs")?;
        let mut pdas = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let program_address = reader.read_array("program address")?;
            let num_seeds = reader.read_u8("number of seeds")?;
            let mut seeds = Vec::with_capacity(num_seeds as usize);
            for _ in 0..num_seeds {
                seeds.push(reader.read_len_prefixed(Some(MAX_SEED_LEN), "seed")?);
            }
            pdas.push(SolanaPdaEntry {
                program_address,
                seeds,
            });
        }

        Ok(Self {
            commitment,
            min_context_slot,
            data_slice_offset,
            data_slice_length,
            pdas,
        })
    }

    /// Check the commitment, data slice, PDA count, and every seed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_solana_header(&self.commitment, self.data_slice_offset, self.data_slice_length)?;
        if self.pdas.is_empty() {
            return Err(ValidationError::NoPdas);
        }
        if self.pdas.len() > SOLANA_MAX_ACCOUNTS_PER_QUERY {
            return Err(ValidationError::TooManyPdas {
                max: SOLANA_MAX_ACCOUNTS_PER_QUERY,
            });
        }
        for pda in &self.pdas {
            if pda.seeds.is_empty() {
                return Err(ValidationError::NoSeeds);
            }
            if pda.seeds.len() > SOLANA_MAX_SEEDS {
                return Err(ValidationError::TooManySeeds);
            }
            for seed in &pda.seeds {
                if seed.is_empty() {
                    return Err(ValidationError::EmptySeed);
                }
                if seed.len() > SOLANA_MAX_SEED_LEN {
                    return Err(ValidationError::SeedTooLong);
                }
            }
        }
        Ok(())
    }
}
