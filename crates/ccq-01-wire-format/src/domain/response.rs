//! # Query Responses
//!
//! `QueryResponsePublication` is what a guardian signs and gossips once every
//! per-chain slot of a request has been answered:
//!
//! ```text
//! version:u8 | sourceChain:u16 | signature:65 | requestLen:u32 | request
//!     | count:u8 | count × PerChainQueryResponse
//! PerChainQueryResponse = chainId:u16 | type:u8 | responseLen:u32 | payload
//! ```

use bytes::BufMut;
use shared_types::{ChainId, Hash, SIGNATURE_LENGTH};

use super::codec::{put_count, put_len_prefixed, WireReader};
use super::envelope::SignedQueryRequest;
use super::errors::{ValidationError, WireError};
use super::request::{QueryRequest, QueryType, SolanaPublicKey, MAX_COUNT, MSG_VERSION};

// =============================================================================
// PUBLICATION
// =============================================================================

/// Aggregated answer to a signed request, in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResponsePublication {
    /// The request being answered, byte-for-byte as the client signed it.
    pub request: SignedQueryRequest,
    /// One response per per-chain query, same order.
    pub per_chain_responses: Vec<PerChainQueryResponse>,
}

impl QueryResponsePublication {
    /// Validate, then serialize.
    pub fn marshal(&self) -> Result<Vec<u8>, WireError> {
        self.validate()?;

        let mut buf = Vec::new();
        buf.put_u8(MSG_VERSION);
        buf.put_u16(ChainId::UNSET.0);
        buf.put_slice(&self.request.signature);
        put_len_prefixed(&mut buf, &self.request.query_request, "query request")?;
        put_count(&mut buf, self.per_chain_responses.len(), "per chain responses")?;
        for pcr in &self.per_chain_responses {
            pcr.write_to(&mut buf)?;
        }
        Ok(buf)
    }

    /// Deserialize and validate. Trailing bytes are an error.
    pub fn unmarshal(data: &[u8]) -> Result<Self, WireError> {
        let mut reader = WireReader::new(data);

        let version = reader.read_u8("message version")?;
        if version != MSG_VERSION {
            return Err(WireError::UnsupportedVersion(version));
        }

        let source_chain = reader.read_u16("request chain")?;
        if source_chain != ChainId::UNSET.0 {
            return Err(WireError::UnsupportedRequestChain(source_chain));
        }

        let signature = reader.read_bytes(SIGNATURE_LENGTH, "signature")?;
        let query_request = reader.read_len_prefixed(None, "query request")?;

        // The embedded request must itself be well formed.
        QueryRequest::unmarshal(&query_request)
            .map_err(|e| WireError::EmbeddedRequest(Box::new(e)))?;

        let count = reader.read_u8("number of per chain responses")?;
        let mut per_chain_responses = Vec::with_capacity(count as usize);
        for _ in 0..count {
            per_chain_responses.push(PerChainQueryResponse::read_from(&mut reader)?);
        }

        reader.finish()?;

        let publication = Self {
            request: SignedQueryRequest {
                query_request,
                signature,
            },
            per_chain_responses,
        };
        publication.validate()?;
        Ok(publication)
    }

    /// Check the embedded request and that responses line up with its queries.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.request.signature.len() != SIGNATURE_LENGTH {
            return Err(ValidationError::InvalidSignatureLength(
                self.request.signature.len(),
            ));
        }

        let request = QueryRequest::unmarshal(&self.request.query_request)
            .map_err(|e| ValidationError::InvalidEmbeddedRequest(e.to_string()))?;

        if self.per_chain_responses.is_empty() {
            return Err(ValidationError::NoPerChainResponses);
        }
        if self.per_chain_responses.len() > MAX_COUNT {
            return Err(ValidationError::TooManyPerChainResponses(
                self.per_chain_responses.len(),
            ));
        }
        if self.per_chain_responses.len() != request.per_chain_queries.len() {
            return Err(ValidationError::ResponseCountMismatch {
                responses: self.per_chain_responses.len(),
                queries: request.per_chain_queries.len(),
            });
        }

        for (idx, (pcr, pcq)) in self
            .per_chain_responses
            .iter()
            .zip(&request.per_chain_queries)
            .enumerate()
        {
            pcr.validate()
                .map_err(|e| ValidationError::at_response(idx, e))?;
            if pcr.response.response_type() != pcq.query.query_type() {
                return Err(ValidationError::ResponseTypeMismatch { index: idx });
            }
        }
        Ok(())
    }

    /// Key of the pending entry this publication answers.
    pub fn request_signature_hex(&self) -> String {
        self.request.signature_hex()
    }
}

// =============================================================================
// PER-CHAIN RESPONSE
// =============================================================================

/// Answer to one per-chain query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerChainQueryResponse {
    /// Chain the query ran against.
    pub chain_id: ChainId,
    /// Chain-specific result.
    pub response: ChainSpecificResponse,
}

impl PerChainQueryResponse {
    fn write_to(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        buf.put_u16(self.chain_id.0);
        buf.put_u8(self.response.response_type().as_u8());

        let mut payload = Vec::new();
        self.response.write_to(&mut payload)?;
        put_len_prefixed(buf, &payload, "response")
    }

    fn read_from(reader: &mut WireReader<'_>) -> Result<Self, WireError> {
        let chain_id = ChainId(reader.read_u16("response chain")?);
        let response_type = QueryType::try_from(reader.read_u8("response type")?)?;
        let declared = reader.read_u32("response length")?;

        let start = reader.position();
        let response = ChainSpecificResponse::read_from(response_type, reader)?;
        let actual = reader.position() - start;

        if actual != declared as usize {
            return Err(WireError::ResponseLengthMismatch { declared, actual });
        }

        Ok(Self { chain_id, response })
    }

    /// Check the chain id and the chain-specific rules.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.chain_id.is_known() {
            return Err(ValidationError::InvalidChainId(self.chain_id.0));
        }
        self.response.validate()
    }
}

// =============================================================================
// CHAIN-SPECIFIC RESPONSE
// =============================================================================

/// Chain-specific response payload; variants mirror [`super::ChainSpecificQuery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainSpecificResponse {
    /// See [`EthCallQueryResponse`].
    EthCall(EthCallQueryResponse),
    /// See [`EthCallByTimestampQueryResponse`].
    EthCallByTimestamp(EthCallByTimestampQueryResponse),
    /// See [`EthCallWithFinalityQueryResponse`].
    EthCallWithFinality(EthCallWithFinalityQueryResponse),
    /// See [`SolanaAccountQueryResponse`].
    SolanaAccount(SolanaAccountQueryResponse),
    /// See [`SolanaPdaQueryResponse`].
    SolanaPda(SolanaPdaQueryResponse),
}

impl ChainSpecificResponse {
    /// Wire discriminant of this variant.
    pub fn response_type(&self) -> QueryType {
        match self {
            ChainSpecificResponse::EthCall(_) => QueryType::EthCall,
            ChainSpecificResponse::EthCallByTimestamp(_) => QueryType::EthCallByTimestamp,
            ChainSpecificResponse::EthCallWithFinality(_) => QueryType::EthCallWithFinality,
            ChainSpecificResponse::SolanaAccount(_) => QueryType::SolanaAccount,
            ChainSpecificResponse::SolanaPda(_) => QueryType::SolanaPda,
        }
    }

    /// Check the variant's rules.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            ChainSpecificResponse::EthCall(r) => validate_results(&r.results),
            ChainSpecificResponse::EthCallByTimestamp(r) => validate_results(&r.results),
            ChainSpecificResponse::EthCallWithFinality(r) => validate_results(&r.results),
            ChainSpecificResponse::SolanaAccount(r) => {
                validate_count(r.results.len())?;
                r.results.iter().try_for_each(|a| validate_blob(&a.data))
            }
            ChainSpecificResponse::SolanaPda(r) => {
                validate_count(r.results.len())?;
                r.results.iter().try_for_each(|p| validate_blob(&p.data))
            }
        }
    }

    fn write_to(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        match self {
            ChainSpecificResponse::EthCall(r) => {
                r.block.write_to(buf);
                write_results(buf, &r.results)
            }
            ChainSpecificResponse::EthCallByTimestamp(r) => {
                r.target_block.write_to(buf);
                r.following_block.write_to(buf);
                write_results(buf, &r.results)
            }
            ChainSpecificResponse::EthCallWithFinality(r) => {
                r.block.write_to(buf);
                write_results(buf, &r.results)
            }
            ChainSpecificResponse::SolanaAccount(r) => {
                r.header.write_to(buf);
                put_count(buf, r.results.len(), "results")?;
                for result in &r.results {
                    result.write_to(buf)?;
                }
                Ok(())
            }
            ChainSpecificResponse::SolanaPda(r) => {
                r.header.write_to(buf);
                put_count(buf, r.results.len(), "results")?;
                for result in &r.results {
                    buf.put_slice(&result.account);
                    buf.put_u8(result.bump);
                    result.account_info().write_to(buf)?;
                }
                Ok(())
            }
        }
    }

    fn read_from(response_type: QueryType, reader: &mut WireReader<'_>) -> Result<Self, WireError> {
        Ok(match response_type {
            QueryType::EthCall => ChainSpecificResponse::EthCall(EthCallQueryResponse {
                block: EvmBlockInfo::read_from(reader)?,
                results: read_results(reader)?,
            }),
            QueryType::EthCallByTimestamp => {
                ChainSpecificResponse::EthCallByTimestamp(EthCallByTimestampQueryResponse {
                    target_block: EvmBlockInfo::read_from(reader)?,
                    following_block: EvmBlockInfo::read_from(reader)?,
                    results: read_results(reader)?,
                })
            }
            QueryType::EthCallWithFinality => {
                ChainSpecificResponse::EthCallWithFinality(EthCallWithFinalityQueryResponse {
                    block: EvmBlockInfo::read_from(reader)?,
                    results: read_results(reader)?,
                })
            }
            QueryType::SolanaAccount => {
                let header = SolanaSlotInfo::read_from(reader)?;
                let count = reader.read_u8("number of results")?;
                let mut results = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    results.push(SolanaAccountResult::read_from(reader)?);
                }
                ChainSpecificResponse::SolanaAccount(SolanaAccountQueryResponse { header, results })
            }
            QueryType::SolanaPda => {
                let header = SolanaSlotInfo::read_from(reader)?;
                let count = reader.read_u8("number of results")?;
                let mut results = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let account = reader.read_array("account")?;
                    let bump = reader.read_u8("bump")?;
                    let info = SolanaAccountResult::read_from(reader)?;
                    results.push(SolanaPdaResult {
                        account,
                        bump,
                        lamports: info.lamports,
                        rent_epoch: info.rent_epoch,
                        executable: info.executable,
                        owner: info.owner,
                        data: info.data,
                    });
                }
                ChainSpecificResponse::SolanaPda(SolanaPdaQueryResponse { header, results })
            }
        })
    }
}

fn validate_count(count: usize) -> Result<(), ValidationError> {
    if count == 0 {
        return Err(ValidationError::NoResults);
    }
    if count > MAX_COUNT {
        return Err(ValidationError::TooManyResults(count));
    }
    Ok(())
}

fn validate_blob(blob: &[u8]) -> Result<(), ValidationError> {
    if u32::try_from(blob.len()).is_err() {
        return Err(ValidationError::ResultTooLong);
    }
    Ok(())
}

fn validate_results(results: &[Vec<u8>]) -> Result<(), ValidationError> {
    validate_count(results.len())?;
    results.iter().try_for_each(|r| validate_blob(r))
}

fn write_results(buf: &mut Vec<u8>, results: &[Vec<u8>]) -> Result<(), WireError> {
    put_count(buf, results.len(), "results")?;
    for result in results {
        put_len_prefixed(buf, result, "result")?;
    }
    Ok(())
}

fn read_results(reader: &mut WireReader<'_>) -> Result<Vec<Vec<u8>>, WireError> {
    let count = reader.read_u8("number of results")?;
    let mut results = Vec::with_capacity(count as usize);
    for _ in 0..count {
        results.push(reader.read_len_prefixed(None, "result")?);
    }
    Ok(results)
}

// =============================================================================
// EVM RESPONSES
// =============================================================================

/// Block a set of EVM calls was evaluated at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EvmBlockInfo {
    /// Block number.
    pub number: u64,
    /// Block hash.
    pub hash: Hash,
    /// Block time in microseconds since the Unix epoch.
    pub time_micros: i64,
}

impl EvmBlockInfo {
    fn write_to(&self, buf: &mut Vec<u8>) {
        buf.put_u64(self.number);
        buf.put_slice(&self.hash);
        buf.put_i64(self.time_micros);
    }

    fn read_from(reader: &mut WireReader<'_>) -> Result<Self, WireError> {
        Ok(Self {
            number: reader.read_u64("block number")?,
            hash: reader.read_array("block hash")?,
            time_micros: reader.read_i64("block timestamp")?,
        })
    }
}

/// Results of an `eth_call` batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthCallQueryResponse {
    /// Block the calls ran at.
    pub block: EvmBlockInfo,
    /// One result per call, in call order.
    pub results: Vec<Vec<u8>>,
}

/// Results of an `eth_call` batch bracketed by a target timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthCallByTimestampQueryResponse {
    /// Block the calls ran at.
    pub target_block: EvmBlockInfo,
    /// The block after it, proving the timestamp falls inside the target block.
    pub following_block: EvmBlockInfo,
    /// One result per call, in call order.
    pub results: Vec<Vec<u8>>,
}

/// Results of an `eth_call` batch at a finalized or safe block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthCallWithFinalityQueryResponse {
    /// Block the calls ran at.
    pub block: EvmBlockInfo,
    /// One result per call, in call order.
    pub results: Vec<Vec<u8>>,
}

// =============================================================================
// SOLANA RESPONSES
// =============================================================================

/// Slot a Solana read was evaluated at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SolanaSlotInfo {
    /// Slot number.
    pub slot_number: u64,
    /// Block time in microseconds since the Unix epoch.
    pub block_time_micros: i64,
    /// Block hash.
    pub block_hash: Hash,
}

impl SolanaSlotInfo {
    fn write_to(&self, buf: &mut Vec<u8>) {
        buf.put_u64(self.slot_number);
        buf.put_i64(self.block_time_micros);
        buf.put_slice(&self.block_hash);
    }

    fn read_from(reader: &mut WireReader<'_>) -> Result<Self, WireError> {
        Ok(Self {
            slot_number: reader.read_u64("slot number")?,
            block_time_micros: reader.read_i64("block time")?,
            block_hash: reader.read_array("block hash")?,
        })
    }
}

/// State of one Solana account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolanaAccountResult {
    /// Balance in lamports.
    pub lamports: u64,
    /// Epoch at which rent is next due.
    pub rent_epoch: u64,
    /// Whether the account holds a program.
    pub executable: bool,
    /// Owning program.
    pub owner: SolanaPublicKey,
    /// Account data, or the requested slice of it.
    pub data: Vec<u8>,
}

impl SolanaAccountResult {
    fn write_to(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        buf.put_u64(self.lamports);
        buf.put_u64(self.rent_epoch);
        buf.put_u8(u8::from(self.executable));
        buf.put_slice(&self.owner);
        put_len_prefixed(buf, &self.data, "data")
    }

    fn read_from(reader: &mut WireReader<'_>) -> Result<Self, WireError> {
        Ok(Self {
            lamports: reader.read_u64("lamports")?,
            rent_epoch: reader.read_u64("rent epoch")?,
            executable: reader.read_bool("executable flag")?,
            owner: reader.read_array("owner")?,
            data: reader.read_len_prefixed(None, "data")?,
        })
    }
}

/// Results of a Solana account read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolanaAccountQueryResponse {
    /// Slot the read ran at.
    pub header: SolanaSlotInfo,
    /// One result per account, in request order.
    pub results: Vec<SolanaAccountResult>,
}

/// State of the account behind one PDA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolanaPdaResult {
    /// Derived address.
    pub account: SolanaPublicKey,
    /// Bump seed found during derivation.
    pub bump: u8,
    /// Balance in lamports.
    pub lamports: u64,
    /// Epoch at which rent is next due.
    pub rent_epoch: u64,
    /// Whether the account holds a program.
    pub executable: bool,
    /// Owning program.
    pub owner: SolanaPublicKey,
    /// Account data, or the requested slice of it.
    pub data: Vec<u8>,
}

impl SolanaPdaResult {
    fn account_info(&self) -> SolanaAccountResult {
        SolanaAccountResult {
            lamports: self.lamports,
            rent_epoch: self.rent_epoch,
            executable: self.executable,
            owner: self.owner,
            data: self.data.clone(),
        }
    }
}

/// Results of a Solana PDA read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolanaPdaQueryResponse {
    /// Slot the read ran at.
    pub header: SolanaSlotInfo,
    /// One result per PDA, in request order.
    pub results: Vec<SolanaPdaResult>,
}
