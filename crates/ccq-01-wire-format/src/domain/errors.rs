//! # Wire Format Errors
//!
//! `WireError` covers framing problems found while decoding or encoding.
//! `ValidationError` covers structural rules; every rule has its own variant.

use thiserror::Error;

/// Errors raised by `marshal` / `unmarshal`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// Input ended before `field` could be read.
    #[error("failed to read {field}: unexpected end of input")]
    Truncated {
        /// Field being read.
        field: &'static str,
    },

    /// Message version other than the single supported one.
    #[error("unsupported message version: {0}")]
    UnsupportedVersion(u8),

    /// Publication source chain other than unset.
    #[error("unsupported request chain: {0}")]
    UnsupportedRequestChain(u16),

    /// Unknown chain-specific query type discriminant.
    #[error("unsupported query type: {0}")]
    UnsupportedQueryType(u8),

    /// An untrusted length prefix exceeds its cap.
    #[error("{field} length {len} exceeds maximum {max}")]
    LengthExceeded {
        /// Field whose length prefix was read.
        field: &'static str,
        /// Declared length.
        len: u64,
        /// Maximum accepted length.
        max: u64,
    },

    /// Declared per-chain query length differs from the bytes consumed.
    #[error("query length mismatch: declared {declared} bytes, actual {actual} bytes")]
    QueryLengthMismatch {
        /// Length from the prefix.
        declared: u32,
        /// Bytes the variant decoder consumed.
        actual: usize,
    },

    /// Declared per-chain response length differs from the bytes consumed.
    #[error("response length mismatch: declared {declared} bytes, actual {actual} bytes")]
    ResponseLengthMismatch {
        /// Length from the prefix.
        declared: u32,
        /// Bytes the variant decoder consumed.
        actual: usize,
    },

    /// A boolean byte other than 0 or 1.
    #[error("invalid boolean value for {field}: {value}")]
    InvalidBool {
        /// Field being read.
        field: &'static str,
        /// Byte found.
        value: u8,
    },

    /// A string field is not valid UTF-8.
    #[error("{field} is not valid UTF-8")]
    InvalidUtf8 {
        /// Field being read.
        field: &'static str,
    },

    /// A blob is too large for its length prefix.
    #[error("{0} too long")]
    TooLong(&'static str),

    /// Bytes remain after a complete structure.
    #[error("excess bytes in unmarshal")]
    ExcessBytes,

    /// The embedded query request of a publication failed to decode.
    #[error("failed to unmarshal query request: {0}")]
    EmbeddedRequest(Box<WireError>),

    /// Structural validation failed.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Structural validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    // ------------------------------------------------------------------
    // Request envelope
    // ------------------------------------------------------------------
    /// Request carries no per-chain queries.
    #[error("request does not contain any per chain queries")]
    NoPerChainQueries,

    /// Request carries more than 255 per-chain queries.
    #[error("too many per chain queries: {0}")]
    TooManyPerChainQueries(usize),

    /// Chain id is unset or not registered.
    #[error("invalid chainID: {0}")]
    InvalidChainId(u16),

    /// A per-chain query failed validation.
    #[error("failed to validate per chain query {index}: {source}")]
    PerChainQuery {
        /// Position in the request.
        index: usize,
        /// Underlying failure.
        #[source]
        source: Box<ValidationError>,
    },

    // ------------------------------------------------------------------
    // EVM queries
    // ------------------------------------------------------------------
    /// Block id longer than the decode cap.
    #[error("block id too long")]
    BlockIdTooLong,

    /// Block id empty.
    #[error("block id is required")]
    BlockIdRequired,

    /// Block id without the `0x` prefix.
    #[error("block id must be a hex number or hash starting with 0x")]
    BlockIdMissingPrefix,

    /// Target timestamp is zero.
    #[error("target timestamp may not be zero")]
    TargetTimestampZero,

    /// Target block hint longer than the decode cap.
    #[error("target block id hint too long")]
    TargetBlockHintTooLong,

    /// Following block hint longer than the decode cap.
    #[error("following block id hint too long")]
    FollowingBlockHintTooLong,

    /// Exactly one of the two block hints is set.
    #[error("if either the target or following block id is unset, they both must be unset")]
    BlockHintsMismatch,

    /// Target block hint without the `0x` prefix.
    #[error("target block id must be a hex number or hash starting with 0x")]
    TargetBlockHintMissingPrefix,

    /// Following block hint without the `0x` prefix.
    #[error("following block id must be a hex number or hash starting with 0x")]
    FollowingBlockHintMissingPrefix,

    /// Finality longer than the decode cap.
    #[error("finality too long")]
    FinalityTooLong,

    /// Finality empty.
    #[error("finality is required")]
    FinalityRequired,

    /// Finality outside `{finalized, safe}`.
    #[error("finality must be \"finalized\" or \"safe\", is \"{0}\"")]
    InvalidFinality(String),

    /// No call data entries.
    #[error("does not contain any call data")]
    NoCallData,

    /// More than 255 call data entries.
    #[error("too many call data entries: {0}")]
    TooManyCallData(usize),

    /// Call data `to` is empty.
    #[error("no call data to")]
    CallDataToMissing,

    /// Call data `to` is not 20 bytes.
    #[error("invalid length for To contract: {0}")]
    InvalidToLength(usize),

    /// Call data payload is empty.
    #[error("no call data data")]
    CallDataEmpty,

    /// Call data payload longer than the decode cap.
    #[error("call data data too long")]
    CallDataTooLong,

    // ------------------------------------------------------------------
    // Solana queries
    // ------------------------------------------------------------------
    /// Commitment longer than 12 characters.
    #[error("commitment too long")]
    CommitmentTooLong,

    /// Commitment other than `finalized`.
    #[error("commitment must be \"finalized\"")]
    InvalidCommitment,

    /// Data slice offset set while the slice length is zero.
    #[error("data slice offset may not be set if data slice length is zero")]
    DataSliceOffsetWithoutLength,

    /// No accounts.
    #[error("does not contain any account entries")]
    NoAccounts,

    /// More than 100 accounts.
    #[error("too many account entries, may not be more than {max}")]
    TooManyAccounts {
        /// Maximum accepted.
        max: usize,
    },

    /// No PDAs.
    #[error("does not contain any PDAs entries")]
    NoPdas,

    /// More than 100 PDAs.
    #[error("too many PDA entries, may not be more than {max}")]
    TooManyPdas {
        /// Maximum accepted.
        max: usize,
    },

    /// PDA without seeds.
    #[error("PDA does not contain any seeds")]
    NoSeeds,

    /// PDA with more than 16 seeds.
    #[error("PDA contains too many seeds")]
    TooManySeeds,

    /// Empty seed.
    #[error("seed is null")]
    EmptySeed,

    /// Seed longer than 32 bytes.
    #[error("seed is too long")]
    SeedTooLong,

    // ------------------------------------------------------------------
    // Responses
    // ------------------------------------------------------------------
    /// Request signature is not 65 bytes.
    #[error("invalid request signature length: {0}")]
    InvalidSignatureLength(usize),

    /// Embedded request bytes failed to decode or validate.
    #[error("query request is invalid: {0}")]
    InvalidEmbeddedRequest(String),

    /// Publication carries no per-chain responses.
    #[error("response does not contain any per chain responses")]
    NoPerChainResponses,

    /// Publication carries more than 255 per-chain responses.
    #[error("too many per chain responses: {0}")]
    TooManyPerChainResponses(usize),

    /// Response count differs from the request's query count.
    #[error("number of responses ({responses}) does not match number of queries ({queries})")]
    ResponseCountMismatch {
        /// Responses carried.
        responses: usize,
        /// Queries in the embedded request.
        queries: usize,
    },

    /// Response variant differs from the query variant at the same index.
    #[error("type of response {index} does not match the query")]
    ResponseTypeMismatch {
        /// Position in the publication.
        index: usize,
    },

    /// A per-chain response failed validation.
    #[error("failed to validate per chain response {index}: {source}")]
    PerChainResponse {
        /// Position in the publication.
        index: usize,
        /// Underlying failure.
        #[source]
        source: Box<ValidationError>,
    },

    /// No results.
    #[error("does not contain any results")]
    NoResults,

    /// More than 255 results.
    #[error("too many results: {0}")]
    TooManyResults(usize),

    /// A result blob does not fit its length prefix.
    #[error("result too long")]
    ResultTooLong,
}

impl ValidationError {
    /// Wrap a per-chain query failure with its position.
    pub(crate) fn at_query(index: usize, source: ValidationError) -> Self {
        ValidationError::PerChainQuery {
            index,
            source: Box::new(source),
        }
    }

    /// Wrap a per-chain response failure with its position.
    pub(crate) fn at_response(index: usize, source: ValidationError) -> Self {
        ValidationError::PerChainResponse {
            index,
            source: Box::new(source),
        }
    }
}
