//! # Gossip Envelopes
//!
//! Opaque bytes plus a 65-byte recoverable signature. The bytes are kept
//! exactly as received; digests are always computed over them, never over a
//! re-encoding.

use serde::{Deserialize, Serialize};

/// A client-signed, serialized [`super::QueryRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignedQueryRequest {
    /// Serialized `QueryRequest`.
    pub query_request: Vec<u8>,
    /// Signature over the environment-prefixed request digest.
    pub signature: Vec<u8>,
}

impl SignedQueryRequest {
    /// Hex signature, the key of the request on the response path.
    pub fn signature_hex(&self) -> String {
        hex::encode(&self.signature)
    }
}

/// A guardian-signed, serialized [`super::QueryResponsePublication`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedQueryResponse {
    /// Serialized `QueryResponsePublication`.
    pub query_response: Vec<u8>,
    /// Guardian signature over the response digest.
    pub signature: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_hex() {
        let signed = SignedQueryRequest {
            query_request: vec![1, 2, 3],
            signature: vec![0xab, 0xcd],
        };
        assert_eq!(signed.signature_hex(), "abcd");
    }

    #[test]
    fn test_envelope_json_round_trip() {
        let signed = SignedQueryResponse {
            query_response: vec![1, 2, 3],
            signature: vec![0u8; 65],
        };
        let json = serde_json::to_string(&signed).unwrap();
        let decoded: SignedQueryResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, signed);
    }
}
