//! # HTTP Boundary Bodies
//!
//! JSON shapes exchanged with the query HTTP endpoint. Binary fields are hex.

use ccq_01_wire_format::{QueryRequest, SignedQueryRequest};
use ccq_02_query_signing::{query_request_digest, recover_query_request_signer};
use serde::{Deserialize, Serialize};
use shared_types::{Address, Environment};

use super::entities::SignedResponse;
use super::errors::AggregatorError;

/// Client request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequestBody {
    /// Hex-encoded serialized `QueryRequest`.
    pub bytes: String,
    /// Hex-encoded 65-byte signature over the request digest.
    pub signature: String,
}

/// Quorum answer body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponseBody {
    /// Hex-encoded serialized publication.
    pub bytes: String,
    /// `hex(signature ‖ guardian_index)`, ascending by guardian index.
    pub signatures: Vec<String>,
}

fn decode_hex(field: &'static str, value: &str) -> Result<Vec<u8>, AggregatorError> {
    let value = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(value).map_err(|e| AggregatorError::InvalidHex {
        field,
        reason: e.to_string(),
    })
}

impl QueryRequestBody {
    /// Build a body from a signed request.
    pub fn from_signed(signed: &SignedQueryRequest) -> Self {
        Self {
            bytes: hex::encode(&signed.query_request),
            signature: hex::encode(&signed.signature),
        }
    }

    /// Decode, check the signature, and validate the request.
    ///
    /// Returns the signed request and the recovered client address.
    pub fn decode(&self, env: Environment) -> Result<(SignedQueryRequest, Address), AggregatorError> {
        let query_request = decode_hex("bytes", &self.bytes)?;
        let signature = decode_hex("signature", &self.signature)?;

        let digest = query_request_digest(env, &query_request);
        let signer = recover_query_request_signer(&digest, &signature)?;
        QueryRequest::unmarshal(&query_request)?;

        Ok((
            SignedQueryRequest {
                query_request,
                signature,
            },
            signer,
        ))
    }
}

impl SignedResponse {
    /// Format for the HTTP response.
    ///
    /// Signatures whose guardian index does not fit the trailing index byte
    /// are left out.
    pub fn to_http_response(&self) -> QueryResponseBody {
        let mut signatures = self.signatures.clone();
        signatures.sort_by_key(|s| s.index);

        QueryResponseBody {
            bytes: hex::encode(&self.response_bytes),
            signatures: signatures
                .iter()
                .filter_map(|s| {
                    let index = u8::try_from(s.index).ok()?;
                    let mut bytes = s.signature.clone();
                    bytes.push(index);
                    Some(hex::encode(bytes))
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GuardianSignature;
    use ccq_01_wire_format::test_helpers::{response_for, simple_request};
    use ccq_01_wire_format::QueryResponsePublication;
    use ccq_02_query_signing::sign_query_request;
    use ccq_02_query_signing::test_helpers::generate_keypair;
    use ccq_02_query_signing::SignatureError;
    use shared_types::ChainId;

    fn signed_request() -> (SignedQueryRequest, Address) {
        let (key, address) = generate_keypair();
        let bytes = simple_request(ChainId::ETHEREUM).marshal().unwrap();
        (
            sign_query_request(&key, Environment::Testnet, bytes).unwrap(),
            address,
        )
    }

    #[test]
    fn test_decode_valid_body() {
        let (signed, address) = signed_request();
        let body = QueryRequestBody::from_signed(&signed);

        let (decoded, signer) = body.decode(Environment::Testnet).unwrap();
        assert_eq!(decoded, signed);
        assert_eq!(signer, address);
    }

    #[test]
    fn test_decode_accepts_0x_prefix() {
        let (signed, _) = signed_request();
        let mut body = QueryRequestBody::from_signed(&signed);
        body.bytes = format!("0x{}", body.bytes);
        assert!(body.decode(Environment::Testnet).is_ok());
    }

    #[test]
    fn test_decode_rejects_bad_hex() {
        let (signed, _) = signed_request();
        let mut body = QueryRequestBody::from_signed(&signed);
        body.signature = "zz".into();
        assert!(matches!(
            body.decode(Environment::Testnet),
            Err(AggregatorError::InvalidHex { field: "signature", .. })
        ));
    }

    #[test]
    fn test_decode_rejects_bad_signatures() {
        let (signed, _) = signed_request();

        let mut short = signed.clone();
        short.signature.truncate(64);
        assert_eq!(
            QueryRequestBody::from_signed(&short).decode(Environment::Testnet),
            Err(AggregatorError::InvalidSignature(SignatureError::InvalidLength(64)))
        );

        let mut bad_v = signed;
        bad_v.signature[64] = 4;
        assert_eq!(
            QueryRequestBody::from_signed(&bad_v).decode(Environment::Testnet),
            Err(AggregatorError::InvalidSignature(
                SignatureError::InvalidRecoveryId(4)
            ))
        );
    }

    #[test]
    fn test_decode_rejects_invalid_request() {
        let (key, _) = generate_keypair();
        let signed = sign_query_request(&key, Environment::Testnet, vec![1, 0, 0]).unwrap();
        let result = QueryRequestBody::from_signed(&signed).decode(Environment::Testnet);
        assert!(matches!(result, Err(AggregatorError::InvalidRequest(_))));
        assert!(result.unwrap_err().is_client_error());
    }

    #[test]
    fn test_signatures_sorted_with_index_byte() {
        let (signed, _) = signed_request();
        let request = simple_request(ChainId::ETHEREUM);
        let response = QueryResponsePublication {
            request: signed,
            per_chain_responses: vec![response_for(&request.per_chain_queries[0])],
        };
        let response_bytes = response.marshal().unwrap();
        let signed_response = SignedResponse {
            response,
            response_bytes: response_bytes.clone(),
            signatures: vec![
                GuardianSignature {
                    index: 5,
                    signature: vec![0xbb; 65],
                },
                GuardianSignature {
                    index: 2,
                    signature: vec![0xaa; 65],
                },
            ],
        };

        let body = signed_response.to_http_response();
        assert_eq!(body.bytes, hex::encode(response_bytes));
        assert_eq!(body.signatures.len(), 2);
        assert_eq!(body.signatures[0], format!("{}02", "aa".repeat(65)));
        assert_eq!(body.signatures[1], format!("{}05", "bb".repeat(65)));

        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("bytes").is_some());
        assert!(json.get("signatures").is_some());
    }

    #[test]
    fn test_index_beyond_one_byte_not_truncated() {
        let (signed, _) = signed_request();
        let request = simple_request(ChainId::ETHEREUM);
        let response = QueryResponsePublication {
            request: signed,
            per_chain_responses: vec![response_for(&request.per_chain_queries[0])],
        };
        let signed_response = SignedResponse {
            response_bytes: response.marshal().unwrap(),
            response,
            signatures: vec![
                GuardianSignature {
                    index: 256,
                    signature: vec![0xcc; 65],
                },
                GuardianSignature {
                    index: 255,
                    signature: vec![0xdd; 65],
                },
            ],
        };

        let body = signed_response.to_http_response();
        assert_eq!(body.signatures, vec![format!("{}ff", "dd".repeat(65))]);
    }
}
