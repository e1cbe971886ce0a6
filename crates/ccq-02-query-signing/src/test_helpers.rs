//! Key generation for tests.

use k256::ecdsa::SigningKey;
use shared_types::Address;

use crate::domain::recovery::address_from_pubkey;

/// Generate a random keypair and its address.
pub fn generate_keypair() -> (SigningKey, Address) {
    let signing_key = SigningKey::random(&mut rand::thread_rng());
    let address = address_of(&signing_key);
    (signing_key, address)
}

/// Address of a signing key.
pub fn address_of(key: &SigningKey) -> Address {
    address_from_pubkey(key.verifying_key())
}

/// `n` random guardian keys and their addresses, in slot order.
pub fn guardian_keys(n: usize) -> (Vec<SigningKey>, Vec<Address>) {
    (0..n).map(|_| generate_keypair()).unzip()
}
