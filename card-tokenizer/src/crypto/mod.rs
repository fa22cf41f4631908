//! Cryptographic building blocks of the tokenization protocol.
//!
//! - [`KeyMaterial`]: ephemeral AES-128 key and counter seed, one per payload
//! - [`GatewayPublicKey`]: the gateway RSA key, parsed once at construction
//! - [`Packer`]: hybrid encryption of the card document
//! - [`SignatureVerifier`]: RSA-SHA256 verification of checkout responses

mod keys;
mod packer;
mod public_key;
mod verifier;


pub use keys::{KEY_LEN, KeyMaterial};
pub use packer::Packer;
pub use public_key::GatewayPublicKey;
pub use verifier::{SignatureVerifier, Verified, canonical_string};
