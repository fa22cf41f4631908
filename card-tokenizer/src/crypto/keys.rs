//! Ephemeral symmetric key material.
//!
//! Every tokenization attempt draws a fresh AES-128 key and counter seed. The
//! material lives only for one pack operation: [`Packer::pack`](super::Packer::pack)
//! takes it by value, and the bytes are zeroized when it is dropped.

use rand::{Rng, RngCore, rngs::OsRng};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// AES key length in bytes.
pub const KEY_LEN: usize = 16;

/// Symmetric key and counter seed for one payload.
///
/// Serializes to `{"k":[..16 bytes..],"s":seed}`, the shape the checkout backend
/// expects inside the wrapped key.
///
/// `Debug` output never contains the key bytes.
///
/// # Examples
///
/// ```
/// use card_tokenizer::crypto::KeyMaterial;
///
/// let first = KeyMaterial::generate();
/// let second = KeyMaterial::generate();
/// assert_ne!(first.key(), second.key());
/// assert!(first.seed() < u8::MAX);
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    #[serde(rename = "k")]
    key: [u8; KEY_LEN],
    #[serde(rename = "s")]
    seed: u8,
}

impl KeyMaterial {
    /// Draws fresh key material from the operating system CSPRNG.
    ///
    /// Key bytes cover the full 0-255 range; the seed is drawn from 0-254, which
    /// the checkout backend has always received.
    #[must_use]
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        let seed = OsRng.gen_range(0..u8::MAX);
        Self { key, seed }
    }

    /// Builds key material from known bytes.
    ///
    /// Intended for replaying a captured payload; production callers should use
    /// [`generate`](Self::generate).
    #[must_use]
    pub const fn from_parts(key: [u8; KEY_LEN], seed: u8) -> Self {
        Self { key, seed }
    }

    /// Returns the AES-128 key bytes.
    #[must_use]
    pub const fn key(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    /// Returns the counter seed.
    #[must_use]
    pub const fn seed(&self) -> u8 {
        self.seed
    }

    /// Initial counter block: the seed as a 128-bit big-endian integer.
    #[must_use]
    pub(crate) fn counter_block(&self) -> [u8; 16] {
        let mut iv = [0u8; 16];
        iv[15] = self.seed;
        iv
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial").field("key", &"[REDACTED]").finish_non_exhaustive()
    }
}
