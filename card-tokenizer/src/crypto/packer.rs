//! Hybrid encryption of card data.
//!
//! The card document is encrypted with AES-128-CTR under ephemeral key material,
//! and the key material itself is wrapped with the gateway RSA key. Only the
//! resulting [`PackedPayload`] ever leaves the process.

use openssl::symm::{Cipher, Crypter, Mode};
use tracing::instrument;
use zeroize::Zeroizing;

use super::{GatewayPublicKey, KeyMaterial};
use crate::{
    error::{Result, TokenizerError},
    models::{CardPayload, PackedPayload},
};

/// Packs card documents for the checkout backend.
#[derive(Debug, Clone)]
pub struct Packer {
    public_key: GatewayPublicKey,
}

impl Packer {
    /// Creates a packer bound to the gateway public key.
    #[must_use]
    pub const fn new(public_key: GatewayPublicKey) -> Self {
        Self { public_key }
    }

    /// Encrypts `card` for `session`.
    ///
    /// Fresh key material is generated when `key` is `None`. The material is
    /// consumed: it cannot be reused for a second payload.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::CryptoError`] if encryption or key wrapping fails.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use card_tokenizer::{
    ///     crypto::{GatewayPublicKey, KeyMaterial, Packer},
    ///     models::{CardInput, CardPayload},
    /// };
    ///
    /// # fn example(public_key_body: &str, card: CardInput) -> card_tokenizer::error::Result<()> {
    /// let packer = Packer::new(GatewayPublicKey::from_pem_body(public_key_body)?);
    /// let payload = packer.pack(&CardPayload::new(&card, None), "S1", None)?;
    /// assert_eq!(payload.session, "S1");
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip_all, fields(update = card.is_update()))]
    pub fn pack(
        &self,
        card: &CardPayload<'_>,
        session: &str,
        key: Option<KeyMaterial>,
    ) -> Result<PackedPayload> {
        let key = key.unwrap_or_else(KeyMaterial::generate);

        let plaintext = Zeroizing::new(serde_json::to_vec(card).map_err(|e| {
            TokenizerError::CryptoError(format!("card serialization failed: {e}"))
        })?);
        let ciphertext = apply_keystream(&key, &plaintext)?;

        let serialized_key = Zeroizing::new(serde_json::to_vec(&key).map_err(|e| {
            TokenizerError::CryptoError(format!("key serialization failed: {e}"))
        })?);
        let lk = self.public_key.wrap(&serialized_key)?;

        Ok(PackedPayload { session: session.to_owned(), ld: hex::encode(ciphertext), lk })
    }

    /// Decrypts the `ld` field of a packed payload back into the card JSON.
    ///
    /// This is the checkout backend's half of the exchange, provided for
    /// diagnostics and tests.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::CryptoError`] if `ld` is not hex or does not decrypt
    /// to UTF-8.
    pub fn unpack_card(ld: &str, key: &KeyMaterial) -> Result<String> {
        let ciphertext = hex::decode(ld)
            .map_err(|e| TokenizerError::CryptoError(format!("ciphertext is not hex: {e}")))?;
        let plaintext = apply_keystream(key, &ciphertext)?;
        String::from_utf8(plaintext)
            .map_err(|e| TokenizerError::CryptoError(format!("plaintext is not UTF-8: {e}")))
    }
}

/// AES-128-CTR; encryption and decryption are the same operation.
fn apply_keystream(key: &KeyMaterial, input: &[u8]) -> Result<Vec<u8>> {
    let cipher = Cipher::aes_128_ctr();
    let iv = key.counter_block();
    let mut crypter = Crypter::new(cipher, Mode::Encrypt, key.key(), Some(&iv))
        .map_err(|e| TokenizerError::CryptoError(format!("cipher setup failed: {e}")))?;

    let mut output = vec![0u8; input.len() + cipher.block_size()];
    let mut written = crypter
        .update(input, &mut output)
        .map_err(|e| TokenizerError::CryptoError(format!("encryption failed: {e}")))?;
    written += crypter
        .finalize(&mut output[written..])
        .map_err(|e| TokenizerError::CryptoError(format!("encryption failed: {e}")))?;
    output.truncate(written);
    Ok(output)
}
