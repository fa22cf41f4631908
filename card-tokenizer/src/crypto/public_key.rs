//! Gateway RSA public key.
//!
//! The gateway publishes one RSA key pair. Its public half is used twice in the
//! protocol: to wrap the per-payload symmetric key (PKCS#1 v1.5 encryption) and to
//! verify the SHA-256 signature on checkout responses.

use base64::Engine as _;
use openssl::{
    pkey::{PKey, Public},
    rsa::{Padding, Rsa},
};

use crate::error::{Result, TokenizerError};

const PEM_HEADER: &str = "-----BEGIN PUBLIC KEY-----";
const PEM_FOOTER: &str = "-----END PUBLIC KEY-----";

/// PKCS#1 v1.5 padding overhead in bytes.
const PKCS1_OVERHEAD: usize = 11;

/// Parsed gateway public key.
///
/// Cheap to clone; the underlying OpenSSL key is reference counted.
#[derive(Clone)]
pub struct GatewayPublicKey {
    rsa: Rsa<Public>,
    pkey: PKey<Public>,
}

impl GatewayPublicKey {
    /// Parses the key as distributed by the gateway: the base64 body of a
    /// `PUBLIC KEY` PEM without header and footer. A complete PEM is accepted too.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::ConfigurationError`] if the input is empty or is not
    /// an RSA public key.
    pub fn from_pem_body(body: &str) -> Result<Self> {
        let pem = to_pem(body)?;
        Self::from_pem(pem.as_bytes())
    }

    /// Parses a complete `PUBLIC KEY` PEM.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::ConfigurationError`] if the PEM is invalid.
    pub fn from_pem(pem: &[u8]) -> Result<Self> {
        let rsa = Rsa::public_key_from_pem(pem).map_err(|e| {
            TokenizerError::ConfigurationError(format!("Invalid public key provided: {e}"))
        })?;
        let pkey = PKey::from_rsa(rsa.clone()).map_err(|e| {
            TokenizerError::ConfigurationError(format!("Invalid public key provided: {e}"))
        })?;
        Ok(Self { rsa, pkey })
    }

    /// Key size in bits.
    #[must_use]
    pub fn bits(&self) -> u32 {
        self.rsa.size() * 8
    }

    /// Encrypts `plaintext` with RSA PKCS#1 v1.5 and returns standard base64.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::CryptoError`] if the plaintext does not fit the
    /// modulus or OpenSSL fails.
    pub fn wrap(&self, plaintext: &[u8]) -> Result<String> {
        let size = self.rsa.size() as usize;
        if plaintext.len() > size.saturating_sub(PKCS1_OVERHEAD) {
            return Err(TokenizerError::CryptoError(format!(
                "key wrap input of {} bytes exceeds {}-bit modulus capacity",
                plaintext.len(),
                self.bits()
            )));
        }

        let mut ciphertext = vec![0u8; size];
        let written = self
            .rsa
            .public_encrypt(plaintext, &mut ciphertext, Padding::PKCS1)
            .map_err(|e| TokenizerError::CryptoError(format!("key wrap failed: {e}")))?;
        ciphertext.truncate(written);

        Ok(base64::engine::general_purpose::STANDARD.encode(ciphertext))
    }

    pub(crate) fn pkey(&self) -> &PKey<Public> {
        &self.pkey
    }
}

impl std::fmt::Debug for GatewayPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayPublicKey").field("bits", &self.bits()).finish()
    }
}

/// Re-wraps a bare base64 body into 64-column PEM.
fn to_pem(body: &str) -> Result<String> {
    let trimmed = body.trim();
    if trimmed.starts_with("-----BEGIN") {
        return Ok(trimmed.to_owned());
    }

    let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(TokenizerError::ConfigurationError("public key is missing".to_owned()));
    }

    let mut pem = String::with_capacity(compact.len() + compact.len() / 64 + 64);
    pem.push_str(PEM_HEADER);
    pem.push('\n');
    for line in compact.as_bytes().chunks(64) {
        // base64 alphabet is ASCII, chunk boundaries are char boundaries
        pem.push_str(&String::from_utf8_lossy(line));
        pem.push('\n');
    }
    pem.push_str(PEM_FOOTER);
    pem.push('\n');
    Ok(pem)
}
