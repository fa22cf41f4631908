//! Gateway response signature verification.
//!
//! The checkout backend signs a canonical string built from an ordered list of
//! fields: `name1:value1,name2:value2`. The order is part of the wire contract,
//! so fields are always passed as a slice of pairs, never as a map.

use openssl::{hash::MessageDigest, sign::Verifier};
use tracing::{debug, instrument, warn};

use super::GatewayPublicKey;
use crate::{
    error::{Result, TokenizerError},
    models::GatewayResponse,
};

/// Builds the canonical string signed by the gateway.
///
/// # Examples
///
/// ```
/// use card_tokenizer::crypto::canonical_string;
///
/// let canonical = canonical_string(&[("status", "SUCCESS"), ("requestId", "req-1")]);
/// assert_eq!(canonical, "status:SUCCESS,requestId:req-1");
/// ```
#[must_use]
pub fn canonical_string(fields: &[(&str, &str)]) -> String {
    fields.iter().map(|(name, value)| format!("{name}:{value}")).collect::<Vec<_>>().join(",")
}

/// A value whose gateway signature has been checked.
///
/// Only [`SignatureVerifier`] can construct it, which keeps unverified responses
/// away from [`normalize`](crate::normalize::normalize).
#[derive(Debug, Clone, PartialEq)]
pub struct Verified<T>(T);

impl<T> Verified<T> {
    /// Returns the verified value.
    #[must_use]
    pub const fn get(&self) -> &T {
        &self.0
    }

    /// Unwraps the verified value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

/// Verifies RSA-SHA256 (PKCS#1 v1.5) signatures made by the gateway.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    public_key: GatewayPublicKey,
}

impl SignatureVerifier {
    /// Creates a verifier for the gateway public key.
    #[must_use]
    pub const fn new(public_key: GatewayPublicKey) -> Self {
        Self { public_key }
    }

    /// Checks a hex signature over the canonical string of `fields`.
    ///
    /// Returns `true` only on an exact cryptographic match. A signature that is
    /// not hex, has the wrong length, or does not match yields `false`.
    #[instrument(skip_all, fields(fields = fields.len()))]
    pub fn verify(&self, signature: &str, fields: &[(&str, &str)]) -> bool {
        let Ok(signature) = hex::decode(signature.trim()) else {
            warn!("signature is not valid hex");
            return false;
        };
        if signature.is_empty() {
            warn!("signature is empty");
            return false;
        }

        let canonical = canonical_string(fields);
        match self.check(canonical.as_bytes(), &signature) {
            Ok(valid) => valid,
            Err(e) => {
                warn!(error = %e, "signature check failed");
                false
            }
        }
    }

    /// Verifies a checkout response over `status` and `request_id`, in that order.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::SecurityError`] if the signature does not verify.
    pub fn verify_response(
        &self,
        response: GatewayResponse,
        request_id: &str,
    ) -> Result<Verified<GatewayResponse>> {
        let status = response.status_text();
        let fields = [("status", status.as_str()), ("requestId", request_id)];

        if self.verify(response.signature(), &fields) {
            debug!(request_id, "gateway response verified");
            Ok(Verified(response))
        } else {
            warn!(request_id, "request response was not secure");
            Err(TokenizerError::SecurityError(format!(
                "response signature for request {request_id} did not verify"
            )))
        }
    }

    fn check(
        &self,
        message: &[u8],
        signature: &[u8],
    ) -> std::result::Result<bool, openssl::error::ErrorStack> {
        let mut verifier = Verifier::new(MessageDigest::sha256(), self.public_key.pkey())?;
        verifier.update(message)?;
        verifier.verify(signature)
    }
}
