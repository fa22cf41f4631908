//! Error types for card tokenization.
//!
//! This module defines all error types that can occur while tokenizing, updating
//! or deleting a card token. All errors implement the standard
//! [`std::error::Error`] trait via [`thiserror::Error`].
//!
//! # Error Categories
//!
//! - **Configuration Errors** ([`TokenizerError::ConfigurationError`]): invalid public key
//!   or missing merchant credentials, detected at construction time
//! - **Transport Errors** ([`TokenizerError::RequestFailed`], [`TokenizerError::HttpError`],
//!   [`TokenizerError::TransportError`]): the gateway rejected the call or could not be reached
//! - **Security Errors** ([`TokenizerError::SecurityError`]): the gateway answered, but its
//!   response signature did not verify
//! - **Input Errors** ([`TokenizerError::InvalidInput`], [`TokenizerError::InvalidResponse`],
//!   [`TokenizerError::CryptoError`]): malformed data on either side of the exchange
//!
//! # Examples
//!
//! ```
//! use card_tokenizer::error::{Result, TokenizerError};
//!
//! fn require_secret(secret: &str) -> Result<&str> {
//!     if secret.is_empty() {
//!         return Err(TokenizerError::ConfigurationError("secret is missing".to_owned()));
//!     }
//!     Ok(secret)
//! }
//!
//! assert!(require_secret("").is_err());
//! ```

use thiserror::Error;

/// Result type alias for tokenizer operations.
///
/// All fallible functions in this crate return this type.
pub type Result<T> = std::result::Result<T, TokenizerError>;

/// Errors that can occur during card tokenization.
///
/// The split between transport and security failures is the trust boundary of the
/// protocol: a transport error means the gateway rejected or never received the
/// call, a security error means a response arrived but cannot be trusted.
///
/// # Error Recovery
///
/// - **Transport errors** ([`RequestFailed`](Self::RequestFailed),
///   [`HttpError`](Self::HttpError)): the caller may re-invoke the whole operation; a
///   fresh request id and fresh key material are used automatically
/// - **Security errors** ([`SecurityError`](Self::SecurityError)): do not retry blindly,
///   check the configured gateway public key and report the incident
/// - **Configuration errors** ([`ConfigurationError`](Self::ConfigurationError)): fix the
///   configuration, no operation can proceed
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum TokenizerError {
    /// Invalid or incomplete configuration.
    ///
    /// Raised synchronously at construction time, most commonly because the gateway
    /// public key cannot be parsed or the merchant id / secret is empty.
    ///
    /// # Recovery
    ///
    /// Verify that:
    /// - The public key is the base64 body of an RSA `PUBLIC KEY` PEM (header optional)
    /// - `merchant` and `secret` are set
    /// - Both gateway URLs are valid HTTPS URLs
    #[error("Invalid configuration: {0}")]
    ConfigurationError(String),

    /// The gateway answered with a non-success status.
    ///
    /// Any status other than `200` from the merchant or checkout backend is terminal
    /// for the current attempt. No retry happens inside the core.
    ///
    /// # Examples
    ///
    /// ```
    /// use card_tokenizer::error::TokenizerError;
    ///
    /// let err = TokenizerError::RequestFailed { endpoint: "/tokenize".to_owned(), status: 500 };
    /// assert!(err.to_string().contains("request failed"));
    /// assert!(err.is_transport());
    /// ```
    #[error("request failed: {endpoint} returned status {status}")]
    RequestFailed {
        /// Endpoint path that failed.
        endpoint: String,
        /// HTTP status returned by the gateway.
        status: u16,
    },

    /// HTTP request could not be completed.
    ///
    /// Wraps [`reqwest::Error`]: timeouts, refused connections, DNS and TLS failures.
    ///
    /// # Recovery
    ///
    /// Retry the whole operation with backoff. Timeouts are configured on the
    /// transport, see [`HttpConfig`](crate::transport::HttpConfig).
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The transport refused to send the request.
    ///
    /// Raised for non-HTTPS or loopback URLs, path traversal sequences and header
    /// values containing control characters.
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Gateway response signature did not verify.
    ///
    /// The response arrived with a success status but was not signed by the
    /// private counterpart of the configured public key, or was tampered with.
    /// The response is discarded and never converted into a token.
    ///
    /// # Examples
    ///
    /// ```
    /// use card_tokenizer::error::TokenizerError;
    ///
    /// let err = TokenizerError::SecurityError("request not secure".to_owned());
    /// assert!(err.is_security());
    /// assert!(!err.is_transport());
    /// ```
    #[error("Request not secure: {0}")]
    SecurityError(String),

    /// Low-level cryptographic operation failed.
    ///
    /// Covers cipher setup, key wrapping and ciphertext decoding failures.
    #[error("Cryptographic operation failed: {0}")]
    CryptoError(String),

    /// Gateway response body could not be interpreted.
    ///
    /// Malformed JSON, missing fields or an expiration date that does not split into
    /// two numeric groups.
    #[error("Invalid gateway response: {0}")]
    InvalidResponse(String),

    /// Caller-supplied input was rejected.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl TokenizerError {
    /// Returns `true` if the gateway rejected or never received the call.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::RequestFailed { .. } | Self::HttpError(_) | Self::TransportError(_))
    }

    /// Returns `true` if the response could not be trusted.
    #[must_use]
    pub const fn is_security(&self) -> bool {
        matches!(self, Self::SecurityError(_))
    }
}
