//! Gateway configuration.
//!
//! This module defines the TOML-deserializable configuration of a
//! [`CardTokenizer`](crate::CardTokenizer). The configuration is read once at
//! construction and never mutated afterwards.
//!
//! # Examples
//!
//! ```toml
//! merchant = "MERCHANT-XXXXX"
//! secret = "SECRET-XXXXX"
//! public_key = "MIGeMA0GCSqGSIb3DQEBAQUAA4GMADCBiAKBgGxr..."
//!
//! # optional, sandbox hosts by default
//! merchant_url = "https://merchant.greenpay.me"
//! checkout_url = "https://checkout.greenpay.me"
//!
//! [http]
//! timeout_secs = 20
//! ```

use std::path::Path;

use serde::Deserialize;
use url::Url;

use crate::{
    error::{Result, TokenizerError},
    transport::{HttpConfig, is_loopback},
};

/// Sandbox merchant backend.
pub const SANDBOX_MERCHANT_URL: &str = "https://sandbox-merchant.greenpay.me";

/// Sandbox checkout backend.
pub const SANDBOX_CHECKOUT_URL: &str = "https://sandbox-checkout.greenpay.me";

/// Gateway endpoints and merchant credentials.
///
/// `Debug` output redacts the secret.
#[derive(Clone, Deserialize)]
pub struct GatewayConfig {
    /// Merchant backend base URL (phase 1 and token deletion).
    #[serde(default = "default_merchant_url")]
    pub merchant_url: String,

    /// Checkout backend base URL (phase 2).
    #[serde(default = "default_checkout_url")]
    pub checkout_url: String,

    /// Gateway RSA public key, PEM body without header and footer.
    pub public_key: String,

    /// Merchant identifier.
    pub merchant: String,

    /// Merchant secret.
    pub secret: String,

    /// HTTP transport settings.
    #[serde(default)]
    pub http: HttpConfig,
}

impl GatewayConfig {
    /// Creates a sandbox configuration for the given credentials.
    #[must_use]
    pub fn sandbox(
        merchant: impl Into<String>,
        secret: impl Into<String>,
        public_key: impl Into<String>,
    ) -> Self {
        Self {
            merchant_url: default_merchant_url(),
            checkout_url: default_checkout_url(),
            public_key: public_key.into(),
            merchant: merchant.into(),
            secret: secret.into(),
            http: HttpConfig::default(),
        }
    }

    /// Parses and validates a TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::ConfigurationError`] if the TOML is malformed or
    /// validation fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use card_tokenizer::config::{GatewayConfig, SANDBOX_CHECKOUT_URL};
    ///
    /// let config = GatewayConfig::from_toml(
    ///     r#"
    ///         merchant = "MERCHANT-XXXXX"
    ///         secret = "SECRET-XXXXX"
    ///         public_key = "MIGeMA0GCSqGSIb3DQEBAQUAA4GMADCBiAKBgGxr"
    ///     "#,
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(config.checkout_url, SANDBOX_CHECKOUT_URL);
    /// ```
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| {
            TokenizerError::ConfigurationError(format!("invalid TOML config: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::ConfigurationError`] if the file cannot be read or
    /// its content is invalid.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            TokenizerError::ConfigurationError(format!(
                "cannot read config file {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Validates required fields and gateway URLs.
    ///
    /// This method checks for:
    /// - Non-empty `secret`, `merchant` and `public_key`
    /// - HTTPS, non-loopback `merchant_url` and `checkout_url`
    /// - HTTP timeout bounds
    ///
    /// Parsing the public key itself happens in
    /// [`CardTokenizer::new`](crate::CardTokenizer::new).
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::ConfigurationError`] naming the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.secret.trim().is_empty() {
            return Err(TokenizerError::ConfigurationError("Secret is missing".to_owned()));
        }
        if self.merchant.trim().is_empty() {
            return Err(TokenizerError::ConfigurationError("Merchant is missing".to_owned()));
        }
        if self.public_key.trim().is_empty() {
            return Err(TokenizerError::ConfigurationError("Public key is missing".to_owned()));
        }

        validate_base_url("merchant_url", &self.merchant_url)?;
        validate_base_url("checkout_url", &self.checkout_url)?;
        self.http.validate()
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("merchant_url", &self.merchant_url)
            .field("checkout_url", &self.checkout_url)
            .field("merchant", &self.merchant)
            .field("secret", &"[REDACTED]")
            .field("http", &self.http)
            .finish_non_exhaustive()
    }
}

fn validate_base_url(name: &str, value: &str) -> Result<()> {
    let url = Url::parse(value).map_err(|e| {
        TokenizerError::ConfigurationError(format!("invalid {name} '{value}': {e}"))
    })?;

    if url.scheme() != "https" {
        return Err(TokenizerError::ConfigurationError(format!(
            "{name} must use HTTPS, got: {}",
            url.scheme()
        )));
    }

    if is_loopback(&url) {
        return Err(TokenizerError::ConfigurationError(format!(
            "{name} must not be localhost or loopback: {}",
            url.host_str().unwrap_or_default()
        )));
    }

    Ok(())
}

fn default_merchant_url() -> String {
    SANDBOX_MERCHANT_URL.to_owned()
}

fn default_checkout_url() -> String {
    SANDBOX_CHECKOUT_URL.to_owned()
}
