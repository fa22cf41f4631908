//! Card tokenization service.
//!
//! [`CardTokenizer`] ties the protocol together: it resolves the request id,
//! runs the two-phase [order exchange](crate::order), verifies the checkout
//! signature and normalizes the verified response.
//!
//! ```text
//! create/update -> OrderClient::create_order -> PendingOrder::sign
//!               -> SignatureVerifier::verify_response -> normalize -> TokenizedCard
//! delete        -> POST {merchant_url}/deleteToken -> DeletedToken
//! ```

use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    config::GatewayConfig,
    crypto::{GatewayPublicKey, Packer, SignatureVerifier},
    error::Result,
    models::{CardInput, CardPayload, DeleteRequest, DeletedToken, RequestOptions, TokenizedCard},
    normalize::normalize,
    order::{OrderClient, TokenizeMode, post_json},
    transport::{HttpTransport, Transport},
};

/// Token deletion endpoint on the merchant backend.
pub const DELETE_TOKEN_PATH: &str = "/deleteToken";

/// Tokenizes, updates and deletes cards against the gateway.
///
/// The service is immutable after construction: every operation takes `&self`,
/// owns its request id and key material, and can run concurrently with others.
///
/// # Examples
///
/// ```no_run
/// use card_tokenizer::{
///     CardTokenizer, GatewayConfig,
///     models::{CardInput, RequestOptions},
/// };
///
/// # async fn example() -> card_tokenizer::error::Result<()> {
/// let config = GatewayConfig::from_file("gateway.toml")?;
/// let tokenizer = CardTokenizer::new(config)?;
///
/// let card = CardInput {
///     number: "4242424242424242".to_owned(),
///     cvc: "123".to_owned(),
///     name: "Jane Doe".to_owned(),
///     nick: None,
///     month: 9,
///     year: 28,
/// };
///
/// let token = tokenizer.create(&card, RequestOptions::default()).await?;
/// println!("token {} for card ending in {}", token.token, token.last4);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CardTokenizer<T = HttpTransport> {
    config: GatewayConfig,
    packer: Packer,
    verifier: SignatureVerifier,
    transport: T,
}

impl CardTokenizer<HttpTransport> {
    /// Creates a tokenizer that talks to the gateway over HTTPS.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::ConfigurationError`](crate::error::TokenizerError::ConfigurationError)
    /// if the configuration is incomplete or the public key cannot be parsed, and
    /// [`TokenizerError::HttpError`](crate::error::TokenizerError::HttpError) if the
    /// HTTP client cannot be built.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let transport = HttpTransport::with_config(&config.http)?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> CardTokenizer<T> {
    /// Creates a tokenizer over a caller-supplied transport.
    ///
    /// The public key is parsed here, so an invalid key fails construction rather
    /// than the first call.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::ConfigurationError`](crate::error::TokenizerError::ConfigurationError)
    /// if the configuration is incomplete or the public key cannot be parsed.
    pub fn with_transport(config: GatewayConfig, transport: T) -> Result<Self> {
        config.validate()?;
        let public_key = GatewayPublicKey::from_pem_body(&config.public_key)?;

        info!(
            merchant = %config.merchant,
            key_bits = public_key.bits(),
            protocol = transport.protocol_name(),
            "card tokenizer ready"
        );

        Ok(Self {
            packer: Packer::new(public_key.clone()),
            verifier: SignatureVerifier::new(public_key),
            config,
            transport,
        })
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Returns the underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Tokenizes `card`, or replaces the card behind `existing_token`.
    ///
    /// # Errors
    ///
    /// - Transport errors ([`TokenizerError::is_transport`](crate::error::TokenizerError::is_transport))
    ///   if either backend rejects the call or cannot be reached
    /// - [`TokenizerError::SecurityError`](crate::error::TokenizerError::SecurityError) if the
    ///   checkout response signature does not verify
    /// - [`TokenizerError::InvalidResponse`](crate::error::TokenizerError::InvalidResponse) if
    ///   the verified response cannot be normalized
    #[instrument(skip(self, card, existing_token), fields(update = existing_token.is_some()))]
    pub async fn tokenize(
        &self,
        card: &CardInput,
        existing_token: Option<&str>,
        options: RequestOptions,
    ) -> Result<TokenizedCard> {
        let payload = CardPayload::new(card, existing_token);
        let request_id = resolve_request_id(options);

        let signed = OrderClient::new(&self.transport, &self.config, &self.packer)
            .create_order(request_id, TokenizeMode::of(&payload))
            .await?
            .sign(&payload)
            .await?;

        let (response, request_id) = signed.into_parts();
        let verified = self.verifier.verify_response(response, &request_id)?;
        let tokenized = normalize(verified, &request_id)?;

        info!(request_id = %request_id, "card tokenized");
        Ok(tokenized)
    }

    /// Tokenizes a new card.
    ///
    /// # Errors
    ///
    /// See [`tokenize`](Self::tokenize).
    pub async fn create(&self, card: &CardInput, options: RequestOptions) -> Result<TokenizedCard> {
        self.tokenize(card, None, options).await
    }

    /// Replaces the card behind `token`.
    ///
    /// # Errors
    ///
    /// See [`tokenize`](Self::tokenize).
    pub async fn update(
        &self,
        token: &str,
        card: &CardInput,
        options: RequestOptions,
    ) -> Result<TokenizedCard> {
        self.tokenize(card, Some(token), options).await
    }

    /// Deletes `token` on the merchant backend.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the merchant backend does not answer `200` or
    /// cannot be reached.
    #[instrument(skip(self, token))]
    pub async fn delete(&self, token: &str, options: RequestOptions) -> Result<DeletedToken> {
        let request_id = resolve_request_id(options);
        let body = DeleteRequest {
            token,
            secret: &self.config.secret,
            request_id: &request_id,
            merchant_id: &self.config.merchant,
        };

        post_json(&self.transport, &self.config.merchant_url, DELETE_TOKEN_PATH, &[], &body)
            .await?;

        info!(request_id = %request_id, "card token deleted");
        Ok(DeletedToken { token: token.to_owned(), request_id })
    }
}

fn resolve_request_id(options: RequestOptions) -> String {
    options.request_id.unwrap_or_else(|| Uuid::new_v4().to_string())
}
