//! Two-phase order exchange with the gateway.
//!
//! Tokenizing a card takes two round trips:
//!
//! 1. **Order**: the merchant backend receives `{secret, merchantId, requestId}` and
//!    answers with an [`OrderSecurity`] (`token` + `session`).
//! 2. **Sign**: the checkout backend receives the packed card `{session, ld, lk}`
//!    authenticated by the `liszt-token` header and answers with a signed
//!    [`GatewayResponse`].
//!
//! The phases are modelled as a typestate chain so phase 2 cannot run without
//! the credentials of phase 1:
//!
//! ```text
//! OrderClient --create_order--> PendingOrder --sign--> SignedOrder
//! ```
//!
//! Any status other than `200` ends the chain with
//! [`TokenizerError::RequestFailed`]. Nothing is retried or rolled back.

use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::{
    config::GatewayConfig,
    crypto::Packer,
    error::{Result, TokenizerError},
    models::{CardPayload, GatewayResponse, OrderRequest, OrderSecurity},
    transport::{RequestContext, Transport, TransportResponse},
};

/// Header carrying the phase-1 token on the checkout call.
pub const ORDER_TOKEN_HEADER: &str = "liszt-token";

/// Whether the exchange creates a new token or replaces the card behind one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenizeMode {
    /// Tokenize a new card.
    Create,
    /// Update the card behind an existing token.
    Update,
}

impl TokenizeMode {
    /// Endpoint path used on both backends.
    ///
    /// # Examples
    ///
    /// ```
    /// use card_tokenizer::order::TokenizeMode;
    ///
    /// assert_eq!(TokenizeMode::Create.path(), "/tokenize");
    /// assert_eq!(TokenizeMode::Update.path(), "/tokenize/update");
    /// ```
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Create => "/tokenize",
            Self::Update => "/tokenize/update",
        }
    }

    /// Mode implied by a card payload.
    #[must_use]
    pub const fn of(card: &CardPayload<'_>) -> Self {
        if card.is_update() { Self::Update } else { Self::Create }
    }
}

/// Entry state of the exchange, borrowing the tokenizer's collaborators.
#[derive(Debug)]
pub struct OrderClient<'a, T> {
    transport: &'a T,
    config: &'a GatewayConfig,
    packer: &'a Packer,
}

impl<T> Clone for OrderClient<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for OrderClient<'_, T> {}

impl<'a, T: Transport> OrderClient<'a, T> {
    /// Creates a client over the given transport and configuration.
    #[must_use]
    pub const fn new(transport: &'a T, config: &'a GatewayConfig, packer: &'a Packer) -> Self {
        Self { transport, config, packer }
    }

    /// Phase 1: registers an order with the merchant backend.
    ///
    /// # Errors
    ///
    /// - [`TokenizerError::RequestFailed`] if the merchant backend does not answer `200`
    /// - [`TokenizerError::HttpError`] or [`TokenizerError::TransportError`] if the call
    ///   cannot be made
    /// - [`TokenizerError::InvalidResponse`] if the body lacks `token` or `session`
    #[instrument(skip(self), fields(path = mode.path()))]
    pub async fn create_order(
        self,
        request_id: String,
        mode: TokenizeMode,
    ) -> Result<PendingOrder<'a, T>> {
        let body = OrderRequest {
            secret: &self.config.secret,
            merchant_id: &self.config.merchant,
            request_id: &request_id,
        };

        let response =
            post_json(self.transport, &self.config.merchant_url, mode.path(), &[], &body).await?;
        let security: OrderSecurity = response.json()?;

        debug!(request_id = %request_id, "card order created");
        Ok(PendingOrder { client: self, mode, request_id, security })
    }
}

/// State after phase 1: the order is open and holds its credentials.
#[derive(Debug)]
pub struct PendingOrder<'a, T> {
    client: OrderClient<'a, T>,
    mode: TokenizeMode,
    request_id: String,
    security: OrderSecurity,
}

impl<T: Transport> PendingOrder<'_, T> {
    /// Credentials returned by the merchant backend.
    #[must_use]
    pub const fn security(&self) -> &OrderSecurity {
        &self.security
    }

    /// Correlation id of the exchange.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Phase 2: packs `card` under fresh key material and submits it to the
    /// checkout backend.
    ///
    /// # Errors
    ///
    /// - [`TokenizerError::InvalidInput`] if the card payload does not match the
    ///   order's mode (an update payload on a create order or vice versa)
    /// - [`TokenizerError::RequestFailed`] if the checkout backend does not answer `200`
    /// - [`TokenizerError::CryptoError`] if packing fails
    /// - [`TokenizerError::InvalidResponse`] if the body is not JSON
    #[instrument(skip_all, fields(request_id = %self.request_id, path = self.mode.path()))]
    pub async fn sign(self, card: &CardPayload<'_>) -> Result<SignedOrder> {
        if TokenizeMode::of(card) != self.mode {
            return Err(TokenizerError::InvalidInput(format!(
                "card payload does not match {:?} order",
                self.mode
            )));
        }

        let OrderClient { transport, config, packer } = self.client;
        let payload = packer.pack(card, &self.security.session, None)?;
        let headers = [(ORDER_TOKEN_HEADER, self.security.token.as_str())];

        let response =
            post_json(transport, &config.checkout_url, self.mode.path(), &headers, &payload)
                .await?;
        let response: GatewayResponse = response.json()?;

        debug!("card order signed");
        Ok(SignedOrder { response, request_id: self.request_id })
    }
}

/// Final state: the checkout backend answered. The response is not yet trusted.
#[derive(Debug)]
pub struct SignedOrder {
    response: GatewayResponse,
    request_id: String,
}

impl SignedOrder {
    /// Raw, unverified checkout response.
    #[must_use]
    pub const fn response(&self) -> &GatewayResponse {
        &self.response
    }

    /// Correlation id of the exchange.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Splits into the raw response and the request id.
    #[must_use]
    pub fn into_parts(self) -> (GatewayResponse, String) {
        (self.response, self.request_id)
    }
}

/// Serializes `body`, posts it and requires a `200` answer.
pub(crate) async fn post_json<T: Transport, B: Serialize>(
    transport: &T,
    base_url: &str,
    path: &str,
    headers: &[(&str, &str)],
    body: &B,
) -> Result<TransportResponse> {
    let body = serde_json::to_vec(body)
        .map_err(|e| TokenizerError::InvalidInput(format!("request serialization failed: {e}")))?;
    let ctx = RequestContext { base_url, path, headers: headers.to_vec() };

    let response = transport.post(ctx, &body).await?;
    if response.status != 200 {
        warn!(
            path,
            status = response.status,
            protocol = transport.protocol_name(),
            "gateway rejected request"
        );
        return Err(TokenizerError::RequestFailed {
            endpoint: path.to_owned(),
            status: response.status,
        });
    }

    Ok(response)
}
