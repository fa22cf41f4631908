//! Data models for the tokenization exchange.
//!
//! Request bodies serialize to the exact JSON the merchant and checkout backends
//! expect (camelCase keys, `ld`/`lk` for the packed payload). Response types accept
//! the backend's mixed snake/camel casing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw card supplied by the caller.
///
/// `Debug` masks the number and CVC; card data must never reach the logs.
///
/// # Examples
///
/// ```
/// use card_tokenizer::models::CardInput;
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
/// let debug = format!("{card:?}");
/// assert!(!debug.contains("4242424242424242"));
/// assert!(debug.contains("4242"));
/// ```
///
/// The raw card has no serialized form; only the packed [`CardPayload`] leaves
/// the process.
///
/// ```compile_fail
/// use card_tokenizer::models::CardInput;
///
/// fn leak(card: &CardInput) -> String {
///     serde_json::to_string(card).unwrap()
/// }
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct CardInput {
    /// Primary account number.
    pub number: String,
    /// Card verification code.
    pub cvc: String,
    /// Card holder name.
    pub name: String,
    /// Optional nickname shown to the customer.
    pub nick: Option<String>,
    /// Expiration month.
    pub month: u32,
    /// Expiration year.
    pub year: u32,
}

impl std::fmt::Debug for CardInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let last4 = self.number.len().checked_sub(4).and_then(|start| self.number.get(start..));
        f.debug_struct("CardInput")
            .field("number", &format_args!("****{}", last4.unwrap_or("")))
            .field("cvc", &"***")
            .field("name", &self.name)
            .field("nick", &self.nick)
            .field("month", &self.month)
            .field("year", &self.year)
            .finish()
    }
}

/// Plaintext card document encrypted into [`PackedPayload::ld`].
///
/// Serializes to `{"card":{"cvc","nickname"?,"cardHolder","cardNumber",
/// "expirationDate":{"month","year"}},"token"?}`.
#[derive(Debug, Serialize)]
pub struct CardPayload<'a> {
    card: CardDetails<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CardDetails<'a> {
    cvc: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    nickname: Option<&'a str>,
    card_holder: &'a str,
    card_number: &'a str,
    expiration_date: ExpirationDate,
}

#[derive(Debug, Serialize)]
struct ExpirationDate {
    month: u32,
    year: u32,
}

impl<'a> CardPayload<'a> {
    /// Builds the wire document for `card`; `token` selects an update of an
    /// existing token.
    #[must_use]
    pub fn new(card: &'a CardInput, token: Option<&'a str>) -> Self {
        Self {
            card: CardDetails {
                cvc: &card.cvc,
                nickname: card.nick.as_deref(),
                card_holder: &card.name,
                card_number: &card.number,
                expiration_date: ExpirationDate { month: card.month, year: card.year },
            },
            token,
        }
    }

    /// Returns `true` if this payload updates an existing token.
    #[must_use]
    pub const fn is_update(&self) -> bool {
        self.token.is_some()
    }
}

/// Phase-1 request body sent to the merchant backend.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OrderRequest<'a> {
    pub secret: &'a str,
    pub merchant_id: &'a str,
    pub request_id: &'a str,
}

/// Token deletion request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeleteRequest<'a> {
    pub token: &'a str,
    pub secret: &'a str,
    pub request_id: &'a str,
    pub merchant_id: &'a str,
}

/// Order credentials returned by phase 1.
///
/// `token` authenticates phase 2; `session` binds both phases and is echoed back
/// inside the packed payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderSecurity {
    /// Phase-2 authentication token (`liszt-token` header).
    pub token: String,
    /// Session binding the two phases.
    pub session: String,
}

/// Encrypted card as placed on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedPayload {
    /// Session from phase 1.
    pub session: String,
    /// Hex-encoded AES-128-CTR ciphertext of the card document.
    pub ld: String,
    /// Base64 RSA PKCS#1 v1.5 ciphertext of the key material.
    pub lk: String,
}

/// Tokenized card details inside a checkout response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenResult {
    /// Opaque card token.
    pub token: String,
    /// Last four digits.
    pub last_digits: String,
    /// Bank identification number.
    pub bin: String,
}

/// Raw checkout response. Untrusted until its signature verifies.
///
/// Any JSON document is accepted here. Only `status` and `_signature` are read
/// before verification; the card fields are parsed into [`CheckoutResult`] once
/// the signature has been checked.
///
/// # Examples
///
/// ```
/// use card_tokenizer::models::GatewayResponse;
///
/// let response: GatewayResponse =
///     serde_json::from_str(r#"{"status":"SUCCESS","_signature":"ab","result":7}"#).unwrap();
///
/// assert_eq!(response.status_text(), "SUCCESS");
/// assert_eq!(response.signature(), "ab");
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct GatewayResponse {
    body: Value,
}

impl GatewayResponse {
    /// Wraps a raw JSON body.
    #[must_use]
    pub const fn new(body: Value) -> Self {
        Self { body }
    }

    /// Status rendered the way the gateway signs it: strings verbatim, other JSON
    /// values in their compact form, a missing status as the empty string.
    #[must_use]
    pub fn status_text(&self) -> String {
        match self.body.get("status") {
            Some(Value::String(s)) => s.clone(),
            None | Some(Value::Null) => String::new(),
            Some(other) => other.to_string(),
        }
    }

    /// Hex RSA-SHA256 signature over `status` and the request id, empty when
    /// absent or not a string.
    #[must_use]
    pub fn signature(&self) -> &str {
        self.body.get("_signature").and_then(Value::as_str).unwrap_or("")
    }

    /// Raw JSON body.
    #[must_use]
    pub const fn body(&self) -> &Value {
        &self.body
    }

    /// Consumes the response and returns the raw JSON body.
    #[must_use]
    pub fn into_body(self) -> Value {
        self.body
    }
}

/// Card fields of a checkout response, parsed after verification.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutResult {
    /// Token details.
    #[serde(default)]
    pub result: Option<TokenResult>,
    /// Four-character expiration string.
    #[serde(default)]
    pub expiration_date: Option<String>,
    /// Card holder name.
    #[serde(rename = "cardHolder", default)]
    pub card_holder: Option<String>,
    /// Card nickname.
    #[serde(default)]
    pub nickname: Option<String>,
    /// Card brand.
    #[serde(default)]
    pub brand: Option<String>,
}

/// Card token returned to callers. Carries no cryptographic material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenizedCard {
    /// Opaque card token.
    pub token: String,
    /// Last four digits.
    pub last4: String,
    /// Bank identification number.
    pub bin: String,
    /// First two characters of the expiration string.
    pub year: u32,
    /// Last two characters of the expiration string.
    pub month: u32,
    /// Card holder name.
    pub name: Option<String>,
    /// Card nickname.
    pub nick: Option<String>,
    /// Card brand.
    pub brand: Option<String>,
    /// Correlation id of the exchange.
    pub request_id: String,
}

/// Result of a token deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedToken {
    /// Deleted token.
    pub token: String,
    /// Correlation id of the call.
    pub request_id: String,
}

/// Per-call options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Correlation id; a UUID v4 is generated when absent.
    pub request_id: Option<String>,
}

impl RequestOptions {
    /// Uses `request_id` as the correlation id.
    #[must_use]
    pub fn with_request_id(request_id: impl Into<String>) -> Self {
        Self { request_id: Some(request_id.into()) }
    }
}
