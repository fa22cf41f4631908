//! Transport abstraction for gateway calls.
//!
//! The tokenization core only ever needs one capability from the network: POST a
//! JSON body to a URL and read back the status and body. This module defines that
//! capability as the [`Transport`] trait so it can be injected; timeouts, pooling
//! and TLS are the transport's business, not the core's.
//!
//! # Examples
//!
//! ```rust,no_run
//! use card_tokenizer::transport::{HttpTransport, RequestContext, Transport};
//!
//! # async fn example() -> card_tokenizer::error::Result<()> {
//! let transport = HttpTransport::new()?;
//!
//! let ctx = RequestContext {
//!     base_url: "https://sandbox-merchant.greenpay.me",
//!     path: "/deleteToken",
//!     headers: vec![],
//! };
//!
//! let response = transport.post(ctx, b"{\"token\":\"tok_123\"}").await?;
//! println!("Status: {}", response.status);
//! # Ok(())
//! # }
//! ```

#[allow(
    redundant_imports,
    reason = "Future needed for RPITIT despite being in Edition 2024 prelude"
)]
use std::future::Future;

use serde::de::DeserializeOwned;
use url::{Host, Url};

use crate::error::{Result, TokenizerError};

pub mod config;
pub mod http;

pub use config::{HttpConfig, HttpVersion};
pub use http::HttpTransport;

/// Returns `true` if `url` points at `localhost` or a loopback address.
///
/// Shared by configuration validation and [`HttpTransport`] so both reject the
/// same hosts.
pub(crate) fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(addr)) => addr.is_loopback(),
        Some(Host::Ipv6(addr)) => addr.is_loopback(),
        None => false,
    }
}

/// Request context for transport operations.
#[derive(Debug, Clone)]
pub struct RequestContext<'a> {
    /// Gateway base URL (e.g., <https://sandbox-checkout.greenpay.me>).
    pub base_url: &'a str,
    /// Request path (e.g., "/tokenize").
    pub path: &'a str,
    /// Additional HTTP headers to include.
    pub headers: Vec<(&'a str, &'a str)>,
}

/// Response from transport operations.
///
/// Non-success statuses are returned as-is; deciding whether a status is
/// acceptable belongs to the protocol layer.
#[derive(Debug)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body bytes.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Deserializes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::InvalidResponse`] if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| TokenizerError::InvalidResponse(format!("malformed JSON body: {e}")))
    }
}

/// HTTP POST capability consumed by the tokenization core.
///
/// Implementations must send `body` as `application/json` to
/// `ctx.base_url + ctx.path` with the extra `ctx.headers`, and return the
/// response status and body without interpreting them.
///
/// # Examples
///
/// A scripted transport for tests:
///
/// ```
/// use card_tokenizer::{
///     error::Result,
///     transport::{RequestContext, Transport, TransportResponse},
/// };
///
/// #[derive(Debug)]
/// struct AlwaysOk;
///
/// impl Transport for AlwaysOk {
///     async fn post<'a>(&'a self, _ctx: RequestContext<'a>, _body: &'a [u8]) -> Result<TransportResponse> {
///         Ok(TransportResponse { status: 200, body: b"{}".to_vec() })
///     }
///
///     fn protocol_name(&self) -> &'static str {
///         "scripted"
///     }
/// }
/// ```
pub trait Transport: Send + Sync {
    /// Executes a POST request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns error if the request cannot be sent or the response cannot be read.
    fn post<'a>(
        &'a self,
        ctx: RequestContext<'a>,
        body: &'a [u8],
    ) -> impl Future<Output = Result<TransportResponse>> + Send + 'a;

    /// Returns the protocol name for logging.
    ///
    /// Examples: "http/1.1", "http/2"
    fn protocol_name(&self) -> &'static str;
}
