//! Card Tokenizer: client-side card tokenization for the Greenpay gateway
//!
//! A Rust library that turns raw card details into an opaque gateway token
//! without the card ever leaving the process in clear text.
//!
//! # How It Works
//!
//! - **Hybrid encryption**: the card document is encrypted with AES-128-CTR under
//!   ephemeral key material; the key material is wrapped with the gateway's RSA key
//! - **Two-phase exchange**: an order is registered with the merchant backend, then
//!   the encrypted card is submitted to the checkout backend
//! - **Signed responses**: the checkout answer is accepted only if its RSA-SHA256
//!   signature verifies against the gateway key
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  CardInput
//! │    Caller    │──────────────┐
//! └──────▲───────┘              │
//!        │ TokenizedCard        │
//! ┌──────┴──────────────────────▼─────────────────────┐
//! │              CardTokenizer (this crate)           │
//! │  ┌───────────┐   ┌─────────────┐   ┌───────────┐  │
//! │  │  Packer   │──▶│ OrderClient │──▶│ Verifier  │  │
//! │  │ (AES+RSA) │   │ (2 phases)  │   │ (SHA256)  │  │
//! │  └───────────┘   └──────┬──────┘   └───────────┘  │
//! └─────────────────────────┼─────────────────────────┘
//!                           │ HTTPS (Transport)
//!              ┌────────────┴────────────┐
//!      ┌───────▼────────┐       ┌────────▼───────┐
//!      │ merchant host  │       │ checkout host  │
//!      │ /tokenize      │       │ /tokenize      │
//!      │ /deleteToken   │       │ (liszt-token)  │
//!      └────────────────┘       └────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use card_tokenizer::{
//!     CardTokenizer, GatewayConfig,
//!     models::{CardInput, RequestOptions},
//! };
//!
//! # async fn example() -> card_tokenizer::Result<()> {
//! let config = GatewayConfig::sandbox("MERCHANT-XXXXX", "SECRET-XXXXX", "MIGeMA0GCSqGSIb3...");
//! let tokenizer = CardTokenizer::new(config)?;
//!
//! let card = CardInput {
//!     number: "4242424242424242".to_owned(),
//!     cvc: "123".to_owned(),
//!     name: "Jane Doe".to_owned(),
//!     nick: Some("daily".to_owned()),
//!     month: 9,
//!     year: 28,
//! };
//!
//! let created = tokenizer.create(&card, RequestOptions::default()).await?;
//! let updated = tokenizer.update(&created.token, &card, RequestOptions::default()).await?;
//! let deleted = tokenizer.delete(&updated.token, RequestOptions::with_request_id("req-42")).await?;
//!
//! assert_eq!(deleted.request_id, "req-42");
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`client`]: the [`CardTokenizer`] service
//! - [`order`]: two-phase order exchange as a typestate chain
//! - [`crypto`]: key material, packing and signature verification
//! - [`normalize`]: verified response to [`TokenizedCard`](models::TokenizedCard)
//! - [`models`]: wire and public data types
//! - [`config`]: TOML gateway configuration
//! - [`transport`]: injectable HTTP POST capability
//! - [`error`]: error types with recovery guidance
//!
//! # Security Considerations
//!
//! - Card numbers and CVCs are masked in `Debug` output and never logged
//! - Key material is zeroized on drop and used for exactly one payload
//! - Gateway URLs must be HTTPS and not loopback
//! - An invalid gateway public key fails construction, not the first call
//! - A response with a bad signature is dropped; it never becomes a token
//!
//! # Error Handling
//!
//! All operations return [`Result<T>`](error::Result). Transport failures and
//! security failures are distinct:
//!
//! ```rust,no_run
//! use card_tokenizer::{CardTokenizer, TokenizerError, models::RequestOptions};
//!
//! # async fn example(tokenizer: CardTokenizer) {
//! match tokenizer.delete("tok_123", RequestOptions::default()).await {
//!     Ok(deleted) => println!("deleted {}", deleted.token),
//!     Err(e) if e.is_transport() => eprintln!("gateway unavailable: {e}"),
//!     Err(TokenizerError::SecurityError(msg)) => eprintln!("untrusted response: {msg}"),
//!     Err(e) => eprintln!("other error: {e}"),
//! }
//! # }
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![allow(
    clippy::multiple_crate_versions,
    reason = "transitive dependencies from reqwest and openssl"
)]

pub mod client;
pub mod config;
pub mod crypto;
pub mod error;
pub mod models;
pub mod normalize;
pub mod order;
pub mod transport;

pub use client::CardTokenizer;
pub use config::GatewayConfig;
pub use error::{Result, TokenizerError};
