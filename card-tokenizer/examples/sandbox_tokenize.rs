//! Sandbox round trip: create, update and delete a card token.
//!
//! # Running this example
//!
//! ```bash
//! export GREENPAY_MERCHANT=<merchant id>
//! export GREENPAY_SECRET=<merchant secret>
//! export GREENPAY_PUBLIC_KEY=<PEM body of the gateway key>
//! cargo run --example sandbox_tokenize
//! ```

#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    reason = "examples are allowed to use println"
)]

use std::env;

use card_tokenizer::{
    CardTokenizer, GatewayConfig, TokenizerError,
    models::{CardInput, RequestOptions},
};

fn load_config() -> Result<GatewayConfig, Box<dyn std::error::Error>> {
    let var = |name: &str| {
        env::var(name).map_err(|_| format!("{name} environment variable not set"))
    };
    Ok(GatewayConfig::sandbox(
        var("GREENPAY_MERCHANT")?,
        var("GREENPAY_SECRET")?,
        var("GREENPAY_PUBLIC_KEY")?,
    ))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Card Tokenizer: Sandbox Example\n");

    let tokenizer = CardTokenizer::new(load_config()?)?;

    let card = CardInput {
        number: "4242424242424242".to_owned(),
        cvc: "123".to_owned(),
        name: "Jane Doe".to_owned(),
        nick: Some("sandbox".to_owned()),
        month: 9,
        year: 28,
    };

    let created = match tokenizer.create(&card, RequestOptions::default()).await {
        Ok(created) => created,
        Err(e @ TokenizerError::SecurityError(_)) => {
            eprintln!("Response signature did not verify, check GREENPAY_PUBLIC_KEY");
            return Err(e.into());
        }
        Err(e) if e.is_transport() => {
            eprintln!("Gateway rejected or did not receive the call, safe to retry");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };
    println!("Created: {}", serde_json::to_string_pretty(&created)?);

    let card = CardInput { nick: Some("sandbox-updated".to_owned()), ..card };
    let updated = tokenizer.update(&created.token, &card, RequestOptions::default()).await?;
    println!("Updated: {}", serde_json::to_string_pretty(&updated)?);

    let deleted = tokenizer.delete(&updated.token, RequestOptions::default()).await?;
    println!("Deleted {} (request {})", deleted.token, deleted.request_id);

    Ok(())
}
