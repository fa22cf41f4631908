//! card-tokenizer: command-line front end for the card tokenization client
//!
//! Reads a TOML gateway configuration, runs one operation and prints its JSON
//! result on stdout. Logs go to stderr.
//!
//! ## Usage
//!
//! ```bash
//! card-tokenizer --config gateway.toml check
//! card-tokenizer --config gateway.toml create --number 4242424242424242 --cvc 123 \
//!     --name "Jane Doe" --month 9 --year 28
//! card-tokenizer --config gateway.toml update --token tok_123 --number ...
//! card-tokenizer --config gateway.toml delete --token tok_123 --request-id req-1
//! ```

mod observability;

use std::{path::PathBuf, process::ExitCode};

use card_tokenizer::{
    CardTokenizer, GatewayConfig, TokenizerError,
    models::{CardInput, RequestOptions},
};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tracing::error;

use crate::observability::{LogFormat, init_observability};

#[derive(Debug, Parser)]
#[command(name = "card-tokenizer")]
#[command(about = "Tokenize, update and delete cards on the Greenpay gateway", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the gateway TOML configuration
    #[arg(short, long, value_name = "PATH", default_value = "gateway.toml")]
    config: PathBuf,

    /// Enable debug logging for the tokenizer
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate the configuration and parse the gateway public key
    Check,

    /// Tokenize a new card
    Create {
        #[command(flatten)]
        card: CardArgs,

        /// Correlation id (UUID v4 when omitted)
        #[arg(long)]
        request_id: Option<String>,
    },

    /// Replace the card behind an existing token
    Update {
        /// Token to update
        #[arg(long)]
        token: String,

        #[command(flatten)]
        card: CardArgs,

        /// Correlation id (UUID v4 when omitted)
        #[arg(long)]
        request_id: Option<String>,
    },

    /// Delete a card token
    Delete {
        /// Token to delete
        #[arg(long)]
        token: String,

        /// Correlation id (UUID v4 when omitted)
        #[arg(long)]
        request_id: Option<String>,
    },
}

#[derive(Debug, Args)]
struct CardArgs {
    /// Card number
    #[arg(long)]
    number: String,

    /// Card verification code
    #[arg(long)]
    cvc: String,

    /// Card holder name
    #[arg(long)]
    name: String,

    /// Card nickname
    #[arg(long)]
    nick: Option<String>,

    /// Expiration month
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    month: u32,

    /// Expiration year
    #[arg(long)]
    year: u32,
}

impl From<CardArgs> for CardInput {
    fn from(args: CardArgs) -> Self {
        Self {
            number: args.number,
            cvc: args.cvc,
            name: args.name,
            nick: args.nick,
            month: args.month,
            year: args.year,
        }
    }
}

fn options(request_id: Option<String>) -> RequestOptions {
    RequestOptions { request_id }
}

async fn run(cli: Cli) -> card_tokenizer::Result<serde_json::Value> {
    let config = GatewayConfig::from_file(&cli.config)?;
    let tokenizer = CardTokenizer::new(config)?;

    let output = match cli.command {
        Commands::Check => json!({
            "merchant": tokenizer.config().merchant,
            "merchantUrl": tokenizer.config().merchant_url,
            "checkoutUrl": tokenizer.config().checkout_url,
        }),
        Commands::Create { card, request_id } => {
            let card = CardInput::from(card);
            to_json(&tokenizer.create(&card, options(request_id)).await?)?
        }
        Commands::Update { token, card, request_id } => {
            let card = CardInput::from(card);
            to_json(&tokenizer.update(&token, &card, options(request_id)).await?)?
        }
        Commands::Delete { token, request_id } => {
            to_json(&tokenizer.delete(&token, options(request_id)).await?)?
        }
    };

    Ok(output)
}

fn to_json<T: serde::Serialize>(value: &T) -> card_tokenizer::Result<serde_json::Value> {
    serde_json::to_value(value)
        .map_err(|e| TokenizerError::InvalidResponse(format!("cannot render result: {e}")))
}

/// Process exit code for an error category.
const fn exit_code(error: &TokenizerError) -> u8 {
    match error {
        TokenizerError::ConfigurationError(_) => 2,
        TokenizerError::SecurityError(_) => 3,
        e if e.is_transport() => 4,
        _ => 1,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_observability(LogFormat::from_env(), cli.verbose);

    match run(cli).await {
        Ok(output) => {
            println!("{output:#}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::from(exit_code(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_create() {
        let cli = Cli::try_parse_from([
            "card-tokenizer",
            "--config",
            "sandbox.toml",
            "create",
            "--number",
            "4242424242424242",
            "--cvc",
            "123",
            "--name",
            "Jane Doe",
            "--month",
            "9",
            "--year",
            "28",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("sandbox.toml"));
        let Commands::Create { card, request_id } = cli.command else {
            panic!("expected create");
        };
        assert!(request_id.is_none());

        let card = CardInput::from(card);
        assert_eq!(card.month, 9);
        assert!(card.nick.is_none());
    }

    #[test]
    fn test_parse_rejects_bad_month() {
        let result = Cli::try_parse_from([
            "card-tokenizer",
            "create",
            "--number",
            "4242424242424242",
            "--cvc",
            "123",
            "--name",
            "Jane Doe",
            "--month",
            "13",
            "--year",
            "28",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_delete_with_request_id() {
        let cli = Cli::try_parse_from([
            "card-tokenizer",
            "delete",
            "--token",
            "tok_123",
            "--request-id",
            "req-1",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("gateway.toml"));
        let Commands::Delete { token, request_id } = cli.command else {
            panic!("expected delete");
        };
        assert_eq!(token, "tok_123");
        assert_eq!(request_id.as_deref(), Some("req-1"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&TokenizerError::ConfigurationError("x".into())), 2);
        assert_eq!(exit_code(&TokenizerError::SecurityError("x".into())), 3);
        assert_eq!(
            exit_code(&TokenizerError::RequestFailed { endpoint: "/tokenize".into(), status: 500 }),
            4
        );
        assert_eq!(exit_code(&TokenizerError::InvalidInput("x".into())), 1);
    }

    #[tokio::test]
    async fn test_run_missing_config() {
        let cli = Cli::try_parse_from(["card-tokenizer", "--config", "/nonexistent.toml", "check"])
            .unwrap();
        let err = run(cli).await.unwrap_err();
        assert_eq!(exit_code(&err), 2);
    }
}
