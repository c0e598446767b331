//! Atelier CLI - operator tools for the storefront integrations.
//!
//! # Usage
//!
//! ```bash
//! # Check that the environment forms a bootable configuration
//! atelier config check
//!
//! # Dry-run variant resolution for a cart file
//! atelier resolve cart.json --country AE
//!
//! # Verify a card payment by its checkout ID
//! atelier payment status 8ac7a4a28f1b2c3d.uat01-vm-tx04
//! ```
//!
//! # Commands
//!
//! - `config check` - Validate configuration and list integrations
//! - `resolve` - Resolve cart lines to Shopify variants without creating a cart
//! - `payment status` - Verify a `HyperPay` payment

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;

use atelier_core::PaymentStatus;
use atelier_storefront::config::StorefrontConfig;
use clap::{Parser, Subcommand};
use serde::Serialize;

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "atelier")]
#[command(author, version, about = "Atelier storefront operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Resolve a cart file against the live catalog
    Resolve {
        /// JSON file with `{"items": [...]}` or a bare item array
        path: PathBuf,

        /// Shopper country (ISO 3166-1 alpha-2) for localized lookups
        #[arg(short, long)]
        country: Option<String>,
    },
    /// Card payment lookups
    Payment {
        #[command(subcommand)]
        action: PaymentAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate configuration and list configured integrations
    Check,
}

#[derive(Subcommand)]
enum PaymentAction {
    /// Verify a payment by checkout ID
    Status {
        /// Checkout ID returned when the widget session was created
        id: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atelier_cli=info,atelier_storefront=warn".into()),
        )
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, CliError> {
    match cli.command {
        Commands::Config {
            action: ConfigAction::Check,
        } => {
            let summary = commands::config::check()?;
            emit_text(&commands::config::render(&summary));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Resolve { path, country } => {
            let resolution = commands::resolve::run(&path, country.as_deref()).await?;
            emit_json(&resolution)?;
            Ok(if resolution.unmatched.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            })
        }
        Commands::Payment {
            action: PaymentAction::Status { id },
        } => {
            let config = StorefrontConfig::from_env()?;
            let result = commands::payment::status(config, &id).await?;
            emit_json(&result)?;
            Ok(if result.status == PaymentStatus::Success {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            })
        }
    }
}

#[allow(clippy::print_stdout)]
fn emit_text(text: &str) {
    println!("{text}");
}

fn emit_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    emit_text(&serde_json::to_string_pretty(value)?);
    Ok(())
}
