//! Kirana CLI - Database migrations and catalogue seeding.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! kirana migrate
//!
//! # Load products into the catalogue
//! kirana seed --file seed/products.json
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "kirana")]
#[command(author, version, about = "Kirana CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Insert or update catalogue products from a JSON file
    Seed {
        /// JSON array of products
        #[arg(short, long, default_value = "seed/products.json")]
        file: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await,
        Commands::Seed { file } => commands::seed::products(&file).await,
    }
}
