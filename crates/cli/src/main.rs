//! Shop Assistant CLI - catalog sync and terminal chat.
//!
//! # Usage
//!
//! ```bash
//! # Fetch the catalog from Shopify into the cache file
//! shop-assistant-cli sync
//!
//! # Ask one question against the cached catalog
//! shop-assistant-cli ask "Show me snowboards"
//!
//! # Chat interactively (quit, exit or bye to leave)
//! shop-assistant-cli chat
//! ```
//!
//! # Commands
//!
//! - `sync` - Refresh the catalog cache from the Shopify Admin API
//! - `ask` - Answer a single question
//! - `chat` - Interactive chat session

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "shop-assistant-cli")]
#[command(author, version, about = "Shop Assistant CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the catalog from Shopify and write the cache file
    Sync,
    /// Answer one question against the cached catalog
    Ask {
        /// The question, e.g. "what's on sale?"
        #[arg(required = true)]
        question: Vec<String>,

        /// Use keyword rules even when a text generator is configured
        #[arg(long)]
        canned: bool,
    },
    /// Chat with the assistant in the terminal
    Chat {
        /// Use keyword rules even when a text generator is configured
        #[arg(long)]
        canned: bool,
    },
}

#[tokio::main]
async fn main() {
    // Load .env before reading RUST_LOG
    dotenvy::dotenv().ok();

    // Quiet by default so replies stay readable
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shop_assistant=warn,shop_assistant_cli=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Sync => commands::sync::run().await?,
        Commands::Ask { question, canned } => {
            commands::chat::ask(&question.join(" "), canned).await?;
        }
        Commands::Chat { canned } => commands::chat::repl(canned).await?,
    }
    Ok(())
}
