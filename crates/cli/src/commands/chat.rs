//! Question answering from the terminal.
//!
//! Both commands answer against the cached catalog and never call Shopify.
//! The interactive session keeps its transcript in memory only.

use std::io::Write as _;

use shop_assistant::config::AssistantConfig;
use shop_assistant::history::{HistoryStore, InMemoryHistoryStore};
use shop_assistant::reply::Responder;
use shop_assistant::state::AppState;
use shop_assistant_core::{ChatMessage, UserId};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::CliError;

/// Words that end an interactive session.
const EXIT_WORDS: &[&str] = &["quit", "exit", "bye"];

/// Answer a single question and print the reply.
///
/// # Errors
///
/// Returns an error if configuration or startup fails.
#[allow(clippy::print_stdout)]
pub async fn ask(question: &str, canned: bool) -> Result<(), CliError> {
    let (state, responder) = load(canned).await?;
    let catalog = state.catalog().snapshot();
    let reply = responder.reply(question, &catalog, &[]).await;
    println!("{reply}");
    Ok(())
}

/// Run an interactive chat session on stdin/stdout.
///
/// # Errors
///
/// Returns an error if configuration, startup, or terminal I/O fails.
#[allow(clippy::print_stdout)]
pub async fn repl(canned: bool) -> Result<(), CliError> {
    let (state, responder) = load(canned).await?;
    let history = InMemoryHistoryStore::new();
    let user = UserId::guest();

    let catalog = state.catalog().snapshot();
    println!(
        "Chatting with {} ({} products loaded). Type 'quit' to leave.",
        responder.store_name(),
        catalog.len()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("You: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if is_exit(message) {
            println!("Bot: Goodbye!");
            break;
        }

        let transcript = history.get(&user).await.unwrap_or_default();
        let reply = responder.reply(message, &catalog, &transcript).await;
        println!("Bot: {reply}\n");

        let exchange = [ChatMessage::user(message), ChatMessage::bot(reply)];
        if let Err(err) = history.append(&user, &exchange).await {
            tracing::warn!(error = %err, "Could not record chat turn");
        }
    }
    Ok(())
}

async fn load(canned: bool) -> Result<(AppState, Responder), CliError> {
    let config = AssistantConfig::from_env()?;
    let state = AppState::from_config(config).await?;
    let responder = if canned {
        let store = &state.config().store;
        Responder::canned(store.display_name.clone(), store.base_url.clone())
    } else {
        state.responder().clone()
    };
    Ok((state, responder))
}

fn is_exit(message: &str) -> bool {
    EXIT_WORDS
        .iter()
        .any(|word| message.eq_ignore_ascii_case(word))
}
