use std::path::PathBuf;

use clap::Parser;
use eyre::Result;

use folio_core::app::Client;
use folio_core::config::ClientConfig;
use folio_core::session::SessionCache;
use tracing::info;

/// Headless Folio client: restores the cached session, verifies it against
/// the server, keeps the realtime chat channel alive, and mirrors every
/// state change to the log until interrupted.
#[derive(Parser, Debug)]
#[command(name = "folio", version, about)]
struct Cli {
    /// Path to an alternate config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the API base URL
    #[arg(long, env = "FOLIO_API_URL")]
    api_url: Option<String>,

    /// Override the chat WebSocket URL
    #[arg(long, env = "FOLIO_CHAT_URL")]
    chat_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // Initialize tracing (level configured via RUST_LOG env var)
    folio_core::utils::tracing::init_tracing()?;

    let mut config = match &cli.config {
        Some(path) => ClientConfig::load_from(path)?,
        None => ClientConfig::load()?,
    };
    if let Some(api_url) = cli.api_url {
        config.api_base_url = api_url;
    }
    if let Some(chat_url) = cli.chat_url {
        config.chat_url = chat_url;
    }

    let session = SessionCache::at_default_location()?;
    let client = Client::new(&config, session)?;

    let state = client.store().state();
    if state.logged_in {
        info!(
            username = state.user.as_ref().map(|u| u.username.as_str()),
            "restored session"
        );
    } else {
        info!("no cached session; starting logged out");
    }

    client.start();

    // Mirror state changes into the log until interrupted.
    let mut state_rx = client.store().subscribe();
    let mut chat_rx = client.chat_state();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = state_rx.borrow_and_update().clone();
                info!(
                    logged_in = state.logged_in,
                    flash_messages = state.flash_messages.len(),
                    transcript = state.chat_messages.len(),
                    unread = state.unread_chat_count,
                    "state changed"
                );
            }
            changed = chat_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let connection = *chat_rx.borrow_and_update();
                info!(?connection, "chat connection state changed");
            }
        }
    }

    info!("shutting down");
    client.shutdown().await;

    Ok(())
}
