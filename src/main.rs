//! QuillChat - terminal chat client
//!
#![doc = "Main entry point for the QuillChat client."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use quillchat::app::ChatApp;
use quillchat::cli::{Cli, Commands};
use quillchat::commands;
use quillchat::config::Config;
use quillchat::storage::{MemoryStore, RecordStore, SqliteStore};
use quillchat::transport::HttpTransport;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    let store: Box<dyn RecordStore> = if cli.ephemeral {
        tracing::info!("Using in-memory store; nothing will be saved");
        Box::new(MemoryStore::new())
    } else {
        match &config.storage.path {
            Some(path) => Box::new(SqliteStore::new_with_path(path)?),
            None => Box::new(SqliteStore::new()?),
        }
    };

    let transport = HttpTransport::new(&config.transport)?;
    tracing::debug!("Using endpoint {}", transport.endpoint());
    let mut app = ChatApp::new(store, transport, config.storage.history_limit)?;

    // Execute command
    match cli.command {
        Commands::Chat { resume } => {
            tracing::info!("Starting interactive chat mode");
            if let Some(r) = &resume {
                tracing::debug!("Resuming chat: {}", r);
            }
            commands::chat::run_chat(&mut app, &config.chat, resume).await?;
        }
        Commands::Send { text, files } => {
            tracing::debug!("Sending one message with {} attachments", files.len());
            commands::send::handle_send(&mut app, &text, &files).await?;
        }
        Commands::History { command } => {
            commands::history::handle_history(&mut app, command)?;
        }
        Commands::Settings { command } => {
            commands::settings::handle_settings(&mut app, command)?;
        }
        Commands::Key { command } => {
            commands::key::handle_key(&mut app, command).await?;
        }
        Commands::Export { id, format, output } => {
            commands::export::handle_export(&mut app, id, format, &output)?;
        }
    }

    Ok(())
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` wins when set; otherwise `--verbose` selects debug output.
fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "quillchat=debug"
    } else {
        "quillchat=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
