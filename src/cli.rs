//! Command-line interface definition for QuillChat
//!
//! This module defines the CLI structure using clap's derive API,
//! providing the interactive chat plus one-shot commands for sending,
//! history, settings, credentials and export.

use crate::export::ExportFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// QuillChat - terminal client for a multipart chat endpoint
///
/// Keeps a local history of recent chats, renders replies as markdown,
/// and exports transcripts.
#[derive(Parser, Debug, Clone)]
#[command(name = "quillchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to the local record store (overrides config and QUILLCHAT_STORE)
    #[arg(long, global = true)]
    pub store: Option<String>,

    /// Chat endpoint URL (overrides config and QUILLCHAT_ENDPOINT)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Keep everything in memory; nothing is read from or written to disk
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for QuillChat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat
    Chat {
        /// Resume a saved chat by id or id prefix
        #[arg(short, long)]
        resume: Option<String>,
    },

    /// Send one message and print the reply
    Send {
        /// Message text
        text: String,

        /// Files to attach (repeatable)
        #[arg(short, long = "file")]
        files: Vec<PathBuf>,
    },

    /// Browse saved chats
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },

    /// Show or change settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },

    /// Manage the API key
    Key {
        #[command(subcommand)]
        command: KeyCommand,
    },

    /// Export a chat transcript to a file
    Export {
        /// Chat id or id prefix (defaults to the most recent chat)
        id: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: ExportFormat,

        /// Directory to write the file into
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

/// History subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum HistoryCommand {
    /// List saved chats, most recent first
    List,

    /// Print one saved chat
    Show {
        /// Chat id or id prefix
        id: String,
    },
}

/// Settings subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SettingsCommand {
    /// Print current settings
    Show,

    /// Change one setting
    Set {
        /// Setting name (temperature, max_tokens, stream_response, syntax_highlight, theme)
        key: String,

        /// New value
        value: String,
    },

    /// Restore default settings
    Reset,
}

/// API key subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum KeyCommand {
    /// Save the API key
    Set {
        /// The key
        key: String,
    },

    /// Check a key against the endpoint (defaults to the saved key)
    Test {
        /// Key to check instead of the saved one
        key: Option<String>,
    },

    /// Remove the saved key
    Clear,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            store: None,
            endpoint: None,
            ephemeral: false,
            command: Commands::Chat { resume: None },
        }
    }
}
