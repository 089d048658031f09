//! QuillChat - terminal chat client library
//!
//! This library provides the pieces behind the `quillchat` binary: a client
//! for a multipart chat endpoint, a local store for settings and recent
//! chats, a markdown renderer, and transcript export.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `app`: Owned client state and the operations front ends call
//! - `transport`: The single multipart POST exchange with the endpoint
//! - `storage`: Key/value record store and the capped chat history
//! - `settings`: User preferences and the API key record
//! - `session`: Chats and messages
//! - `markdown`: Markdown to HTML rendering for stored markup and exports
//! - `export`: JSON, markdown, HTML and text transcripts
//! - `theme`, `display`, `suggest`, `stats`: Terminal presentation helpers
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`, `commands`: Command-line interface and handlers
//!
//! # Example
//!
//! ```no_run
//! use quillchat::app::ChatApp;
//! use quillchat::storage::SqliteStore;
//! use quillchat::transport::HttpTransport;
//! use quillchat::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let transport = HttpTransport::new(&config.transport)?;
//!     let mut app = ChatApp::new(Box::new(SqliteStore::new()?), transport, 50)?;
//!     app.send_message("Hello").await?;
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod markdown;
pub mod session;
pub mod settings;
pub mod stats;
pub mod storage;
pub mod suggest;
pub mod theme;
pub mod transport;

// Re-export commonly used types
pub use app::ChatApp;
pub use config::Config;
pub use error::{ChatError, Result};
pub use session::{ChatSession, Message, Role};
pub use settings::Settings;
pub use transport::{Attachment, HttpTransport, Transport};
