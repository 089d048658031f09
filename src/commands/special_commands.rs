//! Special commands parser for interactive chat mode
//!
//! Lines starting with `/` are commands for the client itself rather than
//! messages for the endpoint. They cover what the keyboard shortcuts and
//! buttons of a graphical client would: starting or clearing a chat,
//! exporting, browsing history, editing settings, managing the API key and
//! attachments.
//!
//! Command names are case-insensitive; arguments keep their case.

use crate::export::ExportFormat;
use std::path::PathBuf;
use thiserror::Error;

/// Command names offered by tab completion
pub const COMMAND_NAMES: [&str; 21] = [
    "/new",
    "/clear",
    "/export",
    "/history",
    "/load",
    "/settings",
    "/set",
    "/theme",
    "/key",
    "/testkey",
    "/attach",
    "/detach",
    "/files",
    "/code",
    "/search",
    "/stats",
    "/suggest",
    "/status",
    "/help",
    "/exit",
    "/quit",
];

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Start a new chat
    NewChat,
    /// Discard the current conversation
    ClearChat,
    /// Export the current conversation
    Export(ExportFormat),
    /// List stored chats
    ListHistory,
    /// Resume a stored chat by id or id prefix
    LoadChat(String),
    /// Show current settings
    ShowSettings,
    /// Change one setting
    SetSetting { name: String, value: String },
    /// Store a new API key
    SetKey(String),
    /// Check the stored API key against the endpoint
    TestKey,
    /// Queue a file for the next message
    Attach(PathBuf),
    /// Drop a queued file by zero-based position
    Detach(usize),
    /// List queued files
    ListAttachments,
    /// Send a source file wrapped in an explanation prompt
    CodePrompt { language: String, path: PathBuf },
    /// Search the current conversation
    Search(String),
    /// Show response time statistics
    Stats,
    /// Show starter prompt suggestions
    Suggest,
    /// Show session status
    ShowStatus,
    /// Display help information
    Help,
    /// Exit the interactive session
    Exit,
    /// Not a special command
    ///
    /// The input should be sent as a regular message.
    None,
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns `CommandError::UnknownCommand` if input starts with "/" but is not
/// a valid command, `CommandError::MissingArgument` if a required argument
/// is missing, and `CommandError::UnsupportedArgument` for a bad argument.
///
/// # Examples
///
/// ```
/// use quillchat::commands::special_commands::{parse_special_command, SpecialCommand};
/// use quillchat::export::ExportFormat;
///
/// assert_eq!(parse_special_command("/NEW").unwrap(), SpecialCommand::NewChat);
/// assert_eq!(
///     parse_special_command("/export md").unwrap(),
///     SpecialCommand::Export(ExportFormat::Markdown)
/// );
/// assert_eq!(parse_special_command("hello").unwrap(), SpecialCommand::None);
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if lower == "exit" || lower == "quit" {
        return Ok(SpecialCommand::Exit);
    }
    if !trimmed.starts_with('/') {
        return Ok(SpecialCommand::None);
    }

    let (name, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((name, rest)) => (name.to_lowercase(), rest.trim()),
        None => (lower.clone(), ""),
    };

    match name.as_str() {
        "/new" => Ok(SpecialCommand::NewChat),
        "/clear" => Ok(SpecialCommand::ClearChat),
        "/export" => {
            if rest.is_empty() {
                return Ok(SpecialCommand::Export(ExportFormat::Text));
            }
            ExportFormat::parse_str(rest)
                .map(SpecialCommand::Export)
                .map_err(|_| CommandError::UnsupportedArgument {
                    command: "/export".to_string(),
                    arg: rest.to_string(),
                })
        }
        "/history" => Ok(SpecialCommand::ListHistory),
        "/load" => {
            let id = require(rest, "/load", "/load <chat_id>")?;
            Ok(SpecialCommand::LoadChat(id.to_string()))
        }
        "/settings" => Ok(SpecialCommand::ShowSettings),
        "/set" => {
            let args = require(rest, "/set", "/set <name> <value>")?;
            match args.split_once(char::is_whitespace) {
                Some((name, value)) if !value.trim().is_empty() => {
                    Ok(SpecialCommand::SetSetting {
                        name: name.to_string(),
                        value: value.trim().to_string(),
                    })
                }
                _ => Err(CommandError::MissingArgument {
                    command: "/set".to_string(),
                    usage: "/set <name> <value>".to_string(),
                }),
            }
        }
        "/theme" => {
            let theme = require(rest, "/theme", "/theme <dark|light|blue>")?;
            Ok(SpecialCommand::SetSetting {
                name: "theme".to_string(),
                value: theme.to_string(),
            })
        }
        "/key" => {
            let key = require(rest, "/key", "/key <api_key>")?;
            Ok(SpecialCommand::SetKey(key.to_string()))
        }
        "/testkey" => Ok(SpecialCommand::TestKey),
        "/attach" => {
            let path = require(rest, "/attach", "/attach <path>")?;
            Ok(SpecialCommand::Attach(PathBuf::from(path)))
        }
        "/detach" => {
            let n = require(rest, "/detach", "/detach <number>")?;
            match n.parse::<usize>() {
                Ok(n) if n > 0 => Ok(SpecialCommand::Detach(n - 1)),
                _ => Err(CommandError::UnsupportedArgument {
                    command: "/detach".to_string(),
                    arg: n.to_string(),
                }),
            }
        }
        "/files" => Ok(SpecialCommand::ListAttachments),
        "/code" => {
            let args = require(rest, "/code", "/code <language> <path>")?;
            match args.split_once(char::is_whitespace) {
                Some((language, path)) if !path.trim().is_empty() => {
                    Ok(SpecialCommand::CodePrompt {
                        language: language.to_lowercase(),
                        path: PathBuf::from(path.trim()),
                    })
                }
                _ => Err(CommandError::MissingArgument {
                    command: "/code".to_string(),
                    usage: "/code <language> <path>".to_string(),
                }),
            }
        }
        "/search" => {
            let query = require(rest, "/search", "/search <text>")?;
            Ok(SpecialCommand::Search(query.to_string()))
        }
        "/stats" => Ok(SpecialCommand::Stats),
        "/suggest" => Ok(SpecialCommand::Suggest),
        "/status" => Ok(SpecialCommand::ShowStatus),
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/exit" | "/quit" => Ok(SpecialCommand::Exit),
        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

fn require<'a>(rest: &'a str, command: &str, usage: &str) -> Result<&'a str, CommandError> {
    if rest.is_empty() {
        Err(CommandError::MissingArgument {
            command: command.to_string(),
            usage: usage.to_string(),
        })
    } else {
        Ok(rest)
    }
}

/// Print help for all special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat Mode
===========================================

CONVERSATION:
  /new                 - Start a new chat
  /clear               - Discard the current conversation
  /history             - List saved chats
  /load <id>           - Resume a saved chat (id or unique prefix)
  /search <text>       - Find messages in this chat (3+ characters)
  /export [format]     - Export as text (default), json, markdown or html

ATTACHMENTS:
  /attach <path>       - Attach a file to the next message
  /files               - List attached files
  /detach <number>     - Remove an attached file
  /code <lang> <path>  - Ask for an explanation of a source file

SETTINGS:
  /settings            - Show settings
  /set <name> <value>  - Change a setting (temperature, max_tokens,
                         stream_response, syntax_highlight, theme)
  /theme <name>        - Switch theme (dark, light, blue)
  /key <api_key>       - Save the API key
  /testkey             - Check the saved API key

SESSION INFORMATION:
  /status              - Show chat, key and attachment status
  /stats               - Show response time statistics
  /suggest             - Show prompt ideas
  /help                - Show this help message
  /?                   - Same as /help

SESSION CONTROL:
  exit                 - Exit interactive mode
  quit                 - Same as exit

NOTES:
  - Command names are case-insensitive
  - Regular text (not starting with /) is sent as a message
  - Press Tab to complete common phrases
"#
    );
}
