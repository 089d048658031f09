//! Transcript export
//!
//! Serializes the messages of a session into one of four formats. Exports
//! are built in memory; writing them out is the caller's job.

use crate::error::{ChatError, Result};
use crate::markdown::escape_html;
use crate::session::{ChatSession, Role};
use crate::theme::Theme;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Json,
    Markdown,
    Html,
    Text,
}

impl ExportFormat {
    /// Parse a format name or common extension
    ///
    /// # Examples
    ///
    /// ```
    /// use quillchat::export::ExportFormat;
    ///
    /// assert_eq!(ExportFormat::parse_str("md").unwrap(), ExportFormat::Markdown);
    /// assert_eq!(ExportFormat::parse_str("TXT").unwrap(), ExportFormat::Text);
    /// ```
    pub fn parse_str(s: &str) -> std::result::Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "markdown" | "md" => Ok(Self::Markdown),
            "html" | "htm" => Ok(Self::Html),
            "text" | "txt" | "plain" => Ok(Self::Text),
            other => Err(format!(
                "Unknown export format: {}. Must be one of: json, markdown, html, text",
                other
            )),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
            Self::Html => "html",
            Self::Text => "txt",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Markdown => "text/markdown",
            Self::Html => "text/html",
            Self::Text => "text/plain",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Markdown => write!(f, "markdown"),
            Self::Html => write!(f, "html"),
            Self::Text => write!(f, "text"),
        }
    }
}

/// A rendered export, ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub file_name: String,
    pub mime_type: &'static str,
    pub content: String,
}

impl ExportedFile {
    /// Write the export into `dir`, returning the full path
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.content)?;
        tracing::info!("Exported transcript to {}", path.display());
        Ok(path)
    }
}

#[derive(Serialize)]
struct JsonMessage<'a> {
    role: Role,
    content: &'a str,
}

/// Export a session's transcript
///
/// `stamp` goes into the file name (`chat-{stamp}.{ext}`); `theme` colours
/// the HTML export.
///
/// # Errors
///
/// Returns `ChatError::EmptyTranscript` when the session has no messages
pub fn export_session(
    session: &ChatSession,
    format: ExportFormat,
    theme: Theme,
    stamp: i64,
) -> Result<ExportedFile> {
    if session.messages.iter().all(|m| m.content.trim().is_empty()) {
        return Err(ChatError::EmptyTranscript.into());
    }

    let content = match format {
        ExportFormat::Json => to_json(session)?,
        ExportFormat::Markdown => to_markdown(session),
        ExportFormat::Html => to_html(session, theme),
        ExportFormat::Text => to_text(session),
    };

    Ok(ExportedFile {
        file_name: format!("chat-{}.{}", stamp, format.extension()),
        mime_type: format.mime_type(),
        content,
    })
}

fn to_json(session: &ChatSession) -> Result<String> {
    let messages: Vec<JsonMessage<'_>> = session
        .messages
        .iter()
        .map(|m| JsonMessage {
            role: m.role,
            content: &m.content,
        })
        .collect();
    Ok(serde_json::to_string_pretty(&messages).map_err(ChatError::from)?)
}

fn to_markdown(session: &ChatSession) -> String {
    let mut out = format!("# {}\n\n", session.title);
    for m in &session.messages {
        out.push_str(&format!("## {}\n\n{}\n\n---\n\n", m.role.label(), m.content));
    }
    out
}

fn to_text(session: &ChatSession) -> String {
    session
        .messages
        .iter()
        .map(|m| format!("{}:\n{}\n", m.role.label(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

fn to_html(session: &ChatSession, theme: Theme) -> String {
    let p = theme.palette();
    let mut body = String::new();
    for m in &session.messages {
        body.push_str(&format!(
            "<div class=\"message {role}\"><div class=\"message-role\">{label}</div><div class=\"message-content\">{markup}</div></div>\n",
            role = m.role,
            label = m.role.label(),
            markup = m.markup,
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<title>{title}</title>
<style>
body {{ font-family: Arial, sans-serif; padding: 20px; background: {background}; color: {text}; }}
.message {{ margin: 20px 0; padding: 15px; border-radius: 8px; background: {surface}; }}
.message.user {{ border-left: 4px solid {primary}; }}
.message-role {{ font-weight: bold; margin-bottom: 8px; }}
.code-block-header {{ display: flex; justify-content: space-between; }}
pre {{ overflow-x: auto; padding: 10px; background: {background}; }}
a {{ color: {primary}; }}
</style>
</head>
<body>
<h1>{title}</h1>
{body}</body>
</html>
"#,
        title = escape_html(&session.title),
        background = p.background,
        surface = p.surface,
        text = p.text_primary,
        primary = p.primary,
        body = body,
    )
}
