//! Chat sessions and messages
//!
//! A [`ChatSession`] is one conversation: a timestamp-derived id, a title
//! taken from the first user message, a creation date, and the ordered
//! messages. Each [`Message`] keeps its raw text next to the markup that was
//! rendered for it when it was added.

use crate::markdown;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

/// Last id handed out by [`ChatSession::new`]
static LAST_SESSION_ID: AtomicI64 = AtomicI64::new(0);

/// Maximum number of characters of the first user message used as a title
pub const TITLE_MAX_CHARS: usize = 30;

/// Title used until the session has a user message
pub const DEFAULT_TITLE: &str = "New chat";

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person at the keyboard
    User,
    /// The remote model (or a locally synthesized reply standing in for it)
    Assistant,
}

impl Role {
    /// Display name used in transcripts
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Assistant => "Assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who wrote the message
    pub role: Role,
    /// Raw text as typed or as received
    pub content: String,
    /// HTML markup rendered when the message was added
    pub markup: String,
}

impl Message {
    /// Create a message, rendering its markup
    ///
    /// Assistant messages go through the markdown renderer when
    /// `syntax_highlight` is on. Everything else is escaped verbatim.
    ///
    /// # Examples
    ///
    /// ```
    /// use quillchat::session::{Message, Role};
    ///
    /// let msg = Message::new(Role::Assistant, "**hi**", true);
    /// assert_eq!(msg.markup, "<strong>hi</strong>");
    ///
    /// let msg = Message::new(Role::User, "**hi**", true);
    /// assert_eq!(msg.markup, "**hi**");
    /// ```
    pub fn new(role: Role, content: impl Into<String>, syntax_highlight: bool) -> Self {
        let content = content.into();
        let markup = if syntax_highlight && role == Role::Assistant {
            markdown::render_markdown(&content)
        } else {
            markdown::render_plain(&content)
        };
        Self {
            role,
            content,
            markup,
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content, false)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>, syntax_highlight: bool) -> Self {
        Self::new(Role::Assistant, content, syntax_highlight)
    }
}

/// One persisted conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Opaque id derived from the creation time in milliseconds
    pub id: String,
    /// Title derived from the first user message
    pub title: String,
    /// When the session was created
    pub created_at: DateTime<Utc>,
    /// Messages in the order they were added
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl ChatSession {
    /// Start an empty session stamped with the current time
    ///
    /// Ids are strictly increasing within a process: a session created in
    /// the same millisecond as the previous one takes the next free number.
    pub fn new() -> Self {
        let created_at = Utc::now();
        let millis = created_at.timestamp_millis();
        let previous = LAST_SESSION_ID
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(millis.max(last + 1))
            })
            .unwrap_or(millis);
        Self {
            id: millis.max(previous + 1).to_string(),
            ..Self::new_at(created_at)
        }
    }

    /// Start an empty session stamped with the given time
    pub fn new_at(created_at: DateTime<Utc>) -> Self {
        Self {
            id: created_at.timestamp_millis().to_string(),
            title: DEFAULT_TITLE.to_string(),
            created_at,
            messages: Vec::new(),
        }
    }

    /// Append a message and refresh the title
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.title = derive_title(&self.messages);
    }

    /// Whether the session has no messages
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Derive a session title from the first user message
///
/// The trimmed text is cut to [`TITLE_MAX_CHARS`] characters and suffixed
/// with `...` when it was longer.
///
/// # Examples
///
/// ```
/// use quillchat::session::{derive_title, Message};
///
/// let msgs = vec![Message::user("  How do lifetimes work in Rust traits and impls?")];
/// assert_eq!(derive_title(&msgs), "How do lifetimes work in Rust ...");
/// ```
pub fn derive_title(messages: &[Message]) -> String {
    let Some(first) = messages.iter().find(|m| m.role == Role::User) else {
        return DEFAULT_TITLE.to_string();
    };

    let text = first.content.trim();
    if text.is_empty() {
        return DEFAULT_TITLE.to_string();
    }

    if text.chars().count() > TITLE_MAX_CHARS {
        let cut: String = text.chars().take(TITLE_MAX_CHARS).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}
