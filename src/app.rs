//! Application state
//!
//! [`ChatApp`] is the one owned record behind the client: the current
//! session, settings, credential, pending attachments, the busy flag of the
//! send control, queued notices, and response statistics. Front ends (the
//! REPL, the one-shot commands) call its operations and then render from its
//! state.
//!
//! Taking `&mut self` in [`ChatApp::send_message`] means a second exchange
//! cannot start while one is in flight.

use crate::error::{ChatError, Result};
use crate::export::{export_session, ExportFormat, ExportedFile};
use crate::session::{ChatSession, Message, Role};
use crate::settings::{self, Settings};
use crate::stats::ResponseStats;
use crate::storage::{ChatHistory, RecordStore};
use crate::transport::{Attachment, Transport};
use chrono::Utc;
use std::path::Path;
use std::time::Instant;

/// Severity of a [`Notice`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A transient notification for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// What happened to a message handed to [`ChatApp::send_message`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing to send: empty text and no attachments
    Ignored,
    /// The endpoint answered and the reply was appended
    Replied,
    /// The exchange failed and an error reply was appended
    Failed,
}

/// A message matching a search query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// Position in the current session
    pub index: usize,
    pub role: Role,
    pub content: String,
}

/// Minimum query length (exclusive) for [`ChatApp::search`]
pub const MIN_SEARCH_CHARS: usize = 2;

/// Owned client state
pub struct ChatApp<T: Transport> {
    store: Box<dyn RecordStore>,
    transport: T,
    history_limit: usize,
    settings: Settings,
    api_key: Option<String>,
    session: ChatSession,
    attachments: Vec<Attachment>,
    sending: bool,
    notices: Vec<Notice>,
    stats: ResponseStats,
}

impl<T: Transport> ChatApp<T> {
    /// Load settings and credential from `store` and start a new chat
    pub fn new(store: Box<dyn RecordStore>, transport: T, history_limit: usize) -> Result<Self> {
        let settings = Settings::load(store.as_ref())?;
        let api_key = settings::load_api_key(store.as_ref())?;
        tracing::debug!(
            "Loaded settings (theme={}, api key {})",
            settings.theme,
            if api_key.is_some() { "present" } else { "absent" }
        );

        Ok(Self {
            store,
            transport,
            history_limit,
            settings,
            api_key,
            session: ChatSession::new(),
            attachments: Vec::new(),
            sending: false,
            notices: Vec::new(),
            stats: ResponseStats::new(),
        })
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn stats(&self) -> &ResponseStats {
        &self.stats
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Whether the send control is disabled by an exchange in flight
    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// Take all queued notices
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push(Notice {
            level,
            message: message.into(),
        });
    }

    fn history(&self) -> ChatHistory<'_> {
        ChatHistory::with_limit(self.store.as_ref(), self.history_limit)
    }

    /// Start an empty chat, dropping pending attachments
    ///
    /// An exchange abandoned before it finished no longer blocks sending.
    pub fn new_chat(&mut self) {
        self.session = ChatSession::new();
        self.attachments.clear();
        self.sending = false;
        tracing::debug!("Started chat {}", self.session.id);
    }

    /// Discard the current conversation
    pub fn clear_chat(&mut self) {
        self.new_chat();
        self.notify(NoticeLevel::Success, "Conversation cleared");
    }

    /// Queue an attachment for the next message
    pub fn attach(&mut self, attachment: Attachment) {
        tracing::debug!("Attached {}", attachment.name);
        self.attachments.push(attachment);
    }

    /// Read a file from disk and queue it
    pub async fn attach_file(&mut self, path: &Path) -> Result<()> {
        match Attachment::from_path(path).await {
            Ok(attachment) => {
                self.attach(attachment);
                Ok(())
            }
            Err(e) => {
                self.notify(NoticeLevel::Error, e.to_string());
                Err(e)
            }
        }
    }

    /// Remove a queued attachment by position
    pub fn remove_attachment(&mut self, index: usize) -> Result<Attachment> {
        if index >= self.attachments.len() {
            return Err(ChatError::Attachment(format!(
                "No attachment at position {} ({} attached)",
                index + 1,
                self.attachments.len()
            ))
            .into());
        }
        Ok(self.attachments.remove(index))
    }

    /// Send a message and append the reply
    ///
    /// Exactly one assistant message is appended per exchange, whether the
    /// request succeeds or fails. Pending attachments are consumed and the
    /// send control is re-enabled on every path.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::MissingCredential` when no API key is set, and
    /// `ChatError::SendInProgress` while an earlier exchange is still
    /// outstanding; no request is made and nothing is appended in either case. Request
    /// failures are not errors: they produce [`SendOutcome::Failed`].
    pub async fn send_message(&mut self, text: &str) -> Result<SendOutcome> {
        if self.sending {
            self.notify(NoticeLevel::Warning, "A message is already being sent");
            return Err(ChatError::SendInProgress.into());
        }

        let text = text.trim();
        if text.is_empty() && self.attachments.is_empty() {
            return Ok(SendOutcome::Ignored);
        }

        let Some(api_key) = self.api_key.clone() else {
            self.notify(
                NoticeLevel::Error,
                "Please set an API key first (`/key <KEY>` or `quillchat key set <KEY>`)",
            );
            return Err(ChatError::MissingCredential.into());
        };

        self.session.push(Message::user(text));
        let attachments = std::mem::take(&mut self.attachments);

        self.sending = true;
        let started = Instant::now();
        let result = self.transport.send(&api_key, text, &attachments).await;
        self.sending = false;

        let outcome = match result {
            Ok(reply) => {
                self.stats.record(started.elapsed());
                self.session
                    .push(Message::assistant(reply, self.settings.syntax_highlight));
                let saved = self.history().save(&self.session);
                if let Err(e) = saved {
                    tracing::warn!("Failed to save chat {}: {}", self.session.id, e);
                    self.notify(NoticeLevel::Warning, format!("Chat not saved: {}", e));
                }
                SendOutcome::Replied
            }
            Err(e) => {
                tracing::error!("Chat request failed: {}", e);
                self.session.push(Message::assistant(
                    format!(
                        "An error occurred: {}. Please check your API key and internet connection.",
                        e
                    ),
                    self.settings.syntax_highlight,
                ));
                self.notify(NoticeLevel::Error, "Request failed");
                SendOutcome::Failed
            }
        };

        Ok(outcome)
    }

    /// Stored chats, most recent first
    pub fn chats(&self) -> Result<Vec<ChatSession>> {
        self.history().list()
    }

    /// Make a stored chat the current one
    ///
    /// # Errors
    ///
    /// Returns `ChatError::UnknownChat` when no chat matches `id`
    pub fn load_chat(&mut self, id: &str) -> Result<()> {
        let Some(session) = self.history().find(id)? else {
            return Err(ChatError::UnknownChat(id.to_string()).into());
        };
        tracing::debug!("Loaded chat {} ({} messages)", session.id, session.len());
        self.session = session;
        self.attachments.clear();
        Ok(())
    }

    /// Change one setting and persist all settings
    pub fn update_setting(&mut self, name: &str, value: &str) -> Result<()> {
        let mut updated = self.settings.clone();
        updated.set(name, value)?;
        self.save_settings(updated)
    }

    /// Replace and persist settings
    pub fn save_settings(&mut self, settings: Settings) -> Result<()> {
        settings.save(self.store.as_ref())?;
        self.settings = settings;
        self.notify(NoticeLevel::Success, "Settings saved");
        Ok(())
    }

    /// Store a new API key; an empty key clears it
    pub fn set_api_key(&mut self, key: &str) -> Result<()> {
        settings::save_api_key(self.store.as_ref(), key)?;
        self.api_key = settings::load_api_key(self.store.as_ref())?;
        if self.api_key.is_some() {
            self.notify(NoticeLevel::Success, "API key saved");
        } else {
            self.notify(NoticeLevel::Info, "API key cleared");
        }
        Ok(())
    }

    /// Ask the endpoint whether a key is accepted
    ///
    /// Uses `candidate` when given, otherwise the stored key.
    pub async fn verify_api_key(&mut self, candidate: Option<&str>) -> Result<bool> {
        let key = candidate
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .or_else(|| self.api_key.clone());
        let Some(key) = key else {
            self.notify(NoticeLevel::Error, "Please enter an API key");
            return Err(ChatError::MissingCredential.into());
        };

        match self.transport.verify_key(&key).await {
            Ok(true) => {
                self.notify(NoticeLevel::Success, "API key is valid");
                Ok(true)
            }
            Ok(false) => {
                self.notify(NoticeLevel::Error, "API key is invalid");
                Ok(false)
            }
            Err(e) => {
                self.notify(NoticeLevel::Error, "Failed to connect to the server");
                Err(e)
            }
        }
    }

    /// Export the current conversation
    ///
    /// # Errors
    ///
    /// Returns `ChatError::EmptyTranscript` when there is nothing to export
    pub fn export(&mut self, format: ExportFormat) -> Result<ExportedFile> {
        match export_session(
            &self.session,
            format,
            self.settings.theme,
            Utc::now().timestamp_millis(),
        ) {
            Ok(file) => {
                self.notify(NoticeLevel::Success, "Conversation exported");
                Ok(file)
            }
            Err(e) => {
                self.notify(NoticeLevel::Error, e.to_string());
                Err(e)
            }
        }
    }

    /// Case-insensitive search over the current conversation
    ///
    /// Queries of [`MIN_SEARCH_CHARS`] characters or fewer match nothing.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let query = query.trim();
        if query.chars().count() <= MIN_SEARCH_CHARS {
            return Vec::new();
        }
        let needle = query.to_lowercase();
        self.session
            .messages
            .iter()
            .enumerate()
            .filter(|(_, m)| m.content.to_lowercase().contains(&needle))
            .map(|(index, m)| SearchHit {
                index,
                role: m.role,
                content: m.content.clone(),
            })
            .collect()
    }
}

/// Wrap source code in a prompt asking for an explanation
///
/// # Examples
///
/// ```
/// use quillchat::app::code_prompt;
///
/// let prompt = code_prompt("rust", "fn main() {}\n");
/// assert_eq!(prompt, "Analyze and explain this code:\n```rust\nfn main() {}\n```");
/// ```
pub fn code_prompt(language: &str, code: &str) -> String {
    format!(
        "Analyze and explain this code:\n```{}\n{}\n```",
        language,
        code.trim_end()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedTransport {
        reply: std::result::Result<String, String>,
        calls: AtomicUsize,
        stall: bool,
    }

    impl ScriptedTransport {
        fn ok(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
                stall: false,
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                calls: AtomicUsize::new(0),
                stall: false,
            }
        }

        /// Never answers
        fn stalled() -> Self {
            Self {
                stall: true,
                ..Self::ok("")
            }
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, _: &str, _: &str, _: &[Attachment]) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.stall {
                std::future::pending::<()>().await;
            }
            self.reply
                .clone()
                .map_err(|m| ChatError::RequestFailed(m).into())
        }

        async fn verify_key(&self, key: &str) -> Result<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(key == "good")
        }
    }

    fn app_with(transport: ScriptedTransport, key: Option<&str>) -> ChatApp<ScriptedTransport> {
        let store = MemoryStore::new();
        if let Some(key) = key {
            settings::save_api_key(&store, key).unwrap();
        }
        ChatApp::new(Box::new(store), transport, 50).unwrap()
    }

    #[tokio::test]
    async fn test_send_refused_while_exchange_outstanding() {
        let mut app = app_with(ScriptedTransport::stalled(), Some("k"));
        let abandoned = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            app.send_message("first"),
        )
        .await;
        assert!(abandoned.is_err());
        assert!(app.is_sending());
        app.drain_notices();

        let err = app.send_message("second").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ChatError>(),
            Some(ChatError::SendInProgress)
        ));
        assert_eq!(app.transport().calls.load(Ordering::SeqCst), 1);
        assert_eq!(app.session().len(), 1);
        assert_eq!(app.drain_notices()[0].level, NoticeLevel::Warning);

        app.new_chat();
        assert!(!app.is_sending());
    }

    #[tokio::test]
    async fn test_sending_flag_cleared_after_exchange() {
        let mut app = app_with(ScriptedTransport::failing("down"), Some("k"));
        app.send_message("hello").await.unwrap();
        assert!(!app.is_sending());
    }

    #[tokio::test]
    async fn test_send_without_key_makes_no_request() {
        let mut app = app_with(ScriptedTransport::ok("hi"), None);
        let err = app.send_message("hello").await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ChatError>(),
            Some(ChatError::MissingCredential)
        ));
        assert_eq!(app.transport().calls.load(Ordering::SeqCst), 0);
        assert!(app.session().is_empty());
        let notices = app.drain_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn test_empty_message_is_ignored() {
        let mut app = app_with(ScriptedTransport::ok("hi"), Some("k"));
        assert_eq!(app.send_message("   ").await.unwrap(), SendOutcome::Ignored);
        assert_eq!(app.transport().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_attachment_only_message_is_sent() {
        let mut app = app_with(ScriptedTransport::ok("got it"), Some("k"));
        app.attach(Attachment::new("a.txt", b"x".to_vec()));
        assert_eq!(app.send_message("").await.unwrap(), SendOutcome::Replied);
        assert!(app.attachments().is_empty());
    }

    #[tokio::test]
    async fn test_successful_send_appends_reply_and_saves() {
        let mut app = app_with(ScriptedTransport::ok("**done**"), Some("k"));
        let outcome = app.send_message("do it").await.unwrap();

        assert_eq!(outcome, SendOutcome::Replied);
        assert_eq!(app.session().len(), 2);
        assert_eq!(app.session().messages[1].markup, "<strong>done</strong>");
        assert_eq!(app.stats().message_count(), 1);
        assert!(!app.is_sending());

        let chats = app.chats().unwrap();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].id, app.session().id);
        assert_eq!(chats[0].title, "do it");
    }

    #[tokio::test]
    async fn test_failed_send_appends_one_error_reply() {
        let mut app = app_with(ScriptedTransport::failing("HTTP error! status: 500"), Some("k"));
        app.attach(Attachment::new("a.txt", b"x".to_vec()));
        let outcome = app.send_message("hello").await.unwrap();

        assert_eq!(outcome, SendOutcome::Failed);
        assert!(!app.is_sending());
        assert!(app.attachments().is_empty());

        let assistant: Vec<_> = app
            .session()
            .messages
            .iter()
            .filter(|m| m.role == Role::Assistant)
            .collect();
        assert_eq!(assistant.len(), 1);
        assert!(assistant[0].content.contains("HTTP error! status: 500"));
        assert_eq!(app.stats().message_count(), 0);
        assert!(app.chats().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_syntax_highlight_off_keeps_reply_plain() {
        let mut app = app_with(ScriptedTransport::ok("**x**"), Some("k"));
        app.update_setting("syntax_highlight", "false").unwrap();
        app.send_message("q").await.unwrap();
        assert_eq!(app.session().messages[1].markup, "**x**");
    }

    #[tokio::test]
    async fn test_new_chat_then_load_chat() {
        let mut app = app_with(ScriptedTransport::ok("a"), Some("k"));
        app.send_message("first chat").await.unwrap();
        let first_id = app.session().id.clone();

        app.new_chat();
        assert!(app.session().is_empty());

        app.load_chat(&first_id).unwrap();
        assert_eq!(app.session().id, first_id);
        assert_eq!(app.session().len(), 2);

        assert!(app.load_chat("does-not-exist").is_err());
    }

    #[test]
    fn test_settings_persist_across_instances() {
        let store = MemoryStore::new();
        settings::save_api_key(&store, "k").unwrap();
        let mut settings = Settings::default();
        settings.set("theme", "blue").unwrap();
        settings.save(&store).unwrap();

        let app = ChatApp::new(Box::new(store), ScriptedTransport::ok(""), 50).unwrap();
        assert_eq!(app.settings().theme, crate::theme::Theme::Blue);
        assert!(app.has_api_key());
    }

    #[test]
    fn test_update_setting_rejects_bad_value() {
        let mut app = app_with(ScriptedTransport::ok(""), None);
        assert!(app.update_setting("temperature", "5").is_err());
        assert_eq!(app.settings().temperature, 0.7);
    }

    #[test]
    fn test_set_and_clear_api_key() {
        let mut app = app_with(ScriptedTransport::ok(""), None);
        app.set_api_key("abc").unwrap();
        assert!(app.has_api_key());
        app.set_api_key("  ").unwrap();
        assert!(!app.has_api_key());
    }

    #[tokio::test]
    async fn test_verify_api_key() {
        let mut app = app_with(ScriptedTransport::ok(""), Some("good"));
        assert!(app.verify_api_key(None).await.unwrap());
        assert!(!app.verify_api_key(Some("bad")).await.unwrap());

        let mut keyless = app_with(ScriptedTransport::ok(""), None);
        assert!(keyless.verify_api_key(None).await.is_err());
        assert_eq!(keyless.transport().calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_export_empty_transcript_notifies() {
        let mut app = app_with(ScriptedTransport::ok(""), None);
        assert!(app.export(ExportFormat::Json).is_err());
        let notices = app.drain_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn test_search() {
        let mut app = app_with(ScriptedTransport::ok("Rust has Ownership rules"), Some("k"));
        app.send_message("tell me about ownership").await.unwrap();

        let hits = app.search("OWNER");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].index, 0);
        assert_eq!(hits[1].role, Role::Assistant);

        assert!(app.search("ow").is_empty());
    }

    #[test]
    fn test_remove_attachment_out_of_range() {
        let mut app = app_with(ScriptedTransport::ok(""), None);
        app.attach(Attachment::new("a", vec![]));
        assert!(app.remove_attachment(1).is_err());
        assert_eq!(app.remove_attachment(0).unwrap().name, "a");
    }

    #[test]
    fn test_clear_chat_notifies() {
        let mut app = app_with(ScriptedTransport::ok(""), None);
        app.clear_chat();
        assert_eq!(app.drain_notices()[0].message, "Conversation cleared");
    }
}
