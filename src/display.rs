//! Terminal rendering
//!
//! The stored markup of a message is HTML for exports. In the terminal the
//! raw markdown is parsed with pulldown-cmark and printed with colors:
//! fenced code blocks are framed, inline code, emphasis and links styled.

use crate::app::{Notice, NoticeLevel, SearchHit};
use crate::markdown::DEFAULT_LANGUAGE;
use crate::session::{ChatSession, Message, Role};
use crate::settings::Settings;
use crate::theme::Theme;
use crate::transport::Attachment;
use colored::Colorize;
use prettytable::{format, Table};
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

const TABLE_TITLE_CHARS: usize = 40;
const SNIPPET_CHARS: usize = 80;
const RULE_WIDTH: usize = 40;

/// Print a notice, colored by level
pub fn print_notice(notice: &Notice) {
    match notice.level {
        NoticeLevel::Info => println!("{}", notice.message.cyan()),
        NoticeLevel::Success => println!("{}", notice.message.green()),
        NoticeLevel::Warning => println!("{}", notice.message.yellow()),
        NoticeLevel::Error => eprintln!("{}", notice.message.red()),
    }
}

pub fn print_notices(notices: &[Notice]) {
    for notice in notices {
        print_notice(notice);
    }
}

/// Render markdown text for the terminal
///
/// Code blocks get a dimmed language header and a left border; their lines
/// are printed verbatim. A fence that is never closed runs to the end of
/// the text, as in CommonMark.
pub fn render_terminal(text: &str) -> String {
    let mut renderer = TerminalRenderer::default();
    for event in Parser::new_ext(text, Options::ENABLE_STRIKETHROUGH) {
        renderer.process_event(event);
    }
    renderer.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Heading,
    Emphasis,
    Strong,
    Strikethrough,
    Link,
    Quote,
}

#[derive(Debug)]
struct ListState {
    /// None for bullets, Some(start) for numbered lists
    ordered: Option<u64>,
    current_item: u64,
}

#[derive(Debug)]
struct CodeBlock {
    language: String,
    code: String,
}

#[derive(Debug)]
struct LinkState {
    target: String,
    text: String,
}

/// Event-driven renderer state
#[derive(Debug, Default)]
struct TerminalRenderer {
    lines: Vec<String>,
    current: String,
    style_stack: Vec<Style>,
    code_block: Option<CodeBlock>,
    list_stack: Vec<ListState>,
    links: Vec<LinkState>,
}

impl TerminalRenderer {
    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.add_text(&text),
            Event::Code(code) => {
                self.track_link_text(&code);
                self.current.push_str(&code.yellow().to_string());
            }
            Event::SoftBreak | Event::HardBreak => self.flush_line(),
            // Raw HTML is shown as typed
            Event::Html(html) => {
                for line in html.lines() {
                    self.add_text(line);
                    self.flush_line();
                }
            }
            Event::InlineHtml(html) => self.add_text(&html),
            Event::Rule => {
                self.flush_line();
                self.lines.push("─".repeat(RULE_WIDTH).dimmed().to_string());
                self.blank_line();
            }
            Event::TaskListMarker(done) => {
                self.current.push_str(if done { "[x] " } else { "[ ] " });
            }
            _ => {}
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { .. } => {
                self.flush_line();
                self.style_stack.push(Style::Heading);
            }
            Tag::CodeBlock(kind) => {
                self.flush_line();
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .unwrap_or(DEFAULT_LANGUAGE)
                        .to_string(),
                    CodeBlockKind::Indented => DEFAULT_LANGUAGE.to_string(),
                };
                self.code_block = Some(CodeBlock {
                    language,
                    code: String::new(),
                });
            }
            Tag::List(start) => {
                self.flush_line();
                self.list_stack.push(ListState {
                    ordered: start,
                    current_item: start.unwrap_or(1),
                });
            }
            Tag::Item => {
                self.flush_line();
                let depth = self.list_stack.len().saturating_sub(1);
                let marker = match self.list_stack.last() {
                    Some(ListState {
                        ordered: Some(_),
                        current_item,
                    }) => format!("{}. ", current_item),
                    _ => "• ".to_string(),
                };
                self.current = format!("{}{}", "  ".repeat(depth), marker);
            }
            Tag::BlockQuote(_) => {
                self.flush_line();
                self.style_stack.push(Style::Quote);
            }
            Tag::Emphasis => self.style_stack.push(Style::Emphasis),
            Tag::Strong => self.style_stack.push(Style::Strong),
            Tag::Strikethrough => self.style_stack.push(Style::Strikethrough),
            Tag::Link { dest_url, .. } => {
                self.style_stack.push(Style::Link);
                self.links.push(LinkState {
                    target: dest_url.to_string(),
                    text: String::new(),
                });
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush_line();
                if self.list_stack.is_empty() {
                    self.blank_line();
                }
            }
            TagEnd::Heading(_) => {
                self.flush_line();
                self.style_stack.pop();
                self.blank_line();
            }
            TagEnd::CodeBlock => {
                if let Some(block) = self.code_block.take() {
                    self.frame_code_block(&block);
                }
                self.blank_line();
            }
            TagEnd::List(_) => {
                self.flush_line();
                self.list_stack.pop();
                if self.list_stack.is_empty() {
                    self.blank_line();
                }
            }
            TagEnd::Item => {
                self.flush_line();
                if let Some(list) = self.list_stack.last_mut() {
                    list.current_item += 1;
                }
            }
            TagEnd::BlockQuote(_) => {
                self.flush_line();
                self.style_stack.pop();
                self.blank_line();
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.style_stack.pop();
            }
            TagEnd::Link => {
                self.style_stack.pop();
                if let Some(link) = self.links.pop() {
                    // Autolinks already show their target
                    if !link.target.is_empty() && link.target != link.text {
                        let target = format!(" ({})", link.target);
                        self.current.push_str(&target.dimmed().to_string());
                    }
                }
            }
            TagEnd::HtmlBlock => self.blank_line(),
            _ => {}
        }
    }

    fn add_text(&mut self, text: &str) {
        if let Some(block) = self.code_block.as_mut() {
            block.code.push_str(text);
            return;
        }
        self.track_link_text(text);
        let styled = self.styled(text);
        self.current.push_str(&styled);
    }

    fn track_link_text(&mut self, text: &str) {
        if let Some(link) = self.links.last_mut() {
            link.text.push_str(text);
        }
    }

    fn styled(&self, text: &str) -> String {
        let mut out = text.normal();
        for style in &self.style_stack {
            out = match style {
                Style::Heading => out.bold().underline(),
                Style::Emphasis => out.italic(),
                Style::Strong => out.bold(),
                Style::Strikethrough => out.strikethrough(),
                Style::Link => out.blue().underline(),
                Style::Quote => out.dimmed(),
            };
        }
        out.to_string()
    }

    fn frame_code_block(&mut self, block: &CodeBlock) {
        self.lines
            .push(format!("  ┌ {}", block.language).dimmed().to_string());
        for line in block.code.lines() {
            self.lines.push(format!("  │ {}", line.cyan()));
        }
        self.lines.push("  └".dimmed().to_string());
    }

    fn flush_line(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let line = std::mem::take(&mut self.current);
        if self.style_stack.contains(&Style::Quote) {
            self.lines.push(format!("{} {}", "│".dimmed(), line));
        } else {
            self.lines.push(line);
        }
    }

    fn blank_line(&mut self) {
        if self.lines.last().is_some_and(|l| !l.is_empty()) {
            self.lines.push(String::new());
        }
    }

    fn finish(mut self) -> String {
        self.flush_line();
        while self.lines.last().is_some_and(|l| l.is_empty()) {
            self.lines.pop();
        }
        self.lines.join("\n")
    }
}

/// Render one message with its role label
pub fn render_message(message: &Message, theme: Theme, syntax_highlight: bool) -> String {
    let label = match message.role {
        Role::User => theme.accent(message.role.label()).bold(),
        Role::Assistant => message.role.label().green().bold(),
    };
    let body = if syntax_highlight && message.role == Role::Assistant {
        render_terminal(&message.content)
    } else {
        message.content.clone()
    };
    format!("{}\n{}\n", label, body)
}

/// Print every message of a session
pub fn print_transcript(session: &ChatSession, settings: &Settings) {
    println!("{}", session.title.bold());
    println!(
        "{}\n",
        format!(
            "{} · {} messages",
            session.created_at.format("%Y-%m-%d %H:%M"),
            session.len()
        )
        .dimmed()
    );
    for message in &session.messages {
        println!(
            "{}",
            render_message(message, settings.theme, settings.syntax_highlight)
        );
    }
}

/// Print saved chats as a table
pub fn print_chat_table(chats: &[ChatSession]) {
    if chats.is_empty() {
        println!("{}", "No saved chats.".yellow());
        return;
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(prettytable::row![
        "ID".bold(),
        "Title".bold(),
        "Messages".bold(),
        "Created".bold()
    ]);

    for chat in chats {
        table.add_row(prettytable::row![
            chat.id.cyan(),
            truncate(&chat.title, TABLE_TITLE_CHARS),
            chat.len(),
            chat.created_at.format("%Y-%m-%d %H:%M")
        ]);
    }

    println!("\nSaved chats:");
    table.printstd();
}

/// Print settings as a two-column table
pub fn print_settings(settings: &Settings) {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(prettytable::row!["Setting".bold(), "Value".bold()]);
    for (name, value) in settings.entries() {
        table.add_row(prettytable::row![name.cyan(), value]);
    }
    table.printstd();
}

pub fn print_attachments(attachments: &[Attachment]) {
    if attachments.is_empty() {
        println!("{}", "No files attached.".yellow());
        return;
    }
    for (i, attachment) in attachments.iter().enumerate() {
        println!(
            "  {}. {} ({})",
            i + 1,
            attachment.name.cyan(),
            format_size(attachment.size())
        );
    }
}

pub fn print_search_hits(query: &str, hits: &[SearchHit]) {
    if hits.is_empty() {
        println!("{}", format!("No messages match '{}'.", query).yellow());
        return;
    }
    println!("{}", format!("{} matching messages:", hits.len()).green());
    for hit in hits {
        println!(
            "  #{} {}: {}",
            hit.index + 1,
            hit.role.label().bold(),
            truncate(&hit.content.replace('\n', " "), SNIPPET_CHARS)
        );
    }
}

pub fn print_suggestions(suggestions: &[&str]) {
    if suggestions.is_empty() {
        return;
    }
    println!("{}", "Try one of:".dimmed());
    for s in suggestions {
        println!("  {} {}", "›".cyan(), s);
    }
}

/// Human-readable byte count
///
/// # Examples
///
/// ```
/// use quillchat::display::format_size;
///
/// assert_eq!(format_size(512), "512 B");
/// assert_eq!(format_size(2048), "2.0 KB");
/// assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
/// ```
pub fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{} B", bytes)
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / (KB * KB))
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars - 3).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_render_terminal_frames_code_blocks() {
        plain();
        let out = render_terminal("Here:\n```rust\nfn main() {}\n```\nDone");
        assert_eq!(out, "Here:\n\n  ┌ rust\n  │ fn main() {}\n  └\n\nDone");
    }

    #[test]
    fn test_render_terminal_unlabelled_fence() {
        plain();
        let out = render_terminal("```\nx\n```");
        assert_eq!(out, "  ┌ plaintext\n  │ x\n  └");
    }

    #[test]
    fn test_render_terminal_unclosed_fence_runs_to_end() {
        plain();
        assert_eq!(
            render_terminal("```rust\nlet x = 1;"),
            "  ┌ rust\n  │ let x = 1;\n  └"
        );
    }

    #[test]
    fn test_render_terminal_code_block_is_verbatim() {
        plain();
        let out = render_terminal("```python\ny = **kwargs\n```");
        assert!(out.contains("  │ y = **kwargs"));
    }

    #[test]
    fn test_render_inline_strips_markers() {
        plain();
        assert_eq!(
            render_terminal("use `cargo` for **speed**"),
            "use cargo for speed"
        );
    }

    #[test]
    fn test_render_terminal_strong_wraps_code() {
        plain();
        assert_eq!(render_terminal("**run `cargo test` first**"), "run cargo test first");
    }

    #[test]
    fn test_render_terminal_link_shows_target() {
        plain();
        assert_eq!(
            render_terminal("see [docs](https://example.com)"),
            "see docs (https://example.com)"
        );
        assert_eq!(
            render_terminal("<https://example.com>"),
            "https://example.com"
        );
    }

    #[test]
    fn test_render_terminal_lists_and_breaks() {
        plain();
        assert_eq!(render_terminal("- one\n- two"), "• one\n• two");
        assert_eq!(render_terminal("3. c\n4. d"), "3. c\n4. d");
        assert_eq!(render_terminal("a\nb"), "a\nb");
    }

    #[test]
    fn test_render_terminal_heading_then_paragraph() {
        plain();
        assert_eq!(render_terminal("# Title\nbody"), "Title\n\nbody");
    }

    #[test]
    fn test_render_message_plain_when_highlight_off() {
        plain();
        let msg = Message::assistant("**raw**", false);
        assert_eq!(render_message(&msg, Theme::Dark, false), "Assistant\n**raw**\n");
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("ééééé", 5), "ééééé");
        assert_eq!(truncate("ééééééé", 5), "éé...");
    }
}
