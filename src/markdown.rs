//! Markdown to HTML rendering for model responses
//!
//! Model output is untrusted text. The renderer turns it into markup with a
//! small, fixed set of transformations applied in this order:
//!
//! 1. Fenced code blocks (```` ```lang ````), rendered with a language header
//!    and a copy action
//! 2. Inline code spans
//! 3. Bold (`**text**`) and italic (`*text*`)
//! 4. Links (`[text](url)`)
//! 5. Remaining newlines become `<br>`
//!
//! Fenced blocks are cut out of the input before anything else runs, and the
//! text between them is HTML-escaped exactly once before any inline rule
//! inserts tags. Inline code spans are swapped for placeholders while the
//! emphasis and link rules run, so those rules never see code contents but
//! can still wrap a code span.
//!
//! # Examples
//!
//! ```
//! use quillchat::markdown::render_markdown;
//!
//! let html = render_markdown("**hi** <there>");
//! assert_eq!(html, "<strong>hi</strong> &lt;there&gt;");
//! ```

use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Language tag used when a fenced block has none
pub const DEFAULT_LANGUAGE: &str = "plaintext";

/// Label of the copy action rendered in every code block header
pub const COPY_LABEL: &str = "Copy";

struct Patterns {
    fence: Regex,
    inline_code: Regex,
    bold: Regex,
    italic: Regex,
    link: Regex,
    placeholder: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        // Non-greedy so an unmatched opening fence never swallows the document
        fence: Regex::new(r"```(\w+)?\n([\s\S]*?)```").expect("Invalid regex pattern"),
        inline_code: Regex::new(r"`([^`]+)`").expect("Invalid regex pattern"),
        bold: Regex::new(r"\*\*(.+?)\*\*").expect("Invalid regex pattern"),
        italic: Regex::new(r"\*(.+?)\*").expect("Invalid regex pattern"),
        link: Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("Invalid regex pattern"),
        placeholder: Regex::new(r"\x1A(\d+)\x1A").expect("Invalid regex pattern"),
    })
}

/// Escape the characters that are significant in HTML text and attributes
///
/// # Examples
///
/// ```
/// use quillchat::markdown::escape_html;
///
/// assert_eq!(escape_html("<a href=\"x\">&</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
/// assert_eq!(escape_html("it's"), "it&#39;s");
/// ```
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Render text without any markdown interpretation
///
/// Used for user messages and for assistant messages when syntax
/// highlighting is turned off.
pub fn render_plain(text: &str) -> String {
    escape_html(text).replace('\n', "<br>")
}

/// Render a model response as HTML
///
/// The output is safe to embed in a document: every character of the input
/// ends up either escaped or inside markup produced by the renderer itself.
pub fn render_markdown(text: &str) -> String {
    let fence = &patterns().fence;
    let mut html = String::with_capacity(text.len() + text.len() / 2);
    let mut last = 0;

    for caps in fence.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        html.push_str(&render_inline(&text[last..whole.start()]));

        let language = caps.get(1).map_or(DEFAULT_LANGUAGE, |m| m.as_str());
        let code = caps.get(2).map_or("", |m| m.as_str());
        html.push_str(&code_block(language, code));

        last = whole.end();
    }

    html.push_str(&render_inline(&text[last..]));
    html
}

fn code_block(language: &str, code: &str) -> String {
    format!(
        concat!(
            "<div class=\"code-block\">",
            "<div class=\"code-block-header\">",
            "<span class=\"code-language\">{lang}</span>",
            "<button class=\"btn-copy-code\" data-action=\"copy-code\">{copy}</button>",
            "</div>",
            "<pre><code class=\"language-{lang}\">{code}</code></pre>",
            "</div>"
        ),
        lang = language,
        copy = COPY_LABEL,
        code = escape_html(code.trim()),
    )
}

/// Marks a code span placeholder; stripped from input so it cannot be forged
const PLACEHOLDER: char = '\u{1A}';

/// Render the prose between fenced blocks
fn render_inline(segment: &str) -> String {
    if segment.is_empty() {
        return String::new();
    }

    let p = patterns();
    let escaped = escape_html(&segment.replace(PLACEHOLDER, ""));

    let mut spans: Vec<String> = Vec::new();
    let masked = p.inline_code.replace_all(&escaped, |caps: &Captures<'_>| {
        spans.push(format!("<code>{}</code>", &caps[1]));
        format!("{0}{1}{0}", PLACEHOLDER, spans.len() - 1)
    });

    let html = render_emphasis_and_links(&masked);
    let html = p.placeholder.replace_all(&html, |caps: &Captures<'_>| {
        caps[1]
            .parse::<usize>()
            .ok()
            .and_then(|i| spans.get(i))
            .cloned()
            .unwrap_or_default()
    });

    html.replace('\n', "<br>")
}

/// Apply bold, italic and link rules to already-escaped text
fn render_emphasis_and_links(escaped: &str) -> String {
    let p = patterns();
    let text = p.bold.replace_all(escaped, "<strong>$1</strong>");
    let text = p.italic.replace_all(&text, "<em>$1</em>");
    let text = p.link.replace_all(&text, |caps: &Captures<'_>| {
        let label = &caps[1];
        let href = caps[2].trim();
        if is_safe_href(href) && !href.contains(PLACEHOLDER) {
            format!(
                "<a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a>",
                href, label
            )
        } else {
            caps[0].to_string()
        }
    });
    text.into_owned()
}

/// Only web, mail, fragment and relative targets become anchors
fn is_safe_href(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("mailto:")
    {
        return true;
    }
    // A scheme is anything before the first ':' that comes ahead of '/', '?' or '#'
    match lower.find([':', '/', '?', '#']) {
        Some(idx) => lower.as_bytes()[idx] != b':',
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html_escapes_markup_characters() {
        assert_eq!(escape_html("a < b && c > \"d\""), "a &lt; b &amp;&amp; c &gt; &quot;d&quot;");
    }

    #[test]
    fn test_escape_html_escapes_apostrophe() {
        assert_eq!(escape_html("it's"), "it&#39;s");
        assert_eq!(render_plain("don't"), "don&#39;t");
    }

    #[test]
    fn test_fenced_block_with_language() {
        let html = render_markdown("```rust\nfn main() {}\n```");
        assert!(html.contains("<span class=\"code-language\">rust</span>"));
        assert!(html.contains("<code class=\"language-rust\">fn main() {}</code>"));
        assert!(html.contains(COPY_LABEL));
    }

    #[test]
    fn test_fenced_block_defaults_to_plaintext() {
        let html = render_markdown("```\nhello\n```");
        assert!(html.contains("<span class=\"code-language\">plaintext</span>"));
        assert!(html.contains("class=\"language-plaintext\""));
    }

    #[test]
    fn test_fenced_block_body_is_escaped() {
        let html = render_markdown("```html\n<script>alert('x')</script>\n```");
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_fenced_block_body_is_not_emphasized() {
        let html = render_markdown("```python\nx = a * b * c\ny = **kwargs\n```");
        assert!(!html.contains("<em>"));
        assert!(!html.contains("<strong>"));
        assert!(html.contains("x = a * b * c\ny = **kwargs"));
    }

    #[test]
    fn test_fenced_block_keeps_newlines_inside_pre() {
        let html = render_markdown("```\nline one\nline two\n```");
        assert!(html.contains("line one\nline two"));
        assert!(!html.contains("line one<br>"));
    }

    #[test]
    fn test_two_fenced_blocks_are_matched_separately() {
        let html = render_markdown("```a\none\n```\nbetween\n```b\ntwo\n```");
        assert!(html.contains("language-a\">one<"));
        assert!(html.contains("language-b\">two<"));
        assert!(html.contains("between"));
    }

    #[test]
    fn test_unclosed_fence_stays_literal() {
        let html = render_markdown("intro\n```python\nprint(1)");
        assert_eq!(html, "intro<br>```python<br>print(1)");
    }

    #[test]
    fn test_inline_code() {
        let html = render_markdown("run `cargo build` now");
        assert_eq!(html, "run <code>cargo build</code> now");
    }

    #[test]
    fn test_inline_code_hides_emphasis_markers() {
        let html = render_markdown("use `**kwargs` here");
        assert_eq!(html, "use <code>**kwargs</code> here");
    }

    #[test]
    fn test_inline_code_content_is_escaped_once() {
        let html = render_markdown("`<div>`");
        assert_eq!(html, "<code>&lt;div&gt;</code>");
    }

    #[test]
    fn test_bold_wraps_inline_code() {
        assert_eq!(
            render_markdown("**run `cargo test` first**"),
            "<strong>run <code>cargo test</code> first</strong>"
        );
    }

    #[test]
    fn test_link_label_may_be_inline_code() {
        let html = render_markdown("see [`Vec`](https://doc.rust-lang.org/std/vec/)");
        assert_eq!(
            html,
            "see <a href=\"https://doc.rust-lang.org/std/vec/\" target=\"_blank\" rel=\"noopener\"><code>Vec</code></a>"
        );
    }

    #[test]
    fn test_inline_code_as_link_target_stays_literal() {
        let html = render_markdown("[x](`y`)");
        assert_eq!(html, "[x](<code>y</code>)");
    }

    #[test]
    fn test_placeholder_marker_in_input_is_dropped() {
        assert_eq!(render_markdown("a\u{1A}0\u{1A}b `c`"), "a0b <code>c</code>");
    }

    #[test]
    fn test_bold_and_italic() {
        assert_eq!(render_markdown("**bold**"), "<strong>bold</strong>");
        assert_eq!(render_markdown("*it*"), "<em>it</em>");
        assert_eq!(
            render_markdown("**a** and *b*"),
            "<strong>a</strong> and <em>b</em>"
        );
    }

    #[test]
    fn test_emphasis_does_not_span_lines() {
        assert_eq!(render_markdown("*a\nb*"), "*a<br>b*");
    }

    #[test]
    fn test_link_opens_new_context() {
        let html = render_markdown("[docs](https://example.com/a?b=1&c=2)");
        assert_eq!(
            html,
            "<a href=\"https://example.com/a?b=1&amp;c=2\" target=\"_blank\" rel=\"noopener\">docs</a>"
        );
    }

    #[test]
    fn test_relative_link_is_allowed() {
        let html = render_markdown("[up](../index.html)");
        assert!(html.starts_with("<a href=\"../index.html\""));
    }

    #[test]
    fn test_script_link_is_left_as_text() {
        let html = render_markdown("[x](javascript:alert)");
        assert_eq!(html, "[x](javascript:alert)");
    }

    #[test]
    fn test_link_cannot_break_out_of_attribute() {
        let html = render_markdown("[x](https://a.test/\"onmouseover=\"y)");
        assert!(html.contains("&quot;onmouseover=&quot;y"));
        assert!(!html.contains("\"onmouseover"));
    }

    #[test]
    fn test_newlines_become_breaks() {
        assert_eq!(render_markdown("a\nb\n"), "a<br>b<br>");
    }

    #[test]
    fn test_raw_html_in_prose_is_escaped() {
        let html = render_markdown("<img src=x onerror=alert(1)>");
        assert_eq!(html, "&lt;img src=x onerror=alert(1)&gt;");
    }

    #[test]
    fn test_plain_text_rendering_is_idempotent() {
        let text = "Just a sentence with no markup at all";
        let once = render_markdown(text);
        assert_eq!(once, text);
        assert_eq!(render_markdown(&once), once);
    }

    #[test]
    fn test_render_plain_ignores_markdown() {
        assert_eq!(render_plain("**x**\n<y>"), "**x**<br>&lt;y&gt;");
    }

    #[test]
    fn test_is_safe_href() {
        assert!(is_safe_href("https://example.com"));
        assert!(is_safe_href("mailto:a@b.c"));
        assert!(is_safe_href("#section"));
        assert!(is_safe_href("docs/page.html"));
        assert!(is_safe_href("/a:b"));
        assert!(!is_safe_href("javascript:void(0"));
        assert!(!is_safe_href("data:text/html,hi"));
    }
}
