//! Rich-text markup touch-up
//!
//! Arcweave stores titles, content and labels as HTML. The dialogue runtime only
//! understands a small rich-text tag subset, so structural markup is removed,
//! paragraph boundaries become line breaks and emphasis is translated.

use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Tags the dialogue runtime renders itself
const RICH_TEXT_TAGS: &[&str] = &["b", "i", "u", "s", "color", "size"];

/// Element tags the authoring tool wraps code in
const HTML_TAGS: &[&str] = &[
    "a", "b", "blockquote", "br", "code", "div", "em", "h1", "h2", "h3", "h4", "h5", "h6", "i",
    "li", "mark", "ol", "p", "pre", "s", "span", "strong", "sub", "sup", "u", "ul",
];

/// Replacement for `/` in display names, which would otherwise read as a
/// hierarchy separator
pub const NAME_SLASH: char = '\u{2215}';

fn paragraph_break_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)</p>\s*<p(?:\s[^>]*)?>|<br\s*/?>").expect("valid regex")
    })
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"</?([A-Za-z][A-Za-z0-9]*)(?:[\s=][^<>]*)?/?>").expect("valid regex"))
}

fn sequence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[SEQUENCE:([^\]]*)\]").expect("valid regex"))
}

/// Convert authored rich text into display text.
///
/// `<em>`/`<strong>` become `<i>`/`<b>`, paragraphs are separated by a line
/// break, every tag outside the runtime's rich-text subset is removed and HTML
/// entities are decoded.
#[must_use]
pub fn touch_up(s: &str) -> String {
    if s.trim().is_empty() {
        return String::new();
    }

    let s = s
        .replace("<em>", "<i>")
        .replace("</em>", "</i>")
        .replace("<strong>", "<b>")
        .replace("</strong>", "</b>");
    let s = paragraph_break_regex().replace_all(&s, "\n");
    let s = tag_regex().replace_all(&s, |caps: &Captures| {
        let name = caps[1].to_ascii_lowercase();
        if RICH_TEXT_TAGS.contains(&name.as_str()) {
            caps[0].to_string()
        } else {
            String::new()
        }
    });
    decode_entities(&s).trim().to_string()
}

/// Remove every tag, keeping paragraph breaks as line breaks.
#[must_use]
pub fn strip_markup(s: &str) -> String {
    let s = paragraph_break_regex().replace_all(s, "\n");
    let s = tag_regex().replace_all(&s, "");
    decode_entities(&s).trim().to_string()
}

/// Remove markup from a code fragment.
///
/// Only authoring-tool element tags are removed, and an opening tag directly
/// after an operand is kept, so unspaced comparisons such as `x<y && y>z`
/// survive.
#[must_use]
pub fn strip_code_markup(code: &str) -> String {
    let s = paragraph_break_regex().replace_all(code, "\n");
    let s = tag_regex().replace_all(&s, |caps: &Captures| {
        let Some(whole) = caps.get(0) else {
            return String::new();
        };
        let name = caps[1].to_ascii_lowercase();
        let closing = whole.as_str().starts_with("</");
        let after_operand = s[..whole.start()]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric() || matches!(c, '_' | ')' | ']' | '"' | '\''));
        if HTML_TAGS.contains(&name.as_str()) && (closing || !after_operand) {
            String::new()
        } else {
            whole.as_str().to_string()
        }
    });
    decode_entities(&s).trim().to_string()
}

/// Single-line code, for branch titles.
#[must_use]
pub fn code_line(code: &str) -> String {
    strip_code_markup(code)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Single-line plain text, for titles and names.
#[must_use]
pub fn plain_line(s: &str) -> String {
    strip_markup(s)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Name usable as a sort key and conversation title segment.
#[must_use]
pub fn display_name(s: &str) -> String {
    plain_line(s).replace('/', &NAME_SLASH.to_string())
}

/// Decode the HTML entities the authoring tool emits.
#[must_use]
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

/// Split a `[SEQUENCE: ...]` directive out of display text.
///
/// Returns the trimmed directive body and the text with the directive removed,
/// or `None` when the text carries no directive.
#[must_use]
pub fn extract_sequence(text: &str) -> Option<(String, String)> {
    let caps = sequence_regex().captures(text)?;
    let whole = caps.get(0)?;
    let directive = caps[1].trim().to_string();
    let mut remaining = String::with_capacity(text.len());
    remaining.push_str(&text[..whole.start()]);
    remaining.push_str(&text[whole.end()..]);
    Some((directive, remaining))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraphs_become_lines() {
        assert_eq!(touch_up("<p>Hello</p><p>World</p>"), "Hello\nWorld");
        assert_eq!(touch_up("<p>One<br>Two</p>"), "One\nTwo");
    }

    #[test]
    fn test_emphasis_translated() {
        assert_eq!(
            touch_up("<p>I <em>really</em> <strong>mean</strong> it</p>"),
            "I <i>really</i> <b>mean</b> it"
        );
    }

    #[test]
    fn test_structural_markup_removed() {
        assert_eq!(
            touch_up(r#"<blockquote><span class="x">Quote &amp; more</span></blockquote>"#),
            "Quote & more"
        );
        assert_eq!(touch_up(r#"<a href="x">link</a>"#), "link");
    }

    #[test]
    fn test_rich_text_subset_kept() {
        assert_eq!(touch_up("<color=#ff0000>red</color>"), "<color=#ff0000>red</color>");
    }

    #[test]
    fn test_empty() {
        assert_eq!(touch_up(""), "");
        assert_eq!(touch_up("   "), "");
        assert_eq!(touch_up("<p></p>"), "");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("<p>Either/Or</p>"), "Either\u{2215}Or");
        assert_eq!(plain_line("<p>Line one</p><p>line two</p>"), "Line one line two");
    }

    #[test]
    fn test_code_markup_keeps_comparisons() {
        assert_eq!(strip_code_markup("<p>x<y && y>z</p>"), "x<y && y>z");
        assert_eq!(strip_code_markup("a<b and b>c"), "a<b and b>c");
        assert_eq!(strip_code_markup(r#"<p><span class="code">gold &gt; 1</span></p>"#), "gold > 1");
        assert_eq!(code_line("<p>a<b</p><p>or c</p>"), "a<b or c");
    }

    #[test]
    fn test_extract_sequence() {
        let (directive, text) = extract_sequence("Hello [SEQUENCE: Camera(Closeup)] there").unwrap();
        assert_eq!(directive, "Camera(Closeup)");
        assert_eq!(text, "Hello  there");
        assert!(extract_sequence("No directive").is_none());
    }
}
