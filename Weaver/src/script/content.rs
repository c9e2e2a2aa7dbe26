//! Content lexer and inline conditional splitting
//!
//! Element content interleaves display text with code blocks. Lexing yields
//! alternating [`Piece::Text`] and [`Piece::Code`] tokens; [`split_content`]
//! then runs a small state machine over them, routing text and statements
//! either to the owning entry or to the arms of an `if`/`elseif`/`else`/`endif`
//! region.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

fn code_open_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:<pre(?:\s[^>]*)?>\s*)?<code(?:\s[^>]*)?>").expect("valid regex")
    })
}

fn code_close_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)</code>(?:\s*</pre>)?").expect("valid regex"))
}

/// A code block was opened but never closed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("code block opened at byte {offset} is never closed")]
pub struct UnterminatedCode {
    pub offset: usize,
}

/// A lexed slice of content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Piece<'a> {
    Text(&'a str),
    Code(&'a str),
}

/// Whether `content` embeds any code block.
#[must_use]
pub fn has_code(content: &str) -> bool {
    code_open_regex().is_match(content)
}

/// Lex content into text and code pieces. Empty text between blocks is dropped.
pub fn lex(content: &str) -> Result<Vec<Piece<'_>>, UnterminatedCode> {
    let mut pieces = Vec::new();
    let mut pos = 0;

    while let Some(open) = code_open_regex().find_at(content, pos) {
        if open.start() > pos {
            pieces.push(Piece::Text(&content[pos..open.start()]));
        }
        let close = code_close_regex()
            .find_at(content, open.end())
            .ok_or(UnterminatedCode {
                offset: open.start(),
            })?;
        pieces.push(Piece::Code(&content[open.end()..close.start()]));
        pos = close.end();
    }

    if pos < content.len() {
        pieces.push(Piece::Text(&content[pos..]));
    }
    Ok(pieces)
}

/// Meaning of a single code block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive<'a> {
    If(&'a str),
    ElseIf(&'a str),
    Else,
    EndIf,
    Statement(&'a str),
}

/// Strip `keyword` when it stands alone at the start of `code`.
fn strip_keyword<'a>(code: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = code.strip_prefix(keyword)?;
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if c.is_whitespace() || c == '(' => Some(rest.trim()),
        Some(_) => None,
    }
}

/// Classify a code block by its leading keyword.
#[must_use]
pub fn classify(code: &str) -> Directive<'_> {
    let code = code.trim();
    if let Some(rest) = strip_keyword(code, "endif") {
        if rest.is_empty() {
            return Directive::EndIf;
        }
    }
    if let Some(cond) = strip_keyword(code, "elseif") {
        return Directive::ElseIf(cond);
    }
    if let Some(rest) = strip_keyword(code, "else") {
        if rest.is_empty() {
            return Directive::Else;
        }
        if let Some(cond) = strip_keyword(rest, "if") {
            return Directive::ElseIf(cond);
        }
    }
    if let Some(cond) = strip_keyword(code, "if") {
        return Directive::If(cond);
    }
    Directive::Statement(code)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmKind {
    If,
    ElseIf,
    Else,
}

/// One arm of a conditional region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arm<'a> {
    pub kind: ArmKind,
    /// Raw condition fragment, empty for `else`
    pub condition: &'a str,
    /// Raw text buffered inside the arm
    pub text: String,
    /// Raw statements buffered inside the arm
    pub statements: Vec<&'a str>,
}

impl<'a> Arm<'a> {
    fn new(kind: ArmKind, condition: &'a str) -> Self {
        Self {
            kind,
            condition,
            text: String::new(),
            statements: Vec::new(),
        }
    }
}

/// An `if ... endif` region and the text following it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region<'a> {
    pub arms: Vec<Arm<'a>>,
    /// Raw text between this region's `endif` and the next region
    pub after_text: String,
}

/// Content routed to its destinations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitContent<'a> {
    /// Raw text before the first region
    pub text: String,
    /// Raw statements outside every region, in encounter order
    pub statements: Vec<&'a str>,
    pub regions: Vec<Region<'a>>,
}

impl SplitContent<'_> {
    #[must_use]
    pub fn has_regions(&self) -> bool {
        !self.regions.is_empty()
    }
}

/// Route lexed pieces to the owner or to region arms.
///
/// Malformed input is recovered rather than rejected: a nested `if` closes the
/// open region, stray `elseif`/`else`/`endif` are ignored and a missing `endif`
/// closes the region at the end of the content. Each case is logged.
#[must_use]
pub fn split_pieces<'a>(pieces: &[Piece<'a>], owner: &str) -> SplitContent<'a> {
    let mut split = SplitContent::default();
    let mut open: Option<Region<'a>> = None;

    for piece in pieces {
        match *piece {
            Piece::Text(text) => {
                if let Some(arm) = open.as_mut().and_then(|r| r.arms.last_mut()) {
                    arm.text.push_str(text);
                } else if let Some(region) = split.regions.last_mut() {
                    region.after_text.push_str(text);
                } else {
                    split.text.push_str(text);
                }
            }
            Piece::Code(code) => match classify(code) {
                Directive::If(cond) => {
                    if let Some(region) = open.take() {
                        tracing::warn!("{}: nested if, closing the enclosing block first", owner);
                        split.regions.push(region);
                    }
                    open = Some(Region {
                        arms: vec![Arm::new(ArmKind::If, cond)],
                        after_text: String::new(),
                    });
                }
                Directive::ElseIf(cond) => match open.as_mut() {
                    Some(region) => {
                        if region.arms.iter().any(|a| a.kind == ArmKind::Else) {
                            tracing::warn!("{}: elseif after else", owner);
                        }
                        region.arms.push(Arm::new(ArmKind::ElseIf, cond));
                    }
                    None => tracing::warn!("{}: elseif outside an if block ignored", owner),
                },
                Directive::Else => match open.as_mut() {
                    Some(region) => region.arms.push(Arm::new(ArmKind::Else, "")),
                    None => tracing::warn!("{}: else outside an if block ignored", owner),
                },
                Directive::EndIf => match open.take() {
                    Some(region) => split.regions.push(region),
                    None => tracing::warn!("{}: endif outside an if block ignored", owner),
                },
                Directive::Statement(stmt) => {
                    if stmt.is_empty() {
                        continue;
                    }
                    match open.as_mut().and_then(|r| r.arms.last_mut()) {
                        Some(arm) => arm.statements.push(stmt),
                        None => split.statements.push(stmt),
                    }
                }
            },
        }
    }

    if let Some(region) = open {
        tracing::warn!("{}: if block without endif, closing at end of content", owner);
        split.regions.push(region);
    }
    split
}

/// Lex and split `content` in one step.
pub fn split_content<'a>(content: &'a str, owner: &str) -> Result<SplitContent<'a>, UnterminatedCode> {
    let pieces = lex(content)?;
    Ok(split_pieces(&pieces, owner))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lex_plain_text() {
        assert_eq!(lex("<p>Hello</p>").unwrap(), vec![Piece::Text("<p>Hello</p>")]);
        assert!(!has_code("<p>Hello</p>"));
    }

    #[test]
    fn test_lex_code_delimiters() {
        let pieces = lex("A<pre><code>x = 1</code></pre>B<code>y</code>").unwrap();
        assert_eq!(
            pieces,
            vec![
                Piece::Text("A"),
                Piece::Code("x = 1"),
                Piece::Text("B"),
                Piece::Code("y"),
            ]
        );
    }

    #[test]
    fn test_lex_unterminated() {
        let err = lex("Hi <code>x = 1").unwrap_err();
        assert_eq!(err.offset, 3);
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(" if x > 1 "), Directive::If("x > 1"));
        assert_eq!(classify("if(x)"), Directive::If("(x)"));
        assert_eq!(classify("elseif y"), Directive::ElseIf("y"));
        assert_eq!(classify("else if y"), Directive::ElseIf("y"));
        assert_eq!(classify("else"), Directive::Else);
        assert_eq!(classify("endif"), Directive::EndIf);
        assert_eq!(classify("iffy = 2"), Directive::Statement("iffy = 2"));
        assert_eq!(classify("elsewhere += 1"), Directive::Statement("elsewhere += 1"));
    }

    #[test]
    fn test_split_single_region() {
        let split = split_content("Before <code>if x</code>mid<code>endif</code>After", "e1").unwrap();
        assert_eq!(split.text, "Before ");
        assert!(split.statements.is_empty());
        assert_eq!(split.regions.len(), 1);
        let region = &split.regions[0];
        assert_eq!(region.arms.len(), 1);
        assert_eq!(region.arms[0].kind, ArmKind::If);
        assert_eq!(region.arms[0].condition, "x");
        assert_eq!(region.arms[0].text, "mid");
        assert_eq!(region.after_text, "After");
    }

    #[test]
    fn test_split_all_arms() {
        let content = "<code>gold += 1</code>\
            <code>if a</code>A<code>coins = 1</code>\
            <code>elseif b</code>B\
            <code>else</code>C\
            <code>endif</code>Done";
        let split = split_content(content, "e1").unwrap();
        assert_eq!(split.statements, vec!["gold += 1"]);
        let arms = &split.regions[0].arms;
        let kinds: Vec<ArmKind> = arms.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![ArmKind::If, ArmKind::ElseIf, ArmKind::Else]);
        assert_eq!(arms[0].statements, vec!["coins = 1"]);
        assert_eq!(arms[1].condition, "b");
        assert_eq!(arms[2].text, "C");
        assert_eq!(split.regions[0].after_text, "Done");
    }

    #[test]
    fn test_split_chained_regions() {
        let content = "<code>if a</code>A<code>endif</code>mid<code>if b</code>B<code>endif</code>end";
        let split = split_content(content, "e1").unwrap();
        assert_eq!(split.text, "");
        assert_eq!(split.regions.len(), 2);
        assert_eq!(split.regions[0].after_text, "mid");
        assert_eq!(split.regions[1].after_text, "end");
    }

    #[test]
    fn test_split_recovers_malformed() {
        let split = split_content("<code>endif</code>X<code>if a</code>A<code>if b</code>B", "e1").unwrap();
        assert_eq!(split.text, "X");
        assert_eq!(split.regions.len(), 2);
        assert_eq!(split.regions[0].arms[0].text, "A");
        assert_eq!(split.regions[1].arms[0].text, "B");
    }
}
