//! Arcscript to runtime-script transpilation
//!
//! Arcweave code uses C-like operators (`!=`, `!`, `&&`, `||`), the word forms
//! `is`/`is not`, bare variable names and `+=`/`-=` shorthand. The dialogue
//! runtime expects Lua-style operators and variables addressed through the
//! `Variable[...]` table. Translation works on tokens so string literals,
//! function names and member accesses are never rewritten.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use super::markup::strip_code_markup;

/// Words that are never treated as variable names
pub const RESERVED_WORDS: &[&str] = &[
    "if", "elseif", "else", "endif", "is", "not", "and", "or", "true", "false", "abs", "sqr",
    "sqrt", "random", "reset", "resetAll", "roll", "show", "visits", "min", "max",
];

/// Variable holding the active player's prefix in multiplayer projects
pub const ACTOR_INDEX_VARIABLE: &str = "ActorIndex";

fn visits_mention_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)visits\(\s*<[^>]*?data-id="([^"]*)"[^>]*>.*?</[A-Za-z]+>\s*\)"#)
            .expect("valid regex")
    })
}

fn visits_empty_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"visits\(\s*\)").expect("valid regex"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Ident(&'a str),
    Number(&'a str),
    Str(&'a str),
    Space(&'a str),
    Symbol(&'a str),
}

const TWO_CHAR_SYMBOLS: &[&str] = &["!=", "==", "<=", ">=", "&&", "||", "+=", "-=", ".."];

fn tokenize(code: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut chars = code.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let mut end = start + c.len_utf8();
        let token = if c.is_alphabetic() || c == '_' {
            while let Some(&(i, n)) = chars.peek() {
                if !(n.is_alphanumeric() || n == '_') {
                    break;
                }
                end = i + n.len_utf8();
                chars.next();
            }
            Token::Ident(&code[start..end])
        } else if c.is_ascii_digit() {
            while let Some(&(i, n)) = chars.peek() {
                let fraction = n == '.'
                    && code[i + 1..].starts_with(|d: char| d.is_ascii_digit())
                    && !code[start..i].contains('.');
                if !(n.is_ascii_digit() || fraction) {
                    break;
                }
                end = i + n.len_utf8();
                chars.next();
            }
            Token::Number(&code[start..end])
        } else if c == '"' || c == '\'' {
            let mut escaped = false;
            for (i, n) in chars.by_ref() {
                end = i + n.len_utf8();
                if escaped {
                    escaped = false;
                } else if n == '\\' {
                    escaped = true;
                } else if n == c {
                    break;
                }
            }
            Token::Str(&code[start..end])
        } else if c.is_whitespace() {
            while let Some(&(i, n)) = chars.peek() {
                if !n.is_whitespace() {
                    break;
                }
                end = i + n.len_utf8();
                chars.next();
            }
            Token::Space(&code[start..end])
        } else {
            let pair = code.get(start..start + 2);
            if let Some(pair) = pair.filter(|p| TWO_CHAR_SYMBOLS.contains(p)) {
                chars.next();
                end = start + 2;
                Token::Symbol(pair)
            } else {
                Token::Symbol(&code[start..end])
            }
        };
        tokens.push(token);
    }
    tokens
}

/// Append a word operator, keeping it separated from its neighbours.
fn push_word(out: &mut String, word: &str, next: Option<&Token<'_>>) {
    if out.chars().next_back().is_some_and(|c| !c.is_whitespace() && c != '(') {
        out.push(' ');
    }
    out.push_str(word);
    if next.is_some_and(|t| !matches!(t, Token::Space(_) | Token::Symbol(")"))) {
        out.push(' ');
    }
}

/// Translates Arcscript fragments for one import run
#[derive(Debug, Clone, Default)]
pub struct Transpiler {
    variables: HashSet<String>,
    globals: HashSet<String>,
    num_players: u32,
}

impl Transpiler {
    /// Create a transpiler that recognizes `variables` as variable names.
    pub fn new<I, S>(variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            variables: variables.into_iter().map(Into::into).collect(),
            globals: HashSet::new(),
            num_players: 1,
        }
    }

    /// Namespace non-global variables per player when `num_players > 1`.
    #[must_use]
    pub fn with_players(mut self, num_players: u32, globals: HashSet<String>) -> Self {
        self.num_players = num_players.max(1);
        self.globals = globals;
        self
    }

    #[must_use]
    pub fn is_multiplayer(&self) -> bool {
        self.num_players > 1
    }

    /// Variables shared by every player profile.
    #[must_use]
    pub fn is_global(&self, name: &str) -> bool {
        name.starts_with("global") || self.globals.contains(name)
    }

    #[must_use]
    pub fn is_variable(&self, name: &str) -> bool {
        self.variables.contains(name)
    }

    /// Runtime reference to variable `name`.
    #[must_use]
    pub fn variable_reference(&self, name: &str) -> String {
        if self.is_multiplayer() && !self.is_global(name) {
            format!("Variable[Variable[\"{ACTOR_INDEX_VARIABLE}\"] .. \"_{name}\"]")
        } else {
            format!("Variable[\"{name}\"]")
        }
    }

    /// Translate a guard expression.
    #[must_use]
    pub fn condition(&self, code: &str) -> String {
        self.translate(code, false)
    }

    /// Translate side-effect statements, desugaring `+=`/`-=`.
    #[must_use]
    pub fn statement(&self, code: &str) -> String {
        self.translate(code, true)
    }

    fn translate(&self, code: &str, statements: bool) -> String {
        if code.trim().is_empty() {
            return String::new();
        }

        let code = visits_mention_regex().replace_all(code, r#"visits("$1")"#);
        let code = strip_code_markup(&code);
        let code = visits_empty_regex().replace_all(&code, r#"visits("")"#);
        let tokens = tokenize(&code);

        let mut out = String::with_capacity(code.len() + 16);
        let mut last_operand: Option<String> = None;
        let mut i = 0;

        while i < tokens.len() {
            let token = tokens[i];
            let next = next_significant(&tokens, i + 1);
            match token {
                Token::Ident("is") => {
                    if let Some(j) = next.filter(|&j| tokens[j] == Token::Ident("not")) {
                        push_word(&mut out, "~=", tokens.get(j + 1));
                        i = j;
                    } else {
                        push_word(&mut out, "==", tokens.get(i + 1));
                    }
                }
                Token::Ident(name) => {
                    let is_call = next.is_some_and(|j| tokens[j] == Token::Symbol("("));
                    let is_member = prev_significant(&tokens, i)
                        .is_some_and(|j| tokens[j] == Token::Symbol("."));
                    if !is_call
                        && !is_member
                        && !RESERVED_WORDS.contains(&name)
                        && self.is_variable(name)
                    {
                        let reference = self.variable_reference(name);
                        out.push_str(&reference);
                        last_operand = Some(reference);
                    } else {
                        out.push_str(name);
                        last_operand = Some(name.to_string());
                    }
                }
                Token::Symbol("!=") => out.push_str("~="),
                Token::Symbol("!") => push_word(&mut out, "not", tokens.get(i + 1)),
                Token::Symbol("&&") => push_word(&mut out, "and", tokens.get(i + 1)),
                Token::Symbol("||") => push_word(&mut out, "or", tokens.get(i + 1)),
                Token::Symbol(op @ ("+=" | "-=")) if statements => match &last_operand {
                    Some(operand) => {
                        out.push_str("= ");
                        out.push_str(operand);
                        out.push(' ');
                        out.push_str(&op[..1]);
                    }
                    None => {
                        tracing::warn!("No variable before '{}' in: {}", op, code);
                        out.push_str(op);
                    }
                },
                Token::Symbol(s @ (";" | "\n")) => {
                    out.push_str(s);
                    last_operand = None;
                }
                Token::Space(s) => {
                    if s.contains('\n') {
                        last_operand = None;
                    }
                    out.push_str(s);
                }
                Token::Number(s) | Token::Str(s) | Token::Symbol(s) => out.push_str(s),
            }
            i += 1;
        }
        out.trim().to_string()
    }
}

fn next_significant(tokens: &[Token<'_>], from: usize) -> Option<usize> {
    (from..tokens.len()).find(|&j| !matches!(tokens[j], Token::Space(_)))
}

fn prev_significant(tokens: &[Token<'_>], before: usize) -> Option<usize> {
    (0..before).rev().find(|&j| !matches!(tokens[j], Token::Space(_)))
}
