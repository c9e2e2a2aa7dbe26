//! Shared fixtures: a project builder and a tiny guard evaluator.

#![allow(dead_code)]

use std::collections::HashMap;

use serde_json::{Map, Value, json};
use weaver::formats::arcweave::ArcweaveProject;
use weaver::formats::database::{DialogueDatabase, DialogueEntry, Field};

pub const ROOT: &str = "root";

/// Builds Arcweave project documents in the export's JSON shape.
pub struct ProjectBuilder {
    doc: Value,
}

impl ProjectBuilder {
    pub fn new(name: &str) -> Self {
        let doc = json!({
            "name": name,
            "boards": { ROOT: { "name": name, "root": true } },
            "elements": {}, "connections": {}, "branches": {}, "jumpers": {},
            "components": {}, "variables": {}, "conditions": {}
        });
        Self { doc }
    }

    fn table(&mut self, key: &str) -> &mut Map<String, Value> {
        self.doc[key].as_object_mut().unwrap()
    }

    fn push(&mut self, table: &str, id: &str, field: &str, value: &str) {
        let list = self.doc[table][id]
            .as_object_mut()
            .unwrap()
            .entry(field)
            .or_insert_with(|| json!([]));
        list.as_array_mut().unwrap().push(json!(value));
    }

    pub fn board(mut self, id: &str, name: &str, parent: &str) -> Self {
        self.table("boards").insert(id.into(), json!({ "name": name }));
        self.push("boards", parent, "children", id);
        self
    }

    pub fn element(mut self, board: &str, id: &str, title: &str, content: &str) -> Self {
        self.table("elements")
            .insert(id.into(), json!({ "title": title, "content": content }));
        self.push("boards", board, "elements", id);
        self
    }

    pub fn element_components(mut self, id: &str, components: &[&str]) -> Self {
        self.doc["elements"][id]["components"] = json!(components);
        self
    }

    pub fn linked_board(mut self, element: &str, board: &str) -> Self {
        self.doc["elements"][element]["linkedBoard"] = json!(board);
        self
    }

    /// Connection `from -> to`, registered as an output of `from` when it is an element.
    pub fn connection(mut self, board: &str, id: &str, from: &str, to: &str, label: &str) -> Self {
        self.table("connections").insert(
            id.into(),
            json!({ "label": label, "sourceid": from, "targetid": to }),
        );
        self.push("boards", board, "connections", id);
        if self.doc["elements"].get(from).is_some() {
            self.push("elements", from, "outputs", id);
        }
        self
    }

    pub fn outputs(mut self, element: &str, outputs: &[&str]) -> Self {
        self.doc["elements"][element]["outputs"] = json!(outputs);
        self
    }

    /// Branch with an if condition, elseif conditions and an optional else,
    /// each given as `(condition id, script)`.
    pub fn branch(
        mut self,
        board: &str,
        id: &str,
        if_condition: (&str, &str),
        else_ifs: &[(&str, &str)],
        else_condition: Option<&str>,
    ) -> Self {
        let conditions = self.table("conditions");
        conditions.insert(if_condition.0.into(), json!({ "script": if_condition.1 }));
        for (cid, script) in else_ifs {
            conditions.insert((*cid).into(), json!({ "script": script }));
        }
        if let Some(cid) = else_condition {
            conditions.insert(cid.into(), json!({ "script": null }));
        }
        let else_if_ids: Vec<&str> = else_ifs.iter().map(|(cid, _)| *cid).collect();
        self.table("branches").insert(
            id.into(),
            json!({ "conditions": {
                "ifCondition": if_condition.0,
                "elseIfConditions": else_if_ids,
                "elseCondition": else_condition
            } }),
        );
        self.push("boards", board, "branches", id);
        self
    }

    pub fn jumper(mut self, board: &str, id: &str, target: &str) -> Self {
        self.table("jumpers").insert(id.into(), json!({ "elementId": target }));
        self.push("boards", board, "jumpers", id);
        self
    }

    pub fn component(mut self, id: &str, name: &str) -> Self {
        self.table("components").insert(id.into(), json!({ "name": name }));
        self
    }

    pub fn variable(mut self, id: &str, name: &str, kind: &str, value: Value) -> Self {
        self.table("variables")
            .insert(id.into(), json!({ "name": name, "type": kind, "value": value }));
        self
    }

    pub fn json(&self) -> String {
        serde_json::to_string_pretty(&self.doc).unwrap()
    }

    pub fn build(self) -> ArcweaveProject {
        serde_json::from_value(self.doc).unwrap()
    }
}

/// Entry carrying `Guid` field `source`.
pub fn entry_from<'a>(db: &'a DialogueDatabase, source: &str) -> &'a DialogueEntry {
    db.conversations
        .iter()
        .flat_map(|c| &c.entries)
        .find(|e| Field::lookup(&e.fields, "Guid") == Some(source))
        .unwrap_or_else(|| panic!("no entry imported from {source}"))
}

/// Entries reached from `entry`'s links, in link order.
pub fn targets<'a>(db: &'a DialogueDatabase, entry: &DialogueEntry) -> Vec<&'a DialogueEntry> {
    entry
        .outgoing_links
        .iter()
        .map(|l| {
            db.entry(l.destination_conversation_id, l.destination_entry_id)
                .expect("link target exists")
        })
        .collect()
}

// =============================================================================
// Guard evaluator
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Val {
    Num(f64),
    Bool(bool),
}

impl Val {
    fn truthy(self) -> bool {
        match self {
            Val::Bool(b) => b,
            Val::Num(n) => n != 0.0,
        }
    }

    fn num(self) -> f64 {
        match self {
            Val::Num(n) => n,
            Val::Bool(b) => f64::from(u8::from(b)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open,
    Close,
    Not,
    And,
    Or,
    Cmp(&'static str),
    Num(f64),
    Bool(bool),
    Var(String),
}

fn tokenize(expr: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut rest = expr.trim_start();
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("Variable[\"") {
            let end = after.find("\"]").expect("closed variable reference");
            tokens.push(Token::Var(after[..end].to_string()));
            rest = &after[end + 2..];
        } else if let Some(op) = ["==", "~=", "<=", ">=", "<", ">"]
            .into_iter()
            .find(|op| rest.starts_with(op))
        {
            tokens.push(Token::Cmp(op));
            rest = &rest[op.len()..];
        } else if rest.starts_with('(') {
            tokens.push(Token::Open);
            rest = &rest[1..];
        } else if rest.starts_with(')') {
            tokens.push(Token::Close);
            rest = &rest[1..];
        } else {
            let end = rest
                .find(|c: char| c.is_whitespace() || "()<>=~".contains(c))
                .unwrap_or(rest.len());
            let word = &rest[..end];
            tokens.push(match word {
                "not" => Token::Not,
                "and" => Token::And,
                "or" => Token::Or,
                "true" => Token::Bool(true),
                "false" => Token::Bool(false),
                number => Token::Num(number.parse().unwrap_or_else(|_| panic!("bad token {number}"))),
            });
            rest = &rest[end..];
        }
        rest = rest.trim_start();
    }
    tokens
}

struct Parser<'e> {
    tokens: Vec<Token>,
    pos: usize,
    env: &'e HashMap<String, Val>,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        self.pos += 1;
        token
    }

    fn or(&mut self) -> Val {
        let mut value = self.and();
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let rhs = self.and();
            value = Val::Bool(value.truthy() || rhs.truthy());
        }
        value
    }

    fn and(&mut self) -> Val {
        let mut value = self.unary();
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let rhs = self.unary();
            value = Val::Bool(value.truthy() && rhs.truthy());
        }
        value
    }

    fn unary(&mut self) -> Val {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            return Val::Bool(!self.unary().truthy());
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Val {
        let lhs = self.primary();
        let Some(Token::Cmp(op)) = self.peek().cloned() else {
            return lhs;
        };
        self.pos += 1;
        let rhs = self.primary();
        let (a, b) = (lhs.num(), rhs.num());
        Val::Bool(match op {
            "==" => a == b,
            "~=" => a != b,
            "<" => a < b,
            ">" => a > b,
            "<=" => a <= b,
            _ => a >= b,
        })
    }

    fn primary(&mut self) -> Val {
        match self.next() {
            Token::Open => {
                let value = self.or();
                assert_eq!(self.next(), Token::Close, "unbalanced parentheses");
                value
            }
            Token::Num(n) => Val::Num(n),
            Token::Bool(b) => Val::Bool(b),
            Token::Var(name) => *self
                .env
                .get(&name)
                .unwrap_or_else(|| panic!("unbound variable {name}")),
            other => panic!("unexpected token {other:?}"),
        }
    }
}

/// Evaluate a guard in the runtime dialect; an empty guard always holds.
pub fn eval_guard(expr: &str, env: &HashMap<String, Val>) -> bool {
    if expr.trim().is_empty() {
        return true;
    }
    let mut parser = Parser {
        tokens: tokenize(expr),
        pos: 0,
        env,
    };
    let value = parser.or();
    assert_eq!(parser.pos, parser.tokens.len(), "trailing tokens in {expr}");
    value.truthy()
}
