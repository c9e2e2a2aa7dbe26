//! Condition normalization
//!
//! The runtime evaluates every outgoing guard independently, so an
//! `if`/`elseif`/`else` chain has to be rewritten into guards that are mutually
//! exclusive on their own. [`GuardChain`] keeps the cumulative condition (the
//! disjunction of every own expression seen so far) and derives each sibling's
//! guard from it.

use crate::formats::arcweave::{Branch, Condition, NodeCatalog};
use crate::script::content::ArmKind;
use crate::script::markup::code_line;
use crate::script::transpile::Transpiler;

/// Whether `expr` is one parenthesized group, e.g. `(a or b)` but not `(a) or (b)`.
#[must_use]
pub fn is_parenthesized(expr: &str) -> bool {
    let expr = expr.trim();
    if !expr.starts_with('(') || !expr.ends_with(')') {
        return false;
    }

    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in expr.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i == expr.len() - 1;
                }
            }
            (None, _) => {}
        }
    }
    false
}

/// Parenthesize `expr` unless it already is a single group.
#[must_use]
pub fn wrap(expr: &str) -> String {
    let expr = expr.trim();
    if is_parenthesized(expr) {
        expr.to_string()
    } else {
        format!("({expr})")
    }
}

/// Guard state for one conditional chain
#[derive(Debug, Clone, Default)]
pub struct GuardChain {
    own: Vec<String>,
}

impl GuardChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The disjunction of every own expression so far, if any.
    #[must_use]
    pub fn cumulative(&self) -> Option<String> {
        match self.own.as_slice() {
            [] => None,
            [single] => Some(single.clone()),
            many => Some(
                many.iter()
                    .map(|e| wrap(e))
                    .collect::<Vec<_>>()
                    .join(" or "),
            ),
        }
    }

    /// Guard of the `if` arm: its own expression. Restarts the chain.
    ///
    /// A blank expression yields an unconditional guard and makes every later
    /// sibling unreachable.
    pub fn if_guard(&mut self, expr: &str) -> String {
        self.own.clear();
        let expr = expr.trim();
        if expr.is_empty() {
            self.own.push("true".to_string());
        } else {
            self.own.push(expr.to_string());
        }
        expr.to_string()
    }

    /// Guard of an `elseif` arm: `(not cumulative) and (own)`.
    ///
    /// Without an own expression the guard is `not cumulative` and the chain is
    /// left unchanged.
    pub fn elseif_guard(&mut self, expr: &str) -> String {
        let expr = expr.trim();
        match (self.cumulative(), expr.is_empty()) {
            (None, true) => String::new(),
            (None, false) => {
                self.own.push(expr.to_string());
                expr.to_string()
            }
            (Some(cumulative), true) => format!("not {}", wrap(&cumulative)),
            (Some(cumulative), false) => {
                self.own.push(expr.to_string());
                format!("(not {}) and {}", wrap(&cumulative), wrap(expr))
            }
        }
    }

    /// Guard of the `else` arm: `not cumulative`.
    #[must_use]
    pub fn else_guard(&self) -> String {
        self.cumulative()
            .map(|cumulative| format!("not {}", wrap(&cumulative)))
            .unwrap_or_default()
    }

    /// Guard for an arm of `kind` with raw expression `expr`.
    pub fn guard(&mut self, kind: ArmKind, expr: &str) -> String {
        match kind {
            ArmKind::If => self.if_guard(expr),
            ArmKind::ElseIf => self.elseif_guard(expr),
            ArmKind::Else => self.else_guard(),
        }
    }
}

/// A branch condition ready to become a guard entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardedCondition<'a> {
    /// Source condition id
    pub id: &'a str,
    pub kind: ArmKind,
    /// `if <script>`, `elseif <script>` or `else`
    pub title: String,
    /// Normalized guard in the runtime dialect
    pub guard: String,
}

/// Title shown for an arm in the dialogue editor.
#[must_use]
pub fn arm_title(kind: ArmKind, script: &str) -> String {
    let script = code_line(script);
    match kind {
        ArmKind::If => format!("if {script}").trim_end().to_string(),
        ArmKind::ElseIf => format!("elseif {script}").trim_end().to_string(),
        ArmKind::Else => "else".to_string(),
    }
}

/// Normalize the conditions of `branch` in evaluation order.
///
/// Unresolvable condition ids are logged and dropped.
pub fn normalize_branch<'a>(
    branch_id: &str,
    branch: &'a Branch,
    catalog: &NodeCatalog<'a>,
    transpiler: &Transpiler,
) -> Vec<GuardedCondition<'a>> {
    let conditions = &branch.conditions;
    let referrer = format!("branch {branch_id}");

    let arms = conditions
        .if_condition
        .iter()
        .map(|id| (ArmKind::If, id))
        .chain(conditions.else_if_conditions.iter().map(|id| (ArmKind::ElseIf, id)))
        .chain(conditions.else_condition.iter().map(|id| (ArmKind::Else, id)));

    let mut chain = GuardChain::new();
    let mut guarded = Vec::new();
    for (kind, id) in arms {
        let Some(condition) = catalog.resolve::<Condition>(id, &referrer) else {
            continue;
        };
        let script = condition.script();
        let guard = chain.guard(kind, &transpiler.condition(script));
        guarded.push(GuardedCondition {
            id: id.as_str(),
            kind,
            title: arm_title(kind, script),
            guard,
        });
    }

    if conditions.if_condition.is_none() {
        tracing::warn!("{} has no if condition", referrer);
    }
    guarded
}
