//! Cross-reference resolution (phase 2)
//!
//! Runs once every configured board has been committed, so every target
//! entry exists no matter which board or conversation it lives in.

use std::collections::HashSet;

use crate::formats::arcweave::{Element, Jumper, NodeKind};
use crate::formats::database::{DialogueDatabase, EntryRef};
use crate::script::markup::{extract_sequence, plain_line};

use super::{Deferred, ImportContext};

/// Upper bound on jumper-to-jumper hops before a chain is treated as cyclic
pub const MAX_JUMPER_HOPS: usize = 64;

fn link(db: &mut DialogueDatabase, origin: EntryRef, destination: EntryRef) {
    if let Some(entry) = db.entry_mut(origin.conversation_id, origin.entry_id) {
        tracing::trace!(
            "Link {}:{} -> {}:{}",
            origin.conversation_id,
            origin.entry_id,
            destination.conversation_id,
            destination.entry_id
        );
        entry.link_to(destination);
    }
}

/// Produced entry for `id`, logging a miss.
///
/// Ids unknown to the catalog count as unresolved references; known nodes
/// that were simply not imported (a board left out of the configuration)
/// are only logged.
fn target(ctx: &ImportContext<'_>, id: &str, referrer: &str) -> Option<EntryRef> {
    if let Some(entry) = ctx.entry_for(id) {
        return Some(entry);
    }
    match ctx.catalog.kind_of(id) {
        Some(kind) => {
            tracing::warn!("{}: {} {} was not imported, link dropped", referrer, kind, id);
        }
        None => {
            ctx.catalog.note_miss();
            tracing::warn!("{}: unresolved reference {}", referrer, id);
        }
    }
    None
}

/// Follow `start` through any chain of jumpers to the element it lands on.
fn jumper_destination<'a>(ctx: &ImportContext<'a>, jumper_id: &str, start: &'a str) -> Option<&'a str> {
    let mut visited = HashSet::from([jumper_id]);
    let mut current = start;

    for _ in 0..MAX_JUMPER_HOPS {
        if ctx.catalog.kind_of(current) != Some(NodeKind::Jumper) {
            return Some(current);
        }
        if !visited.insert(current) {
            tracing::warn!("Jumper {} is part of a jumper cycle, left unlinked", jumper_id);
            return None;
        }
        current = ctx.catalog.lookup::<Jumper>(current)?.element_id.as_deref()?;
    }

    tracing::warn!(
        "Jumper {} chain exceeds {} hops, left unlinked",
        jumper_id,
        MAX_JUMPER_HOPS
    );
    None
}

fn resolve_jumper(
    ctx: &ImportContext<'_>,
    db: &mut DialogueDatabase,
    entry: EntryRef,
    jumper_id: &str,
    start: Option<&str>,
) {
    let referrer = format!("jumper {jumper_id}");
    let Some(start) = start.filter(|id| !id.is_empty()) else {
        tracing::warn!("{} has no target element", referrer);
        return;
    };
    let Some(element_id) = jumper_destination(ctx, jumper_id, start) else {
        return;
    };
    if ctx.catalog.kind_of(element_id).is_some_and(|kind| kind != NodeKind::Element) {
        tracing::warn!("{}: target {} is not an element", referrer, element_id);
    }
    let Some(destination) = target(ctx, element_id, &referrer) else {
        return;
    };

    let label = db
        .entry(destination.conversation_id, destination.entry_id)
        .map(|target| {
            let text = extract_sequence(&target.dialogue_text)
                .map_or_else(|| target.dialogue_text.clone(), |(_, text)| text);
            plain_line(&text)
        })
        .unwrap_or_default();
    if let Some(jumper) = db.entry_mut(entry.conversation_id, entry.entry_id) {
        jumper.title = if label.is_empty() {
            "Jumper".to_string()
        } else {
            format!("Jumper: {label}")
        };
    }
    link(db, entry, destination);
}

/// Wire every deferred link recorded while building conversations.
pub fn resolve(ctx: &mut ImportContext<'_>, db: &mut DialogueDatabase) {
    let deferred = std::mem::take(&mut ctx.deferred);
    let count = deferred.len();

    for work in deferred {
        match work {
            Deferred::Connection {
                entry,
                connection,
                source,
                target: to,
            } => {
                let referrer = format!("connection {connection}");
                if let Some(origin) = target(ctx, source, &referrer) {
                    link(db, origin, entry);
                }
                if let Some(destination) = target(ctx, to, &referrer) {
                    link(db, entry, destination);
                }
            }
            Deferred::Jumper {
                entry,
                jumper,
                target: start,
            } => resolve_jumper(ctx, db, entry, jumper, start),
            Deferred::LinkedBoard {
                entry,
                element,
                board,
            } => {
                if let Some(destination) = target(ctx, board, &format!("element {element}")) {
                    link(db, entry, destination);
                }
            }
        }
    }
    tracing::debug!("Resolved {} deferred links", count);
}

/// Order each element entry's links by the element's declared outputs.
///
/// Links whose destination did not come from an output sort last and keep
/// their relative order.
pub fn sort_links(ctx: &ImportContext<'_>, db: &mut DialogueDatabase) {
    for &(element_id, entry_ref) in &ctx.elements {
        let Some(element) = ctx.catalog.lookup::<Element>(element_id) else {
            continue;
        };
        let Some(entry) = db.entry_mut(entry_ref.conversation_id, entry_ref.entry_id) else {
            continue;
        };
        if entry.outgoing_links.len() < 2 {
            continue;
        }

        let rank = |destination: EntryRef| {
            ctx.origins
                .get(&destination)
                .and_then(|source| element.outputs.iter().position(|output| output == source))
                .unwrap_or(element.outputs.len())
        };
        entry.outgoing_links.sort_by_key(|l| rank(l.destination()));
    }
}
