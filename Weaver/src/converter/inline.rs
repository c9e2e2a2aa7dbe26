//! Inline conditional materialization
//!
//! An element whose content holds `if`/`elseif`/`else`/`endif` code regions is
//! expanded after link ordering. Per region the owner gets one guard entry per
//! arm plus a continuation entry holding the text after `endif`:
//!
//! ```text
//! owner ──▶ arm (if x) ─────┐
//!   │  ──▶ arm (else) ──────┤
//!   └──────────────────────▶ continuation ──▶ owner's original links
//! ```
//!
//! The final owner→continuation link is the fallthrough taken when no arm's
//! guard holds. With several regions the continuation of one region owns the
//! next.

use crate::formats::database::{Conversation, DialogueDatabase, EntryRef, CONTINUE_SEQUENCE};
use crate::script::content::Region;
use crate::script::markup::touch_up;
use crate::script::transpile::Transpiler;

use super::conditions::{GuardChain, arm_title};
use super::ImportContext;

/// Expand one region below `owner`, returning the continuation entry id.
fn expand_region(
    conversation: &mut Conversation,
    owner: u32,
    region: &Region<'_>,
    transpiler: &Transpiler,
) -> Option<u32> {
    let owner_entry = conversation.entry(owner)?;
    let (actor_id, conversant_id) = (owner_entry.actor_id, owner_entry.conversant_id);
    let conversation_id = conversation.id;

    let continuation = conversation.add_entry(actor_id, conversant_id);
    let continuation_ref = EntryRef::new(conversation_id, continuation);
    let moved = std::mem::take(&mut conversation.entry_mut(owner)?.outgoing_links);
    if let Some(entry) = conversation.entry_mut(continuation) {
        entry.dialogue_text = touch_up(&region.after_text);
        entry.is_group = entry.dialogue_text.is_empty();
        for link in moved {
            entry.link_to(link.destination());
        }
    }

    let mut chain = GuardChain::new();
    let mut arms = Vec::with_capacity(region.arms.len());
    for arm in &region.arms {
        let guard = chain.guard(arm.kind, &transpiler.condition(arm.condition));
        let id = conversation.add_entry(actor_id, conversant_id);
        if let Some(entry) = conversation.entry_mut(id) {
            entry.title = arm_title(arm.kind, arm.condition);
            entry.conditions = guard;
            entry.dialogue_text = touch_up(&arm.text);
            entry.is_group = entry.dialogue_text.is_empty();
            if !entry.is_group {
                entry.sequence = CONTINUE_SEQUENCE.to_string();
            }
            entry.user_script = transpiler.statement(&arm.statements.join("\n"));
            entry.link_to(continuation_ref);
        }
        arms.push(EntryRef::new(conversation_id, id));
    }

    let owner_entry = conversation.entry_mut(owner)?;
    for arm in arms {
        owner_entry.link_to(arm);
    }
    owner_entry.link_to(continuation_ref);
    Some(continuation)
}

/// Expand every recorded inline region.
pub fn materialize(ctx: &mut ImportContext<'_>, db: &mut DialogueDatabase) {
    let work = std::mem::take(&mut ctx.inline);
    let mut regions = 0usize;

    for item in work {
        let Some(conversation) = db.conversation_mut(item.owner.conversation_id) else {
            continue;
        };
        let mut owner = item.owner.entry_id;
        for region in &item.split.regions {
            match expand_region(conversation, owner, region, &ctx.transpiler) {
                Some(continuation) => owner = continuation,
                None => break,
            }
            regions += 1;
        }
    }
    tracing::debug!("Materialized {} inline conditional regions", regions);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::content::split_content;
    use pretty_assertions::assert_eq;

    fn owner_with_links(conversation: &mut Conversation, targets: u32) -> u32 {
        let owner = conversation.add_entry(1, 2);
        for _ in 0..targets {
            let id = conversation.add_entry(1, 2);
            let destination = EntryRef::new(conversation.id, id);
            conversation.entry_mut(owner).unwrap().link_to(destination);
        }
        owner
    }

    #[test]
    fn test_single_region() {
        let mut conversation = Conversation::new(1, "Test", 1, 2);
        let owner = owner_with_links(&mut conversation, 1);
        let original = conversation.entry(owner).unwrap().outgoing_links[0].destination();

        let split = split_content("Before <code>if x</code>mid<code>endif</code>After", "e1").unwrap();
        let transpiler = Transpiler::new(["x"]);
        let continuation =
            expand_region(&mut conversation, owner, &split.regions[0], &transpiler).unwrap();

        let cont = conversation.entry(continuation).unwrap();
        assert_eq!(cont.dialogue_text, "After");
        assert!(!cont.is_group);
        let cont_targets: Vec<EntryRef> = cont.outgoing_links.iter().map(|l| l.destination()).collect();
        assert_eq!(cont_targets, vec![original]);
        assert!(cont.outgoing_links.iter().all(|l| l.origin() == cont.entry_ref()));

        let owner_links = &conversation.entry(owner).unwrap().outgoing_links;
        assert_eq!(owner_links.len(), 2);
        assert_eq!(owner_links[1].destination_entry_id, continuation);

        let arm = conversation.entry(owner_links[0].destination_entry_id).unwrap();
        assert_eq!(arm.dialogue_text, "mid");
        assert_eq!(arm.conditions, r#"Variable["x"]"#);
        assert_eq!(arm.title, "if x");
        assert_eq!(arm.sequence, CONTINUE_SEQUENCE);
        assert_eq!(arm.outgoing_links[0].destination_entry_id, continuation);
    }

    #[test]
    fn test_chained_regions() {
        let mut conversation = Conversation::new(1, "Test", 1, 2);
        let owner = owner_with_links(&mut conversation, 0);
        let split = split_content(
            "<code>if a</code>A<code>else</code><code>b = 1</code><code>endif</code>\
             <code>if c</code>C<code>endif</code>Tail",
            "e1",
        )
        .unwrap();
        let transpiler = Transpiler::new(["a", "b", "c"]);

        let first = expand_region(&mut conversation, owner, &split.regions[0], &transpiler).unwrap();
        let second = expand_region(&mut conversation, first, &split.regions[1], &transpiler).unwrap();

        let first_entry = conversation.entry(first).unwrap();
        assert!(first_entry.is_group);
        assert_eq!(first_entry.outgoing_links.len(), 2);

        let else_arm = conversation
            .entries
            .iter()
            .find(|e| e.title == "else")
            .unwrap();
        assert!(else_arm.is_group);
        assert_eq!(else_arm.conditions, r#"not (Variable["a"])"#);
        assert_eq!(else_arm.user_script, r#"Variable["b"] = 1"#);
        assert!(else_arm.sequence.is_empty());

        assert_eq!(conversation.entry(second).unwrap().dialogue_text, "Tail");
    }
}
