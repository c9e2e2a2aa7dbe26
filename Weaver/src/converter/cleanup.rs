//! Graph cleanup
//!
//! Label-less, codeless connections become group entries with a single
//! outgoing link. They carry nothing, so every link into one is spliced
//! straight through to its destination and the relay is removed.

use std::collections::{HashMap, HashSet};

use crate::formats::database::{DialogueDatabase, DialogueEntry, EntryRef};

use super::ImportContext;

/// Whether `entry` still carries nothing but its single link.
fn is_elidable(entry: &DialogueEntry) -> bool {
    entry.is_group
        && entry.outgoing_links.len() == 1
        && entry.dialogue_text.trim().is_empty()
        && entry.user_script.trim().is_empty()
        && entry.conditions.trim().is_empty()
}

/// Final non-relay destination of `relay`, or `None` inside a relay cycle.
fn final_destination(relay: EntryRef, next: &HashMap<EntryRef, EntryRef>) -> Option<EntryRef> {
    let mut seen = HashSet::from([relay]);
    let mut current = next.get(&relay).copied()?;
    while let Some(&following) = next.get(&current) {
        if !seen.insert(current) {
            return None;
        }
        current = following;
    }
    Some(current)
}

/// Elide every relay recorded while building and return how many were removed.
pub fn elide_relays(ctx: &ImportContext<'_>, db: &mut DialogueDatabase) -> usize {
    let next: HashMap<EntryRef, EntryRef> = ctx
        .relays
        .iter()
        .filter_map(|relay| {
            let entry = db.entry(relay.conversation_id, relay.entry_id)?;
            is_elidable(entry).then(|| (*relay, entry.outgoing_links[0].destination()))
        })
        .collect();

    let mut splice = HashMap::with_capacity(next.len());
    for &relay in next.keys() {
        match final_destination(relay, &next) {
            Some(destination) => {
                splice.insert(relay, destination);
            }
            None => tracing::warn!(
                "Connection relay {}:{} is part of a relay cycle, kept",
                relay.conversation_id,
                relay.entry_id
            ),
        }
    }
    if splice.is_empty() {
        return 0;
    }

    for conversation in &mut db.conversations {
        for entry in &mut conversation.entries {
            if splice.contains_key(&entry.entry_ref()) {
                continue;
            }
            let links = std::mem::take(&mut entry.outgoing_links);
            for link in links {
                let destination = link.destination();
                entry.link_to(splice.get(&destination).copied().unwrap_or(destination));
            }
        }
        conversation
            .entries
            .retain(|entry| !splice.contains_key(&entry.entry_ref()));
    }

    tracing::debug!("Elided {} connection relays", splice.len());
    splice.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImportPrefs;
    use crate::formats::arcweave::ArcweaveProject;
    use crate::formats::database::Conversation;
    use pretty_assertions::assert_eq;

    fn link(conversation: &mut Conversation, from: u32, to: u32) {
        let destination = EntryRef::new(conversation.id, to);
        conversation.entry_mut(from).unwrap().link_to(destination);
    }

    #[test]
    fn test_relay_chain_spliced() {
        let project: ArcweaveProject =
            serde_json::from_str(r#"{ "boards": { "r": { "name": "R", "root": true } } }"#).unwrap();
        let prefs = ImportPrefs::default();
        let mut ctx = ImportContext::new(&project, &prefs).unwrap();

        let mut conversation = Conversation::new(1, "Test", 1, 2);
        let ids: Vec<u32> = (0..6).map(|_| conversation.add_entry(1, 2)).collect();
        // 0 -> 1 -> 2 -> 3, 0 -> 4 (scripted relay) -> 3, 5 <-> 5 cycle
        for &relay in &[ids[1], ids[2], ids[4], ids[5]] {
            conversation.entry_mut(relay).unwrap().is_group = true;
            ctx.relays.insert(EntryRef::new(1, relay));
        }
        conversation.entry_mut(ids[4]).unwrap().user_script = "x = 1".into();
        link(&mut conversation, ids[0], ids[1]);
        link(&mut conversation, ids[1], ids[2]);
        link(&mut conversation, ids[2], ids[3]);
        link(&mut conversation, ids[0], ids[4]);
        link(&mut conversation, ids[4], ids[3]);
        link(&mut conversation, ids[5], ids[5]);

        let mut db = DialogueDatabase::new();
        db.conversations.push(conversation);
        assert_eq!(elide_relays(&ctx, &mut db), 2);

        let conversation = db.conversation(1).unwrap();
        let remaining: Vec<u32> = conversation.entries.iter().map(|e| e.id).collect();
        assert_eq!(remaining, vec![ids[0], ids[3], ids[4], ids[5]]);
        let targets: Vec<u32> = conversation.entry(ids[0]).unwrap().outgoing_links.iter().map(|l| l.destination_entry_id).collect();
        assert_eq!(targets, vec![ids[3], ids[4]]);
        assert!(db.dangling_links().is_empty());
    }

    #[test]
    fn test_parallel_relays_deduplicated() {
        let project: ArcweaveProject =
            serde_json::from_str(r#"{ "boards": { "r": { "name": "R", "root": true } } }"#).unwrap();
        let prefs = ImportPrefs::default();
        let mut ctx = ImportContext::new(&project, &prefs).unwrap();

        let mut conversation = Conversation::new(1, "Test", 1, 2);
        let ids: Vec<u32> = (0..4).map(|_| conversation.add_entry(1, 2)).collect();
        for &relay in &[ids[1], ids[2]] {
            conversation.entry_mut(relay).unwrap().is_group = true;
            ctx.relays.insert(EntryRef::new(1, relay));
            link(&mut conversation, ids[0], relay);
            link(&mut conversation, relay, ids[3]);
        }

        let mut db = DialogueDatabase::new();
        db.conversations.push(conversation);
        assert_eq!(elide_relays(&ctx, &mut db), 2);
        assert_eq!(db.conversation(1).unwrap().entry(ids[0]).unwrap().outgoing_links.len(), 1);
    }
}
