//! Final presentation touch-ups
//!
//! Runs last, over the conversations produced by the current run only.

use crate::formats::database::{
    CONTINUE_SEQUENCE, Conversation, DialogueDatabase, EntryRef, NONE_SEQUENCE, START_ENTRY_ID,
};
use crate::script::markup::extract_sequence;

/// Separator between lines shown one after another
pub const PIPE: char = '|';

/// Move a `[SEQUENCE: ...]` directive from the text into the sequence.
fn move_sequence(text: &mut String, sequence: &mut String) {
    let Some((directive, remaining)) = extract_sequence(text) else {
        return;
    };
    if !directive.is_empty() {
        if sequence.trim().is_empty() {
            *sequence = directive;
        } else {
            sequence.push_str(";\n");
            sequence.push_str(&directive);
        }
    }
    *text = remaining;
}

/// Split piped text of entry `id` into a chain of entries.
fn split_pipes(conversation: &mut Conversation, id: u32) {
    let Some(entry) = conversation.entry(id) else {
        return;
    };
    if !entry.dialogue_text.contains(PIPE) {
        return;
    }
    let pieces: Vec<String> = entry
        .dialogue_text
        .split(PIPE)
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect();
    let (actor_id, conversant_id) = (entry.actor_id, entry.conversant_id);

    let mut pieces = pieces.into_iter();
    let first = pieces.next().unwrap_or_default();
    let Some(entry) = conversation.entry_mut(id) else {
        return;
    };
    entry.dialogue_text = first;
    let moved = std::mem::take(&mut entry.outgoing_links);

    let mut previous = id;
    for piece in pieces {
        let next = conversation.add_entry(actor_id, conversant_id);
        if let Some(entry) = conversation.entry_mut(next) {
            entry.dialogue_text = piece;
        }
        let destination = EntryRef::new(conversation.id, next);
        if let Some(entry) = conversation.entry_mut(previous) {
            entry.link_to(destination);
        }
        previous = next;
    }

    if let Some(last) = conversation.entry_mut(previous) {
        for link in moved {
            last.link_to(link.destination());
        }
    }
}

fn polish_conversation(conversation: &mut Conversation) {
    let ids: Vec<u32> = conversation.entries.iter().map(|e| e.id).collect();
    for id in ids {
        if let Some(entry) = conversation.entry_mut(id) {
            move_sequence(&mut entry.dialogue_text, &mut entry.sequence);
        }
        split_pipes(conversation, id);
    }

    for entry in &mut conversation.entries {
        let trimmed = entry.dialogue_text.trim();
        if trimmed.len() != entry.dialogue_text.len() {
            entry.dialogue_text = trimmed.to_string();
        }
        if entry.id == START_ENTRY_ID {
            if entry.sequence.is_empty() {
                entry.sequence = NONE_SEQUENCE.to_string();
            }
        } else if !entry.is_group && entry.dialogue_text.is_empty() && entry.sequence.is_empty() {
            entry.sequence = CONTINUE_SEQUENCE.to_string();
        }
    }
}

/// Polish every conversation in `conversations`.
pub fn polish(conversations: &[u32], db: &mut DialogueDatabase) {
    for &id in conversations {
        if let Some(conversation) = db.conversation_mut(id) {
            polish_conversation(conversation);
        }
    }
    tracing::debug!("Polished {} conversations", conversations.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_move_sequence() {
        let mut text = "Hello [SEQUENCE: Camera(Close)] there".to_string();
        let mut sequence = String::new();
        move_sequence(&mut text, &mut sequence);
        assert_eq!(text, "Hello  there");
        assert_eq!(sequence, "Camera(Close)");

        let mut text = "[SEQUENCE:Audio(hi)]".to_string();
        move_sequence(&mut text, &mut sequence);
        assert_eq!(sequence, "Camera(Close);\nAudio(hi)");
        assert!(text.is_empty());
    }

    #[test]
    fn test_pipe_split_moves_links() {
        let mut conversation = Conversation::new(3, "Test", 1, 2);
        let start = conversation.add_entry(1, 2);
        let line = conversation.add_entry(2, 1);
        let after = conversation.add_entry(2, 1);
        conversation.entry_mut(start).unwrap().link_to(EntryRef::new(3, line));
        conversation.entry_mut(line).unwrap().dialogue_text = "One | Two|Three".into();
        conversation.entry_mut(line).unwrap().link_to(EntryRef::new(3, after));
        conversation.entry_mut(after).unwrap().dialogue_text = "Bye".into();

        polish_conversation(&mut conversation);

        let mut current = conversation.entry(line).unwrap();
        let mut texts = vec![current.dialogue_text.clone()];
        while current.id != after {
            assert_eq!(current.outgoing_links.len(), 1);
            current = conversation.entry(current.outgoing_links[0].destination_entry_id).unwrap();
            texts.push(current.dialogue_text.clone());
        }
        assert_eq!(texts, vec!["One", "Two", "Three", "Bye"]);
        assert_eq!(conversation.entry(start).unwrap().sequence, NONE_SEQUENCE);
    }

    #[test]
    fn test_blank_entries_continue() {
        let mut conversation = Conversation::new(1, "Test", 1, 2);
        conversation.add_entry(1, 2);
        let blank = conversation.add_entry(1, 2);
        let group = conversation.add_entry(1, 2);
        conversation.entry_mut(group).unwrap().is_group = true;
        let padded = conversation.add_entry(1, 2);
        conversation.entry_mut(padded).unwrap().dialogue_text = "  Hi \n".into();

        polish_conversation(&mut conversation);

        assert_eq!(conversation.entry(blank).unwrap().sequence, CONTINUE_SEQUENCE);
        assert!(conversation.entry(group).unwrap().sequence.is_empty());
        assert_eq!(conversation.entry(padded).unwrap().dialogue_text, "Hi");
        assert!(conversation.entry(padded).unwrap().sequence.is_empty());
    }
}
