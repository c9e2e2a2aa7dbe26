//! Dialogue database types
//!
//! The produced runtime graph: actors, locations, items and variables plus
//! conversations made of linked dialogue entries.

use serde::{Deserialize, Serialize};

/// Entry id reserved for a conversation's START entry
pub const START_ENTRY_ID: u32 = 0;

/// Sequence hint meaning "present nothing"
pub const NONE_SEQUENCE: &str = "None()";

/// Sequence hint meaning "advance without waiting"
pub const CONTINUE_SEQUENCE: &str = "Continue()";

/// Root database holding every imported asset and conversation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DialogueDatabase {
    pub description: String,
    pub actors: Vec<Actor>,
    pub locations: Vec<Location>,
    pub items: Vec<Item>,
    pub variables: Vec<Variable>,
    pub conversations: Vec<Conversation>,
}

impl DialogueDatabase {
    /// Create an empty database
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn actor(&self, id: u32) -> Option<&Actor> {
        self.actors.iter().find(|a| a.id == id)
    }

    #[must_use]
    pub fn actor_by_name(&self, name: &str) -> Option<&Actor> {
        self.actors.iter().find(|a| a.name == name)
    }

    #[must_use]
    pub fn conversation(&self, id: u32) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn conversation_mut(&mut self, id: u32) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| c.id == id)
    }

    #[must_use]
    pub fn conversation_by_title(&self, title: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.title == title)
    }

    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Entry addressed by a link destination
    #[must_use]
    pub fn entry(&self, conversation_id: u32, entry_id: u32) -> Option<&DialogueEntry> {
        self.conversation(conversation_id)
            .and_then(|c| c.entry(entry_id))
    }

    pub fn entry_mut(&mut self, conversation_id: u32, entry_id: u32) -> Option<&mut DialogueEntry> {
        self.conversation_mut(conversation_id)
            .and_then(|c| c.entry_mut(entry_id))
    }

    #[must_use]
    pub fn next_actor_id(&self) -> u32 {
        next_id(self.actors.iter().map(|a| a.id))
    }

    #[must_use]
    pub fn next_location_id(&self) -> u32 {
        next_id(self.locations.iter().map(|l| l.id))
    }

    #[must_use]
    pub fn next_item_id(&self) -> u32 {
        next_id(self.items.iter().map(|i| i.id))
    }

    #[must_use]
    pub fn next_variable_id(&self) -> u32 {
        next_id(self.variables.iter().map(|v| v.id))
    }

    #[must_use]
    pub fn next_conversation_id(&self) -> u32 {
        next_id(self.conversations.iter().map(|c| c.id))
    }

    /// Total number of dialogue entries across all conversations
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.conversations.iter().map(|c| c.entries.len()).sum()
    }

    /// Total number of links across all conversations
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.conversations
            .iter()
            .flat_map(|c| &c.entries)
            .map(|e| e.outgoing_links.len())
            .sum()
    }

    /// Links whose destination entry does not exist
    #[must_use]
    pub fn dangling_links(&self) -> Vec<Link> {
        self.conversations
            .iter()
            .flat_map(|c| &c.entries)
            .flat_map(|e| &e.outgoing_links)
            .filter(|l| {
                self.entry(l.destination_conversation_id, l.destination_entry_id)
                    .is_none()
            })
            .copied()
            .collect()
    }
}

/// Lowest id above every id in use, starting at 1
fn next_id(ids: impl Iterator<Item = u32>) -> u32 {
    ids.max().map_or(1, |max| max + 1)
}

/// Data type of a custom field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    #[default]
    Text,
    Number,
    Boolean,
    Files,
}

/// Custom title/value field carried by assets and entries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Field {
    pub title: String,
    pub value: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl Field {
    #[must_use]
    pub fn text(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            field_type: FieldType::Text,
        }
    }

    /// Value of the field titled `title` in `fields`
    #[must_use]
    pub fn lookup<'a>(fields: &'a [Field], title: &str) -> Option<&'a str> {
        fields
            .iter()
            .find(|f| f.title == title)
            .map(|f| f.value.as_str())
    }
}

/// A speaking participant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Actor {
    pub id: u32,
    pub name: String,
    pub is_player: bool,
    /// Portrait image path, resolved by the runtime
    pub portrait: Option<String>,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Location {
    pub id: u32,
    pub name: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Item {
    pub id: u32,
    pub name: String,
    pub fields: Vec<Field>,
}

/// Initial value of a variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum VariableValue {
    Boolean(bool),
    Number(f64),
    Text(String),
}

impl Default for VariableValue {
    fn default() -> Self {
        VariableValue::Text(String::new())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Variable {
    pub id: u32,
    pub name: String,
    pub initial_value: VariableValue,
}

/// A conversation: a START entry plus every entry reachable from it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Conversation {
    pub id: u32,
    /// Slash-separated hierarchical title
    pub title: String,
    /// Primary participant (usually the player)
    pub actor_id: u32,
    /// Secondary participant
    pub conversant_id: u32,
    pub fields: Vec<Field>,
    pub entries: Vec<DialogueEntry>,
}

impl Conversation {
    #[must_use]
    pub fn new(id: u32, title: impl Into<String>, actor_id: u32, conversant_id: u32) -> Self {
        Self {
            id,
            title: title.into(),
            actor_id,
            conversant_id,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn entry(&self, id: u32) -> Option<&DialogueEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn entry_mut(&mut self, id: u32) -> Option<&mut DialogueEntry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    #[must_use]
    pub fn start_entry(&self) -> Option<&DialogueEntry> {
        self.entry(START_ENTRY_ID)
    }

    /// Next free entry id; START takes 0 so the first regular entry is 1
    #[must_use]
    pub fn next_entry_id(&self) -> u32 {
        self.entries.iter().map(|e| e.id + 1).max().unwrap_or(START_ENTRY_ID)
    }

    /// Append a new entry spoken by `actor_id` to `conversant_id` and return its id
    pub fn add_entry(&mut self, actor_id: u32, conversant_id: u32) -> u32 {
        let id = self.next_entry_id();
        let mut entry = DialogueEntry::new(id, self.id);
        entry.actor_id = actor_id;
        entry.conversant_id = conversant_id;
        self.entries.push(entry);
        id
    }

    /// Number of links pointing at entry `id` from inside this conversation
    #[must_use]
    pub fn incoming_count(&self, id: u32) -> usize {
        self.entries
            .iter()
            .flat_map(|e| &e.outgoing_links)
            .filter(|l| l.destination_conversation_id == self.id && l.destination_entry_id == id)
            .count()
    }
}

/// A node of a conversation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DialogueEntry {
    pub id: u32,
    pub conversation_id: u32,
    pub title: String,
    pub actor_id: u32,
    pub conversant_id: u32,
    pub dialogue_text: String,
    /// Presentation directive
    pub sequence: String,
    /// Side-effect script run when the entry is reached
    pub user_script: String,
    /// Guard expression; empty means always available
    pub conditions: String,
    /// Pass-through node that is never presented
    pub is_group: bool,
    pub fields: Vec<Field>,
    pub outgoing_links: Vec<Link>,
}

impl DialogueEntry {
    #[must_use]
    pub fn new(id: u32, conversation_id: u32) -> Self {
        Self {
            id,
            conversation_id,
            ..Self::default()
        }
    }

    /// Link from this entry to `destination`, skipping duplicates
    pub fn link_to(&mut self, destination: EntryRef) {
        let link = Link::new(self.entry_ref(), destination);
        if !self.outgoing_links.contains(&link) {
            self.outgoing_links.push(link);
        }
    }

    #[must_use]
    pub fn entry_ref(&self) -> EntryRef {
        EntryRef::new(self.conversation_id, self.id)
    }
}

/// Address of an entry anywhere in the database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRef {
    pub conversation_id: u32,
    pub entry_id: u32,
}

impl EntryRef {
    #[must_use]
    pub fn new(conversation_id: u32, entry_id: u32) -> Self {
        Self {
            conversation_id,
            entry_id,
        }
    }
}

/// Directed edge between two entries, possibly across conversations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub origin_conversation_id: u32,
    pub origin_entry_id: u32,
    pub destination_conversation_id: u32,
    pub destination_entry_id: u32,
}

impl Link {
    #[must_use]
    pub fn new(origin: EntryRef, destination: EntryRef) -> Self {
        Self {
            origin_conversation_id: origin.conversation_id,
            origin_entry_id: origin.entry_id,
            destination_conversation_id: destination.conversation_id,
            destination_entry_id: destination.entry_id,
        }
    }

    #[must_use]
    pub fn origin(&self) -> EntryRef {
        EntryRef::new(self.origin_conversation_id, self.origin_entry_id)
    }

    #[must_use]
    pub fn destination(&self) -> EntryRef {
        EntryRef::new(self.destination_conversation_id, self.destination_entry_id)
    }
}
