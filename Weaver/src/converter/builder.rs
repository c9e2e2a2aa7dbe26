//! Conversation builder (phase 1)
//!
//! Turns one leaf board into a conversation. Every element, connection, branch
//! condition and jumper becomes an entry; links that may point outside the
//! board are recorded as [`Deferred`] work for the resolver. The board is built
//! into a [`BoardStage`] and committed only when it converts cleanly, so a
//! malformed board leaves the database and the context untouched.

use crate::config::ConversationInfo;
use crate::error::{Error, Result};
use crate::formats::arcweave::{Branch, Connection, Element, Jumper};
use crate::formats::database::{
    Conversation, DialogueDatabase, DialogueEntry, EntryRef, Field, NONE_SEQUENCE,
};
use crate::script::content::{self, Piece, SplitContent};
use crate::script::markup::{plain_line, touch_up};

use super::assets::{GUID_FIELD, participant};
use super::conditions::normalize_branch;
use super::{Deferred, ImportContext, InlineWork};

/// Title prefix naming the speaker of an element
pub const SPEAKER_PREFIX: &str = "Speaker:";

/// Title of every conversation's START entry
pub const START_TITLE: &str = "START";

/// A conversation under construction plus the context updates it will make
#[derive(Debug)]
pub struct BoardStage<'a> {
    pub conversation: Conversation,
    pub entries: Vec<(&'a str, u32)>,
    pub deferred: Vec<Deferred<'a>>,
    pub relays: Vec<u32>,
    pub inline: Vec<InlineWork<'a>>,
    /// Source id of every element entry, in creation order
    pub elements: Vec<(&'a str, u32)>,
}

impl<'a> BoardStage<'a> {
    fn new(conversation: Conversation) -> Self {
        Self {
            conversation,
            entries: Vec::new(),
            deferred: Vec::new(),
            relays: Vec::new(),
            inline: Vec::new(),
            elements: Vec::new(),
        }
    }

    fn entry_ref(&self, entry_id: u32) -> EntryRef {
        EntryRef::new(self.conversation.id, entry_id)
    }

    /// Create an entry for source node `source_id` and register it.
    fn add_entry(
        &mut self,
        source_id: &'a str,
        actor_id: u32,
        conversant_id: u32,
        import_guids: bool,
    ) -> u32 {
        let id = self.conversation.add_entry(actor_id, conversant_id);
        if import_guids {
            if let Some(entry) = self.conversation.entry_mut(id) {
                entry.fields.push(Field::text(GUID_FIELD, source_id));
            }
        }
        self.entries.push((source_id, id));
        id
    }

    fn entry_mut(&mut self, id: u32) -> Option<&mut DialogueEntry> {
        self.conversation.entry_mut(id)
    }

    fn local(&self, source_id: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|(id, _)| *id == source_id)
            .map(|&(_, entry)| entry)
    }
}

/// Speaker named by a `Speaker: <name>` title.
#[must_use]
pub fn speaker_name(title: &str) -> Option<String> {
    let title = plain_line(title);
    let (_, name) = title.split_once(SPEAKER_PREFIX)?;
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Text and statements of a label or code-only content.
fn split_label<'a>(label: &'a str, owner: &str) -> Result<(String, Vec<&'a str>)> {
    let pieces = content::lex(label).map_err(|_| Error::UnterminatedCode {
        owner: owner.to_string(),
    })?;
    let mut text = String::new();
    let mut statements = Vec::new();
    for piece in pieces {
        match piece {
            Piece::Text(t) => text.push_str(t),
            Piece::Code(code) if !code.trim().is_empty() => statements.push(code),
            Piece::Code(_) => {}
        }
    }
    Ok((touch_up(&text), statements))
}

/// Build the conversation for one configured leaf board.
///
/// Returns the staged conversation; nothing is written to `db` or `ctx`.
///
/// # Errors
/// Returns a board-local error when the board is unknown, is not a leaf, or
/// holds malformed content.
pub fn build_board<'a>(
    ctx: &ImportContext<'a>,
    db: &DialogueDatabase,
    info: &ConversationInfo,
) -> Result<BoardStage<'a>> {
    let node = ctx
        .hierarchy
        .get(&info.board_id)
        .ok_or_else(|| Error::BoardNotFound(info.board_id.clone()))?;
    if !node.is_leaf() {
        return Err(Error::NotALeafBoard {
            id: node.id.to_string(),
            name: node.name.clone(),
        });
    }
    let board = node.board;
    let board_id = node.id;
    let title = ctx.hierarchy.title(board_id);
    let import_guids = ctx.prefs.import_guids;

    let actor_id = participant(&ctx.component_names, db, info.actor_index, ctx.default_player);
    let conversant_id =
        participant(&ctx.component_names, db, info.conversant_index, ctx.default_npc);

    // Merge mode replaces a same-titled conversation from an earlier run in place.
    let conversation_id = match db.conversation_by_title(&title) {
        Some(existing) if ctx.prefs.merge && !ctx.conversations.contains(&existing.id) => {
            existing.id
        }
        _ => db.next_conversation_id(),
    };
    let mut conversation = Conversation::new(conversation_id, title, actor_id, conversant_id);
    if import_guids {
        conversation.fields.push(Field::text(GUID_FIELD, board_id));
    }
    tracing::debug!(
        "Building conversation {} '{}' from board {}",
        conversation_id,
        conversation.title,
        board_id
    );

    let mut stage = BoardStage::new(conversation);

    // START
    let start_id = stage.add_entry(board_id, actor_id, conversant_id, false);
    if let Some(start) = stage.entry_mut(start_id) {
        start.title = START_TITLE.to_string();
        start.sequence = NONE_SEQUENCE.to_string();
    }

    for &element_id in &node.sorted_elements {
        if let Some(element) = ctx.catalog.lookup::<Element>(element_id) {
            add_element(ctx, db, &mut stage, element_id, element)?;
        }
    }

    let referrer = format!("board {board_id}");
    for connection_id in &board.connections {
        if let Some(connection) = ctx.catalog.resolve::<Connection>(connection_id, &referrer) {
            add_connection(ctx, &mut stage, connection_id, connection)?;
        }
    }

    for branch_id in &board.branches {
        if let Some(branch) = ctx.catalog.resolve::<Branch>(branch_id, &referrer) {
            add_branch(ctx, &mut stage, branch_id, branch);
        }
    }

    for jumper_id in &board.jumpers {
        if let Some(jumper) = ctx.catalog.resolve::<Jumper>(jumper_id, &referrer) {
            let id = stage.add_entry(jumper_id, conversant_id, actor_id, import_guids);
            if let Some(entry) = stage.entry_mut(id) {
                entry.title = "Jumper".to_string();
                entry.is_group = true;
            }
            let entry = stage.entry_ref(id);
            stage.deferred.push(Deferred::Jumper {
                entry,
                jumper: jumper_id,
                target: jumper.element_id.as_deref(),
            });
        }
    }

    link_start(&mut stage, &node.sorted_elements, info, start_id);
    Ok(stage)
}

/// Point START at the configured first element.
fn link_start(stage: &mut BoardStage<'_>, sorted: &[&str], info: &ConversationInfo, start_id: u32) {
    let first = match sorted.get(info.start_index) {
        Some(id) => Some(*id),
        None => {
            if !sorted.is_empty() {
                tracing::warn!(
                    "Board {}: start index {} out of range ({} elements), using the first element",
                    info.board_id,
                    info.start_index,
                    sorted.len()
                );
            }
            sorted.first().copied()
        }
    };

    let Some(target) = first.and_then(|id| stage.local(id)) else {
        tracing::warn!("Board {} has no element to start from", info.board_id);
        return;
    };
    let destination = stage.entry_ref(target);
    if let Some(start) = stage.entry_mut(start_id) {
        start.link_to(destination);
    }
}

fn add_element<'a>(
    ctx: &ImportContext<'a>,
    db: &DialogueDatabase,
    stage: &mut BoardStage<'a>,
    element_id: &'a str,
    element: &'a Element,
) -> Result<()> {
    // Elements are spoken by the conversant to the actor unless they say otherwise.
    let conversation = &stage.conversation;
    let speaker = speaker_name(element.title())
        .and_then(|name| db.actor_by_name(&name))
        .map(|actor| actor.id);
    let from_component = |index: usize| {
        element
            .components
            .get(index)
            .and_then(|component| ctx.component_actors.get(component))
            .copied()
    };
    let actor_id = speaker
        .or_else(|| from_component(0))
        .unwrap_or(conversation.conversant_id);
    let conversant_id = from_component(1).unwrap_or(conversation.actor_id);

    let split: SplitContent<'a> = content::split_content(element.content(), element_id)
        .map_err(|_| Error::UnterminatedCode {
            owner: format!("element {element_id}"),
        })?;

    let id = stage.add_entry(element_id, actor_id, conversant_id, ctx.prefs.import_guids);
    stage.elements.push((element_id, id));
    if let Some(entry) = stage.entry_mut(id) {
        entry.title = plain_line(element.title());
        entry.dialogue_text = touch_up(&split.text);
        entry.user_script = ctx.transpiler.statement(&split.statements.join("\n"));
    }

    if let Some(board) = element.linked_board.as_deref().filter(|b| !b.is_empty()) {
        let entry = stage.entry_ref(id);
        stage.deferred.push(Deferred::LinkedBoard {
            entry,
            element: element_id,
            board,
        });
    }

    if split.has_regions() {
        let owner = stage.entry_ref(id);
        stage.inline.push(InlineWork { owner, split });
    }
    Ok(())
}

fn add_connection<'a>(
    ctx: &ImportContext<'a>,
    stage: &mut BoardStage<'a>,
    connection_id: &'a str,
    connection: &'a Connection,
) -> Result<()> {
    let (text, statements) = split_label(connection.label(), &format!("connection {connection_id}"))?;
    let presented = !text.is_empty();
    // Labelled choices are the actor's; blank connections belong to the conversant.
    let conversation = &stage.conversation;
    let (actor_id, conversant_id) = if presented {
        (conversation.actor_id, conversation.conversant_id)
    } else {
        (conversation.conversant_id, conversation.actor_id)
    };

    let id = stage.add_entry(connection_id, actor_id, conversant_id, ctx.prefs.import_guids);
    if let Some(entry) = stage.entry_mut(id) {
        entry.dialogue_text = text;
        entry.user_script = ctx.transpiler.statement(&statements.join("\n"));
        entry.is_group = !presented;
    }
    if !presented && statements.is_empty() {
        stage.relays.push(id);
    }

    let entry = stage.entry_ref(id);
    stage.deferred.push(Deferred::Connection {
        entry,
        connection: connection_id,
        source: connection.source_id.as_str(),
        target: connection.target_id.as_str(),
    });
    Ok(())
}

fn add_branch<'a>(
    ctx: &ImportContext<'a>,
    stage: &mut BoardStage<'a>,
    branch_id: &'a str,
    branch: &'a Branch,
) {
    let (actor_id, conversant_id) = (stage.conversation.conversant_id, stage.conversation.actor_id);
    let import_guids = ctx.prefs.import_guids;

    let branch_entry = stage.add_entry(branch_id, actor_id, conversant_id, import_guids);
    if let Some(entry) = stage.entry_mut(branch_entry) {
        entry.title = "Branch".to_string();
        entry.is_group = true;
    }

    for guarded in normalize_branch(branch_id, branch, &ctx.catalog, &ctx.transpiler) {
        let id = stage.add_entry(guarded.id, actor_id, conversant_id, import_guids);
        if let Some(entry) = stage.entry_mut(id) {
            entry.title = guarded.title;
            entry.conditions = guarded.guard;
            entry.is_group = true;
        }
        let destination = stage.entry_ref(id);
        if let Some(entry) = stage.entry_mut(branch_entry) {
            entry.link_to(destination);
        }
    }
}
