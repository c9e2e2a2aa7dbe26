//! Arcweave project to dialogue database conversion
//!
//! The import runs as a strictly ordered pipeline over one [`ImportContext`]:
//!
//! 1. catalog every node and build the board hierarchy
//! 2. import variables, locations, items and actors ([`assets`])
//! 3. build one conversation per configured leaf board ([`builder`])
//! 4. resolve connections, jumpers and linked boards across conversations ([`resolver`])
//! 5. order links by the authored output order and materialize inline
//!    conditionals ([`inline`])
//! 6. elide pass-through connection relays ([`cleanup`]) and apply final
//!    presentation touch-ups ([`polish`])
//!
//! # Usage
//!
//! ```no_run
//! use weaver::config::ImportPrefs;
//! use weaver::converter::Importer;
//! use weaver::formats::database::DialogueDatabase;
//!
//! let prefs = ImportPrefs::load("import.toml")?;
//! let project = prefs.load_project()?;
//! let mut db = DialogueDatabase::new();
//! let report = Importer::new(prefs).import(&project, &mut db)?;
//! println!("{} conversations", report.conversations);
//! # Ok::<(), weaver::Error>(())
//! ```

pub mod assets;
pub mod builder;
pub mod cleanup;
pub mod conditions;
pub mod hierarchy;
pub mod inline;
pub mod polish;
pub mod resolver;

use std::collections::{HashMap, HashSet};
use std::ops::ControlFlow;

use crate::config::ImportPrefs;
use crate::error::Result;
use crate::formats::arcweave::{ArcweaveProject, NodeCatalog};
use crate::formats::database::{DialogueDatabase, EntryRef};
use crate::script::content::SplitContent;
use crate::script::transpile::Transpiler;

pub use builder::BoardStage;
pub use conditions::GuardChain;
pub use hierarchy::{BoardHierarchy, BoardNode};

/// Link work that needs every conversation to exist first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred<'a> {
    /// Connection entry to wire between its source and target nodes
    Connection {
        entry: EntryRef,
        connection: &'a str,
        source: &'a str,
        target: &'a str,
    },
    /// Jumper entry to point at its target element
    Jumper {
        entry: EntryRef,
        jumper: &'a str,
        target: Option<&'a str>,
    },
    /// Element handing off to another board's START entry
    LinkedBoard {
        entry: EntryRef,
        element: &'a str,
        board: &'a str,
    },
}

/// Element content whose inline conditionals still need entries
#[derive(Debug, Clone)]
pub struct InlineWork<'a> {
    pub owner: EntryRef,
    pub split: SplitContent<'a>,
}

/// State shared by every stage of one import run
#[derive(Debug)]
pub struct ImportContext<'a> {
    pub project: &'a ArcweaveProject,
    pub prefs: &'a ImportPrefs,
    pub catalog: NodeCatalog<'a>,
    pub hierarchy: BoardHierarchy<'a>,
    pub transpiler: Transpiler,
    /// Names addressed by `actorIndex`/`conversantIndex`
    pub component_names: Vec<String>,
    /// Component id to actor id
    pub component_actors: HashMap<String, u32>,
    pub default_player: u32,
    pub default_npc: u32,
    /// Source node id to produced entry (board ids map to START)
    pub entries: HashMap<&'a str, EntryRef>,
    /// Produced entry to source node id
    pub origins: HashMap<EntryRef, &'a str>,
    /// Element entries, for link ordering
    pub elements: Vec<(&'a str, EntryRef)>,
    pub deferred: Vec<Deferred<'a>>,
    /// Label-less, codeless connection entries
    pub relays: HashSet<EntryRef>,
    pub inline: Vec<InlineWork<'a>>,
    /// Conversations produced by this run, in build order
    pub conversations: Vec<u32>,
}

impl<'a> ImportContext<'a> {
    /// Catalog `project` and build its board hierarchy.
    ///
    /// # Errors
    /// Returns an error if the project has no boards or no root board.
    pub fn new(project: &'a ArcweaveProject, prefs: &'a ImportPrefs) -> Result<Self> {
        let catalog = NodeCatalog::build(project);
        let hierarchy = BoardHierarchy::build(project, &catalog)?;
        let transpiler = Transpiler::new(project.variables.values().map(|v| v.name.trim()))
            .with_players(prefs.num_players, prefs.global_variable_names());

        Ok(Self {
            project,
            prefs,
            catalog,
            hierarchy,
            transpiler,
            component_names: assets::component_table(project),
            component_actors: HashMap::new(),
            default_player: 0,
            default_npc: 0,
            entries: HashMap::new(),
            origins: HashMap::new(),
            elements: Vec::new(),
            deferred: Vec::new(),
            relays: HashSet::new(),
            inline: Vec::new(),
            conversations: Vec::new(),
        })
    }

    /// Produced entry for source node `id`.
    #[must_use]
    pub fn entry_for(&self, id: &str) -> Option<EntryRef> {
        self.entries.get(id).copied()
    }

    /// Move a successfully built board into the context and the database.
    pub fn commit(&mut self, db: &mut DialogueDatabase, stage: BoardStage<'a>) {
        let conversation_id = stage.conversation.id;
        for (source, entry_id) in stage.entries {
            let entry = EntryRef::new(conversation_id, entry_id);
            if let Some(previous) = self.entries.insert(source, entry) {
                tracing::warn!(
                    "Node {} is imported more than once, links now use conversation {} instead of {}",
                    source,
                    conversation_id,
                    previous.conversation_id
                );
            }
            self.origins.insert(entry, source);
        }
        self.elements.extend(
            stage
                .elements
                .into_iter()
                .map(|(source, id)| (source, EntryRef::new(conversation_id, id))),
        );
        self.deferred.extend(stage.deferred);
        self.relays.extend(
            stage
                .relays
                .into_iter()
                .map(|id| EntryRef::new(conversation_id, id)),
        );
        self.inline.extend(stage.inline);
        self.conversations.push(conversation_id);

        db.conversations.retain(|c| c.id != conversation_id);
        db.conversations.push(stage.conversation);
    }
}

/// A configured board that could not be imported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedBoard {
    pub board_id: String,
    /// Board name, empty when the id is unknown
    pub board_name: String,
    pub reason: String,
}

/// Summary of one import run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Conversations produced by this run
    pub conversations: usize,
    /// Entries in the produced conversations
    pub entries: usize,
    pub skipped_boards: Vec<SkippedBoard>,
    /// Dangling ids met during the run
    pub unresolved_references: usize,
    /// Connection relays removed by cleanup
    pub relays_elided: usize,
    /// The progress callback stopped the run early
    pub cancelled: bool,
}

/// Progress notification sent before each board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportProgress<'p> {
    /// Zero-based position among the configured boards
    pub index: usize,
    pub total: usize,
    pub board_id: &'p str,
    /// Conversation title, or the id when the board is unknown
    pub board_title: String,
}

/// Runs imports with one set of preferences
#[derive(Debug, Clone, Default)]
pub struct Importer {
    prefs: ImportPrefs,
}

impl Importer {
    #[must_use]
    pub fn new(prefs: ImportPrefs) -> Self {
        Self { prefs }
    }

    #[must_use]
    pub fn prefs(&self) -> &ImportPrefs {
        &self.prefs
    }

    /// Import `project` into `db`.
    ///
    /// In replace mode `db` is cleared first; in merge mode same-named assets
    /// and same-titled conversations are replaced and everything else is kept.
    ///
    /// # Errors
    /// Returns an error for project-level failures (no boards, no root board,
    /// invalid preferences). Failures confined to one board are reported in
    /// [`ImportReport::skipped_boards`] instead.
    pub fn import(&self, project: &ArcweaveProject, db: &mut DialogueDatabase) -> Result<ImportReport> {
        self.import_with_progress(project, db, |_| ControlFlow::Continue(()))
    }

    /// Import with a callback invoked before each board.
    ///
    /// Returning [`ControlFlow::Break`] stops building further boards; the
    /// boards already built are still resolved and cleaned up.
    ///
    /// # Errors
    /// See [`Importer::import`].
    pub fn import_with_progress<F>(
        &self,
        project: &ArcweaveProject,
        db: &mut DialogueDatabase,
        mut progress: F,
    ) -> Result<ImportReport>
    where
        F: FnMut(&ImportProgress<'_>) -> ControlFlow<()>,
    {
        self.prefs.validate()?;
        let mut ctx = ImportContext::new(project, &self.prefs)?;
        let mut report = ImportReport::default();

        if !self.prefs.merge {
            *db = DialogueDatabase::new();
        }
        if !project.name.is_empty() {
            db.description.clone_from(&project.name);
        }
        assets::import_assets(&mut ctx, db);

        let total = self.prefs.conversations.len();
        for (index, info) in self.prefs.conversations.iter().enumerate() {
            let board_title = ctx
                .hierarchy
                .get(&info.board_id)
                .map_or_else(|| info.board_id.clone(), |node| ctx.hierarchy.title(node.id));
            let update = ImportProgress {
                index,
                total,
                board_id: &info.board_id,
                board_title,
            };
            if progress(&update).is_break() {
                tracing::info!("Import cancelled after {} of {} boards", index, total);
                report.cancelled = true;
                break;
            }

            match builder::build_board(&ctx, db, info) {
                Ok(stage) => ctx.commit(db, stage),
                Err(err) if err.is_board_local() => {
                    tracing::warn!("Skipping board {}: {}", info.board_id, err);
                    let board_name = ctx
                        .hierarchy
                        .get(&info.board_id)
                        .map(|node| node.name.clone())
                        .unwrap_or_default();
                    report.skipped_boards.push(SkippedBoard {
                        board_id: info.board_id.clone(),
                        board_name,
                        reason: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        db.conversations.sort_by_key(|c| c.id);

        resolver::resolve(&mut ctx, db);
        resolver::sort_links(&ctx, db);
        inline::materialize(&mut ctx, db);
        report.relays_elided = cleanup::elide_relays(&ctx, db);
        polish::polish(&ctx.conversations, db);

        report.conversations = ctx.conversations.len();
        report.entries = ctx
            .conversations
            .iter()
            .filter_map(|&id| db.conversation(id))
            .map(|c| c.entries.len())
            .sum();
        report.unresolved_references = ctx.catalog.misses();

        tracing::info!(
            "Imported {} conversations ({} entries), {} boards skipped, {} unresolved references",
            report.conversations,
            report.entries,
            report.skipped_boards.len(),
            report.unresolved_references
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConversationInfo;

    fn project() -> ArcweaveProject {
        serde_json::from_str(
            r#"{
                "name": "Tiny",
                "boards": {
                    "root": { "name": "Root", "root": true, "children": ["b1", "b2"] },
                    "b1": { "name": "One", "elements": ["e1"] },
                    "b2": { "name": "Two", "elements": ["e2"] }
                },
                "elements": {
                    "e1": { "content": "<p>First</p>" },
                    "e2": { "content": "<p>Second</p>" }
                }
            }"#,
        )
        .unwrap()
    }

    fn prefs() -> ImportPrefs {
        ImportPrefs {
            conversations: vec![ConversationInfo::new("b1"), ConversationInfo::new("b2")],
            ..ImportPrefs::default()
        }
    }

    #[test]
    fn test_progress_reports_each_board() {
        let project = project();
        let mut db = DialogueDatabase::new();
        let mut seen = Vec::new();
        let report = Importer::new(prefs())
            .import_with_progress(&project, &mut db, |p| {
                seen.push((p.index, p.total, p.board_title.clone()));
                ControlFlow::Continue(())
            })
            .unwrap();

        assert_eq!(seen, vec![(0, 2, "One".to_string()), (1, 2, "Two".to_string())]);
        assert_eq!(report.conversations, 2);
        assert!(!report.cancelled);
        assert_eq!(db.description, "Tiny");
    }

    #[test]
    fn test_cancel_keeps_built_boards() {
        let project = project();
        let mut db = DialogueDatabase::new();
        let report = Importer::new(prefs())
            .import_with_progress(&project, &mut db, |p| {
                if p.index == 1 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.conversations, 1);
        assert_eq!(db.conversations.len(), 1);
        assert_eq!(db.conversations[0].title, "One");
    }

    #[test]
    fn test_replace_mode_clears_database() {
        let project = project();
        let mut db = DialogueDatabase::new();
        db.description = "Old".into();
        db.conversations.push(crate::formats::database::Conversation::new(7, "Stale", 1, 1));

        Importer::new(prefs()).import(&project, &mut db).unwrap();
        assert!(db.conversation_by_title("Stale").is_none());
        assert_eq!(db.conversations.len(), 2);
    }

    #[test]
    fn test_merge_mode_keeps_unrelated() {
        let project = project();
        let mut db = DialogueDatabase::new();
        db.conversations.push(crate::formats::database::Conversation::new(7, "Stale", 1, 1));

        let prefs = ImportPrefs {
            merge: true,
            ..prefs()
        };
        Importer::new(prefs).import(&project, &mut db).unwrap();
        assert!(db.conversation_by_title("Stale").is_some());
        assert_eq!(db.conversations.len(), 3);
    }
}
