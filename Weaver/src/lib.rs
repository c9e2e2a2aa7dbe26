//! # Weaver
//!
//! Imports Arcweave narrative projects into dialogue databases.
//!
//! An Arcweave project is a graph of boards holding elements, connections,
//! branches and jumpers. Weaver turns every configured leaf board into a
//! conversation of linked dialogue entries, normalizes `if`/`elseif`/`else`
//! chains into mutually exclusive guards and translates Arcscript into the
//! dialogue runtime's script dialect.
//!
//! ## Quick Start
//!
//! ```no_run
//! use weaver::prelude::*;
//!
//! let prefs = ImportPrefs::load("import.toml")?;
//! let project = prefs.load_project()?;
//!
//! let mut db = DialogueDatabase::new();
//! let report = Importer::new(prefs).import(&project, &mut db)?;
//! write_database(&db, "dialogue.json")?;
//!
//! for skipped in &report.skipped_boards {
//!     eprintln!("skipped {}: {}", skipped.board_id, skipped.reason);
//! }
//! # Ok::<(), weaver::Error>(())
//! ```
//!
//! ### Translating a Single Fragment
//!
//! ```
//! use weaver::script::Transpiler;
//!
//! let transpiler = Transpiler::new(["gold"]);
//! assert_eq!(transpiler.condition("gold > 10 && !done"), r#"Variable["gold"] > 10 and not done"#);
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `weaver` command-line binary

pub mod config;
pub mod converter;
pub mod error;
pub mod formats;
pub mod script;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::config::{ConversationInfo, ImportPrefs};
    pub use crate::converter::{ImportProgress, ImportReport, Importer, SkippedBoard};
    pub use crate::error::{Error, Result};
    pub use crate::formats::arcweave::{ArcweaveProject, NodeCatalog, parse_project, read_project};
    pub use crate::formats::database::{
        Conversation, DialogueDatabase, DialogueEntry, EntryRef, Link, read_database,
        write_database,
    };
    pub use crate::script::Transpiler;
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
