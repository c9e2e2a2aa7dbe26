//! File formats on both sides of an import
//!
//! - [`arcweave`] - the authored project document (input)
//! - [`database`] - the dialogue database (output)

pub mod arcweave;
pub mod database;

pub use arcweave::{ArcweaveProject, NodeCatalog, read_project, parse_project};
pub use database::{DialogueDatabase, read_database, write_database};
