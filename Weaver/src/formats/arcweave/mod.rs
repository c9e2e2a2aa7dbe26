//! Arcweave project format module

mod catalog;
mod reader;
mod types;

pub use catalog::{CatalogNode, NodeCatalog, NodeKind, NodeRef};
pub use reader::{PROJECT_FILE_NAME, locate_project_file, parse_project, read_project};
pub use types::*;
