//! Arcweave project reading

use super::types::ArcweaveProject;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// File name Arcweave uses for the project export inside a project folder
pub const PROJECT_FILE_NAME: &str = "project_settings.json";

/// Read an Arcweave project from disk
///
/// `path` may point at the exported JSON file itself or at the folder holding
/// [`PROJECT_FILE_NAME`].
///
/// # Errors
/// Returns an error if the file cannot be found, read, or has invalid JSON.
pub fn read_project<P: AsRef<Path>>(path: P) -> Result<ArcweaveProject> {
    let file = locate_project_file(path.as_ref())?;
    tracing::info!("Reading Arcweave project {}", file.display());
    let content = fs::read_to_string(&file)?;
    parse_project(&content)
}

/// Parse an Arcweave project from a JSON string
///
/// # Errors
/// Returns an error if the JSON is malformed.
pub fn parse_project(content: &str) -> Result<ArcweaveProject> {
    let project: ArcweaveProject = serde_json::from_str(content)?;
    tracing::debug!(
        "Parsed project '{}': {} boards, {} elements, {} connections",
        project.name,
        project.boards.len(),
        project.elements.len(),
        project.connections.len()
    );
    Ok(project)
}

/// Resolve a project path to the JSON file to read
///
/// # Errors
/// Returns [`Error::ProjectFileNotFound`] if neither the path nor the project
/// file inside it exists.
pub fn locate_project_file(path: &Path) -> Result<PathBuf> {
    let candidate = if path.is_dir() {
        path.join(PROJECT_FILE_NAME)
    } else {
        path.to_path_buf()
    };

    if candidate.is_file() {
        Ok(candidate)
    } else {
        Err(Error::ProjectFileNotFound { path: candidate })
    }
}
