//! Dialogue database persistence (JSON)

use super::types::DialogueDatabase;
use crate::error::Result;
use std::fs;
use std::path::Path;

/// Read a dialogue database from disk
///
/// # Errors
/// Returns an error if the file cannot be read or has invalid JSON.
pub fn read_database<P: AsRef<Path>>(path: P) -> Result<DialogueDatabase> {
    let content = fs::read_to_string(path)?;
    parse_database(&content)
}

/// Parse a dialogue database from a JSON string
///
/// # Errors
/// Returns an error if the JSON is malformed.
pub fn parse_database(content: &str) -> Result<DialogueDatabase> {
    let db: DialogueDatabase = serde_json::from_str(content)?;
    Ok(db)
}

/// Write a dialogue database to disk
///
/// # Errors
/// Returns an error if serialization or file writing fails.
pub fn write_database<P: AsRef<Path>>(db: &DialogueDatabase, path: P) -> Result<()> {
    let json = serialize_database(db)?;
    fs::write(path, json)?;
    Ok(())
}

/// Serialize a dialogue database to pretty-printed JSON
///
/// # Errors
/// Returns an error if JSON serialization fails.
pub fn serialize_database(db: &DialogueDatabase) -> Result<String> {
    Ok(serde_json::to_string_pretty(db)?)
}
