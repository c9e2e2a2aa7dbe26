//! Error types for `Weaver`

use std::path::PathBuf;

use thiserror::Error;

/// The error type for `Weaver` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The project document could not be located on disk.
    #[error("project file not found: {path}")]
    ProjectFileNotFound {
        /// The path that was searched.
        path: PathBuf,
    },

    // ==================== Serialization Errors ====================
    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML parsing error (import preferences).
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    // ==================== Project Structure Errors ====================
    /// No board in the project is flagged as the root.
    #[error("project has no root board")]
    MissingRootBoard,

    /// The project contains no boards at all.
    #[error("project contains no boards")]
    EmptyProject,

    /// A configured board id does not exist in the board hierarchy.
    #[error("board not found: {0}")]
    BoardNotFound(String),

    /// A configured board has children and cannot hold a conversation.
    #[error("board {name} ({id}) has child boards and cannot be imported as a conversation")]
    NotALeafBoard {
        /// Board id.
        id: String,
        /// Board display name.
        name: String,
    },

    // ==================== Content Errors ====================
    /// A code delimiter was opened but never closed.
    #[error("unterminated code block in {owner}")]
    UnterminatedCode {
        /// Id of the node whose content is malformed.
        owner: String,
    },

    // ==================== Configuration Errors ====================
    /// Import preferences are unusable.
    #[error("invalid import preferences: {0}")]
    InvalidConfig(String),
}

/// Result type alias for `Weaver` operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error only affects a single board and the import can carry on.
    #[must_use]
    pub fn is_board_local(&self) -> bool {
        matches!(
            self,
            Error::BoardNotFound(_) | Error::NotALeafBoard { .. } | Error::UnterminatedCode { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_local_errors() {
        assert!(Error::BoardNotFound("b1".into()).is_board_local());
        assert!(Error::UnterminatedCode { owner: "e1".into() }.is_board_local());
        assert!(!Error::MissingRootBoard.is_board_local());
        assert!(!Error::EmptyProject.is_board_local());
    }

    #[test]
    fn test_display() {
        let err = Error::NotALeafBoard {
            id: "b1".into(),
            name: "Chapter 1".into(),
        };
        assert_eq!(
            err.to_string(),
            "board Chapter 1 (b1) has child boards and cannot be imported as a conversation"
        );
    }
}
