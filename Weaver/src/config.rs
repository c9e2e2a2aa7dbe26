//! Import preferences
//!
//! Preferences name the project to read, the leaf boards to turn into
//! conversations and how components map onto actors, items and locations.
//! They load from JSON or TOML depending on the file extension.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::formats::arcweave::{ArcweaveProject, parse_project, read_project};

/// One leaf board to import as a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationInfo {
    /// Leaf board id
    #[serde(alias = "boardGuid")]
    pub board_id: String,
    /// Index into the board's elements sorted by display name
    #[serde(default)]
    pub start_index: usize,
    /// Index into the component name table (0 is the implicit `Player`)
    #[serde(default)]
    pub actor_index: usize,
    /// Index into the component name table
    #[serde(default = "default_conversant_index")]
    pub conversant_index: usize,
}

impl ConversationInfo {
    #[must_use]
    pub fn new(board_id: impl Into<String>) -> Self {
        Self {
            board_id: board_id.into(),
            start_index: 0,
            actor_index: 0,
            conversant_index: default_conversant_index(),
        }
    }
}

fn default_conversant_index() -> usize {
    1
}

fn default_true() -> bool {
    true
}

fn default_num_players() -> u32 {
    1
}

/// Preferences for one import run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPrefs {
    /// Folder holding `project_settings.json`, or the JSON file itself
    #[serde(default, alias = "arcweaveProjectPath")]
    pub project_path: Option<PathBuf>,
    /// Inline project JSON; takes precedence over `project_path`
    #[serde(default)]
    pub content_json: Option<String>,
    #[serde(default, alias = "conversationInfo")]
    pub conversations: Vec<ConversationInfo>,
    #[serde(default, alias = "playerComponentGuids")]
    pub player_component_ids: Vec<String>,
    #[serde(default, alias = "npcComponentGuids")]
    pub npc_component_ids: Vec<String>,
    #[serde(default, alias = "itemComponentGuids")]
    pub item_component_ids: Vec<String>,
    #[serde(default, alias = "locationComponentGuids")]
    pub location_component_ids: Vec<String>,
    /// Record cover assets as actor portraits
    #[serde(default = "default_true")]
    pub import_portraits: bool,
    /// Attach a `Guid` field holding each node's source id
    #[serde(default)]
    pub import_guids: bool,
    /// Merge into an existing database instead of replacing it
    #[serde(default)]
    pub merge: bool,
    /// Number of player profiles sharing the variable table
    #[serde(default = "default_num_players")]
    pub num_players: u32,
    /// Comma-separated names of variables shared by every player profile
    #[serde(default)]
    pub global_variables: Option<String>,
}

impl Default for ImportPrefs {
    fn default() -> Self {
        Self {
            project_path: None,
            content_json: None,
            conversations: Vec::new(),
            player_component_ids: Vec::new(),
            npc_component_ids: Vec::new(),
            item_component_ids: Vec::new(),
            location_component_ids: Vec::new(),
            import_portraits: true,
            import_guids: false,
            merge: false,
            num_players: 1,
            global_variables: None,
        }
    }
}

impl ImportPrefs {
    /// Load preferences from a `.json` or `.toml` file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or the extension
    /// is not recognized.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        let prefs: Self = match ext.as_str() {
            "json" => serde_json::from_str(&content)?,
            "toml" => toml::from_str(&content)?,
            _ => {
                return Err(Error::InvalidConfig(format!(
                    "unsupported preferences format: {}",
                    path.display()
                )));
            }
        };
        prefs.validate()?;
        Ok(prefs)
    }

    /// Save preferences as pretty-printed JSON
    ///
    /// # Errors
    /// Returns an error if serialization or writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Check values that cannot be expressed in the type
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] when `num_players` is zero or a
    /// conversation has a blank board id.
    pub fn validate(&self) -> Result<()> {
        if self.num_players == 0 {
            return Err(Error::InvalidConfig("numPlayers must be at least 1".into()));
        }
        if let Some(info) = self.conversations.iter().find(|c| c.board_id.trim().is_empty()) {
            return Err(Error::InvalidConfig(format!(
                "conversation entry with blank board id (start index {})",
                info.start_index
            )));
        }
        Ok(())
    }

    /// Read the project these preferences point at
    ///
    /// # Errors
    /// Returns an error if no project source is configured or it cannot be read.
    pub fn load_project(&self) -> Result<ArcweaveProject> {
        if let Some(json) = self.content_json.as_deref().filter(|j| !j.trim().is_empty()) {
            return parse_project(json);
        }
        match &self.project_path {
            Some(path) => read_project(path),
            None => Err(Error::InvalidConfig(
                "neither projectPath nor contentJson is set".into(),
            )),
        }
    }

    /// Trimmed, non-blank entries of the global variable allow-list
    #[must_use]
    pub fn global_variable_names(&self) -> HashSet<String> {
        self.global_variables
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect()
    }

    #[must_use]
    pub fn is_multiplayer(&self) -> bool {
        self.num_players > 1
    }
}
