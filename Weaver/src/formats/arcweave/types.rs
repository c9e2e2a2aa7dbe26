//! Arcweave project document types
//!
//! Mirrors the JSON export of an Arcweave project. Every dictionary is keyed by
//! the node's stable id and keeps document order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Root of an exported Arcweave project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArcweaveProject {
    /// Project name
    pub name: String,
    /// Element the project starts at
    pub starting_element: Option<String>,
    pub boards: IndexMap<String, Board>,
    pub notes: IndexMap<String, Note>,
    pub elements: IndexMap<String, Element>,
    pub jumpers: IndexMap<String, Jumper>,
    pub connections: IndexMap<String, Connection>,
    pub branches: IndexMap<String, Branch>,
    pub components: IndexMap<String, Component>,
    pub attributes: IndexMap<String, Attribute>,
    pub assets: IndexMap<String, Asset>,
    pub variables: IndexMap<String, Variable>,
    pub conditions: IndexMap<String, Condition>,
}

/// A board: either a folder of child boards or a leaf holding narrative nodes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Board {
    pub name: String,
    /// Set on exactly one board per project
    pub root: bool,
    /// Child board ids (organizational boards only)
    pub children: Vec<String>,
    pub elements: Vec<String>,
    pub connections: Vec<String>,
    pub branches: Vec<String>,
    pub jumpers: Vec<String>,
    pub notes: Vec<String>,
}

impl Board {
    /// A board without children can be imported as a conversation.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Editor annotation, never imported
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Note {
    pub content: Option<String>,
}

/// A single authored narrative node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Element {
    /// Rich-text title, may carry a `Speaker: <name>` convention
    pub title: Option<String>,
    /// Rich-text body, may embed code blocks and a sequence directive
    pub content: Option<String>,
    /// Outgoing connection ids in authored order
    pub outputs: Vec<String>,
    /// Component ids: first is the speaker, second the listener
    pub components: Vec<String>,
    /// Board this element hands off to
    pub linked_board: Option<String>,
}

impl Element {
    #[must_use]
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn content(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}

/// Directed edge between two nodes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Connection {
    /// Visible text or a code block
    pub label: Option<String>,
    #[serde(rename = "sourceid")]
    pub source_id: String,
    #[serde(rename = "targetid")]
    pub target_id: String,
}

impl Connection {
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or_default()
    }
}

/// Conditional fork
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Branch {
    pub conditions: BranchConditions,
}

/// Condition ids of a branch in evaluation order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BranchConditions {
    pub if_condition: Option<String>,
    pub else_if_conditions: Vec<String>,
    pub else_condition: Option<String>,
}

/// Reference to an element elsewhere in the project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Jumper {
    pub element_id: Option<String>,
}

/// Character, item or location
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Component {
    pub name: String,
    /// Attribute ids
    pub attributes: Vec<String>,
    pub assets: ComponentAssets,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentAssets {
    /// Portrait image
    pub cover: Option<AssetRef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetRef {
    pub id: String,
}

/// Named value attached to a component
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Attribute {
    pub name: String,
    pub value: AttributeValue,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeValue {
    /// `string`, `component-list`, ...
    #[serde(rename = "type")]
    pub kind: String,
    pub data: serde_json::Value,
}

impl AttributeValue {
    /// Text payload of a `string` attribute.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if self.kind == "string" {
            self.data.as_str()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Asset {
    /// File name of the asset
    pub name: String,
}

/// Project variable
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Variable {
    pub name: String,
    /// `boolean`, `integer`, `float` or `string`
    #[serde(rename = "type")]
    pub kind: String,
    pub value: serde_json::Value,
}

/// Expression fragment referenced by a branch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Condition {
    pub script: Option<String>,
}

impl Condition {
    #[must_use]
    pub fn script(&self) -> &str {
        self.script.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_project() {
        let json = r#"{
            "name": "Demo",
            "startingElement": "e1",
            "boards": {
                "b0": { "name": "Root", "root": true, "children": ["b1"] },
                "b1": { "name": "Intro", "elements": ["e1"], "connections": [] }
            },
            "elements": {
                "e1": { "title": null, "content": "<p>Hi</p>", "outputs": [], "components": [] }
            },
            "connections": {
                "c1": { "label": null, "sourceid": "e1", "targetid": "e2" }
            },
            "branches": {
                "br1": { "conditions": { "ifCondition": "k1", "elseIfConditions": [], "elseCondition": null } }
            }
        }"#;
        let project: ArcweaveProject = serde_json::from_str(json).unwrap();
        assert_eq!(project.name, "Demo");
        assert_eq!(project.starting_element.as_deref(), Some("e1"));
        assert!(project.boards["b0"].root);
        assert!(!project.boards["b0"].is_leaf());
        assert!(project.boards["b1"].is_leaf());
        assert_eq!(project.elements["e1"].title(), "");
        assert_eq!(project.connections["c1"].source_id, "e1");
        assert_eq!(
            project.branches["br1"].conditions.if_condition.as_deref(),
            Some("k1")
        );
    }

    #[test]
    fn test_document_order_preserved() {
        let json = r#"{ "boards": { "z": {"name": "Z"}, "a": {"name": "A"}, "m": {"name": "M"} } }"#;
        let project: ArcweaveProject = serde_json::from_str(json).unwrap();
        let keys: Vec<&str> = project.boards.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_attribute_text() {
        let attr: Attribute =
            serde_json::from_str(r#"{ "name": "Bio", "value": { "type": "string", "data": "<p>Tall</p>" } }"#)
                .unwrap();
        assert_eq!(attr.value.as_text(), Some("<p>Tall</p>"));

        let list: Attribute =
            serde_json::from_str(r#"{ "name": "Inv", "value": { "type": "component-list", "data": [] } }"#)
                .unwrap();
        assert_eq!(list.value.as_text(), None);
    }
}
