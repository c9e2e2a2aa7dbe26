//! Flat id to node lookup across every node category

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;

use super::types::{
    ArcweaveProject, Asset, Attribute, Board, Branch, Component, Condition, Connection, Element,
    Jumper, Note, Variable,
};

/// Category of a catalogued node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Board,
    Note,
    Element,
    Jumper,
    Connection,
    Branch,
    Component,
    Attribute,
    Asset,
    Variable,
    Condition,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Board => "board",
            NodeKind::Note => "note",
            NodeKind::Element => "element",
            NodeKind::Jumper => "jumper",
            NodeKind::Connection => "connection",
            NodeKind::Branch => "branch",
            NodeKind::Component => "component",
            NodeKind::Attribute => "attribute",
            NodeKind::Asset => "asset",
            NodeKind::Variable => "variable",
            NodeKind::Condition => "condition",
        };
        f.write_str(name)
    }
}

/// Borrowed reference to any node of the project
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Board(&'a Board),
    Note(&'a Note),
    Element(&'a Element),
    Jumper(&'a Jumper),
    Connection(&'a Connection),
    Branch(&'a Branch),
    Component(&'a Component),
    Attribute(&'a Attribute),
    Asset(&'a Asset),
    Variable(&'a Variable),
    Condition(&'a Condition),
}

impl NodeRef<'_> {
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeRef::Board(_) => NodeKind::Board,
            NodeRef::Note(_) => NodeKind::Note,
            NodeRef::Element(_) => NodeKind::Element,
            NodeRef::Jumper(_) => NodeKind::Jumper,
            NodeRef::Connection(_) => NodeKind::Connection,
            NodeRef::Branch(_) => NodeKind::Branch,
            NodeRef::Component(_) => NodeKind::Component,
            NodeRef::Attribute(_) => NodeKind::Attribute,
            NodeRef::Asset(_) => NodeKind::Asset,
            NodeRef::Variable(_) => NodeKind::Variable,
            NodeRef::Condition(_) => NodeKind::Condition,
        }
    }
}

/// A node type that can be pulled out of a [`NodeRef`].
pub trait CatalogNode: 'static {
    const KIND: NodeKind;

    /// Returns the node if `node` is of this category.
    fn from_node(node: NodeRef<'_>) -> Option<&Self>;
}

macro_rules! catalog_node {
    ($ty:ident) => {
        impl CatalogNode for $ty {
            const KIND: NodeKind = NodeKind::$ty;

            fn from_node(node: NodeRef<'_>) -> Option<&Self> {
                match node {
                    NodeRef::$ty(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

catalog_node!(Board);
catalog_node!(Note);
catalog_node!(Element);
catalog_node!(Jumper);
catalog_node!(Connection);
catalog_node!(Branch);
catalog_node!(Component);
catalog_node!(Attribute);
catalog_node!(Asset);
catalog_node!(Variable);
catalog_node!(Condition);

/// Id to node map built once per import run.
///
/// Lookups never fail loudly: a missing id or an id of the wrong category yields
/// `None`. [`NodeCatalog::resolve`] additionally logs the miss and counts it so
/// the import report can surface stale references.
#[derive(Debug)]
pub struct NodeCatalog<'a> {
    nodes: HashMap<&'a str, NodeRef<'a>>,
    misses: Cell<usize>,
}

impl<'a> NodeCatalog<'a> {
    /// Catalog every node of `project`.
    ///
    /// Ids are expected to be unique across categories; on a collision the first
    /// node registered wins.
    #[must_use]
    pub fn build(project: &'a ArcweaveProject) -> Self {
        let mut catalog = Self {
            nodes: HashMap::new(),
            misses: Cell::new(0),
        };

        catalog.register(&project.boards, NodeRef::Board);
        catalog.register(&project.notes, NodeRef::Note);
        catalog.register(&project.elements, NodeRef::Element);
        catalog.register(&project.jumpers, NodeRef::Jumper);
        catalog.register(&project.connections, NodeRef::Connection);
        catalog.register(&project.branches, NodeRef::Branch);
        catalog.register(&project.components, NodeRef::Component);
        catalog.register(&project.attributes, NodeRef::Attribute);
        catalog.register(&project.assets, NodeRef::Asset);
        catalog.register(&project.variables, NodeRef::Variable);
        catalog.register(&project.conditions, NodeRef::Condition);

        tracing::debug!("Catalogued {} nodes", catalog.nodes.len());
        catalog
    }

    fn register<T>(
        &mut self,
        map: &'a indexmap::IndexMap<String, T>,
        wrap: fn(&'a T) -> NodeRef<'a>,
    ) {
        for (id, node) in map {
            let node = wrap(node);
            if let Some(existing) = self.nodes.get(id.as_str()) {
                tracing::warn!(
                    "Duplicate id {} ({} and {}), keeping the {}",
                    id,
                    existing.kind(),
                    node.kind(),
                    existing.kind()
                );
                continue;
            }
            self.nodes.insert(id.as_str(), node);
        }
    }

    /// Raw lookup of any node.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<NodeRef<'a>> {
        self.nodes.get(id).copied()
    }

    /// Category of the node with `id`, if catalogued.
    #[must_use]
    pub fn kind_of(&self, id: &str) -> Option<NodeKind> {
        self.get(id).map(|node| node.kind())
    }

    /// Typed lookup; `None` when absent or of another category.
    #[must_use]
    pub fn lookup<T: CatalogNode>(&self, id: &str) -> Option<&'a T> {
        self.get(id).and_then(T::from_node)
    }

    /// Typed lookup of a reference held by `referrer`; a miss is logged and counted.
    pub fn resolve<T: CatalogNode>(&self, id: &str, referrer: &str) -> Option<&'a T> {
        let found = self.lookup::<T>(id);
        if found.is_none() {
            self.misses.set(self.misses.get() + 1);
            match self.kind_of(id) {
                Some(kind) => tracing::warn!(
                    "{} references {} as a {}, but it is a {}",
                    referrer,
                    id,
                    T::KIND,
                    kind
                ),
                None => tracing::warn!("{} references missing {} {}", referrer, T::KIND, id),
            }
        }
        found
    }

    /// Records an unresolved reference found outside of [`NodeCatalog::resolve`].
    pub fn note_miss(&self) {
        self.misses.set(self.misses.get() + 1);
    }

    /// Number of unresolved references seen so far.
    #[must_use]
    pub fn misses(&self) -> usize {
        self.misses.get()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> ArcweaveProject {
        serde_json::from_str(
            r#"{
                "boards": { "b0": { "name": "Root", "root": true } },
                "elements": { "e1": { "title": "Hello" } },
                "conditions": { "k1": { "script": "x > 1" } },
                "variables": { "v1": { "name": "x", "type": "integer", "value": 0 } }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_typed_lookup() {
        let project = project();
        let catalog = NodeCatalog::build(&project);
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.lookup::<Element>("e1").unwrap().title(), "Hello");
        assert_eq!(catalog.lookup::<Condition>("k1").unwrap().script(), "x > 1");
        assert_eq!(catalog.kind_of("v1"), Some(NodeKind::Variable));
    }

    #[test]
    fn test_category_mismatch_is_none() {
        let project = project();
        let catalog = NodeCatalog::build(&project);
        assert!(catalog.lookup::<Board>("e1").is_none());
        assert!(catalog.resolve::<Board>("e1", "test").is_none());
        assert_eq!(catalog.misses(), 1);
    }

    #[test]
    fn test_missing_reference_counted() {
        let project = project();
        let catalog = NodeCatalog::build(&project);
        assert!(catalog.resolve::<Element>("nope", "board b0").is_none());
        assert!(catalog.resolve::<Element>("e1", "board b0").is_some());
        assert_eq!(catalog.misses(), 1);
    }

    #[test]
    fn test_duplicate_id_first_wins() {
        let project: ArcweaveProject = serde_json::from_str(
            r#"{
                "boards": { "x": { "name": "Board" } },
                "elements": { "x": { "title": "Element" } }
            }"#,
        )
        .unwrap();
        let catalog = NodeCatalog::build(&project);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.kind_of("x"), Some(NodeKind::Board));
    }
}
