//! Board hierarchy
//!
//! Boards form a tree below the single root board. Boards with children only
//! organize the project; leaf boards hold the nodes of one conversation. The
//! path of ancestor names gives each conversation its title.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::formats::arcweave::{ArcweaveProject, Board, Element, NodeCatalog};
use crate::script::markup::display_name;

/// Separator between board names in a conversation title
pub const TITLE_SEPARATOR: &str = "/";

/// A board placed in the hierarchy
#[derive(Debug, Clone)]
pub struct BoardNode<'a> {
    pub id: &'a str,
    pub board: &'a Board,
    /// Display name, safe to use as a title segment
    pub name: String,
    pub parent: Option<&'a str>,
    pub depth: usize,
    /// Element ids ordered by display name, ties kept in board order
    pub sorted_elements: Vec<&'a str>,
}

impl BoardNode<'_> {
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.board.is_leaf()
    }
}

/// Display name of an element: its title, or its content when untitled.
#[must_use]
pub fn element_name(element: &Element) -> String {
    let name = display_name(element.title());
    if name.is_empty() {
        display_name(element.content())
    } else {
        name
    }
}

/// Every board reachable from the root, in depth-first order
#[derive(Debug)]
pub struct BoardHierarchy<'a> {
    root: &'a str,
    nodes: IndexMap<&'a str, BoardNode<'a>>,
}

impl<'a> BoardHierarchy<'a> {
    /// Walk the board tree from the root board.
    ///
    /// # Errors
    /// Returns [`Error::EmptyProject`] when the project has no boards and
    /// [`Error::MissingRootBoard`] when none is flagged as root.
    pub fn build(project: &'a ArcweaveProject, catalog: &NodeCatalog<'a>) -> Result<Self> {
        if project.boards.is_empty() {
            return Err(Error::EmptyProject);
        }

        let mut roots = project.boards.iter().filter(|(_, board)| board.root);
        let (root_id, root) = roots.next().ok_or(Error::MissingRootBoard)?;
        for (extra, _) in roots {
            tracing::warn!("Board {} is also flagged as root, ignoring the flag", extra);
        }

        let mut hierarchy = Self {
            root: root_id.as_str(),
            nodes: IndexMap::new(),
        };
        let mut visited = HashSet::new();
        hierarchy.walk(root_id, root, None, 0, catalog, &mut visited);

        for id in project.boards.keys() {
            if !visited.contains(id.as_str()) {
                tracing::warn!("Board {} is not reachable from the root board", id);
            }
        }

        tracing::debug!(
            "Board hierarchy: {} boards, {} leaves",
            hierarchy.nodes.len(),
            hierarchy.leaves().count()
        );
        Ok(hierarchy)
    }

    fn walk(
        &mut self,
        id: &'a str,
        board: &'a Board,
        parent: Option<&'a str>,
        depth: usize,
        catalog: &NodeCatalog<'a>,
        visited: &mut HashSet<&'a str>,
    ) {
        if !visited.insert(id) {
            tracing::warn!("Board {} appears more than once in the hierarchy", id);
            return;
        }

        let referrer = format!("board {id}");
        let mut named: Vec<(String, &'a str)> = board
            .elements
            .iter()
            .filter_map(|element_id| {
                catalog
                    .resolve::<Element>(element_id, &referrer)
                    .map(|element| (element_name(element), element_id.as_str()))
            })
            .collect();
        named.sort_by(|a, b| a.0.cmp(&b.0));

        self.nodes.insert(id, BoardNode {
            id,
            board,
            name: display_name(&board.name),
            parent,
            depth,
            sorted_elements: named.into_iter().map(|(_, element_id)| element_id).collect(),
        });

        for child_id in &board.children {
            if let Some(child) = catalog.resolve::<Board>(child_id, &referrer) {
                self.walk(child_id, child, Some(id), depth + 1, catalog, visited);
            }
        }
    }

    #[must_use]
    pub fn root(&self) -> Option<&BoardNode<'a>> {
        self.nodes.get(self.root)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&BoardNode<'a>> {
        self.nodes.get(id)
    }

    /// Importable boards, in depth-first order.
    pub fn leaves(&self) -> impl Iterator<Item = &BoardNode<'a>> {
        self.nodes.values().filter(|node| node.is_leaf())
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoardNode<'a>> {
        self.nodes.values()
    }

    /// Chain from the root down to and including `id`.
    #[must_use]
    pub fn ancestors(&self, id: &str) -> Vec<&BoardNode<'a>> {
        let mut chain = Vec::new();
        let mut current = self.nodes.get(id);
        while let Some(node) = current {
            chain.push(node);
            current = node.parent.and_then(|parent| self.nodes.get(parent));
        }
        chain.reverse();
        chain
    }

    /// Conversation title for board `id`.
    ///
    /// Ancestor names below the root, joined with [`TITLE_SEPARATOR`]. The root
    /// board's own name is used only when it is the board itself.
    #[must_use]
    pub fn title(&self, id: &str) -> String {
        let chain = self.ancestors(id);
        let names: Vec<&str> = chain
            .iter()
            .filter(|node| node.id != self.root || chain.len() == 1)
            .map(|node| node.name.as_str())
            .collect();
        names.join(TITLE_SEPARATOR)
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
