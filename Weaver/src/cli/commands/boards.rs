//! CLI command for listing importable boards

use std::path::Path;

use crate::converter::BoardHierarchy;
use crate::converter::hierarchy::element_name;
use crate::formats::arcweave::{Element, NodeCatalog, read_project};

pub fn execute(project: &Path) -> anyhow::Result<()> {
    let project = read_project(project)?;
    let catalog = NodeCatalog::build(&project);
    let hierarchy = BoardHierarchy::build(&project, &catalog)?;

    for board in hierarchy.leaves() {
        println!("{}  {}", board.id, hierarchy.title(board.id));
        for (index, element_id) in board.sorted_elements.iter().enumerate() {
            let name = catalog
                .lookup::<Element>(element_id)
                .map(element_name)
                .unwrap_or_default();
            println!("    [{index}] {name}");
        }
    }

    println!("\nTotal: {} importable boards", hierarchy.leaves().count());
    Ok(())
}
