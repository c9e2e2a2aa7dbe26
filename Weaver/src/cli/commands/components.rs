//! CLI command for listing components by actor index

use std::path::Path;

use crate::converter::assets::component_table;
use crate::formats::arcweave::read_project;

pub fn execute(project: &Path) -> anyhow::Result<()> {
    let project = read_project(project)?;
    for (index, name) in component_table(&project).iter().enumerate() {
        println!("[{index}] {name}");
    }
    Ok(())
}
