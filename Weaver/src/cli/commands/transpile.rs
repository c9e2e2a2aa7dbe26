//! CLI command for translating one Arcscript fragment

use std::path::Path;

use crate::config::ImportPrefs;
use crate::formats::arcweave::read_project;
use crate::script::Transpiler;

/// Comma-separated list to trimmed, non-blank names
fn split_names(list: Option<&str>) -> Vec<String> {
    list.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

pub fn execute(
    code: &str,
    project: Option<&Path>,
    statement: bool,
    players: u32,
    globals: Option<&str>,
    variables: Option<&str>,
) -> anyhow::Result<()> {
    let mut names = split_names(variables);
    if let Some(project) = project {
        let project = read_project(project)?;
        names.extend(project.variables.values().map(|v| v.name.trim().to_string()));
    }

    let prefs = ImportPrefs {
        num_players: players,
        global_variables: globals.map(String::from),
        ..ImportPrefs::default()
    };
    prefs.validate()?;
    let transpiler = Transpiler::new(names).with_players(prefs.num_players, prefs.global_variable_names());

    let translated = if statement {
        transpiler.statement(code)
    } else {
        transpiler.condition(code)
    };
    println!("{translated}");
    Ok(())
}
