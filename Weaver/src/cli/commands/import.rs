//! CLI command for importing a project

use std::ops::ControlFlow;
use std::path::Path;
use std::time::Instant;

use crate::cli::progress::{DISK, GEAR, LOOKING_GLASS, print_done, print_step, print_warning, simple_bar};
use crate::config::ImportPrefs;
use crate::converter::Importer;
use crate::formats::database::{DialogueDatabase, read_database, write_database};

pub fn execute(
    prefs_path: &Path,
    project: Option<&Path>,
    output: &Path,
    merge: bool,
    show_progress: bool,
) -> anyhow::Result<()> {
    let started = Instant::now();
    let mut prefs = ImportPrefs::load(prefs_path)?;
    if let Some(project) = project {
        prefs.project_path = Some(project.to_path_buf());
        prefs.content_json = None;
    }
    prefs.merge |= merge;

    print_step(1, 3, LOOKING_GLASS, "Reading project...");
    let project = prefs.load_project()?;
    tracing::info!(
        "Loaded project '{}' ({} boards, {} elements)",
        project.name,
        project.boards.len(),
        project.elements.len()
    );

    let mut db = if prefs.merge && output.exists() {
        read_database(output)?
    } else {
        DialogueDatabase::new()
    };

    print_step(2, 3, GEAR, "Importing boards...");
    let pb = show_progress.then(|| simple_bar(prefs.conversations.len() as u64, "Importing"));
    let report = Importer::new(prefs).import_with_progress(&project, &mut db, |update| {
        if let Some(pb) = &pb {
            pb.set_position(update.index as u64);
            pb.set_message(update.board_title.clone());
        }
        ControlFlow::Continue(())
    })?;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    print_step(3, 3, DISK, "Writing database...");
    write_database(&db, output)?;

    println!(
        "  {} conversations, {} entries, {} relays elided",
        report.conversations, report.entries, report.relays_elided
    );
    for skipped in &report.skipped_boards {
        let name = if skipped.board_name.is_empty() {
            skipped.board_id.clone()
        } else {
            format!("{} ({})", skipped.board_name, skipped.board_id)
        };
        print_warning(&format!("Skipped {name}: {}", skipped.reason));
    }
    if report.unresolved_references > 0 {
        print_warning(&format!(
            "{} unresolved references, see the log for details",
            report.unresolved_references
        ));
    }
    print_done(started.elapsed());
    Ok(())
}
