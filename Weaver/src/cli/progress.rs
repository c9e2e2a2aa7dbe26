//! CLI progress display utilities
//!
//! Step indicators with emojis plus a per-board progress bar for imports.

use std::time::Duration;

use console::{Emoji, style};
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};

// =============================================================================
// Emoji Constants (with ASCII fallbacks for terminals without emoji support)
// =============================================================================

/// Magnifying glass - for reading/scanning operations
pub static LOOKING_GLASS: Emoji<'_, '_> = Emoji("🔍 ", "");
/// Floppy disk - for writing/saving operations
pub static DISK: Emoji<'_, '_> = Emoji("💾 ", "");
/// Gear - for processing/conversion operations
pub static GEAR: Emoji<'_, '_> = Emoji("⚙️  ", "");
/// Sparkles - for completion
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "");
/// Warning sign - for skipped boards
pub static WARNING: Emoji<'_, '_> = Emoji("⚠️  ", "! ");

// =============================================================================
// Step-Based Progress
// =============================================================================

/// Print a step indicator: `[1/3] 🔍 Message...`
///
/// # Example
/// ```ignore
/// print_step(1, 3, LOOKING_GLASS, "Reading project...");
/// print_step(2, 3, GEAR, "Importing boards...");
/// print_step(3, 3, DISK, "Writing database...");
/// ```
pub fn print_step(current: usize, total: usize, emoji: Emoji, msg: &str) {
    println!(
        "{} {}{}",
        style(format!("[{current}/{total}]")).bold().dim(),
        emoji,
        msg
    );
}

/// Print completion message: `✨ Done in 2s`
pub fn print_done(elapsed: Duration) {
    println!("{} Done in {}", SPARKLE, HumanDuration(elapsed));
}

/// Print a warning line: `⚠️  Message`
pub fn print_warning(msg: &str) {
    println!("{}{}", WARNING, style(msg).yellow());
}

// =============================================================================
// Progress Styles
// =============================================================================

/// Progress bar style for determinate progress
///
/// Format: `Act 1/Intro [████████░░░░░░░░] 5/10`
///
/// # Panics
/// Panics if the template string is invalid (this is a compile-time constant).
#[must_use]
pub fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{msg} [{bar:40.cyan/blue}] {pos}/{len}")
        .expect("valid template")
}

/// Create a simple progress bar
#[must_use]
pub fn simple_bar(total: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(bar_style());
    pb.set_message(msg.to_string());
    pb
}
