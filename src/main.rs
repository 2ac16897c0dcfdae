//! `iterion` (itr) - agile delivery core
//!
//! Org-scoped dashboards, discovery search, kanban board and an AI
//! assistant over an in-memory workspace.

use iterion::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
