//! `mvnget status` – completed and pending work in an output directory.

use anyhow::{Context, Result};
use mvnget_core::state::StateStore;
use std::path::Path;

pub fn run_status(output: &Path) -> Result<()> {
    let store = StateStore::new(output);
    let summary = store
        .summary()
        .with_context(|| format!("reading state in {}", output.display()))?;

    println!("completed: {}", summary.completed);
    if !summary.has_snapshot {
        println!("no pending snapshot");
        return Ok(());
    }
    println!(
        "pending snapshot{}: {} task(s), {} group(s)",
        summary
            .seed
            .as_deref()
            .map(|s| format!(" (seed {s})"))
            .unwrap_or_default(),
        summary.pending_tasks,
        summary.frontier.len()
    );
    for entry in &summary.frontier {
        println!("  {:<50} depth {}", entry.group.to_string(), entry.depth);
    }
    Ok(())
}
