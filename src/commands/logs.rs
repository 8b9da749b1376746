use anyhow::Result;
use owo_colors::OwoColorize;
use plancal_core::Engine;
use plancal_core::log;

use crate::render::Render;

pub async fn run(engine: &Engine, limit: usize) -> Result<()> {
    let Some(project) = engine.active_project() else {
        anyhow::bail!("No project selected");
    };

    let entries =
        log::recent_entries(engine.store(), &project.account_id, &project.id, limit).await?;

    if entries.is_empty() {
        println!("{}", "No change-log entries yet".dimmed());
        return Ok(());
    }

    for entry in &entries {
        println!("{}", entry.render());
    }
    Ok(())
}
