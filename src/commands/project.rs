use anyhow::Result;
use owo_colors::OwoColorize;
use plancal_core::Engine;

use super::resolve_project_id;

pub fn list(engine: &Engine) -> Result<()> {
    if engine.projects().is_empty() {
        println!("No projects yet. Create one with `plancal project new <name>`.");
        return Ok(());
    }

    for project in engine.projects() {
        println!("{}  {}", project.name, project.id.dimmed());
    }
    Ok(())
}

pub async fn new(engine: &mut Engine, name: &str) -> Result<()> {
    let account_id = match engine.active_account() {
        Some(account) => account.id.clone(),
        None => anyhow::bail!("No account selected"),
    };

    let project = engine.create_project(name, &account_id).await?;
    println!("{}", format!("Created project: {}", project.name).green());
    Ok(())
}

pub async fn rename(engine: &mut Engine, project: &str, name: &str) -> Result<()> {
    let id = resolve_project_id(engine, project)?;
    engine.rename_project(&id, name).await?;
    println!("Renamed project '{}' to '{}'", project, name);
    Ok(())
}

pub async fn rm(engine: &mut Engine, project: &str) -> Result<()> {
    let id = resolve_project_id(engine, project)?;
    engine.delete_project(&id).await?;
    println!(
        "{}",
        format!("Deleted project '{}' and its change log", project).red()
    );
    Ok(())
}
