use anyhow::Result;
use owo_colors::OwoColorize;
use plancal_core::Engine;
use plancal_core::store::RemoteChange;

/// Follow remote changes to the active project's document until
/// interrupted. Each push runs through the engine's reducer, so the
/// printed state is exactly what any frontend would see.
pub async fn run(engine: &mut Engine) -> Result<()> {
    let project_name = match engine.active_project() {
        Some(project) => project.name.clone(),
        None => anyhow::bail!("No project selected"),
    };

    let mut subscription = engine.watch_active_project().await?;
    println!(
        "Watching '{}' for remote changes. Ctrl-C to stop.",
        project_name
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            change = subscription.recv() => {
                let Some(change) = change else { break };
                let deleted = matches!(change, RemoteChange::Deleted);
                engine.apply_remote(change)?;

                if deleted {
                    println!("{}", format!("Project '{}' was deleted remotely", project_name).red());
                    break;
                }

                let posts = engine
                    .active_calendar()
                    .map(|c| c.calendar_data.len())
                    .unwrap_or(0);
                println!(
                    "{}",
                    format!("Remote update applied ({} posts on the active calendar)", posts)
                        .yellow()
                );
            }
        }
    }

    Ok(())
}
