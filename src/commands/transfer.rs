use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use plancal_core::Engine;
use plancal_core::exchange::{CalendarExchange, EXCHANGE_EXTENSION};

pub async fn import(engine: &mut Engine, file: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Could not read {}", file.display()))?;
    let exchange = CalendarExchange::from_json(&raw)?;
    let post_count = exchange.calendar_data.len();

    engine.import_calendar_data(exchange)?;
    engine.save().await?;

    println!(
        "{}",
        format!(
            "Imported {} posts from {}",
            post_count,
            file.display()
        )
        .green()
    );
    Ok(())
}

pub fn export(engine: &Engine, file: Option<&Path>) -> Result<()> {
    let Some(calendar) = engine.active_calendar() else {
        anyhow::bail!("No active calendar");
    };

    let path = match file {
        Some(path) => path.to_path_buf(),
        None => default_export_path(&calendar.name),
    };

    let exchange = CalendarExchange::from_calendar(calendar);
    std::fs::write(&path, exchange.to_json()?)
        .with_context(|| format!("Could not write {}", path.display()))?;

    println!(
        "{}",
        format!(
            "Exported {} posts to {}",
            calendar.calendar_data.len(),
            path.display()
        )
        .green()
    );
    Ok(())
}

fn default_export_path(calendar_name: &str) -> PathBuf {
    let stem: String = calendar_name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    PathBuf::from(format!("{}.{}", stem.trim_matches('-'), EXCHANGE_EXTENSION))
}
