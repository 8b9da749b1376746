use anyhow::Result;
use owo_colors::OwoColorize;
use plancal_core::Engine;

use super::resolve_calendar_id;
use crate::render::Render;

pub fn list(engine: &Engine) -> Result<()> {
    let Some(doc) = engine.working() else {
        anyhow::bail!("No project document loaded");
    };

    for calendar in &doc.calendars {
        let marker = if calendar.id == doc.active_calendar_id {
            "*"
        } else {
            " "
        };
        println!("{} {}  {}", marker, calendar.render(), calendar.id.dimmed());
    }
    Ok(())
}

pub async fn new(engine: &mut Engine, name: &str) -> Result<()> {
    engine.create_calendar(name)?;
    engine.save().await?;
    println!("{}", format!("Created calendar: {}", name).green());
    Ok(())
}

pub async fn rename(engine: &mut Engine, calendar: &str, name: &str) -> Result<()> {
    let id = resolve_calendar_id(engine, calendar)?;
    engine.rename_calendar(&id, name)?;
    engine.save().await?;
    println!("Renamed calendar '{}' to '{}'", calendar, name);
    Ok(())
}

pub async fn rm(engine: &mut Engine, calendar: &str) -> Result<()> {
    let id = resolve_calendar_id(engine, calendar)?;
    engine.delete_calendar(&id)?;
    engine.save().await?;
    println!("{}", format!("Deleted calendar '{}'", calendar).red());
    Ok(())
}

pub async fn switch(engine: &mut Engine, calendar: &str) -> Result<()> {
    let id = resolve_calendar_id(engine, calendar)?;
    engine.switch_active_calendar(&id)?;
    engine.save().await?;
    println!("Switched active calendar to '{}'", calendar);
    Ok(())
}
