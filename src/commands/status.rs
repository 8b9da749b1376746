use std::collections::HashSet;

use anyhow::Result;
use owo_colors::OwoColorize;
use plancal_core::Engine;
use plancal_core::filter::PostFilter;
use plancal_core::post::{PostStatus, PostType};

use crate::render::Render;

pub fn run(
    engine: &Engine,
    statuses: &[String],
    types: &[String],
    platforms: Vec<String>,
) -> Result<()> {
    let Some(calendar) = engine.active_calendar() else {
        anyhow::bail!("No active calendar");
    };

    let filter = build_filter(statuses, types, platforms)?;
    let visible = filter.apply(&calendar.calendar_data);

    println!("{}", calendar.render());

    if calendar.calendar_data.is_empty() {
        println!("   {}", "No posts yet".dimmed());
        return Ok(());
    }

    // Filtering is a view: posts outside the filter stay visible, dimmed.
    for (date, post) in &calendar.calendar_data {
        let line = format!("   {}  {}", date, post.render());
        if visible.contains_key(date) {
            println!("{}", line);
        } else {
            println!("{}", line.dimmed());
        }
    }

    if !filter.is_unconstrained() {
        println!(
            "\n{} of {} posts match the filter",
            visible.len(),
            calendar.calendar_data.len()
        );
    }
    Ok(())
}

fn build_filter(
    statuses: &[String],
    types: &[String],
    platforms: Vec<String>,
) -> Result<PostFilter> {
    let statuses = statuses
        .iter()
        .map(|s| s.parse::<PostStatus>())
        .collect::<Result<HashSet<_>, _>>()?;
    let types = types
        .iter()
        .map(|t| t.parse::<PostType>())
        .collect::<Result<HashSet<_>, _>>()?;

    Ok(PostFilter {
        statuses,
        types,
        platforms: platforms.into_iter().collect(),
    })
}
