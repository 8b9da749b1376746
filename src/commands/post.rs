use anyhow::Result;
use owo_colors::OwoColorize;
use plancal_core::post::{PostStatus, PostType, THEME_COLORS, ThemeColor};
use plancal_core::{Engine, Post};

#[allow(clippy::too_many_arguments)]
pub async fn add(
    engine: &mut Engine,
    date: &str,
    title: String,
    notes: Option<String>,
    types: &[String],
    platforms: Vec<String>,
    color: Option<String>,
    status: Option<&str>,
) -> Result<()> {
    let types = types
        .iter()
        .map(|t| t.parse::<PostType>())
        .collect::<Result<Vec<_>, _>>()?;

    let status = match status {
        Some(s) => s.parse::<PostStatus>()?,
        None => PostStatus::default(),
    };

    let color = match color {
        Some(value) => {
            if !THEME_COLORS.contains(&value.as_str()) {
                anyhow::bail!(
                    "Unknown color '{}'. Available: {}",
                    value,
                    THEME_COLORS.join(", ")
                );
            }
            ThemeColor(value)
        }
        None => ThemeColor::default(),
    };

    let post = Post {
        title: title.clone(),
        notes: notes.unwrap_or_default(),
        types,
        platforms,
        color,
        status,
    };

    engine.upsert_post(date, post)?;
    engine.save().await?;
    println!("{}", format!("Added post on {}: {}", date, title).green());
    Ok(())
}

pub async fn rm(engine: &mut Engine, date: &str) -> Result<()> {
    engine.delete_post(date)?;
    engine.save().await?;
    println!("{}", format!("Removed post on {}", date).red());
    Ok(())
}

pub async fn mv(engine: &mut Engine, from: &str, to: &str) -> Result<()> {
    engine.move_post(from, to)?;
    engine.save().await?;
    println!("Moved post from {} to {}", from, to);
    Ok(())
}
