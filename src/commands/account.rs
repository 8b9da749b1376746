use anyhow::Result;
use owo_colors::OwoColorize;
use plancal_core::Engine;

use super::resolve_account_id;

pub fn list(engine: &Engine) -> Result<()> {
    if engine.accounts().is_empty() {
        println!("No accounts yet. Create one with `plancal account new <name>`.");
        return Ok(());
    }

    for account in engine.accounts() {
        println!("{}  {}", account.name, account.id.dimmed());
    }
    Ok(())
}

pub async fn new(engine: &mut Engine, name: &str) -> Result<()> {
    let account = engine.create_account(name).await?;
    println!("{}", format!("Created account: {}", account.name).green());
    Ok(())
}

pub async fn rename(engine: &mut Engine, account: &str, name: &str) -> Result<()> {
    let id = resolve_account_id(engine, account)?;
    engine.rename_account(&id, name).await?;
    println!("Renamed account '{}' to '{}'", account, name);
    Ok(())
}

pub async fn rm(engine: &mut Engine, account: &str) -> Result<()> {
    let id = resolve_account_id(engine, account)?;
    engine.delete_account(&id).await?;
    println!(
        "{}",
        format!("Deleted account '{}' and all of its projects", account).red()
    );
    Ok(())
}
