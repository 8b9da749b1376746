use anyhow::Result;
use owo_colors::OwoColorize;
use plancal_core::Engine;
use plancal_core::config::GlobalConfig;

use super::{resolve_account_id, resolve_project_id};

/// Remember an account (and optionally a project) as the default scope
/// in the global config.
pub async fn run(
    engine: &mut Engine,
    mut config: GlobalConfig,
    account: &str,
    project: Option<&str>,
) -> Result<()> {
    let account_id = resolve_account_id(engine, account)?;
    engine.select_account(&account_id).await?;

    let project_id = match project {
        Some(query) => Some(resolve_project_id(engine, query)?),
        None => None,
    };

    config.default_account = Some(account_id);
    config.default_project = project_id;
    config.save()?;

    match project {
        Some(project) => println!(
            "{}",
            format!("Default scope set to {} / {}", account, project).green()
        ),
        None => println!("{}", format!("Default account set to {}", account).green()),
    }
    Ok(())
}
