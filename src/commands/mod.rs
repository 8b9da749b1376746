pub mod account;
pub mod calendar;
pub mod logs;
pub mod post;
pub mod project;
pub mod select;
pub mod status;
pub mod transfer;
pub mod watch;

use std::sync::Arc;

use anyhow::Result;
use plancal_core::Engine;
use plancal_core::config::GlobalConfig;
use plancal_core::store::FileStore;

/// Open the document store, build the engine and load the account list.
pub async fn open_engine(config: &GlobalConfig) -> Result<Engine> {
    let store = FileStore::open(config.data_path())?;
    let mut engine = Engine::new(Arc::new(store)).with_origin(config.origin.clone());
    engine.bootstrap().await?;
    Ok(engine)
}

/// Make an account active: --account wins, then the config default,
/// then the only account available.
pub async fn select_account(
    engine: &mut Engine,
    flag: Option<&str>,
    config: &GlobalConfig,
) -> Result<()> {
    let wanted = flag.or(config.default_account.as_deref());

    let id = match wanted {
        Some(query) => resolve_account_id(engine, query)?,
        None if engine.accounts().len() == 1 => engine.accounts()[0].id.clone(),
        None => anyhow::bail!(
            "No account selected.\n\
            Use --account <name>, or set a default with `plancal use <account>`."
        ),
    };

    engine.select_account(&id).await?;
    Ok(())
}

/// Make a project active within the already-selected account: --project
/// wins, then the config default, then the only project available.
pub async fn select_project(
    engine: &mut Engine,
    flag: Option<&str>,
    config: &GlobalConfig,
) -> Result<()> {
    let wanted = flag.or(config.default_project.as_deref());

    let id = match wanted {
        Some(query) => resolve_project_id(engine, query)?,
        None if engine.projects().len() == 1 => engine.projects()[0].id.clone(),
        None => anyhow::bail!(
            "No project selected.\n\
            Use --project <name>, or set a default with `plancal use <account> <project>`."
        ),
    };

    engine.select_project(&id).await?;
    Ok(())
}

/// Select both account and project from the global CLI flags.
pub async fn select_scope(
    engine: &mut Engine,
    account: Option<&str>,
    project: Option<&str>,
    config: &GlobalConfig,
) -> Result<()> {
    select_account(engine, account, config).await?;
    select_project(engine, project, config).await
}

/// Resolve an account by name or id, listing what exists on a miss.
pub fn resolve_account_id(engine: &Engine, query: &str) -> Result<String> {
    match engine
        .accounts()
        .iter()
        .find(|a| a.id == query || a.name == query)
    {
        Some(account) => Ok(account.id.clone()),
        None => {
            let available: Vec<_> = engine.accounts().iter().map(|a| a.name.as_str()).collect();
            anyhow::bail!(
                "Account '{}' not found. Available: {}",
                query,
                available.join(", ")
            );
        }
    }
}

/// Resolve a project of the active account by name or id.
pub fn resolve_project_id(engine: &Engine, query: &str) -> Result<String> {
    match engine
        .projects()
        .iter()
        .find(|p| p.id == query || p.name == query)
    {
        Some(project) => Ok(project.id.clone()),
        None => {
            let available: Vec<_> = engine.projects().iter().map(|p| p.name.as_str()).collect();
            anyhow::bail!(
                "Project '{}' not found. Available: {}",
                query,
                available.join(", ")
            );
        }
    }
}

/// Resolve a calendar of the active project by name or id.
pub fn resolve_calendar_id(engine: &Engine, query: &str) -> Result<String> {
    let Some(doc) = engine.working() else {
        anyhow::bail!("No project document loaded");
    };

    match doc
        .calendars
        .iter()
        .find(|c| c.id == query || c.name == query)
    {
        Some(calendar) => Ok(calendar.id.clone()),
        None => {
            let available: Vec<_> = doc.calendars.iter().map(|c| c.name.as_str()).collect();
            anyhow::bail!(
                "Calendar '{}' not found. Available: {}",
                query,
                available.join(", ")
            );
        }
    }
}
