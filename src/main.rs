mod commands;
mod render;

use anyhow::Result;
use clap::{Parser, Subcommand};
use plancal_core::config::GlobalConfig;

#[derive(Parser)]
#[command(name = "plancal")]
#[command(about = "Plan dated content posts across accounts, projects and calendars")]
struct Cli {
    /// Account to operate on (name or id)
    #[arg(long, global = true)]
    account: Option<String>,

    /// Project to operate on (name or id)
    #[arg(long, global = true)]
    project: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage accounts
    #[command(subcommand)]
    Account(AccountCommands),
    /// Manage the projects of the active account
    #[command(subcommand)]
    Project(ProjectCommands),
    /// Manage the calendars of the active project
    #[command(subcommand)]
    Calendar(CalendarCommands),
    /// Manage posts on the active calendar
    #[command(subcommand)]
    Post(PostCommands),
    /// Show the active calendar's posts
    Status {
        /// Only highlight posts with this status (repeatable)
        #[arg(short, long)]
        status: Vec<String>,

        /// Only highlight posts of this type (repeatable)
        #[arg(short = 't', long = "type")]
        post_type: Vec<String>,

        /// Only highlight posts on this platform (repeatable)
        #[arg(short, long)]
        platform: Vec<String>,
    },
    /// Show recent change-log entries for the active project
    Logs {
        /// How many entries to show
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
    /// Import a .ccpro file into the active calendar
    Import {
        /// Path to the .ccpro file
        file: std::path::PathBuf,
    },
    /// Export the active calendar to a .ccpro file
    Export {
        /// Output path (defaults to <calendar-name>.ccpro)
        file: Option<std::path::PathBuf>,
    },
    /// Remember an account (and optionally a project) as the default
    Use {
        account: String,
        project: Option<String>,
    },
    /// Follow remote changes to the active project's document
    Watch,
}

#[derive(Subcommand)]
enum AccountCommands {
    /// List all accounts
    List,
    /// Create a new account
    New { name: String },
    /// Rename an account
    Rename { account: String, name: String },
    /// Delete an account and everything under it
    Rm { account: String },
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// List the active account's projects
    List,
    /// Create a new project under the active account
    New { name: String },
    /// Rename a project
    Rename { project: String, name: String },
    /// Delete a project and its change log
    Rm { project: String },
}

#[derive(Subcommand)]
enum CalendarCommands {
    /// List the active project's calendars
    List,
    /// Create a new calendar and make it active
    New { name: String },
    /// Rename a calendar
    Rename { calendar: String, name: String },
    /// Delete a calendar (a project always keeps at least one)
    Rm { calendar: String },
    /// Switch the active calendar
    Switch { calendar: String },
}

#[derive(Subcommand)]
enum PostCommands {
    /// Add or replace the post on a date
    Add {
        /// Date of the post (YYYY-MM-DD)
        date: String,

        /// Post title
        title: String,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,

        /// Post type: Reel, Post, Carousel or "Blog Post" (repeatable)
        #[arg(short = 't', long = "type")]
        post_type: Vec<String>,

        /// Platform, e.g. Instagram or YouTube (repeatable)
        #[arg(short, long)]
        platform: Vec<String>,

        /// Highlight color (CSS value from the theme palette)
        #[arg(long)]
        color: Option<String>,

        /// Status: Planned, "On Approval", Scheduled, Posted or Edited
        #[arg(short, long)]
        status: Option<String>,
    },
    /// Remove the post on a date
    Rm { date: String },
    /// Move a post to another date (swaps if the target is occupied)
    Mv { from: String, to: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = GlobalConfig::load()?;
    let mut engine = commands::open_engine(&config).await?;

    match cli.command {
        Commands::Account(command) => match command {
            AccountCommands::List => commands::account::list(&engine),
            AccountCommands::New { name } => commands::account::new(&mut engine, &name).await,
            AccountCommands::Rename { account, name } => {
                commands::account::rename(&mut engine, &account, &name).await
            }
            AccountCommands::Rm { account } => commands::account::rm(&mut engine, &account).await,
        },
        Commands::Project(command) => {
            commands::select_account(&mut engine, cli.account.as_deref(), &config).await?;
            match command {
                ProjectCommands::List => commands::project::list(&engine),
                ProjectCommands::New { name } => commands::project::new(&mut engine, &name).await,
                ProjectCommands::Rename { project, name } => {
                    commands::project::rename(&mut engine, &project, &name).await
                }
                ProjectCommands::Rm { project } => {
                    commands::project::rm(&mut engine, &project).await
                }
            }
        }
        Commands::Calendar(command) => {
            commands::select_scope(
                &mut engine,
                cli.account.as_deref(),
                cli.project.as_deref(),
                &config,
            )
            .await?;
            match command {
                CalendarCommands::List => commands::calendar::list(&engine),
                CalendarCommands::New { name } => commands::calendar::new(&mut engine, &name).await,
                CalendarCommands::Rename { calendar, name } => {
                    commands::calendar::rename(&mut engine, &calendar, &name).await
                }
                CalendarCommands::Rm { calendar } => {
                    commands::calendar::rm(&mut engine, &calendar).await
                }
                CalendarCommands::Switch { calendar } => {
                    commands::calendar::switch(&mut engine, &calendar).await
                }
            }
        }
        Commands::Post(command) => {
            commands::select_scope(
                &mut engine,
                cli.account.as_deref(),
                cli.project.as_deref(),
                &config,
            )
            .await?;
            match command {
                PostCommands::Add {
                    date,
                    title,
                    notes,
                    post_type,
                    platform,
                    color,
                    status,
                } => {
                    commands::post::add(
                        &mut engine,
                        &date,
                        title,
                        notes,
                        &post_type,
                        platform,
                        color,
                        status.as_deref(),
                    )
                    .await
                }
                PostCommands::Rm { date } => commands::post::rm(&mut engine, &date).await,
                PostCommands::Mv { from, to } => {
                    commands::post::mv(&mut engine, &from, &to).await
                }
            }
        }
        Commands::Status {
            status,
            post_type,
            platform,
        } => {
            commands::select_scope(
                &mut engine,
                cli.account.as_deref(),
                cli.project.as_deref(),
                &config,
            )
            .await?;
            commands::status::run(&engine, &status, &post_type, platform)
        }
        Commands::Logs { limit } => {
            commands::select_scope(
                &mut engine,
                cli.account.as_deref(),
                cli.project.as_deref(),
                &config,
            )
            .await?;
            commands::logs::run(&engine, limit).await
        }
        Commands::Import { file } => {
            commands::select_scope(
                &mut engine,
                cli.account.as_deref(),
                cli.project.as_deref(),
                &config,
            )
            .await?;
            commands::transfer::import(&mut engine, &file).await
        }
        Commands::Export { file } => {
            commands::select_scope(
                &mut engine,
                cli.account.as_deref(),
                cli.project.as_deref(),
                &config,
            )
            .await?;
            commands::transfer::export(&engine, file.as_deref())
        }
        Commands::Use { account, project } => {
            commands::select::run(&mut engine, config, &account, project.as_deref()).await
        }
        Commands::Watch => {
            commands::select_scope(
                &mut engine,
                cli.account.as_deref(),
                cli.project.as_deref(),
                &config,
            )
            .await?;
            commands::watch::run(&mut engine).await
        }
    }
}
