use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use expense_tracker::cli::{
    handle_add, handle_budget_command, handle_category_command, handle_delete,
    handle_export_command, handle_list, handle_summary, AddArgs, BudgetCommands, CategoryCommands,
    CliSession, ExportArgs, FilterArgs,
};
use expense_tracker::config::{paths::ExpensePaths, settings::Settings};
use expense_tracker::models::UserId;
use expense_tracker::store::FileStore;

#[derive(Parser)]
#[command(
    name = "expense",
    author = "Nini",
    version,
    about = "Personal expense tracker",
    long_about = "Record expenses, organise them into categories, and compare \
                  monthly spending against a budget."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Set the user and create the data directory
    Init {
        /// User id to act for
        #[arg(short, long)]
        user: String,
    },

    /// Record an expense
    Add(AddArgs),

    /// List expenses, newest first
    #[command(alias = "ls")]
    List(FilterArgs),

    /// Delete an expense
    #[command(alias = "rm")]
    Delete {
        /// Expense ID (or unique prefix)
        id: String,
    },

    /// Show this month's spending by category and the budget
    Summary,

    /// Category management commands
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Budget commands
    #[command(subcommand)]
    Budget(BudgetCommands),

    /// Export expenses to CSV or JSON
    Export(ExportArgs),

    /// Show current configuration and paths
    Config,
}

fn init_tracing(settings: &Settings) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn open_session(paths: &ExpensePaths, settings: &Settings) -> Result<CliSession> {
    let user = settings
        .user()
        .context("No user configured. Run 'expense init --user <id>' first")?;
    let store = FileStore::open(paths.store_file())?;
    let session = CliSession::new(Arc::new(store));
    session.sign_in(user).await?;
    session.wait_until_synced().await?;
    Ok(session)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = ExpensePaths::new()?;
    let mut settings = Settings::load_or_create(&paths)?;
    init_tracing(&settings);

    let command = match cli.command {
        Some(command) => command,
        None => {
            println!("Expense tracker");
            println!();
            println!("Run 'expense --help' for usage information.");
            return Ok(());
        }
    };

    match command {
        Commands::Init { user } => {
            let user = UserId::parse(&user)?;
            settings.user_id = Some(user.to_string());
            settings.save(&paths)?;
            println!("Initialized expense tracker at: {}", paths.base_dir().display());
            println!("  User: {}", user);
            println!();
            println!("Run 'expense category add <name>' to create a category.");
        }
        Commands::Config => {
            println!("Expense Tracker Configuration");
            println!("=============================");
            println!("Config directory: {}", paths.base_dir().display());
            println!("Store file:       {}", paths.store_file().display());
            println!();
            println!("Settings:");
            println!(
                "  User:            {}",
                settings.user_id.as_deref().unwrap_or("(not set)")
            );
            println!("  Currency symbol: {}", settings.currency_symbol);
            println!("  Date format:     {}", settings.date_format);
            println!("  Log filter:      {}", settings.log_filter);
        }
        command => {
            let session = open_session(&paths, &settings).await?;
            match command {
                Commands::Add(args) => handle_add(&session, &settings, args).await?,
                Commands::List(args) => handle_list(&session, &settings, args).await?,
                Commands::Delete { id } => handle_delete(&session, &id).await?,
                Commands::Summary => handle_summary(&session, &settings).await?,
                Commands::Category(cmd) => handle_category_command(&session, cmd).await?,
                Commands::Budget(cmd) => handle_budget_command(&session, &settings, cmd).await?,
                Commands::Export(args) => handle_export_command(&session, args).await?,
                Commands::Init { .. } | Commands::Config => {}
            }
            session.sign_out();
        }
    }

    Ok(())
}
