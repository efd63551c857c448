//! Category CLI commands

use clap::Subcommand;

use super::CliSession;
use crate::display::format_category_list;
use crate::error::{ExpenseError, ExpenseResult};

/// Category subcommands
#[derive(Subcommand)]
pub enum CategoryCommands {
    /// List all categories (oldest first)
    List,

    /// Create a new category
    Add {
        /// Category name
        name: String,
    },

    /// Rename a category and update its expenses
    Rename {
        /// Category name or ID
        category: String,
        /// New name
        name: String,
    },

    /// Delete a category no expense uses
    Delete {
        /// Category name or ID
        category: String,
    },
}

/// Handle a category command
pub async fn handle_category_command(session: &CliSession, cmd: CategoryCommands) -> ExpenseResult<()> {
    let registry = session.categories();

    match cmd {
        CategoryCommands::List => {
            print!("{}", format_category_list(&registry.categories()));
        }

        CategoryCommands::Add { name } => {
            let category = registry.add(&name).await?;
            println!("Created category: {}", category.name);
            println!("  ID: {}", category.id);
        }

        CategoryCommands::Rename { category, name } => {
            let cat = registry
                .find(&category)
                .ok_or_else(|| ExpenseError::category_not_found(category.as_str()))?;

            let outcome = registry.rename(&cat.id, &name).await?;
            println!("Renamed category: {} -> {}", cat.name, outcome.new_name);

            let report = outcome.wait_propagation().await?;
            println!("  Updated {} expense(s)", report.updated);
        }

        CategoryCommands::Delete { category } => {
            let cat = registry
                .find(&category)
                .ok_or_else(|| ExpenseError::category_not_found(category.as_str()))?;

            registry.delete(&cat.id).await?;
            println!("Deleted category: {}", cat.name);
        }
    }

    Ok(())
}
