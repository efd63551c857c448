//! Budget CLI commands

use clap::Subcommand;

use super::{parse_amount, CliSession};
use crate::config::settings::Settings;
use crate::display::format_budget_status;
use crate::error::ExpenseResult;

/// Budget subcommands
#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Show the monthly budget against this month's spending
    Show,

    /// Set the monthly budget (0 clears it)
    Set {
        /// Amount (e.g., "500" or "500.00")
        amount: String,
    },
}

/// Handle a budget command
pub async fn handle_budget_command(
    session: &CliSession,
    settings: &Settings,
    cmd: BudgetCommands,
) -> ExpenseResult<()> {
    match cmd {
        BudgetCommands::Show => {
            let status = session.budget().status(session.ledger().monthly_total());
            print!("{}", format_budget_status(&status, &settings.currency_symbol));
        }

        BudgetCommands::Set { amount } => {
            let amount = parse_amount(&amount)?;
            session.budget().set_budget(amount).await?;
            if amount.is_zero() {
                println!("Monthly budget cleared");
            } else {
                println!(
                    "Monthly budget set to {}",
                    amount.format_with_symbol(&settings.currency_symbol)
                );
            }
        }
    }

    Ok(())
}
