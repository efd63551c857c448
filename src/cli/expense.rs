//! Expense CLI commands
//!
//! `add`, `list`, `delete` and `summary`.

use clap::Args;
use chrono::Local;

use super::{parse_amount, parse_date_time, CliSession, FilterArgs};
use crate::config::settings::Settings;
use crate::display::{format_budget_status, format_category_summaries, format_expense_list};
use crate::error::{ExpenseError, ExpenseResult};
use crate::models::{CategoryId, ExpenseId, MonthPeriod, NewExpense, UNCATEGORIZED_NAME};
use crate::reports::apply;

/// Arguments for `expense add`
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Amount (e.g., "12.50")
    pub amount: String,

    /// Category name or ID (uncategorized if omitted)
    #[arg(short, long)]
    pub category: Option<String>,

    /// Date (YYYY-MM-DD or YYYY-MM-DDTHH:MM); defaults to now
    #[arg(short, long)]
    pub date: Option<String>,

    /// Note
    #[arg(short, long)]
    pub note: Option<String>,
}

/// Handle `expense add`
pub async fn handle_add(session: &CliSession, settings: &Settings, args: AddArgs) -> ExpenseResult<()> {
    let amount = parse_amount(&args.amount)?;

    let (category_id, category_name) = match &args.category {
        Some(identifier) => {
            let category = session
                .categories()
                .find(identifier)
                .ok_or_else(|| ExpenseError::category_not_found(identifier.as_str()))?;
            (category.id, category.name)
        }
        None => (CategoryId::uncategorized(), UNCATEGORIZED_NAME.to_string()),
    };

    let date = match &args.date {
        Some(input) => parse_date_time(input)?,
        None => Local::now().naive_local(),
    };

    let mut input = NewExpense::new(amount, category_id, category_name.clone(), date);
    if let Some(note) = args.note {
        input = input.with_note(note);
    }

    let id = session.ledger().add(input).await?;
    println!(
        "Added expense: {} {} on {}",
        amount.format_with_symbol(&settings.currency_symbol),
        category_name,
        date.format(&settings.date_format)
    );
    println!("  ID: {}", id);
    Ok(())
}

/// Handle `expense list`
pub async fn handle_list(session: &CliSession, settings: &Settings, args: FilterArgs) -> ExpenseResult<()> {
    let filter = args.to_filter(session)?;
    let result = apply(&session.ledger().snapshot(), &filter);
    print!(
        "{}",
        format_expense_list(&result, &settings.currency_symbol, &settings.date_format)
    );

    let skipped = session.ledger().skipped_records();
    if !skipped.is_empty() {
        println!("({} unreadable record(s) skipped)", skipped.len());
    }
    Ok(())
}

/// Handle `expense delete`
pub async fn handle_delete(session: &CliSession, identifier: &str) -> ExpenseResult<()> {
    match session.ledger().find(identifier) {
        Some(expense) => {
            session.ledger().delete(&expense.id).await?;
            println!("Deleted expense: {}", expense);
        }
        None => {
            // deleting an absent expense is a no-op
            session.ledger().delete(&ExpenseId::from(identifier)).await?;
            println!("No expense matching '{}'; nothing deleted.", identifier);
        }
    }
    Ok(())
}

/// Handle `expense summary`
pub async fn handle_summary(session: &CliSession, settings: &Settings) -> ExpenseResult<()> {
    let ledger = session.ledger();
    let total = ledger.monthly_total();

    println!("Spending for {}", MonthPeriod::current());
    println!("==================");
    print!(
        "{}",
        format_category_summaries(&ledger.monthly_category_summaries(), &settings.currency_symbol)
    );
    println!();
    print!(
        "{}",
        format_budget_status(&session.budget().status(total), &settings.currency_symbol)
    );
    Ok(())
}
