//! CLI command for data export

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::{Args, ValueEnum};

use super::{CliSession, FilterArgs};
use crate::error::{ExpenseError, ExpenseResult};
use crate::export::ExportFormat;
use crate::reports::apply;

/// Export format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExportFormatArg {
    /// CSV rows: date,category,amount,note
    Csv,
    /// JSON array of expense records
    Json,
}

impl From<ExportFormatArg> for ExportFormat {
    fn from(arg: ExportFormatArg) -> Self {
        match arg {
            ExportFormatArg::Csv => ExportFormat::Csv,
            ExportFormatArg::Json => ExportFormat::Json,
        }
    }
}

/// Arguments for `expense export`
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Export format
    #[arg(value_enum)]
    pub format: ExportFormatArg,

    /// Output file (defaults to expenses.csv / expenses.json in the current directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub filter: FilterArgs,
}

/// Handle `expense export`
pub async fn handle_export_command(session: &CliSession, args: ExportArgs) -> ExpenseResult<()> {
    let format = ExportFormat::from(args.format);
    let filter = args.filter.to_filter(session)?;
    let result = apply(&session.ledger().snapshot(), &filter);
    let bytes = format.render(&result.expenses)?;

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(format.file_name()));
    let file = File::create(&output).map_err(|e| {
        ExpenseError::Export(format!("Failed to create file {}: {}", output.display(), e))
    })?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(&bytes)
        .and_then(|_| writer.flush())
        .map_err(|e| ExpenseError::Export(e.to_string()))?;

    println!(
        "Exported {} expense(s) as {} to: {}",
        result.len(),
        format,
        output.display()
    );
    Ok(())
}
