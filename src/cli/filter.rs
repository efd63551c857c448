//! Filter flags shared by `list` and `export`

use clap::{Args, ValueEnum};

use super::{parse_date, CliSession};
use crate::error::{ExpenseError, ExpenseResult};
use crate::reports::{DatePreset, FilterState};

/// Date preset names accepted on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PresetArg {
    All,
    ThisMonth,
    LastMonth,
    Custom,
}

impl From<PresetArg> for DatePreset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::All => DatePreset::All,
            PresetArg::ThisMonth => DatePreset::ThisMonth,
            PresetArg::LastMonth => DatePreset::LastMonth,
            PresetArg::Custom => DatePreset::Custom,
        }
    }
}

/// Filter flags
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Date preset (defaults to custom when --from or --to is given, else all)
    #[arg(short, long, value_enum)]
    pub preset: Option<PresetArg>,

    /// First day of a custom range (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// Last day of a custom range, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    /// Only these categories (name or ID); repeatable
    #[arg(short, long = "category")]
    pub categories: Vec<String>,
}

impl FilterArgs {
    /// Resolve the flags against the session's categories
    pub fn to_filter(&self, session: &CliSession) -> ExpenseResult<FilterState> {
        let has_range = self.from.is_some() || self.to.is_some();
        let preset = match self.preset {
            Some(preset) => DatePreset::from(preset),
            None if has_range => DatePreset::Custom,
            None => DatePreset::All,
        };

        let mut filter = FilterState::preset(preset);
        if preset == DatePreset::Custom {
            let (Some(from), Some(to)) = (&self.from, &self.to) else {
                return Err(ExpenseError::Validation(
                    "A custom range needs both --from and --to".into(),
                ));
            };
            filter.start_date = parse_date(from)?;
            filter.end_date = parse_date(to)?;
        }

        for identifier in &self.categories {
            let category = session
                .categories()
                .find(identifier)
                .ok_or_else(|| ExpenseError::category_not_found(identifier.as_str()))?;
            filter.selected_category_ids.insert(category.id);
        }

        Ok(filter)
    }
}
