//! Monthly budget model
//!
//! A user has at most one budget figure. An amount of zero means no budget
//! has been set, which is why a zero budget is never "over budget".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::money::Money;

/// The user's monthly budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Budget {
    /// Budget per calendar month; zero is the "unset" sentinel
    pub amount: Money,

    /// Last write time, if the budget document carried one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Budget {
    /// A budget that has never been set
    pub const fn unset() -> Self {
        Self {
            amount: Money::zero(),
            updated_at: None,
        }
    }

    /// Create a budget stamped with the current time
    pub fn new(amount: Money) -> Self {
        Self {
            amount,
            updated_at: Some(Utc::now()),
        }
    }

    /// Whether a budget figure is in effect
    pub fn is_set(&self) -> bool {
        self.amount.is_positive()
    }

    /// Budget left after `spent` (may be negative)
    pub fn remaining(&self, spent: Money) -> Money {
        self.amount - spent
    }

    /// Over budget only when a budget is set and spending exceeds it
    pub fn is_exceeded_by(&self, spent: Money) -> bool {
        spent > self.amount && self.is_set()
    }
}
