//! Service layer for the expense tracker
//!
//! The service layer owns the live local mirrors of remote data and the
//! business rules around them: validation, derived totals, and keeping
//! categories and expenses consistent with each other.

pub mod budget;
pub mod category;
pub mod consistency;
pub mod ledger;
pub mod session;

pub use budget::{BudgetStatus, BudgetTracker};
pub use category::{CategoryRegistry, RenameOutcome};
pub use consistency::{ConsistencyCoordinator, PropagationReport};
pub use ledger::ExpenseLedger;
pub use session::{Session, SignedInUser};
