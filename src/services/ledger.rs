//! Expense ledger
//!
//! Owns the local mirror of a user's expenses and the derived monthly views.
//! Mutations go straight to the store; the mirror only changes when the
//! store's next snapshot arrives.

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use tokio::sync::watch;
use tracing::{debug, error, info};

use super::session::SignedInUser;
use crate::error::{ExpenseError, ExpenseResult};
use crate::models::{Expense, ExpenseId, Money, MonthPeriod, NewExpense, UserId};
use crate::reports::summary::{summarize_by_category, CategorySummary};
use crate::store::codec::{decode_expenses, encode_expense};
use crate::store::{DocumentPath, DocumentSnapshot, DocumentStore, LiveMirror, MirrorUpdate};

fn decode_snapshot(documents: DocumentSnapshot) -> MirrorUpdate<Vec<Expense>> {
    let (expenses, failures) = decode_expenses(&documents);
    for failure in &failures {
        debug!(%failure, "undecodable expense");
    }
    MirrorUpdate {
        value: expenses,
        skipped: failures.into_iter().map(|f| f.doc_id).collect(),
    }
}

/// The signed-in user's expenses
pub struct ExpenseLedger<S> {
    store: Arc<S>,
    user: SignedInUser,
    mirror: LiveMirror<Vec<Expense>>,
}

impl<S: DocumentStore> ExpenseLedger<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            user: SignedInUser::default(),
            mirror: LiveMirror::new("expenses"),
        }
    }

    // === Subscription ===

    /// Subscribe to `user`'s expenses, replacing any earlier subscription
    pub async fn start_listening(&self, user: UserId) -> ExpenseResult<()> {
        self.mirror.stop();
        if self.user.get().as_ref() != Some(&user) {
            self.mirror.clear();
        }
        self.user.set(user.clone());

        let subscription = self
            .store
            .subscribe(&DocumentPath::expenses(&user))
            .await
            .map_err(|e| {
                error!(user = %user, error = %e, "failed to subscribe to expenses");
                e
            })?;
        self.mirror.start(subscription, decode_snapshot);
        info!(user = %user, "listening for expenses");
        Ok(())
    }

    /// Cancel the subscription and forget the user; the mirror is emptied
    pub fn stop_listening(&self) {
        self.mirror.stop();
        self.mirror.clear();
        self.user.clear();
    }

    pub fn is_listening(&self) -> bool {
        self.mirror.is_listening()
    }

    /// Wait for the first snapshot of the current subscription
    pub async fn wait_until_synced(&self) -> ExpenseResult<()> {
        self.mirror.wait_until_synced().await
    }

    // === Mutations ===

    /// Record a new expense; returns the id it was stored under
    pub async fn add(&self, input: NewExpense) -> ExpenseResult<ExpenseId> {
        input
            .validate()
            .map_err(|e| ExpenseError::Validation(e.to_string()))?;
        let user = self.user.require()?;

        let expense = Expense::new(input);
        let path = DocumentPath::expense(&user, &expense.id);
        match self.store.write(&path, encode_expense(&expense)).await {
            Ok(()) => {
                info!(expense = %expense.id, amount = %expense.amount, "expense added");
                Ok(expense.id)
            }
            Err(e) => {
                error!(error = %e, "failed to add expense");
                Err(e)
            }
        }
    }

    /// Remove an expense; removing an absent id is not an error
    pub async fn delete(&self, id: &ExpenseId) -> ExpenseResult<()> {
        let user = self.user.require()?;
        match self.store.delete(&DocumentPath::expense(&user, id)).await {
            Ok(()) => {
                info!(expense = %id, "expense deleted");
                Ok(())
            }
            Err(e) => {
                error!(expense = %id, error = %e, "failed to delete expense");
                Err(e)
            }
        }
    }

    // === Queries ===

    /// Immutable copy of the mirrored expenses
    pub fn snapshot(&self) -> Arc<Vec<Expense>> {
        self.mirror.snapshot()
    }

    /// Look up a mirrored expense by id, or by a unique id prefix
    pub fn find(&self, identifier: &str) -> Option<Expense> {
        let snapshot = self.snapshot();
        if let Some(exact) = snapshot.iter().find(|e| e.id.as_str() == identifier) {
            return Some(exact.clone());
        }
        let mut prefixed = snapshot.iter().filter(|e| e.id.as_str().starts_with(identifier));
        match (prefixed.next(), prefixed.next()) {
            (Some(only), None) if !identifier.is_empty() => Some(only.clone()),
            _ => None,
        }
    }

    /// Total spent in the current calendar month
    pub fn monthly_total(&self) -> Money {
        self.monthly_total_at(Local::now().naive_local())
    }

    /// Total spent in the calendar month containing `now`
    pub fn monthly_total_at(&self, now: NaiveDateTime) -> Money {
        let period = MonthPeriod::containing(now);
        self.snapshot()
            .iter()
            .filter(|e| period.contains(e.date))
            .map(|e| e.amount)
            .sum()
    }

    /// Current month's spending per category name, largest first
    pub fn monthly_category_summaries(&self) -> Vec<CategorySummary> {
        self.monthly_category_summaries_at(Local::now().naive_local())
    }

    /// Spending per category name for the month containing `now`
    pub fn monthly_category_summaries_at(&self, now: NaiveDateTime) -> Vec<CategorySummary> {
        let period = MonthPeriod::containing(now);
        let snapshot = self.snapshot();
        summarize_by_category(snapshot.iter().filter(|e| period.contains(e.date)))
    }

    /// Observe every applied snapshot
    pub fn subscribe_changes(&self) -> watch::Receiver<Arc<Vec<Expense>>> {
        self.mirror.subscribe_changes()
    }

    /// Most recent subscription error
    pub fn last_error(&self) -> Option<String> {
        self.mirror.last_error()
    }

    /// Document ids the last snapshot could not decode
    pub fn skipped_records(&self) -> Vec<String> {
        self.mirror.skipped()
    }

    pub fn user(&self) -> Option<UserId> {
        self.user.get()
    }
}
