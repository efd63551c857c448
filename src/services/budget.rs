//! Budget tracker
//!
//! Mirrors the single budget document of the signed-in user and compares it
//! against spending totals supplied by the ledger.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};

use super::session::SignedInUser;
use crate::error::{ExpenseError, ExpenseResult};
use crate::models::{Budget, Money, UserId};
use crate::store::codec::{decode_budget, encode_budget};
use crate::store::{DocumentPath, DocumentSnapshot, DocumentStore, LiveMirror, MirrorUpdate};

fn decode_snapshot(documents: DocumentSnapshot) -> MirrorUpdate<Budget> {
    MirrorUpdate::new(decode_budget(documents.first().map(|(_, doc)| doc)))
}

/// Budget compared with actual spending
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetStatus {
    pub budget: Money,
    pub spent: Money,
    pub remaining: Money,
    /// `spent / budget`, or `None` when no budget is set
    pub usage: Option<f64>,
    pub over_budget: bool,
}

/// The signed-in user's monthly budget
pub struct BudgetTracker<S> {
    store: Arc<S>,
    user: SignedInUser,
    mirror: LiveMirror<Budget>,
}

impl<S: DocumentStore> BudgetTracker<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            user: SignedInUser::default(),
            mirror: LiveMirror::new("budget"),
        }
    }

    /// Subscribe to `user`'s budget document, replacing any earlier subscription
    pub async fn start_listening(&self, user: UserId) -> ExpenseResult<()> {
        self.mirror.stop();
        if self.user.get().as_ref() != Some(&user) {
            self.mirror.clear();
        }
        self.user.set(user.clone());

        let subscription = self
            .store
            .subscribe(&DocumentPath::budget(&user))
            .await
            .map_err(|e| {
                error!(user = %user, error = %e, "failed to subscribe to budget");
                e
            })?;
        self.mirror.start(subscription, decode_snapshot);
        info!(user = %user, "listening for budget");
        Ok(())
    }

    pub fn stop_listening(&self) {
        self.mirror.stop();
        self.mirror.clear();
        self.user.clear();
    }

    pub fn is_listening(&self) -> bool {
        self.mirror.is_listening()
    }

    pub async fn wait_until_synced(&self) -> ExpenseResult<()> {
        self.mirror.wait_until_synced().await
    }

    /// Store a new monthly budget; zero clears it
    pub async fn set_budget(&self, amount: Money) -> ExpenseResult<()> {
        if amount.is_negative() {
            return Err(ExpenseError::Validation(format!(
                "Budget cannot be negative: {}",
                amount
            )));
        }
        let user = self.user.require()?;

        let budget = Budget::new(amount);
        self.store
            .write(&DocumentPath::budget(&user), encode_budget(&budget))
            .await
            .map_err(|e| {
                error!(error = %e, "failed to save budget");
                e
            })?;
        info!(amount = %amount, "budget set");
        Ok(())
    }

    /// Mirrored budget document
    pub fn budget(&self) -> Budget {
        *self.mirror.snapshot()
    }

    /// Mirrored budget amount; zero when unset
    pub fn monthly_budget(&self) -> Money {
        self.budget().amount
    }

    /// Budget minus `total_expenses`; may be negative
    pub fn remaining_budget(&self, total_expenses: Money) -> Money {
        self.budget().remaining(total_expenses)
    }

    /// Over budget only when a budget is set and spending exceeds it
    pub fn is_over_budget(&self, total_expenses: Money) -> bool {
        self.budget().is_exceeded_by(total_expenses)
    }

    pub fn status(&self, total_expenses: Money) -> BudgetStatus {
        status_of(self.budget(), total_expenses)
    }

    pub fn subscribe_changes(&self) -> watch::Receiver<Arc<Budget>> {
        self.mirror.subscribe_changes()
    }

    pub fn last_error(&self) -> Option<String> {
        self.mirror.last_error()
    }
}

fn status_of(budget: Budget, spent: Money) -> BudgetStatus {
    BudgetStatus {
        budget: budget.amount,
        spent,
        remaining: budget.remaining(spent),
        usage: budget
            .is_set()
            .then(|| spent.cents() as f64 / budget.amount.cents() as f64),
        over_budget: budget.is_exceeded_by(spent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreOp};
    use serde_json::json;

    fn user() -> UserId {
        UserId::parse("alice").unwrap()
    }

    async fn listening(store: &MemoryStore) -> BudgetTracker<MemoryStore> {
        let tracker = BudgetTracker::new(Arc::new(store.clone()));
        tracker.start_listening(user()).await.unwrap();
        tracker.wait_until_synced().await.unwrap();
        tracker
    }

    #[tokio::test]
    async fn test_missing_document_reads_as_unset() {
        let tracker = listening(&MemoryStore::new()).await;
        assert_eq!(tracker.monthly_budget(), Money::zero());
        assert!(!tracker.is_over_budget(Money::from_cents(1_000_000)));
        assert_eq!(tracker.status(Money::from_cents(10)).usage, None);
    }

    #[tokio::test]
    async fn test_set_budget_round_trip() {
        let store = MemoryStore::new();
        let tracker = listening(&store).await;
        tracker.set_budget(Money::from_cents(10000)).await.unwrap();

        let mut changes = tracker.subscribe_changes();
        changes.wait_for(|b| b.is_set()).await.unwrap();

        assert_eq!(tracker.monthly_budget(), Money::from_cents(10000));
        assert!(tracker.budget().updated_at.is_some());
        assert!(!tracker.is_over_budget(Money::from_cents(10000)));
        assert!(tracker.is_over_budget(Money::from_cents(10001)));
        assert_eq!(
            tracker.remaining_budget(Money::from_cents(12500)),
            Money::from_cents(-2500)
        );

        let status = tracker.status(Money::from_cents(2500));
        assert_eq!(status.usage, Some(0.25));
        assert!(!status.over_budget);
    }

    #[tokio::test]
    async fn test_negative_budget_rejected_without_store_call() {
        let store = MemoryStore::new();
        let tracker = listening(&store).await;
        store.fail_next(StoreOp::Write, "should not be reached");

        let err = tracker.set_budget(Money::from_cents(-1)).await.unwrap_err();
        assert!(err.is_validation());
        assert!(tracker.set_budget(Money::from_cents(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_non_numeric_budget_reads_as_zero() {
        let store = MemoryStore::new();
        store
            .write(
                &DocumentPath::budget(&user()),
                json!({ "amount": "a lot" }).as_object().cloned().unwrap(),
            )
            .await
            .unwrap();
        let tracker = listening(&store).await;
        assert_eq!(tracker.monthly_budget(), Money::zero());
    }

    #[test]
    fn test_status_over_budget() {
        let status = status_of(Budget::new(Money::from_cents(10000)), Money::from_cents(10001));
        assert!(status.over_budget);
        assert_eq!(status.remaining, Money::from_cents(-1));

        let unset = status_of(Budget::unset(), Money::from_cents(10001));
        assert!(!unset.over_budget);
    }
}
