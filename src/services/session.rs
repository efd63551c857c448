//! Signed-in session
//!
//! The authentication boundary hands over a user id; until it does, no
//! component talks to the store.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{info, warn};

use super::budget::BudgetTracker;
use super::category::CategoryRegistry;
use super::ledger::ExpenseLedger;
use crate::error::{ExpenseError, ExpenseResult};
use crate::models::UserId;
use crate::store::DocumentStore;

/// The user a component is currently acting for
#[derive(Debug, Default)]
pub struct SignedInUser(RwLock<Option<UserId>>);

impl SignedInUser {
    pub fn get(&self) -> Option<UserId> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// The current user, or [`ExpenseError::NotSignedIn`]
    pub fn require(&self) -> ExpenseResult<UserId> {
        self.get().ok_or(ExpenseError::NotSignedIn)
    }

    pub fn set(&self, user: UserId) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Some(user);
    }

    pub fn clear(&self) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// One user's live view of their expenses, categories and budget
pub struct Session<S> {
    user: SignedInUser,
    ledger: ExpenseLedger<S>,
    categories: CategoryRegistry<S>,
    budget: BudgetTracker<S>,
}

impl<S: DocumentStore> Session<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            user: SignedInUser::default(),
            ledger: ExpenseLedger::new(Arc::clone(&store)),
            categories: CategoryRegistry::new(Arc::clone(&store)),
            budget: BudgetTracker::new(store),
        }
    }

    /// Start all subscriptions for `user`, cancelling any previous ones
    ///
    /// If any subscription fails the session is left signed out.
    pub async fn sign_in(&self, user: UserId) -> ExpenseResult<()> {
        let started = async {
            self.categories.start_listening(user.clone()).await?;
            self.ledger.start_listening(user.clone()).await?;
            self.budget.start_listening(user.clone()).await
        };
        if let Err(e) = started.await {
            warn!(user = %user, error = %e, "sign-in failed");
            self.sign_out();
            return Err(e);
        }
        self.user.set(user.clone());
        info!(user = %user, "signed in");
        Ok(())
    }

    /// Stop all subscriptions and forget the user
    pub fn sign_out(&self) {
        self.categories.stop_listening();
        self.ledger.stop_listening();
        self.budget.stop_listening();
        if let Some(user) = self.user.get() {
            info!(user = %user, "signed out");
        }
        self.user.clear();
    }

    /// Wait until every component has its first snapshot
    pub async fn wait_until_synced(&self) -> ExpenseResult<()> {
        self.categories.wait_until_synced().await?;
        self.ledger.wait_until_synced().await?;
        self.budget.wait_until_synced().await
    }

    pub fn user(&self) -> Option<UserId> {
        self.user.get()
    }

    pub fn ledger(&self) -> &ExpenseLedger<S> {
        &self.ledger
    }

    pub fn categories(&self) -> &CategoryRegistry<S> {
        &self.categories
    }

    pub fn budget(&self) -> &BudgetTracker<S> {
        &self.budget
    }
}
