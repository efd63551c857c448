//! Category consistency
//!
//! Expenses carry a copy of their category's name. When a category is
//! renamed the copies have to be rewritten, and a category may only be
//! deleted while no expense points at it. Both checks go to the store rather
//! than a local mirror, so they see records the mirror has not received yet.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::error::{ExpenseError, ExpenseResult};
use crate::models::{CategoryId, ExpenseId, UserId};
use crate::store::{Document, DocumentPath, DocumentSnapshot, DocumentStore};

pub use crate::store::codec::{decode_expense, resolve_category, DecodedExpense, LegacyFormat};

/// Outcome of a rename propagation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropagationReport {
    /// Expenses that referenced the category
    pub matched: usize,
    /// Expenses whose name copy was rewritten
    pub updated: usize,
    /// Expenses that could not be rewritten, with the store's message
    pub failures: Vec<(ExpenseId, String)>,
}

impl PropagationReport {
    /// Whether every matched expense was updated
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Keeps expenses consistent with the categories they reference
pub struct ConsistencyCoordinator<S> {
    store: Arc<S>,
}

impl<S> Clone for ConsistencyCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: DocumentStore> ConsistencyCoordinator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Expense documents referencing `category_id`
    ///
    /// Includes legacy records that name the category through a bare
    /// `category` field and carry no `categoryId`.
    async fn referencing(
        &self,
        user: &UserId,
        category_id: &CategoryId,
    ) -> ExpenseResult<DocumentSnapshot> {
        let collection = DocumentPath::expenses(user);
        let key = json!(category_id.as_str());

        let mut matches = self.store.query(&collection, "categoryId", &key).await?;
        let legacy = self.store.query(&collection, "category", &key).await?;
        for (doc_id, doc) in legacy {
            let has_id = doc
                .get("categoryId")
                .and_then(Value::as_str)
                .is_some_and(|s| !s.trim().is_empty());
            if !has_id && !matches.iter().any(|(id, _)| *id == doc_id) {
                matches.push((doc_id, doc));
            }
        }
        Ok(matches)
    }

    /// Number of expenses referencing a category
    pub async fn usage_count(&self, user: &UserId, category_id: &CategoryId) -> ExpenseResult<usize> {
        self.referencing(user, category_id)
            .await
            .map(|docs| docs.len())
            .map_err(|e| {
                error!(category = %category_id, error = %e, "usage check failed");
                e
            })
    }

    /// Whether at least one expense references a category
    pub async fn is_in_use(&self, user: &UserId, category_id: &CategoryId) -> ExpenseResult<bool> {
        Ok(self.usage_count(user, category_id).await? > 0)
    }

    /// Rewrite the category name on every expense referencing `category_id`
    ///
    /// Updates are applied one by one and never rolled back. If any of them
    /// fails the result is [`ExpenseError::PartialPropagation`] carrying the
    /// report, including the updates that did succeed.
    pub async fn propagate_rename(
        &self,
        user: &UserId,
        category_id: &CategoryId,
        new_name: &str,
    ) -> ExpenseResult<PropagationReport> {
        let matches = self.referencing(user, category_id).await.map_err(|e| {
            error!(
                category = %category_id,
                error = %e,
                "failed to find expenses for category rename"
            );
            e
        })?;
        let mut report = PropagationReport {
            matched: matches.len(),
            ..PropagationReport::default()
        };

        let mut fields = Document::new();
        fields.insert("categoryId".into(), json!(category_id.as_str()));
        fields.insert("categoryName".into(), json!(new_name));

        for (doc_id, _) in matches {
            let id = ExpenseId::from(doc_id);
            let path = DocumentPath::expense(user, &id);
            match self.store.update(&path, fields.clone()).await {
                Ok(()) => report.updated += 1,
                Err(e) => report.failures.push((id, e.to_string())),
            }
        }

        if report.is_complete() {
            info!(
                category = %category_id,
                updated = report.updated,
                "propagated category rename"
            );
            Ok(report)
        } else {
            warn!(
                category = %category_id,
                updated = report.updated,
                failed = report.failures.len(),
                "category rename only partially propagated"
            );
            Err(ExpenseError::PartialPropagation(report))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreOp};

    fn user() -> UserId {
        UserId::parse("alice").unwrap()
    }

    async fn put(store: &MemoryStore, id: &str, value: Value) {
        let doc = value.as_object().cloned().unwrap();
        store
            .write(&DocumentPath::expense(&user(), &ExpenseId::from(id)), doc)
            .await
            .unwrap();
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        put(&store, "e1", json!({ "id": "e1", "amount": 5.0, "categoryId": "b", "categoryName": "Food", "date": "2024-01-01T10:00:00" })).await;
        put(&store, "e2", json!({ "id": "e2", "amount": 7.0, "categoryId": "b", "categoryName": "Food", "date": "2024-01-02T10:00:00" })).await;
        put(&store, "e3", json!({ "id": "e3", "amount": 9.0, "categoryId": "c", "categoryName": "Rent", "date": "2024-01-03T10:00:00" })).await;
        store
    }

    #[tokio::test]
    async fn test_propagate_rename_updates_only_matching() {
        let store = seeded().await;
        let coordinator = ConsistencyCoordinator::new(Arc::new(store.clone()));

        let report = coordinator
            .propagate_rename(&user(), &CategoryId::from("b"), "Dining")
            .await
            .unwrap();
        assert_eq!(report.matched, 2);
        assert_eq!(report.updated, 2);

        let e1 = store
            .document(&DocumentPath::expense(&user(), &ExpenseId::from("e1")))
            .unwrap();
        assert_eq!(e1["categoryName"], json!("Dining"));
        assert_eq!(e1["amount"], json!(5.0));
        assert_eq!(e1["date"], json!("2024-01-01T10:00:00"));

        let e3 = store
            .document(&DocumentPath::expense(&user(), &ExpenseId::from("e3")))
            .unwrap();
        assert_eq!(e3["categoryName"], json!("Rent"));
    }

    #[tokio::test]
    async fn test_partial_propagation_is_reported() {
        let store = seeded().await;
        store.fail_path(
            StoreOp::Update,
            &DocumentPath::expense(&user(), &ExpenseId::from("e2")),
            "permission denied",
        );
        let coordinator = ConsistencyCoordinator::new(Arc::new(store.clone()));

        let err = coordinator
            .propagate_rename(&user(), &CategoryId::from("b"), "Dining")
            .await
            .unwrap_err();
        let ExpenseError::PartialPropagation(report) = err else {
            panic!("expected partial propagation");
        };
        assert_eq!(report.matched, 2);
        assert_eq!(report.updated, 1);
        assert_eq!(report.failures[0].0, ExpenseId::from("e2"));

        // no rollback of the update that went through
        let e1 = store
            .document(&DocumentPath::expense(&user(), &ExpenseId::from("e1")))
            .unwrap();
        assert_eq!(e1["categoryName"], json!("Dining"));
    }

    #[tokio::test]
    async fn test_usage_includes_legacy_records() {
        let store = seeded().await;
        put(&store, "old", json!({ "amount": 1.0, "category": "Rent", "date": "2023-05-01" })).await;
        let coordinator = ConsistencyCoordinator::new(Arc::new(store.clone()));

        assert_eq!(coordinator.usage_count(&user(), &CategoryId::from("b")).await.unwrap(), 2);
        assert!(coordinator.is_in_use(&user(), &CategoryId::from("Rent")).await.unwrap());
        assert!(!coordinator.is_in_use(&user(), &CategoryId::from("zzz")).await.unwrap());

        coordinator
            .propagate_rename(&user(), &CategoryId::from("Rent"), "Housing")
            .await
            .unwrap();
        let old = store
            .document(&DocumentPath::expense(&user(), &ExpenseId::from("old")))
            .unwrap();
        let expense = decode_expense("old", &old).into_expense().unwrap();
        assert_eq!(expense.category_id.as_str(), "Rent");
        assert_eq!(expense.category_name, "Housing");
    }

    #[tokio::test]
    async fn test_query_failure_is_not_silently_unused() {
        let store = seeded().await;
        store.fail_next(StoreOp::Query, "offline");
        let coordinator = ConsistencyCoordinator::new(Arc::new(store));

        let err = coordinator
            .is_in_use(&user(), &CategoryId::from("b"))
            .await
            .unwrap_err();
        assert!(err.is_persistence());
    }

    #[tokio::test]
    async fn test_rename_lookup_failure_updates_nothing() {
        let store = seeded().await;
        store.fail_next(StoreOp::Query, "offline");
        let coordinator = ConsistencyCoordinator::new(Arc::new(store.clone()));

        let err = coordinator
            .propagate_rename(&user(), &CategoryId::from("b"), "Dining")
            .await
            .unwrap_err();
        assert!(matches!(err, ExpenseError::Persistence(ref m) if m == "offline"));

        let e1 = store
            .document(&DocumentPath::expense(&user(), &ExpenseId::from("e1")))
            .unwrap();
        assert_eq!(e1["categoryName"], json!("Food"));
    }
}
