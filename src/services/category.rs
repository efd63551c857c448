//! Category registry
//!
//! Owns the signed-in user's categories. Renames are pushed on to the
//! expenses that copy the category name, and deletes are refused while any
//! expense still references the category.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::consistency::{ConsistencyCoordinator, PropagationReport};
use super::session::SignedInUser;
use crate::error::{ExpenseError, ExpenseResult};
use crate::models::category::validate_name;
use crate::models::{Category, CategoryId, UserId};
use crate::store::codec::{decode_category, encode_category};
use crate::store::{Document, DocumentPath, DocumentSnapshot, DocumentStore, LiveMirror, MirrorUpdate};

fn decode_snapshot(documents: DocumentSnapshot) -> MirrorUpdate<Vec<Category>> {
    let mut categories = Vec::with_capacity(documents.len());
    let mut skipped = Vec::new();
    for (doc_id, doc) in &documents {
        match decode_category(doc_id, doc) {
            Ok(category) => categories.push(category),
            Err(_) => skipped.push(doc_id.clone()),
        }
    }
    categories.sort_by_key(|c| c.created_at);
    MirrorUpdate {
        value: categories,
        skipped,
    }
}

/// A committed rename whose propagation may still be running
#[derive(Debug)]
pub struct RenameOutcome {
    pub category_id: CategoryId,
    pub new_name: String,
    propagation: JoinHandle<ExpenseResult<PropagationReport>>,
}

impl RenameOutcome {
    /// Whether propagation has finished
    pub fn is_finished(&self) -> bool {
        self.propagation.is_finished()
    }

    /// Wait for propagation and return its result
    pub async fn wait_propagation(self) -> ExpenseResult<PropagationReport> {
        self.propagation
            .await
            .map_err(|e| ExpenseError::Persistence(format!("rename propagation aborted: {}", e)))?
    }
}

/// The signed-in user's categories
pub struct CategoryRegistry<S> {
    store: Arc<S>,
    user: SignedInUser,
    mirror: LiveMirror<Vec<Category>>,
    coordinator: ConsistencyCoordinator<S>,
}

impl<S: DocumentStore> CategoryRegistry<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            coordinator: ConsistencyCoordinator::new(Arc::clone(&store)),
            store,
            user: SignedInUser::default(),
            mirror: LiveMirror::new("categories"),
        }
    }

    // === Subscription ===

    /// Subscribe to `user`'s categories, replacing any earlier subscription
    pub async fn start_listening(&self, user: UserId) -> ExpenseResult<()> {
        self.mirror.stop();
        if self.user.get().as_ref() != Some(&user) {
            self.mirror.clear();
        }
        self.user.set(user.clone());

        let subscription = self
            .store
            .subscribe(&DocumentPath::categories(&user))
            .await
            .map_err(|e| {
                error!(user = %user, error = %e, "failed to subscribe to categories");
                e
            })?;
        self.mirror.start(subscription, decode_snapshot);
        info!(user = %user, "listening for categories");
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

    // === Mutations ===

    /// Create a category; the name is trimmed and must not be empty
    pub async fn add(&self, name: &str) -> ExpenseResult<Category> {
        validate_name(name).map_err(|e| ExpenseError::Validation(e.to_string()))?;
        let user = self.user.require()?;

        let category = Category::new(name);
        let path = DocumentPath::category(&user, &category.id);
        self.store
            .write(&path, encode_category(&category))
            .await
            .map_err(|e| {
                error!(error = %e, "failed to add category");
                e
            })?;
        info!(category = %category.id, name = %category.name, "category added");
        Ok(category)
    }

    /// Rename a category, then propagate the new name to its expenses
    ///
    /// Returns once the category itself is renamed. Propagation runs on a
    /// separate task; its result is available through the returned
    /// [`RenameOutcome`]. Must be called within a Tokio runtime.
    pub async fn rename(&self, id: &CategoryId, new_name: &str) -> ExpenseResult<RenameOutcome> {
        validate_name(new_name).map_err(|e| ExpenseError::Validation(e.to_string()))?;
        let user = self.user.require()?;
        let new_name = new_name.trim().to_string();

        let mut fields = Document::new();
        fields.insert("name".into(), serde_json::json!(new_name));
        self.store
            .update(&DocumentPath::category(&user, id), fields)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    ExpenseError::category_not_found(id.as_str())
                } else {
                    error!(category = %id, error = %e, "failed to rename category");
                    e
                }
            })?;
        info!(category = %id, name = %new_name, "category renamed");

        let coordinator = self.coordinator.clone();
        let category_id = id.clone();
        let name = new_name.clone();
        let propagation = tokio::spawn(async move {
            coordinator
                .propagate_rename(&user, &category_id, &name)
                .await
        });

        Ok(RenameOutcome {
            category_id: id.clone(),
            new_name,
            propagation,
        })
    }

    /// Delete a category that no expense references
    pub async fn delete(&self, id: &CategoryId) -> ExpenseResult<()> {
        let user = self.user.require()?;

        let references = self.coordinator.usage_count(&user, id).await?;
        if references > 0 {
            let category = self.find_name(id).unwrap_or_else(|| id.to_string());
            warn!(category = %id, references, "refusing to delete category in use");
            return Err(ExpenseError::CategoryInUse {
                category,
                references,
            });
        }

        self.store
            .delete(&DocumentPath::category(&user, id))
            .await
            .map_err(|e| {
                error!(category = %id, error = %e, "failed to delete category");
                e
            })?;
        info!(category = %id, "category deleted");
        Ok(())
    }

    // === Queries ===

    /// Categories ordered by creation time
    pub fn categories(&self) -> Arc<Vec<Category>> {
        self.mirror.snapshot()
    }

    /// Name of a mirrored category
    pub fn find_name(&self, id: &CategoryId) -> Option<String> {
        self.categories()
            .iter()
            .find(|c| &c.id == id)
            .map(|c| c.name.clone())
    }

    /// Find a category by id, id prefix, or case-insensitive name
    pub fn find(&self, identifier: &str) -> Option<Category> {
        let identifier = identifier.trim();
        let categories = self.categories();
        categories
            .iter()
            .find(|c| c.id.as_str() == identifier)
            .or_else(|| {
                categories
                    .iter()
                    .find(|c| c.name.eq_ignore_ascii_case(identifier))
            })
            .or_else(|| {
                let mut prefixed = categories
                    .iter()
                    .filter(|c| !identifier.is_empty() && c.id.as_str().starts_with(identifier));
                match (prefixed.next(), prefixed.next()) {
                    (Some(only), None) => Some(only),
                    _ => None,
                }
            })
            .cloned()
    }

    pub fn subscribe_changes(&self) -> watch::Receiver<Arc<Vec<Category>>> {
        self.mirror.subscribe_changes()
    }

    pub fn last_error(&self) -> Option<String> {
        self.mirror.last_error()
    }

    pub fn skipped_records(&self) -> Vec<String> {
        self.mirror.skipped()
    }

    /// The coordinator used for rename and delete checks
    pub fn coordinator(&self) -> &ConsistencyCoordinator<S> {
        &self.coordinator
    }
}
