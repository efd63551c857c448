//! Persistence boundary
//!
//! The expense tracker keeps no durable state of its own. Everything lives in
//! a document store organised as
//!
//! - `users/{userId}/expenses/{expenseId}`
//! - `users/{userId}/categories/{categoryId}`
//! - `users/{userId}/settings/budget`
//!
//! Components talk to the store through [`DocumentStore`] and keep a local
//! mirror of the data they own, refreshed from a live [`Subscription`].
//!
//! # Example
//!
//! ```rust,ignore
//! use expense_tracker::store::{DocumentPath, DocumentStore, MemoryStore};
//!
//! let store = MemoryStore::new();
//! let mut sub = store.subscribe(&DocumentPath::expenses(&user)).await?;
//! while let Some(event) = sub.next().await {
//!     // apply snapshot
//! }
//! ```

pub mod codec;
pub mod file;
pub mod memory;
pub mod mirror;
pub mod path;
pub mod subscription;

pub use codec::{DecodeError, DecodedExpense, LegacyFormat};
pub use file::FileStore;
pub use memory::{MemoryStore, StoreContents, StoreOp};
pub use mirror::{LiveMirror, MirrorUpdate};
pub use path::DocumentPath;
pub use subscription::{CancelHandle, Subscription};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ExpenseResult;

/// A stored record: a JSON object of top-level fields
pub type Document = serde_json::Map<String, Value>;

/// Point-in-time contents of a collection, as `(document id, document)` pairs
pub type DocumentSnapshot = Vec<(String, Document)>;

/// A change notification pushed to subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// The full current contents of the subscribed path
    Snapshot(DocumentSnapshot),
    /// The store could not deliver a snapshot
    Error(String),
}

/// Remote document store contract
///
/// Writes are not reflected in local mirrors until the next [`StoreEvent`]
/// arrives on a subscription. Implementations serialize writes per document.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Subscribe to a collection or a single document
    ///
    /// The current contents are delivered immediately, then again after every
    /// change under `path`.
    async fn subscribe(&self, path: &DocumentPath) -> ExpenseResult<Subscription>;

    /// Create or replace a document
    async fn write(&self, path: &DocumentPath, document: Document) -> ExpenseResult<()>;

    /// Merge fields into an existing document; `NotFound` if it does not exist
    async fn update(&self, path: &DocumentPath, fields: Document) -> ExpenseResult<()>;

    /// Remove a document; removing an absent document succeeds
    async fn delete(&self, path: &DocumentPath) -> ExpenseResult<()>;

    /// Documents in a collection whose top-level `field` equals `value`
    async fn query(
        &self,
        collection: &DocumentPath,
        field: &str,
        value: &Value,
    ) -> ExpenseResult<DocumentSnapshot>;
}
