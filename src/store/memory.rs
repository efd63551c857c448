//! In-process document store
//!
//! [`MemoryStore`] implements [`DocumentStore`] over nested maps guarded by a
//! mutex, pushing a fresh snapshot to every interested subscriber after each
//! change. It also supports fault injection so callers can exercise the
//! error paths of the persistence boundary.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use super::path::DocumentPath;
use super::subscription::{CancelHandle, Subscription};
use super::{Document, DocumentSnapshot, DocumentStore, StoreEvent};
use crate::error::{ExpenseError, ExpenseResult};

/// Full store contents: collection key to documents by id
pub type StoreContents = BTreeMap<String, BTreeMap<String, Document>>;

/// Store operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Subscribe,
    Write,
    Update,
    Delete,
    Query,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Subscribe => write!(f, "subscribe"),
            Self::Write => write!(f, "write"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
            Self::Query => write!(f, "query"),
        }
    }
}

/// A change to a single document
#[derive(Debug, Clone)]
pub(crate) enum Mutation {
    /// Create or replace
    Write(Document),
    /// Merge fields into an existing document
    Update(Document),
    Delete,
}

impl Mutation {
    fn op(&self) -> StoreOp {
        match self {
            Self::Write(_) => StoreOp::Write,
            Self::Update(_) => StoreOp::Update,
            Self::Delete => StoreOp::Delete,
        }
    }

    /// Apply to `collections`; returns whether anything changed
    fn apply(self, collections: &mut StoreContents, path: &DocumentPath) -> ExpenseResult<bool> {
        let (Some(parent), Some(id)) = (path.parent(), path.document_id()) else {
            return Err(ExpenseError::Validation(format!(
                "{} needs a document path, got {}",
                self.op(),
                path
            )));
        };
        match self {
            Self::Write(document) => {
                collections
                    .entry(parent.key())
                    .or_default()
                    .insert(id.to_string(), document);
                Ok(true)
            }
            Self::Update(fields) => {
                let document = collections
                    .get_mut(&parent.key())
                    .and_then(|docs| docs.get_mut(id))
                    .ok_or_else(|| ExpenseError::document_not_found(path.key()))?;
                for (field, value) in fields {
                    document.insert(field, value);
                }
                Ok(true)
            }
            Self::Delete => Ok(collections
                .get_mut(&parent.key())
                .and_then(|docs| docs.remove(id))
                .is_some()),
        }
    }
}

struct Subscriber {
    path: DocumentPath,
    events: mpsc::UnboundedSender<StoreEvent>,
    handle: CancelHandle,
}

impl Subscriber {
    fn is_live(&self) -> bool {
        self.handle.is_active() && !self.events.is_closed()
    }
}

#[derive(Default)]
struct Inner {
    collections: StoreContents,
    subscribers: Vec<Subscriber>,
    one_shot_faults: Vec<(StoreOp, String)>,
    path_faults: HashMap<(StoreOp, String), String>,
}

impl Inner {
    fn snapshot(&self, path: &DocumentPath) -> DocumentSnapshot {
        if path.is_collection() {
            return self
                .collections
                .get(&path.key())
                .map(|docs| {
                    docs.iter()
                        .map(|(id, doc)| (id.clone(), doc.clone()))
                        .collect()
                })
                .unwrap_or_default();
        }
        self.document(path)
            .map(|(id, doc)| vec![(id.to_string(), doc.clone())])
            .unwrap_or_default()
    }

    fn document(&self, path: &DocumentPath) -> Option<(&str, &Document)> {
        let parent = path.parent()?;
        let id = path.document_id()?;
        self.collections
            .get(&parent.key())
            .and_then(|docs| docs.get_key_value(id))
            .map(|(id, doc)| (id.as_str(), doc))
    }

    fn check_fault(&mut self, op: StoreOp, path: &DocumentPath) -> ExpenseResult<()> {
        if let Some(pos) = self.one_shot_faults.iter().position(|(o, _)| *o == op) {
            let (_, message) = self.one_shot_faults.remove(pos);
            return Err(ExpenseError::Persistence(message));
        }
        if let Some(message) = self.path_faults.get(&(op, path.key())) {
            return Err(ExpenseError::Persistence(message.clone()));
        }
        Ok(())
    }

    /// Push current contents to subscribers of `path` and of its collection
    fn notify(&mut self, path: &DocumentPath) {
        self.subscribers.retain(Subscriber::is_live);
        let parent = path.parent();
        let targets: Vec<DocumentPath> = self
            .subscribers
            .iter()
            .filter(|s| &s.path == path || Some(&s.path) == parent.as_ref())
            .map(|s| s.path.clone())
            .collect();
        for target in targets {
            let snapshot = self.snapshot(&target);
            for subscriber in self.subscribers.iter().filter(|s| s.path == target) {
                let _ = subscriber
                    .events
                    .send(StoreEvent::Snapshot(snapshot.clone()));
            }
        }
    }
}

/// Document store held entirely in memory
///
/// Cloning yields another handle to the same store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store preloaded with `contents`
    pub fn from_contents(contents: StoreContents) -> Self {
        let store = Self::new();
        store.lock().collections = contents;
        store
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of everything in the store
    pub fn contents(&self) -> StoreContents {
        self.lock().collections.clone()
    }

    /// Read one document directly, bypassing subscriptions
    pub fn document(&self, path: &DocumentPath) -> Option<Document> {
        self.lock().document(path).map(|(_, doc)| doc.clone())
    }

    // === Fault injection ===

    /// Fail the next `op`, whatever its path
    pub fn fail_next(&self, op: StoreOp, message: impl Into<String>) {
        self.lock().one_shot_faults.push((op, message.into()));
    }

    /// Fail every `op` on `path` until [`MemoryStore::clear_faults`]
    pub fn fail_path(&self, op: StoreOp, path: &DocumentPath, message: impl Into<String>) {
        self.lock()
            .path_faults
            .insert((op, path.key()), message.into());
    }

    /// Remove all injected failures
    pub fn clear_faults(&self) {
        let mut inner = self.lock();
        inner.one_shot_faults.clear();
        inner.path_faults.clear();
    }

    /// Deliver an error event to subscribers of exactly `path`
    pub fn push_error(&self, path: &DocumentPath, message: impl Into<String>) {
        let message = message.into();
        let mut inner = self.lock();
        inner.subscribers.retain(Subscriber::is_live);
        for subscriber in inner.subscribers.iter().filter(|s| &s.path == path) {
            let _ = subscriber.events.send(StoreEvent::Error(message.clone()));
        }
    }

    /// Number of live subscriptions on exactly `path`
    pub fn subscriber_count(&self, path: &DocumentPath) -> usize {
        let mut inner = self.lock();
        inner.subscribers.retain(Subscriber::is_live);
        inner.subscribers.iter().filter(|s| &s.path == path).count()
    }

    /// Apply `mutation` to a copy of the contents, hand the copy to `persist`,
    /// and only then make it current and notify subscribers
    ///
    /// Runs entirely under the store lock, so commits are serialized and a
    /// failed `persist` leaves both the contents and subscribers untouched.
    pub(crate) fn commit<F>(
        &self,
        path: &DocumentPath,
        mutation: Mutation,
        persist: F,
    ) -> ExpenseResult<()>
    where
        F: FnOnce(&StoreContents) -> ExpenseResult<()>,
    {
        let mut inner = self.lock();
        let op = mutation.op();
        inner.check_fault(op, path)?;

        let mut candidate = inner.collections.clone();
        if !mutation.apply(&mut candidate, path)? {
            trace!(path = %path, %op, "nothing to change");
            return Ok(());
        }
        persist(&candidate)?;

        inner.collections = candidate;
        trace!(path = %path, %op, "document committed");
        inner.notify(path);
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn subscribe(&self, path: &DocumentPath) -> ExpenseResult<Subscription> {
        let mut inner = self.lock();
        inner.check_fault(StoreOp::Subscribe, path)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let handle = CancelHandle::new();
        let _ = tx.send(StoreEvent::Snapshot(inner.snapshot(path)));

        inner.subscribers.retain(Subscriber::is_live);
        inner.subscribers.push(Subscriber {
            path: path.clone(),
            events: tx,
            handle: handle.clone(),
        });
        debug!(path = %path, "subscribed");
        Ok(Subscription::new(path.clone(), rx, handle))
    }

    async fn write(&self, path: &DocumentPath, document: Document) -> ExpenseResult<()> {
        self.commit(path, Mutation::Write(document), |_| Ok(()))
    }

    async fn update(&self, path: &DocumentPath, fields: Document) -> ExpenseResult<()> {
        self.commit(path, Mutation::Update(fields), |_| Ok(()))
    }

    async fn delete(&self, path: &DocumentPath) -> ExpenseResult<()> {
        self.commit(path, Mutation::Delete, |_| Ok(()))
    }

    async fn query(
        &self,
        collection: &DocumentPath,
        field: &str,
        value: &Value,
    ) -> ExpenseResult<DocumentSnapshot> {
        let mut inner = self.lock();
        inner.check_fault(StoreOp::Query, collection)?;
        if !collection.is_collection() {
            return Err(ExpenseError::Validation(format!(
                "cannot query document path {}",
                collection
            )));
        }
        Ok(inner
            .snapshot(collection)
            .into_iter()
            .filter(|(_, doc)| doc.get(field) == Some(value))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExpenseId, UserId};
    use serde_json::json;

    fn user() -> UserId {
        UserId::parse("alice").unwrap()
    }

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn ids(event: Option<StoreEvent>) -> Vec<String> {
        match event {
            Some(StoreEvent::Snapshot(docs)) => docs.into_iter().map(|(id, _)| id).collect(),
            other => panic!("expected snapshot, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_subscribe_delivers_current_contents() {
        let store = MemoryStore::new();
        let path = DocumentPath::expense(&user(), &ExpenseId::from("e1"));
        store.write(&path, doc(json!({ "amount": 1.0 }))).await.unwrap();

        let mut sub = store.subscribe(&DocumentPath::expenses(&user())).await.unwrap();
        assert_eq!(ids(sub.next().await), vec!["e1"]);
    }

    #[tokio::test]
    async fn test_changes_reach_collection_and_document_subscribers() {
        let store = MemoryStore::new();
        let path = DocumentPath::expense(&user(), &ExpenseId::from("e1"));
        let mut collection = store.subscribe(&DocumentPath::expenses(&user())).await.unwrap();
        let mut single = store.subscribe(&path).await.unwrap();
        assert!(ids(collection.next().await).is_empty());
        assert!(ids(single.next().await).is_empty());

        store.write(&path, doc(json!({ "amount": 1.0 }))).await.unwrap();
        assert_eq!(ids(collection.next().await), vec!["e1"]);
        assert_eq!(ids(single.next().await), vec!["e1"]);

        store.delete(&path).await.unwrap();
        assert!(ids(collection.next().await).is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_and_requires_existing_document() {
        let store = MemoryStore::new();
        let path = DocumentPath::expense(&user(), &ExpenseId::from("e1"));

        let err = store
            .update(&path, doc(json!({ "note": "x" })))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        store
            .write(&path, doc(json!({ "amount": 1.0, "note": "a" })))
            .await
            .unwrap();
        store
            .update(&path, doc(json!({ "note": "b" })))
            .await
            .unwrap();
        assert_eq!(
            store.document(&path),
            Some(doc(json!({ "amount": 1.0, "note": "b" })))
        );
    }

    #[tokio::test]
    async fn test_query_matches_field() {
        let store = MemoryStore::new();
        let u = user();
        for (id, cat) in [("e1", "c1"), ("e2", "c2"), ("e3", "c1")] {
            store
                .write(
                    &DocumentPath::expense(&u, &ExpenseId::from(id)),
                    doc(json!({ "categoryId": cat })),
                )
                .await
                .unwrap();
        }

        let hits = store
            .query(&DocumentPath::expenses(&u), "categoryId", &json!("c1"))
            .await
            .unwrap();
        let hit_ids: Vec<_> = hits.into_iter().map(|(id, _)| id).collect();
        assert_eq!(hit_ids, vec!["e1", "e3"]);
    }

    #[tokio::test]
    async fn test_fault_injection() {
        let store = MemoryStore::new();
        let path = DocumentPath::expense(&user(), &ExpenseId::from("e1"));

        store.fail_next(StoreOp::Write, "quota exceeded");
        let err = store.write(&path, Document::new()).await.unwrap_err();
        assert!(matches!(err, ExpenseError::Persistence(ref m) if m == "quota exceeded"));
        store.write(&path, Document::new()).await.unwrap();

        store.fail_path(StoreOp::Delete, &path, "permission denied");
        assert!(store.delete(&path).await.is_err());
        assert!(store.delete(&path).await.is_err());
        store.clear_faults();
        store.delete(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_subscribers_are_pruned() {
        let store = MemoryStore::new();
        let path = DocumentPath::expenses(&user());
        let sub = store.subscribe(&path).await.unwrap();
        assert_eq!(store.subscriber_count(&path), 1);

        sub.cancel();
        assert_eq!(store.subscriber_count(&path), 0);
    }

    #[tokio::test]
    async fn test_push_error() {
        let store = MemoryStore::new();
        let path = DocumentPath::expenses(&user());
        let mut sub = store.subscribe(&path).await.unwrap();
        let _ = sub.next().await;

        store.push_error(&path, "offline");
        assert_eq!(sub.next().await, Some(StoreEvent::Error("offline".into())));
    }
}
