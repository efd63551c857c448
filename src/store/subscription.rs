//! Cancelable subscription streams
//!
//! A [`Subscription`] yields [`StoreEvent`]s until it is cancelled. Cancelling
//! is synchronous: once [`Subscription::cancel`] (or [`CancelHandle::cancel`])
//! returns, no further event is handed out, including events that were already
//! queued in the channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use super::path::DocumentPath;
use super::StoreEvent;

/// Shared "still subscribed" flag
#[derive(Debug, Clone)]
pub struct CancelHandle {
    active: Arc<AtomicBool>,
}

impl CancelHandle {
    /// A fresh, active handle
    pub fn new() -> Self {
        Self {
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn cancel(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving end of a live subscription
#[derive(Debug)]
pub struct Subscription {
    path: DocumentPath,
    events: mpsc::UnboundedReceiver<StoreEvent>,
    handle: CancelHandle,
}

impl Subscription {
    /// Wrap a channel receiver; the store keeps the sender and a clone of `handle`
    pub fn new(
        path: DocumentPath,
        events: mpsc::UnboundedReceiver<StoreEvent>,
        handle: CancelHandle,
    ) -> Self {
        Self {
            path,
            events,
            handle,
        }
    }

    /// Path this subscription watches
    pub fn path(&self) -> &DocumentPath {
        &self.path
    }

    /// Wait for the next event
    ///
    /// Returns `None` once the subscription is cancelled or the store hangs up.
    pub async fn next(&mut self) -> Option<StoreEvent> {
        if !self.handle.is_active() {
            return None;
        }
        let event = self.events.recv().await?;
        // suppress anything queued before a cancel
        if !self.handle.is_active() {
            return None;
        }
        Some(event)
    }

    /// Stop receiving events
    pub fn cancel(&self) {
        self.handle.cancel();
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_active()
    }

    /// A handle that can cancel this subscription from elsewhere
    pub fn cancel_handle(&self) -> CancelHandle {
        self.handle.clone()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserId;

    fn channel() -> (mpsc::UnboundedSender<StoreEvent>, Subscription) {
        let (tx, rx) = mpsc::unbounded_channel();
        let user = UserId::parse("alice").unwrap();
        let sub = Subscription::new(DocumentPath::expenses(&user), rx, CancelHandle::new());
        (tx, sub)
    }

    #[tokio::test]
    async fn test_delivers_events_in_order() {
        let (tx, mut sub) = channel();
        tx.send(StoreEvent::Snapshot(Vec::new())).unwrap();
        tx.send(StoreEvent::Error("boom".into())).unwrap();

        assert_eq!(sub.next().await, Some(StoreEvent::Snapshot(Vec::new())));
        assert_eq!(sub.next().await, Some(StoreEvent::Error("boom".into())));
    }

    #[tokio::test]
    async fn test_cancel_suppresses_queued_events() {
        let (tx, mut sub) = channel();
        tx.send(StoreEvent::Snapshot(Vec::new())).unwrap();

        sub.cancel();
        assert!(!sub.is_active());
        assert_eq!(sub.next().await, None);
    }

    #[tokio::test]
    async fn test_cancel_through_handle() {
        let (tx, mut sub) = channel();
        let handle = sub.cancel_handle();
        tx.send(StoreEvent::Snapshot(Vec::new())).unwrap();

        handle.cancel();
        assert_eq!(sub.next().await, None);
    }

    #[tokio::test]
    async fn test_sender_dropped_ends_stream() {
        let (tx, mut sub) = channel();
        drop(tx);
        assert_eq!(sub.next().await, None);
    }

    #[test]
    fn test_drop_cancels() {
        let (_tx, sub) = channel();
        let handle = sub.cancel_handle();
        assert!(handle.is_active());
        drop(sub);
        assert!(!handle.is_active());
    }
}
