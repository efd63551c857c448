//! Document paths
//!
//! Paths alternate collection and document segments, so a path with an odd
//! number of segments names a collection and an even number names a document.

use std::fmt;

use crate::models::{CategoryId, ExpenseId, UserId};

/// Location of a collection or document in the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath {
    segments: Vec<String>,
}

impl DocumentPath {
    fn user_root(user: &UserId) -> Vec<String> {
        vec!["users".to_string(), user.as_str().to_string()]
    }

    /// `users/{uid}/expenses`
    pub fn expenses(user: &UserId) -> Self {
        let mut segments = Self::user_root(user);
        segments.push("expenses".to_string());
        Self { segments }
    }

    /// `users/{uid}/expenses/{id}`
    pub fn expense(user: &UserId, id: &ExpenseId) -> Self {
        Self::expenses(user).child(id.as_str())
    }

    /// `users/{uid}/categories`
    pub fn categories(user: &UserId) -> Self {
        let mut segments = Self::user_root(user);
        segments.push("categories".to_string());
        Self { segments }
    }

    /// `users/{uid}/categories/{id}`
    pub fn category(user: &UserId, id: &CategoryId) -> Self {
        Self::categories(user).child(id.as_str())
    }

    /// `users/{uid}/settings/budget`
    pub fn budget(user: &UserId) -> Self {
        let mut segments = Self::user_root(user);
        segments.push("settings".to_string());
        segments.push("budget".to_string());
        Self { segments }
    }

    /// Path of a document inside this collection
    pub fn child(&self, id: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(id.to_string());
        Self { segments }
    }

    /// Whether this path names a collection
    pub fn is_collection(&self) -> bool {
        self.segments.len() % 2 == 1
    }

    /// Collection holding this document, or `None` for a collection path
    pub fn parent(&self) -> Option<Self> {
        if self.is_collection() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Last segment of a document path
    pub fn document_id(&self) -> Option<&str> {
        if self.is_collection() {
            return None;
        }
        self.segments.last().map(String::as_str)
    }

    /// Path as a slash-joined key
    pub fn key(&self) -> String {
        self.segments.join("/")
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}
