//! Document store persisted to a single JSON file
//!
//! Used by the command-line front end. The whole store is loaded at open and
//! rewritten atomically for every mutation, so the file is either the old
//! contents or the new contents, never a partial write. A mutation becomes
//! visible to subscribers only once the file holds it.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error};

use super::memory::{MemoryStore, Mutation, StoreContents};
use super::path::DocumentPath;
use super::subscription::Subscription;
use super::{Document, DocumentSnapshot, DocumentStore};
use crate::error::{ExpenseError, ExpenseResult};

/// A [`MemoryStore`] mirrored to disk
#[derive(Clone)]
pub struct FileStore {
    path: PathBuf,
    memory: MemoryStore,
}

impl FileStore {
    /// Open the store at `path`; a missing file is an empty store
    pub fn open(path: impl Into<PathBuf>) -> ExpenseResult<Self> {
        let path = path.into();
        let contents: StoreContents = read_json(&path)?;
        debug!(path = %path.display(), collections = contents.len(), "opened store");
        Ok(Self {
            path,
            memory: MemoryStore::from_contents(contents),
        })
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The in-memory store behind this file
    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    fn commit(&self, path: &DocumentPath, mutation: Mutation) -> ExpenseResult<()> {
        self.memory.commit(path, mutation, |contents| {
            write_json_atomic(&self.path, contents).map_err(|e| {
                error!(file = %self.path.display(), error = %e, "failed to persist store");
                e
            })
        })
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn subscribe(&self, path: &DocumentPath) -> ExpenseResult<Subscription> {
        self.memory.subscribe(path).await
    }

    async fn write(&self, path: &DocumentPath, document: Document) -> ExpenseResult<()> {
        self.commit(path, Mutation::Write(document))
    }

    async fn update(&self, path: &DocumentPath, fields: Document) -> ExpenseResult<()> {
        self.commit(path, Mutation::Update(fields))
    }

    async fn delete(&self, path: &DocumentPath) -> ExpenseResult<()> {
        self.commit(path, Mutation::Delete)
    }

    async fn query(
        &self,
        collection: &DocumentPath,
        field: &str,
        value: &Value,
    ) -> ExpenseResult<DocumentSnapshot> {
        self.memory.query(collection, field, value).await
    }
}

/// Read JSON from a file, returning a default value if the file doesn't exist
fn read_json<T>(path: &Path) -> ExpenseResult<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    if !path.exists() {
        return Ok(T::default());
    }

    let file = File::open(path).map_err(|e| {
        ExpenseError::Persistence(format!("Failed to open {}: {}", path.display(), e))
    })?;

    serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        ExpenseError::Persistence(format!("Failed to parse {}: {}", path.display(), e))
    })
}

/// Write JSON to a file atomically (write to temp, then rename)
fn write_json_atomic<T: serde::Serialize>(path: &Path, data: &T) -> ExpenseResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            ExpenseError::Persistence(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    // Temp file must live in the same directory for the rename to be atomic
    let temp_path = path.with_extension("json.tmp");

    let file = File::create(&temp_path)
        .map_err(|e| ExpenseError::Persistence(format!("Failed to create temp file: {}", e)))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| ExpenseError::Persistence(format!("Failed to serialize data: {}", e)))?;

    writer
        .flush()
        .map_err(|e| ExpenseError::Persistence(format!("Failed to flush data: {}", e)))?;

    writer
        .get_ref()
        .sync_all()
        .map_err(|e| ExpenseError::Persistence(format!("Failed to sync data: {}", e)))?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        ExpenseError::Persistence(format!("Failed to rename temp file: {}", e))
    })?;

    Ok(())
}
