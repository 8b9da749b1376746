//! Document store contract.
//!
//! The engine persists everything through this trait: a hierarchical
//! document database addressed by path segments, with atomic batches
//! and push-based subscriptions. `MemoryStore` and `FileStore` are the
//! built-in implementations; remote backends plug in the same way.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::{PlancalError, PlancalResult};

pub const ACCOUNTS: &str = "accounts";
pub const PROJECTS: &str = "projects";
pub const LOGS: &str = "logs";

/// Hierarchical document path. Even-length paths address documents,
/// odd-length paths address collections.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath(Vec<String>);

impl DocPath {
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DocPath(segments.into_iter().map(Into::into).collect())
    }

    pub fn parse(raw: &str) -> Self {
        DocPath(raw.split('/').map(String::from).collect())
    }

    pub fn accounts() -> Self {
        DocPath::from_segments([ACCOUNTS])
    }

    pub fn account(account_id: &str) -> Self {
        DocPath::from_segments([ACCOUNTS, account_id])
    }

    pub fn projects(account_id: &str) -> Self {
        Self::account(account_id).child(PROJECTS)
    }

    pub fn project(account_id: &str, project_id: &str) -> Self {
        Self::projects(account_id).child(project_id)
    }

    pub fn logs(account_id: &str, project_id: &str) -> Self {
        Self::project(account_id, project_id).child(LOGS)
    }

    pub fn log(account_id: &str, project_id: &str, log_id: &str) -> Self {
        Self::logs(account_id, project_id).child(log_id)
    }

    /// Generation-1/2 documents lived in a top-level `projects`
    /// collection, before accounts existed.
    pub fn legacy_project(project_id: &str) -> Self {
        DocPath::from_segments([PROJECTS, project_id])
    }

    pub fn child(&self, segment: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.to_string());
        DocPath(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Final path segment: the document (or collection) id.
    pub fn id(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or_default()
    }

    pub fn is_document(&self) -> bool {
        !self.0.is_empty() && self.0.len() % 2 == 0
    }

    /// Name of the collection a document belongs to.
    pub fn collection_name(&self) -> Option<&str> {
        if !self.is_document() {
            return None;
        }
        self.0.get(self.0.len() - 2).map(String::as_str)
    }

    pub fn starts_with(&self, prefix: &DocPath) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

/// One operation inside an atomic batch.
#[derive(Debug, Clone)]
pub enum BatchOp {
    Put { path: DocPath, doc: Value },
    Delete { path: DocPath },
}

impl BatchOp {
    pub fn path(&self) -> &DocPath {
        match self {
            BatchOp::Put { path, .. } => path,
            BatchOp::Delete { path } => path,
        }
    }
}

/// A set of writes and deletes committed all-or-nothing.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        WriteBatch::default()
    }

    pub fn put(&mut self, path: DocPath, doc: Value) -> &mut Self {
        self.ops.push(BatchOp::Put { path, doc });
        self
    }

    pub fn delete(&mut self, path: DocPath) -> &mut Self {
        self.ops.push(BatchOp::Delete { path });
        self
    }

    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// A change pushed to a subscriber.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteChange {
    Updated(Value),
    Deleted,
}

/// Live updates for one document. Delivery stops as soon as the
/// subscription is dropped.
pub struct Subscription {
    updates: mpsc::UnboundedReceiver<RemoteChange>,
}

impl Subscription {
    pub(crate) fn new(updates: mpsc::UnboundedReceiver<RemoteChange>) -> Self {
        Subscription { updates }
    }

    pub async fn recv(&mut self) -> Option<RemoteChange> {
        self.updates.recv().await
    }

    /// Non-blocking poll, for callers that drain pushes between
    /// local operations.
    pub fn try_recv(&mut self) -> Option<RemoteChange> {
        self.updates.try_recv().ok()
    }

    pub fn unsubscribe(self) {}
}

/// The contract the engine requires from a document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a document. `None` means not found.
    async fn read(&self, path: &DocPath) -> PlancalResult<Option<Value>>;

    /// Full overwrite/create.
    async fn write(&self, path: &DocPath, doc: Value) -> PlancalResult<()>;

    /// Merge fields into an existing document.
    async fn update(
        &self,
        path: &DocPath,
        fields: serde_json::Map<String, Value>,
    ) -> PlancalResult<()>;

    async fn delete(&self, path: &DocPath) -> PlancalResult<()>;

    /// Create-if-absent. Returns `false` (without writing) when the
    /// document already exists. Used as a transactional claim.
    async fn create(&self, path: &DocPath, doc: Value) -> PlancalResult<bool>;

    /// Commit a batch atomically, all-or-nothing.
    async fn commit(&self, batch: WriteBatch) -> PlancalResult<()>;

    /// Documents directly under a collection path.
    async fn list_children(&self, collection: &DocPath) -> PlancalResult<Vec<(DocPath, Value)>>;

    /// Every document in any collection of the given name, regardless
    /// of parent. Required by the one-time tenant migration scan.
    async fn query_across_tenants(
        &self,
        collection_name: &str,
    ) -> PlancalResult<Vec<(DocPath, Value)>>;

    /// Live updates for one document path.
    async fn subscribe(&self, path: &DocPath) -> PlancalResult<Subscription>;

    /// Maximum number of operations per atomic batch, if the backend
    /// enforces one. Callers chunk cascading deletes accordingly.
    fn max_batch_size(&self) -> Option<usize> {
        None
    }
}

pub(crate) fn to_doc<T: serde::Serialize>(value: &T) -> PlancalResult<Value> {
    serde_json::to_value(value).map_err(|e| PlancalError::Serialization(e.to_string()))
}
