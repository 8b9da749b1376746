//! JSON-file-backed document store.
//!
//! The whole document tree is held in memory and persisted to a single
//! JSON file. Every mutation is staged against a copy of the tree and
//! flushed with a temp file + rename before it becomes visible, so a
//! crash or a failed write never corrupts the store and a failed batch
//! leaves nothing observable.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{PlancalError, PlancalResult};
use crate::store::{BatchOp, DocPath, DocumentStore, MemoryStore, Subscription, WriteBatch};

pub struct FileStore {
    inner: MemoryStore,
    path: PathBuf,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> PlancalResult<Self> {
        let path = path.into();
        let docs = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let raw: BTreeMap<String, Value> = serde_json::from_str(&content)
                .map_err(|e| PlancalError::Serialization(e.to_string()))?;
            raw.into_iter()
                .map(|(key, doc)| (DocPath::parse(&key), doc))
                .collect()
        } else {
            BTreeMap::new()
        };

        Ok(FileStore {
            inner: MemoryStore::from_docs(docs),
            path,
        })
    }

    /// Persist a staged document tree. Called before the staged tree is
    /// swapped into the inner store, so an error here aborts the whole
    /// mutation.
    fn flush(&self, docs: &BTreeMap<DocPath, Value>) -> PlancalResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let raw: BTreeMap<String, Value> = docs
            .iter()
            .map(|(path, doc)| (path.to_string(), doc.clone()))
            .collect();
        let content = serde_json::to_string_pretty(&raw)
            .map_err(|e| PlancalError::Serialization(e.to_string()))?;

        let temp = self.path.with_extension("tmp");
        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn read(&self, path: &DocPath) -> PlancalResult<Option<Value>> {
        self.inner.read(path).await
    }

    async fn write(&self, path: &DocPath, doc: Value) -> PlancalResult<()> {
        let mut staged = self.inner.snapshot();
        staged.insert(path.clone(), doc.clone());
        self.flush(&staged)?;
        self.inner.write(path, doc).await
    }

    async fn update(
        &self,
        path: &DocPath,
        fields: serde_json::Map<String, Value>,
    ) -> PlancalResult<()> {
        let mut staged = self.inner.snapshot();
        let doc = staged
            .get_mut(path)
            .ok_or_else(|| PlancalError::NotFound(path.to_string()))?;
        let Some(target) = doc.as_object_mut() else {
            return Err(PlancalError::Remote(format!(
                "Document at {} is not an object",
                path
            )));
        };
        for (key, value) in &fields {
            target.insert(key.clone(), value.clone());
        }

        self.flush(&staged)?;
        self.inner.update(path, fields).await
    }

    async fn delete(&self, path: &DocPath) -> PlancalResult<()> {
        let mut staged = self.inner.snapshot();
        if staged.remove(path).is_none() {
            return Ok(());
        }

        self.flush(&staged)?;
        self.inner.delete(path).await
    }

    async fn create(&self, path: &DocPath, doc: Value) -> PlancalResult<bool> {
        let mut staged = self.inner.snapshot();
        if staged.contains_key(path) {
            return Ok(false);
        }
        staged.insert(path.clone(), doc.clone());

        self.flush(&staged)?;
        self.inner.create(path, doc).await
    }

    async fn commit(&self, batch: WriteBatch) -> PlancalResult<()> {
        let mut staged = self.inner.snapshot();
        for op in batch.ops() {
            match op {
                BatchOp::Put { path, doc } => {
                    staged.insert(path.clone(), doc.clone());
                }
                BatchOp::Delete { path } => {
                    staged.remove(path);
                }
            }
        }

        self.flush(&staged)?;
        self.inner.commit(batch).await
    }

    async fn list_children(&self, collection: &DocPath) -> PlancalResult<Vec<(DocPath, Value)>> {
        self.inner.list_children(collection).await
    }

    async fn query_across_tenants(
        &self,
        collection_name: &str,
    ) -> PlancalResult<Vec<(DocPath, Value)>> {
        self.inner.query_across_tenants(collection_name).await
    }

    async fn subscribe(&self, path: &DocPath) -> PlancalResult<Subscription> {
        self.inner.subscribe(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn documents_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        {
            let store = FileStore::open(&path).unwrap();
            store
                .write(&DocPath::account("a1"), json!({"name": "A"}))
                .await
                .unwrap();
        }

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(
            reopened.read(&DocPath::account("a1")).await.unwrap(),
            Some(json!({"name": "A"}))
        );
    }

    #[tokio::test]
    async fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("missing.json")).unwrap();
        assert!(store.read(&DocPath::account("a1")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_flush_leaves_no_observable_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = FileStore::open(&path).unwrap();
        store
            .write(&DocPath::account("a1"), json!({"name": "A"}))
            .await
            .unwrap();

        // Occupy the temp path with a directory so the next flush fails.
        std::fs::create_dir(path.with_extension("tmp")).unwrap();

        let mut batch = WriteBatch::new();
        batch.put(DocPath::account("a2"), json!({"name": "B"}));
        batch.delete(DocPath::account("a1"));
        assert!(store.commit(batch).await.is_err());

        // Nothing from the failed batch is observable, in memory...
        assert!(store.read(&DocPath::account("a2")).await.unwrap().is_none());
        assert_eq!(
            store.read(&DocPath::account("a1")).await.unwrap(),
            Some(json!({"name": "A"}))
        );

        // ...or on disk after a reload.
        let reopened = FileStore::open(&path).unwrap();
        assert!(reopened.read(&DocPath::account("a2")).await.unwrap().is_none());
        assert_eq!(
            reopened.read(&DocPath::account("a1")).await.unwrap(),
            Some(json!({"name": "A"}))
        );
    }

    #[tokio::test]
    async fn failed_flush_aborts_single_writes_too() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = FileStore::open(&path).unwrap();
        std::fs::create_dir(path.with_extension("tmp")).unwrap();

        assert!(
            store
                .write(&DocPath::account("a1"), json!({"name": "A"}))
                .await
                .is_err()
        );
        assert!(store.read(&DocPath::account("a1")).await.unwrap().is_none());
    }
}
