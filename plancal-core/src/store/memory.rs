//! In-memory document store.
//!
//! Backs tests and the file store. Batches are applied under a single
//! lock, so atomicity is structural rather than simulated.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::{PlancalError, PlancalResult};
use crate::store::{
    BatchOp, DocPath, DocumentStore, RemoteChange, Subscription, WriteBatch,
};

#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<BTreeMap<DocPath, Value>>,
    subscribers: Mutex<HashMap<DocPath, Vec<mpsc::UnboundedSender<RemoteChange>>>>,
    max_batch_size: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Emulate a backend that caps atomic batches at `limit` operations.
    pub fn with_max_batch_size(limit: usize) -> Self {
        MemoryStore {
            max_batch_size: Some(limit),
            ..MemoryStore::default()
        }
    }

    pub(crate) fn from_docs(docs: BTreeMap<DocPath, Value>) -> Self {
        MemoryStore {
            docs: Mutex::new(docs),
            ..MemoryStore::default()
        }
    }

    pub(crate) fn snapshot(&self) -> BTreeMap<DocPath, Value> {
        self.docs.lock().unwrap().clone()
    }

    /// Push a change to live subscribers, pruning closed channels.
    fn notify(&self, path: &DocPath, change: RemoteChange) {
        let mut subscribers = self.subscribers.lock().unwrap();
        if let Some(senders) = subscribers.get_mut(path) {
            senders.retain(|sender| sender.send(change.clone()).is_ok());
            if senders.is_empty() {
                subscribers.remove(path);
            }
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn read(&self, path: &DocPath) -> PlancalResult<Option<Value>> {
        Ok(self.docs.lock().unwrap().get(path).cloned())
    }

    async fn write(&self, path: &DocPath, doc: Value) -> PlancalResult<()> {
        self.docs.lock().unwrap().insert(path.clone(), doc.clone());
        self.notify(path, RemoteChange::Updated(doc));
        Ok(())
    }

    async fn update(
        &self,
        path: &DocPath,
        fields: serde_json::Map<String, Value>,
    ) -> PlancalResult<()> {
        let merged = {
            let mut docs = self.docs.lock().unwrap();
            let doc = docs
                .get_mut(path)
                .ok_or_else(|| PlancalError::NotFound(path.to_string()))?;
            let Some(target) = doc.as_object_mut() else {
                return Err(PlancalError::Remote(format!(
                    "Document at {} is not an object",
                    path
                )));
            };
            for (key, value) in fields {
                target.insert(key, value);
            }
            doc.clone()
        };
        self.notify(path, RemoteChange::Updated(merged));
        Ok(())
    }

    async fn delete(&self, path: &DocPath) -> PlancalResult<()> {
        let removed = self.docs.lock().unwrap().remove(path).is_some();
        if removed {
            self.notify(path, RemoteChange::Deleted);
        }
        Ok(())
    }

    async fn create(&self, path: &DocPath, doc: Value) -> PlancalResult<bool> {
        let created = {
            let mut docs = self.docs.lock().unwrap();
            if docs.contains_key(path) {
                false
            } else {
                docs.insert(path.clone(), doc.clone());
                true
            }
        };
        if created {
            self.notify(path, RemoteChange::Updated(doc));
        }
        Ok(created)
    }

    async fn commit(&self, batch: WriteBatch) -> PlancalResult<()> {
        if let Some(limit) = self.max_batch_size {
            if batch.len() > limit {
                return Err(PlancalError::Remote(format!(
                    "Batch of {} operations exceeds the store limit of {}",
                    batch.len(),
                    limit
                )));
            }
        }

        let ops = batch.into_ops();
        {
            let mut docs = self.docs.lock().unwrap();
            for op in &ops {
                match op {
                    BatchOp::Put { path, doc } => {
                        docs.insert(path.clone(), doc.clone());
                    }
                    BatchOp::Delete { path } => {
                        docs.remove(path);
                    }
                }
            }
        }

        for op in ops {
            match op {
                BatchOp::Put { path, doc } => self.notify(&path, RemoteChange::Updated(doc)),
                BatchOp::Delete { path } => self.notify(&path, RemoteChange::Deleted),
            }
        }
        Ok(())
    }

    async fn list_children(&self, collection: &DocPath) -> PlancalResult<Vec<(DocPath, Value)>> {
        let want_len = collection.segments().len() + 1;
        Ok(self
            .docs
            .lock()
            .unwrap()
            .iter()
            .filter(|(path, _)| path.segments().len() == want_len && path.starts_with(collection))
            .map(|(path, doc)| (path.clone(), doc.clone()))
            .collect())
    }

    async fn query_across_tenants(
        &self,
        collection_name: &str,
    ) -> PlancalResult<Vec<(DocPath, Value)>> {
        Ok(self
            .docs
            .lock()
            .unwrap()
            .iter()
            .filter(|(path, _)| path.collection_name() == Some(collection_name))
            .map(|(path, doc)| (path.clone(), doc.clone()))
            .collect())
    }

    async fn subscribe(&self, path: &DocPath) -> PlancalResult<Subscription> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap()
            .entry(path.clone())
            .or_default()
            .push(sender);
        Ok(Subscription::new(receiver))
    }

    fn max_batch_size(&self) -> Option<usize> {
        self.max_batch_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn list_children_is_one_level_deep() {
        let store = MemoryStore::new();
        store
            .write(&DocPath::account("a1"), json!({"name": "A"}))
            .await
            .unwrap();
        store
            .write(&DocPath::project("a1", "p1"), json!({"name": "P"}))
            .await
            .unwrap();

        let accounts = store.list_children(&DocPath::accounts()).await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].0, DocPath::account("a1"));
    }

    #[tokio::test]
    async fn query_across_tenants_spans_parents() {
        let store = MemoryStore::new();
        store
            .write(&DocPath::project("a1", "p1"), json!({"name": "P1"}))
            .await
            .unwrap();
        store
            .write(&DocPath::legacy_project("p2"), json!({"name": "P2"}))
            .await
            .unwrap();

        let projects = store.query_across_tenants("projects").await.unwrap();
        assert_eq!(projects.len(), 2);
    }

    #[tokio::test]
    async fn create_claims_only_once() {
        let store = MemoryStore::new();
        let claim = DocPath::from_segments(["system", "claim"]);
        assert!(store.create(&claim, json!({})).await.unwrap());
        assert!(!store.create(&claim, json!({"other": true})).await.unwrap());
        assert_eq!(store.read(&claim).await.unwrap(), Some(json!({})));
    }

    #[tokio::test]
    async fn oversized_batch_is_rejected_whole() {
        let store = MemoryStore::with_max_batch_size(2);
        let mut batch = WriteBatch::new();
        batch.put(DocPath::account("a1"), json!({}));
        batch.put(DocPath::account("a2"), json!({}));
        batch.put(DocPath::account("a3"), json!({}));

        assert!(store.commit(batch).await.is_err());
        assert!(store.list_children(&DocPath::accounts()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn subscribers_see_writes_until_unsubscribed() {
        let store = MemoryStore::new();
        let path = DocPath::project("a1", "p1");
        let mut subscription = store.subscribe(&path).await.unwrap();

        store.write(&path, json!({"name": "P"})).await.unwrap();
        assert_eq!(
            subscription.try_recv(),
            Some(RemoteChange::Updated(json!({"name": "P"})))
        );

        subscription.unsubscribe();
        store.write(&path, json!({"name": "Q"})).await.unwrap();
        assert!(store.subscribers.lock().unwrap().is_empty());
    }
}
