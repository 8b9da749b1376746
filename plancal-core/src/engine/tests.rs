use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};

use super::*;
use crate::post::PostStatus;
use crate::store::{LOGS, MemoryStore, PROJECTS};

/// Store wrapper with switchable failure injection.
struct FailingStore {
    inner: MemoryStore,
    fail_commits: AtomicBool,
    fail_reads: AtomicBool,
}

impl FailingStore {
    fn new() -> Self {
        FailingStore {
            inner: MemoryStore::new(),
            fail_commits: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
        }
    }

    fn outage() -> PlancalError {
        PlancalError::Remote("simulated outage".to_string())
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn read(&self, path: &DocPath) -> PlancalResult<Option<Value>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::outage());
        }
        self.inner.read(path).await
    }

    async fn write(&self, path: &DocPath, doc: Value) -> PlancalResult<()> {
        self.inner.write(path, doc).await
    }

    async fn update(
        &self,
        path: &DocPath,
        fields: serde_json::Map<String, Value>,
    ) -> PlancalResult<()> {
        self.inner.update(path, fields).await
    }

    async fn delete(&self, path: &DocPath) -> PlancalResult<()> {
        self.inner.delete(path).await
    }

    async fn create(&self, path: &DocPath, doc: Value) -> PlancalResult<bool> {
        self.inner.create(path, doc).await
    }

    async fn commit(&self, batch: WriteBatch) -> PlancalResult<()> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(Self::outage());
        }
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

fn flat_legacy_doc() -> Value {
    json!({
        "name": "Legacy",
        "startDate": "2024-01-01",
        "endDate": "2024-01-31",
        "calendarData": {
            "2024-01-10": {
                "title": "X",
                "notes": "",
                "types": [],
                "platforms": ["Website"],
                "color": "transparent",
                "status": "Planned"
            }
        }
    })
}

async fn engine_with_project(store: Arc<dyn DocumentStore>) -> Engine {
    let mut engine = Engine::new(store);
    engine.bootstrap().await.unwrap();
    let account_id = engine.accounts()[0].id.clone();
    engine.create_project("Campaign", &account_id).await.unwrap();
    engine
}

// --- bootstrap / tenant migration ---

#[tokio::test]
async fn bootstrap_creates_default_account_and_moves_legacy_projects() {
    let store = Arc::new(MemoryStore::new());
    store
        .write(&DocPath::legacy_project("p1"), flat_legacy_doc())
        .await
        .unwrap();

    let mut engine = Engine::new(store.clone());
    engine.bootstrap().await.unwrap();

    assert_eq!(engine.accounts().len(), 1);
    let account = &engine.accounts()[0];
    assert_eq!(account.name, DEFAULT_ACCOUNT_NAME);

    // Moved, not copied: the source id is preserved, the source is gone.
    assert!(
        store
            .read(&DocPath::legacy_project("p1"))
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        store
            .read(&DocPath::project(&account.id, "p1"))
            .await
            .unwrap()
            .is_some()
    );

    // Running the migration again is a no-op.
    let mut second = Engine::new(store.clone());
    second.bootstrap().await.unwrap();
    assert_eq!(second.accounts().len(), 1);
}

#[tokio::test]
async fn bootstrap_claim_loser_does_not_create_an_account() {
    let store = Arc::new(MemoryStore::new());
    // Simulate another client holding the claim mid-migration.
    store
        .create(
            &DocPath::from_segments(["system", "tenant-migration"]),
            json!({}),
        )
        .await
        .unwrap();

    let mut engine = Engine::new(store.clone());
    engine.bootstrap().await.unwrap();

    assert!(engine.accounts().is_empty());
    assert!(
        store
            .list_children(&DocPath::accounts())
            .await
            .unwrap()
            .is_empty()
    );
}

// --- accounts ---

#[tokio::test]
async fn create_account_persists_and_becomes_active() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = Engine::new(store.clone());
    engine.bootstrap().await.unwrap();

    let account = engine.create_account("  Acme  ").await.unwrap();
    assert_eq!(account.name, "Acme");
    assert_eq!(engine.active_account().unwrap().id, account.id);
    assert!(
        store
            .read(&DocPath::account(&account.id))
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn empty_account_name_is_rejected_without_a_write() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = Engine::new(store.clone());

    let err = engine.create_account("   ").await.unwrap_err();
    assert!(matches!(err, PlancalError::Validation(_)));
    assert!(
        store
            .list_children(&DocPath::accounts())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn delete_account_cascades_through_chunked_batches() {
    let store = Arc::new(MemoryStore::with_max_batch_size(2));
    let mut engine = Engine::new(store.clone());
    engine.bootstrap().await.unwrap();
    let account_id = engine.accounts()[0].id.clone();

    for name in ["P1", "P2"] {
        engine.create_project(name, &account_id).await.unwrap();
        engine.save().await.unwrap();
        engine.save().await.unwrap();
    }

    engine.delete_account(&account_id).await.unwrap();

    assert!(engine.accounts().is_empty());
    assert!(engine.active_account().is_none());
    assert!(
        store
            .read(&DocPath::account(&account_id))
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        store
            .query_across_tenants(PROJECTS)
            .await
            .unwrap()
            .is_empty()
    );
    assert!(store.query_across_tenants(LOGS).await.unwrap().is_empty());
}

// --- project selection ---

#[tokio::test]
async fn select_project_migrates_legacy_document() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = Engine::new(store.clone());
    engine.bootstrap().await.unwrap();
    let account_id = engine.accounts()[0].id.clone();

    // A generation-1 document written straight to the project path.
    store
        .write(&DocPath::project(&account_id, "p1"), flat_legacy_doc())
        .await
        .unwrap();

    engine.select_account(&account_id).await.unwrap();
    engine.select_project("p1").await.unwrap();

    let doc = engine.working().unwrap();
    assert_eq!(doc.calendars.len(), 1);
    assert_eq!(doc.calendars[0].name, Calendar::DEFAULT_NAME);
    assert_eq!(doc.active_calendar_id, doc.calendars[0].id);
    let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
    assert_eq!(doc.calendars[0].calendar_data[&date].title, "X");
}

#[tokio::test]
async fn select_project_failure_reverts_to_account_selected() {
    let store = Arc::new(FailingStore::new());
    store
        .inner
        .write(&DocPath::account("a1"), json!({"name": "A"}))
        .await
        .unwrap();
    store
        .inner
        .write(&DocPath::project("a1", "p1"), flat_legacy_doc())
        .await
        .unwrap();

    let mut engine = Engine::new(store.clone());
    engine.bootstrap().await.unwrap();
    engine.select_account("a1").await.unwrap();

    store.fail_reads.store(true, Ordering::SeqCst);
    let err = engine.select_project("p1").await.unwrap_err();
    assert!(matches!(err, PlancalError::Remote(_)));

    assert!(engine.active_account().is_some());
    assert!(engine.active_project().is_none());
    assert!(engine.working().is_none());
}

#[tokio::test]
async fn selecting_a_project_without_a_document_provisions_one() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = Engine::new(store.clone());
    engine.bootstrap().await.unwrap();
    let account_id = engine.accounts()[0].id.clone();
    let project = engine.create_project("P", &account_id).await.unwrap();
    engine.select_account(&account_id).await.unwrap();

    // The document vanishes between listing and selection.
    let path = DocPath::project(&account_id, &project.id);
    store.delete(&path).await.unwrap();

    engine.select_project(&project.id).await.unwrap();

    let doc = engine.working().unwrap();
    assert_eq!(doc.calendars.len(), 1);
    assert_eq!(doc.calendars[0].name, Calendar::DEFAULT_NAME);
    assert!(store.read(&path).await.unwrap().is_some());
}

// --- calendar invariants ---

#[tokio::test]
async fn the_last_calendar_cannot_be_deleted() {
    let mut engine = engine_with_project(Arc::new(MemoryStore::new())).await;
    let only_id = engine.working().unwrap().calendars[0].id.clone();

    let err = engine.delete_calendar(&only_id).unwrap_err();
    assert!(matches!(err, PlancalError::InvariantViolation(_)));

    let doc = engine.working().unwrap();
    assert_eq!(doc.calendars.len(), 1);
    assert_eq!(doc.calendars[0].id, only_id);
}

#[tokio::test]
async fn calendars_never_drop_below_one() {
    let mut engine = engine_with_project(Arc::new(MemoryStore::new())).await;

    let second = engine.create_calendar("Second").unwrap();
    let third = engine.create_calendar("Third").unwrap();
    assert_eq!(engine.working().unwrap().calendars.len(), 3);
    assert_eq!(engine.working().unwrap().active_calendar_id, third);

    engine.delete_calendar(&third).unwrap();
    engine.delete_calendar(&second).unwrap();
    assert_eq!(engine.working().unwrap().calendars.len(), 1);

    // Whatever calendar remains can no longer be deleted.
    let remaining = engine.working().unwrap().calendars[0].id.clone();
    assert!(engine.delete_calendar(&remaining).is_err());
    assert_eq!(engine.working().unwrap().calendars.len(), 1);
}

#[tokio::test]
async fn deleting_the_active_calendar_falls_back_to_the_first() {
    let mut engine = engine_with_project(Arc::new(MemoryStore::new())).await;
    let first = engine.working().unwrap().calendars[0].id.clone();
    let second = engine.create_calendar("Second").unwrap();

    assert_eq!(engine.active_calendar().unwrap().id, second);
    engine.delete_calendar(&second).unwrap();
    assert_eq!(engine.active_calendar().unwrap().id, first);
}

#[tokio::test]
async fn switch_active_calendar_requires_a_known_id() {
    let mut engine = engine_with_project(Arc::new(MemoryStore::new())).await;
    let err = engine.switch_active_calendar("nope").unwrap_err();
    assert!(matches!(err, PlancalError::NotFound(_)));
}

// --- posts ---

#[tokio::test]
async fn upsert_post_validates_the_date() {
    let mut engine = engine_with_project(Arc::new(MemoryStore::new())).await;
    let err = engine.upsert_post("02/01/2024", Post::new("A")).unwrap_err();
    assert!(matches!(err, PlancalError::Validation(_)));
    assert!(engine.active_calendar().unwrap().calendar_data.is_empty());
}

#[tokio::test]
async fn deleting_an_absent_post_is_a_no_op() {
    let mut engine = engine_with_project(Arc::new(MemoryStore::new())).await;
    engine.delete_post("2024-02-01").unwrap();
}

#[tokio::test]
async fn move_onto_occupied_date_swaps_the_posts() {
    let mut engine = engine_with_project(Arc::new(MemoryStore::new())).await;
    engine.upsert_post("2024-02-01", Post::new("A")).unwrap();
    engine.upsert_post("2024-02-02", Post::new("B")).unwrap();

    engine.move_post("2024-02-01", "2024-02-02").unwrap();

    let data = &engine.active_calendar().unwrap().calendar_data;
    let d1 = chrono::NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
    let d2 = chrono::NaiveDate::from_ymd_opt(2024, 2, 2).unwrap();
    assert_eq!(data[&d1].title, "B");
    assert_eq!(data[&d2].title, "A");
}

#[tokio::test]
async fn move_there_and_back_restores_the_original_map() {
    let mut engine = engine_with_project(Arc::new(MemoryStore::new())).await;
    engine.upsert_post("2024-02-01", Post::new("A")).unwrap();
    engine.upsert_post("2024-02-02", Post::new("B")).unwrap();
    let original = engine.active_calendar().unwrap().calendar_data.clone();

    engine.move_post("2024-02-01", "2024-02-02").unwrap();
    engine.move_post("2024-02-02", "2024-02-01").unwrap();

    assert_eq!(engine.active_calendar().unwrap().calendar_data, original);
}

#[tokio::test]
async fn move_with_empty_source_or_same_date_is_a_no_op() {
    let mut engine = engine_with_project(Arc::new(MemoryStore::new())).await;
    engine.upsert_post("2024-02-01", Post::new("A")).unwrap();
    let original = engine.active_calendar().unwrap().calendar_data.clone();

    engine.move_post("2024-02-05", "2024-02-06").unwrap();
    engine.move_post("2024-02-01", "2024-02-01").unwrap();

    assert_eq!(engine.active_calendar().unwrap().calendar_data, original);
}

// --- import ---

#[tokio::test]
async fn imported_posts_without_status_become_planned() {
    let mut engine = engine_with_project(Arc::new(MemoryStore::new())).await;
    let exchange = CalendarExchange::from_json(
        r#"{
            "startDate": "",
            "endDate": "",
            "calendarData": {
                "2024-03-01": {"title": "Y", "notes": "", "types": [], "platforms": [], "color": "transparent"}
            }
        }"#,
    )
    .unwrap();

    engine.import_calendar_data(exchange).unwrap();

    let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let post = &engine.active_calendar().unwrap().calendar_data[&date];
    assert_eq!(post.status, PostStatus::Planned);
}

#[tokio::test]
async fn import_without_an_active_calendar_is_rejected() {
    let mut engine = Engine::new(Arc::new(MemoryStore::new()));
    let exchange = CalendarExchange::from_json(
        r#"{"startDate": "", "endDate": "", "calendarData": {}}"#,
    )
    .unwrap();

    let err = engine.import_calendar_data(exchange).unwrap_err();
    assert!(matches!(err, PlancalError::Validation(_)));
}

// --- save ---

#[tokio::test]
async fn save_commits_document_and_log_entry_together() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = engine_with_project(store.clone()).await;
    engine.upsert_post("2024-02-01", Post::new("A")).unwrap();
    assert!(engine.has_unsaved_changes());

    let entry = engine.save().await.unwrap();

    assert!(!engine.has_unsaved_changes());
    let project = engine.active_project().unwrap();
    let stored = store
        .read(&DocPath::project(&project.account_id, &project.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored, serde_json::to_value(engine.working().unwrap()).unwrap());

    let logs = store
        .list_children(&DocPath::logs(&project.account_id, &project.id))
        .await
        .unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].0.id(), entry.id);
}

#[tokio::test]
async fn failed_save_leaves_neither_document_nor_log() {
    let store = Arc::new(FailingStore::new());
    let mut engine = engine_with_project(store.clone()).await;
    let committed_before = engine.committed().unwrap().clone();

    engine.upsert_post("2024-02-01", Post::new("A")).unwrap();
    store.fail_commits.store(true, Ordering::SeqCst);

    let err = engine.save().await.unwrap_err();
    assert!(matches!(err, PlancalError::Remote(_)));

    // Committed snapshot untouched, working edits preserved.
    assert_eq!(engine.committed().unwrap(), &committed_before);
    assert!(engine.has_unsaved_changes());

    let project = engine.active_project().unwrap();
    let stored = store
        .inner
        .read(&DocPath::project(&project.account_id, &project.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored, serde_json::to_value(&committed_before).unwrap());
    let logs = store
        .inner
        .list_children(&DocPath::logs(&project.account_id, &project.id))
        .await
        .unwrap();
    assert!(logs.is_empty());
}

// --- remote reconciliation ---

#[tokio::test]
async fn remote_push_wins_over_unsaved_local_edits() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = engine_with_project(store.clone()).await;
    let project = engine.active_project().unwrap().clone();

    let mut subscription = engine.watch_active_project().await.unwrap();
    engine.upsert_post("2024-02-01", Post::new("local")).unwrap();

    // Another client saves a different document.
    let mut remote_doc = engine.committed().unwrap().clone();
    remote_doc.name = "Renamed remotely".to_string();
    store
        .write(
            &DocPath::project(&project.account_id, &project.id),
            serde_json::to_value(&remote_doc).unwrap(),
        )
        .await
        .unwrap();

    let change = subscription.try_recv().unwrap();
    engine.apply_remote(change).unwrap();

    let doc = engine.working().unwrap();
    assert_eq!(doc.name, "Renamed remotely");
    assert!(doc.active_calendar().unwrap().calendar_data.is_empty());
    assert!(!engine.has_unsaved_changes());
}

#[tokio::test]
async fn remote_delete_clears_the_active_project() {
    let mut engine = engine_with_project(Arc::new(MemoryStore::new())).await;
    assert!(engine.active_project().is_some());

    engine.apply_remote(RemoteChange::Deleted).unwrap();

    assert!(engine.active_project().is_none());
    assert!(engine.working().is_none());
    assert!(engine.projects().is_empty());
}
