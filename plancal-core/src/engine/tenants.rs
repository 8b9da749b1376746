//! One-time tenant migration: account-less to account-based storage.
//!
//! Early deployments stored project documents in a top-level `projects`
//! collection. When a client starts against a store with zero accounts,
//! a default account is created and every legacy document is moved
//! under it, preserving its id. Each move is a copy-then-delete batch
//! keyed by the stable source id, so re-running the migration is a
//! no-op after the first success.
//!
//! Concurrent first loads are serialized with a claim write: a
//! create-if-absent on a sentinel document. The losing client skips the
//! scan and re-reads the account list instead.

use serde_json::json;

use crate::engine::load_accounts;
use crate::error::PlancalResult;
use crate::project::Account;
use crate::store::{DocPath, DocumentStore, PROJECTS, WriteBatch};

/// Name of the account created by the migration.
pub const DEFAULT_ACCOUNT_NAME: &str = "My Account";

fn claim_path() -> DocPath {
    DocPath::from_segments(["system", "tenant-migration"])
}

/// Load all accounts, bootstrapping the default account (and moving
/// legacy documents under it) when none exist.
pub(crate) async fn bootstrap_accounts(
    store: &dyn DocumentStore,
) -> PlancalResult<Vec<Account>> {
    let accounts = load_accounts(store).await?;
    if !accounts.is_empty() {
        return Ok(accounts);
    }

    let claimed = store
        .create(
            &claim_path(),
            json!({ "claimedAt": chrono::Utc::now().to_rfc3339() }),
        )
        .await?;

    if !claimed {
        // Another client claimed the migration; it may still be in
        // flight, so just report whatever is visible now.
        return load_accounts(store).await;
    }

    let account = migrate_tenants(store).await?;
    Ok(vec![account])
}

async fn migrate_tenants(store: &dyn DocumentStore) -> PlancalResult<Account> {
    let account = Account {
        id: crate::calendar::new_id(),
        name: DEFAULT_ACCOUNT_NAME.to_string(),
    };
    store
        .write(&DocPath::account(&account.id), account.to_doc())
        .await?;
    tracing::info!(account = %account.id, "created default account");

    let candidates = store.query_across_tenants(PROJECTS).await?;
    for (path, _) in candidates {
        // Only top-level legacy documents move; nested ones already
        // belong to an account.
        if path.segments().len() != 2 {
            continue;
        }

        // Re-read: the document may be gone by the time we move it.
        let Some(doc) = store.read(&path).await? else {
            tracing::warn!(%path, "legacy project vanished during migration, skipping");
            continue;
        };

        let mut batch = WriteBatch::new();
        batch.put(DocPath::project(&account.id, path.id()), doc);
        batch.delete(path.clone());
        store.commit(batch).await?;
        tracing::info!(%path, "moved legacy project under default account");
    }

    Ok(account)
}
