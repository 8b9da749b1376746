//! The state engine: the single authoritative in-memory state holder.
//!
//! The engine owns the canonical account list, project list and the
//! active project document. All mutations go through it. Calendar and
//! post edits are optimistic and local; [`Engine::save`] is the only
//! point where the working copy is reconciled into the store, together
//! with one change-log entry, in a single atomic batch.
//!
//! Remote pushes re-enter through [`Engine::apply_remote`], the same
//! reducer path used to load documents, so structural invariants are
//! enforced uniformly. Last writer from remote wins on refresh; there
//! is no merge logic, and unsaved local edits may be discarded.

mod tenants;

#[cfg(test)]
mod tests;

pub use tenants::DEFAULT_ACCOUNT_NAME;

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value;

use crate::calendar::Calendar;
use crate::error::{PlancalError, PlancalResult};
use crate::exchange::CalendarExchange;
use crate::log::{LogEntry, UNKNOWN_ORIGIN};
use crate::migrate::migrate;
use crate::post::Post;
use crate::project::{Account, Project, ProjectDocument};
use crate::store::{
    DocPath, DocumentStore, RemoteChange, Subscription, WriteBatch, to_doc,
};

pub struct Engine {
    store: Arc<dyn DocumentStore>,
    /// Best-effort caller origin recorded in change-log entries.
    origin: String,
    accounts: Vec<Account>,
    projects: Vec<Project>,
    active_account: Option<Account>,
    active_project: Option<Project>,
    /// Last known persisted document for the active project.
    committed: Option<ProjectDocument>,
    /// Editable copy; diverges from `committed` until the next save.
    working: Option<ProjectDocument>,
}

impl Engine {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Engine {
            store,
            origin: UNKNOWN_ORIGIN.to_string(),
            accounts: Vec::new(),
            projects: Vec::new(),
            active_account: None,
            active_project: None,
            committed: None,
            working: None,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Load the account list, running the one-time tenant migration
    /// when no accounts exist yet.
    pub async fn bootstrap(&mut self) -> PlancalResult<()> {
        self.accounts = tenants::bootstrap_accounts(self.store.as_ref()).await?;
        Ok(())
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// The backing store, for read-only queries outside the engine
    /// (the change log, ad-hoc tooling).
    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn active_account(&self) -> Option<&Account> {
        self.active_account.as_ref()
    }

    pub fn active_project(&self) -> Option<&Project> {
        self.active_project.as_ref()
    }

    /// The editable copy of the active project document.
    pub fn working(&self) -> Option<&ProjectDocument> {
        self.working.as_ref()
    }

    /// The last known persisted document.
    pub fn committed(&self) -> Option<&ProjectDocument> {
        self.committed.as_ref()
    }

    pub fn active_calendar(&self) -> Option<&Calendar> {
        self.working.as_ref()?.active_calendar()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.working != self.committed
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Make an account active, clearing any project selection, and
    /// fetch its project list.
    pub async fn select_account(&mut self, account_id: &str) -> PlancalResult<()> {
        let account = self.find_account(account_id)?.clone();
        let projects = load_projects(self.store.as_ref(), &account.id).await?;

        self.active_account = Some(account);
        self.projects = projects;
        self.clear_project_selection();
        Ok(())
    }

    /// Make a project active and load its document through migration.
    ///
    /// Any prior document is cleared first; on fetch failure the engine
    /// is left in the account-selected state and the error is surfaced.
    /// A project whose document does not exist yet gets the default
    /// document provisioned.
    pub async fn select_project(&mut self, project_id: &str) -> PlancalResult<()> {
        let project = self
            .projects
            .iter()
            .find(|p| p.id == project_id)
            .ok_or_else(|| PlancalError::NotFound(format!("Project '{}'", project_id)))?
            .clone();

        self.clear_project_selection();

        let path = DocPath::project(&project.account_id, &project.id);
        let doc = match self.store.read(&path).await? {
            Some(raw) => migrate(raw)?,
            None => {
                let doc = ProjectDocument::new(&project.name);
                self.store.write(&path, to_doc(&doc)?).await?;
                doc
            }
        };

        self.active_project = Some(project);
        self.committed = Some(doc.clone());
        self.working = Some(doc);
        Ok(())
    }

    // =========================================================================
    // Account operations (persisted)
    // =========================================================================

    pub async fn create_account(&mut self, name: &str) -> PlancalResult<Account> {
        let name = non_empty(name, "Account name")?;
        let account = Account {
            id: crate::calendar::new_id(),
            name,
        };

        self.store
            .write(&DocPath::account(&account.id), account.to_doc())
            .await?;

        self.accounts.push(account.clone());
        self.active_account = Some(account.clone());
        self.projects = Vec::new();
        self.clear_project_selection();
        Ok(account)
    }

    pub async fn rename_account(&mut self, account_id: &str, name: &str) -> PlancalResult<()> {
        let name = non_empty(name, "Account name")?;
        self.find_account(account_id)?;

        let mut fields = serde_json::Map::new();
        fields.insert("name".to_string(), Value::String(name.clone()));
        self.store
            .update(&DocPath::account(account_id), fields)
            .await?;

        for account in &mut self.accounts {
            if account.id == account_id {
                account.name = name.clone();
            }
        }
        if let Some(active) = &mut self.active_account {
            if active.id == account_id {
                active.name = name;
            }
        }
        Ok(())
    }

    /// Delete an account and everything under it: every project, every
    /// project's log entries, then the account itself. Deletes are
    /// chunked to the store's batch limit, children before parent, so
    /// the account document only disappears in the final chunk.
    pub async fn delete_account(&mut self, account_id: &str) -> PlancalResult<()> {
        self.find_account(account_id)?;

        let mut paths = Vec::new();
        let projects = self
            .store
            .list_children(&DocPath::projects(account_id))
            .await?;
        for (project_path, _) in &projects {
            let logs = self
                .store
                .list_children(&project_path.child(crate::store::LOGS))
                .await?;
            paths.extend(logs.into_iter().map(|(path, _)| path));
            paths.push(project_path.clone());
        }
        paths.push(DocPath::account(account_id));

        self.commit_deletes(paths).await?;

        self.accounts.retain(|a| a.id != account_id);
        if self.active_account.as_ref().is_some_and(|a| a.id == account_id) {
            self.active_account = None;
            self.projects = Vec::new();
            self.clear_project_selection();
        }
        Ok(())
    }

    // =========================================================================
    // Project operations (persisted)
    // =========================================================================

    /// Create a project under an account, provisioning its document
    /// with one default calendar, and make it active.
    pub async fn create_project(
        &mut self,
        name: &str,
        account_id: &str,
    ) -> PlancalResult<Project> {
        let name = non_empty(name, "Project name")?;
        let account = self.find_account(account_id)?.clone();

        let project = Project {
            id: crate::calendar::new_id(),
            name: name.clone(),
            account_id: account.id.clone(),
        };
        let doc = ProjectDocument::new(&name);

        self.store
            .write(
                &DocPath::project(&account.id, &project.id),
                to_doc(&doc)?,
            )
            .await?;

        if self.active_account.as_ref().is_some_and(|a| a.id == account.id) {
            self.projects.push(project.clone());
        } else {
            self.active_account = Some(account.clone());
            self.projects = match load_projects(self.store.as_ref(), &account.id).await {
                Ok(projects) => projects,
                Err(e) => {
                    tracing::warn!(account = %account.id, error = %e, "could not refresh project list");
                    vec![project.clone()]
                }
            };
        }

        self.active_project = Some(project.clone());
        self.committed = Some(doc.clone());
        self.working = Some(doc);
        Ok(project)
    }

    pub async fn rename_project(&mut self, project_id: &str, name: &str) -> PlancalResult<()> {
        let name = non_empty(name, "Project name")?;
        let project = self.find_project(project_id)?.clone();

        let mut fields = serde_json::Map::new();
        fields.insert("name".to_string(), Value::String(name.clone()));
        self.store
            .update(&DocPath::project(&project.account_id, &project.id), fields)
            .await?;

        for entry in &mut self.projects {
            if entry.id == project_id {
                entry.name = name.clone();
            }
        }
        if self.active_project.as_ref().is_some_and(|p| p.id == project_id) {
            if let Some(active) = &mut self.active_project {
                active.name = name.clone();
            }
            if let Some(doc) = &mut self.working {
                doc.name = name.clone();
            }
            if let Some(doc) = &mut self.committed {
                doc.name = name;
            }
        }
        Ok(())
    }

    /// Delete a project and its log entries, children first.
    pub async fn delete_project(&mut self, project_id: &str) -> PlancalResult<()> {
        let project = self.find_project(project_id)?.clone();

        let logs = self
            .store
            .list_children(&DocPath::logs(&project.account_id, &project.id))
            .await?;
        let mut paths: Vec<DocPath> = logs.into_iter().map(|(path, _)| path).collect();
        paths.push(DocPath::project(&project.account_id, &project.id));

        self.commit_deletes(paths).await?;

        self.projects.retain(|p| p.id != project_id);
        if self.active_project.as_ref().is_some_and(|p| p.id == project_id) {
            self.clear_project_selection();
        }
        Ok(())
    }

    // =========================================================================
    // Calendar operations (local, deferred persistence)
    // =========================================================================

    pub fn switch_active_calendar(&mut self, calendar_id: &str) -> PlancalResult<()> {
        let doc = self.working_mut()?;
        if !doc.calendars.iter().any(|c| c.id == calendar_id) {
            return Err(PlancalError::NotFound(format!(
                "Calendar '{}'",
                calendar_id
            )));
        }
        doc.active_calendar_id = calendar_id.to_string();
        Ok(())
    }

    /// Append a new empty calendar and make it active. Returns its id.
    pub fn create_calendar(&mut self, name: &str) -> PlancalResult<String> {
        let name = non_empty(name, "Calendar name")?;
        let doc = self.working_mut()?;
        let calendar = Calendar::new(name);
        let id = calendar.id.clone();
        doc.calendars.push(calendar);
        doc.active_calendar_id = id.clone();
        Ok(id)
    }

    pub fn rename_calendar(&mut self, calendar_id: &str, name: &str) -> PlancalResult<()> {
        let name = non_empty(name, "Calendar name")?;
        let doc = self.working_mut()?;
        let calendar = doc
            .calendars
            .iter_mut()
            .find(|c| c.id == calendar_id)
            .ok_or_else(|| PlancalError::NotFound(format!("Calendar '{}'", calendar_id)))?;
        calendar.name = name;
        Ok(())
    }

    /// Remove a calendar. Refused when it would leave the document
    /// with no calendars.
    pub fn delete_calendar(&mut self, calendar_id: &str) -> PlancalResult<()> {
        let doc = self.working_mut()?;
        let index = doc
            .calendars
            .iter()
            .position(|c| c.id == calendar_id)
            .ok_or_else(|| PlancalError::NotFound(format!("Calendar '{}'", calendar_id)))?;

        if doc.calendars.len() == 1 {
            return Err(PlancalError::InvariantViolation(
                "Cannot delete the last calendar of a project".to_string(),
            ));
        }

        doc.calendars.remove(index);
        doc.normalize_active();
        Ok(())
    }

    // =========================================================================
    // Post operations (local, deferred persistence)
    // =========================================================================

    /// Insert or replace the post on a date of the active calendar.
    pub fn upsert_post(&mut self, date: &str, post: Post) -> PlancalResult<()> {
        let date = parse_date(date)?;
        let calendar = self.active_calendar_mut()?;
        calendar.calendar_data.insert(date, post);
        Ok(())
    }

    /// Remove the post on a date. Absent dates are a no-op, not an error.
    pub fn delete_post(&mut self, date: &str) -> PlancalResult<()> {
        let date = parse_date(date)?;
        let calendar = self.active_calendar_mut()?;
        calendar.calendar_data.remove(&date);
        Ok(())
    }

    /// Reassign the post at `source` to `dest`. An occupied destination
    /// swaps the two posts; a post is never silently dropped. No-op when
    /// the source is empty or the dates are equal.
    pub fn move_post(&mut self, source: &str, dest: &str) -> PlancalResult<()> {
        let source = parse_date(source)?;
        let dest = parse_date(dest)?;
        if source == dest {
            return Ok(());
        }

        let calendar = self.active_calendar_mut()?;
        let Some(moved) = calendar.calendar_data.remove(&source) else {
            return Ok(());
        };
        if let Some(displaced) = calendar.calendar_data.insert(dest, moved) {
            calendar.calendar_data.insert(source, displaced);
        }
        Ok(())
    }

    /// Merge an imported `.ccpro` envelope into the active calendar.
    pub fn import_calendar_data(&mut self, exchange: CalendarExchange) -> PlancalResult<()> {
        let calendar = self.active_calendar_mut()?;
        if let Some(name) = exchange.name {
            calendar.name = name;
        }
        calendar.start_date = exchange.start_date;
        calendar.end_date = exchange.end_date;
        calendar.calendar_data = exchange.calendar_data;
        Ok(())
    }

    // =========================================================================
    // Save & remote reconciliation
    // =========================================================================

    /// Persist the working document and append one change-log entry,
    /// in a single atomic batch: both commit or neither does.
    ///
    /// Saves on one engine cannot interleave: the exclusive borrow
    /// keeps a second save from starting while one is in flight.
    pub async fn save(&mut self) -> PlancalResult<LogEntry> {
        let project = self
            .active_project
            .clone()
            .ok_or_else(|| PlancalError::Validation("No active project to save".to_string()))?;
        let doc = self
            .working
            .clone()
            .ok_or_else(|| PlancalError::Validation("No project document loaded".to_string()))?;

        let calendar_name = doc
            .active_calendar()
            .map(|c| c.name.clone())
            .unwrap_or_default();
        let entry = LogEntry::for_save(&self.origin, &project.name, &calendar_name);

        let mut batch = WriteBatch::new();
        batch.put(
            DocPath::project(&project.account_id, &project.id),
            to_doc(&doc)?,
        );
        batch.put(
            DocPath::log(&project.account_id, &project.id, &entry.id),
            to_doc(&entry)?,
        );
        self.store.commit(batch).await?;

        self.committed = Some(doc);
        tracing::debug!(project = %project.name, calendar = %calendar_name, "project saved");
        Ok(entry)
    }

    /// Subscribe to remote changes of the active project's document.
    /// Pump received changes through [`Engine::apply_remote`].
    pub async fn watch_active_project(&self) -> PlancalResult<Subscription> {
        let project = self
            .active_project
            .as_ref()
            .ok_or_else(|| PlancalError::Validation("No active project to watch".to_string()))?;
        self.store
            .subscribe(&DocPath::project(&project.account_id, &project.id))
            .await
    }

    /// Reducer for remote pushes: re-run migration and replace the
    /// canonical document. Unsaved local edits are discarded; the last
    /// writer from remote wins.
    pub fn apply_remote(&mut self, change: RemoteChange) -> PlancalResult<()> {
        let Some(project) = self.active_project.clone() else {
            // Stale push after deselection; nothing to reconcile.
            return Ok(());
        };

        match change {
            RemoteChange::Updated(raw) => {
                let doc = migrate(raw)?;
                if self.has_unsaved_changes() {
                    tracing::warn!(project = %project.name, "remote update discarded unsaved local edits");
                }
                self.committed = Some(doc.clone());
                self.working = Some(doc);
            }
            RemoteChange::Deleted => {
                self.projects.retain(|p| p.id != project.id);
                self.clear_project_selection();
            }
        }
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn clear_project_selection(&mut self) {
        self.active_project = None;
        self.committed = None;
        self.working = None;
    }

    fn find_account(&self, account_id: &str) -> PlancalResult<&Account> {
        self.accounts
            .iter()
            .find(|a| a.id == account_id)
            .ok_or_else(|| PlancalError::NotFound(format!("Account '{}'", account_id)))
    }

    fn find_project(&self, project_id: &str) -> PlancalResult<&Project> {
        self.projects
            .iter()
            .find(|p| p.id == project_id)
            .ok_or_else(|| PlancalError::NotFound(format!("Project '{}'", project_id)))
    }

    fn working_mut(&mut self) -> PlancalResult<&mut ProjectDocument> {
        self.working
            .as_mut()
            .ok_or_else(|| PlancalError::Validation("No project document loaded".to_string()))
    }

    fn active_calendar_mut(&mut self) -> PlancalResult<&mut Calendar> {
        self.working_mut()?
            .active_calendar_mut()
            .ok_or_else(|| PlancalError::Validation("No active calendar".to_string()))
    }

    /// Commit deletes in order, chunked to the store's batch limit.
    /// Callers order paths children-before-parent so no chunk can leave
    /// a parent deleted while children remain.
    async fn commit_deletes(&self, paths: Vec<DocPath>) -> PlancalResult<()> {
        let chunk_size = self.store.max_batch_size().unwrap_or(paths.len().max(1));
        for chunk in paths.chunks(chunk_size) {
            let mut batch = WriteBatch::new();
            for path in chunk {
                batch.delete(path.clone());
            }
            self.store.commit(batch).await?;
        }
        Ok(())
    }
}

async fn load_projects(
    store: &dyn DocumentStore,
    account_id: &str,
) -> PlancalResult<Vec<Project>> {
    let children = store.list_children(&DocPath::projects(account_id)).await?;
    let mut projects: Vec<Project> = children
        .iter()
        .filter_map(|(path, doc)| Project::from_doc(account_id, path, doc))
        .collect();
    projects.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(projects)
}

pub(crate) async fn load_accounts(store: &dyn DocumentStore) -> PlancalResult<Vec<Account>> {
    let children = store.list_children(&DocPath::accounts()).await?;
    let mut accounts: Vec<Account> = children
        .iter()
        .filter_map(|(path, doc)| Account::from_doc(path, doc))
        .collect();
    accounts.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(accounts)
}

fn non_empty(name: &str, what: &str) -> PlancalResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(PlancalError::Validation(format!(
            "{} must not be empty",
            what
        )));
    }
    Ok(trimmed.to_string())
}

fn parse_date(s: &str) -> PlancalResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
        PlancalError::Validation(format!("Invalid date '{}'. Expected YYYY-MM-DD", s))
    })
}
