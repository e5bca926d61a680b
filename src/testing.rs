//! In-memory collaborators for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::clockify::{TimeTracker, TrackerError, UpdatedEntry};
use crate::config::{Client, Clients, Workspace};
use crate::dates::DateRange;
use crate::jira::{IssueTracker, IssueTrackerError, Worklog};
use crate::models::{TagSet, TimeEntry};

/// Echoes pushed tag ids back unless `update_response` overrides it.
#[derive(Default)]
pub(crate) struct FakeTracker {
    pub(crate) tags: HashMap<String, TagSet>,
    pub(crate) entries: HashMap<String, Vec<TimeEntry>>,
    pub(crate) fetch_error: Option<TrackerError>,
    pub(crate) update_response: Option<Result<UpdatedEntry, TrackerError>>,
    pub(crate) pushed: Mutex<Vec<(String, TimeEntry)>>,
}

impl FakeTracker {
    pub(crate) fn updates(&self) -> Vec<(String, TimeEntry)> {
        self.pushed.lock().unwrap().clone()
    }
}

impl TimeTracker for FakeTracker {
    fn fetch_tags(&self, workspace_id: &str) -> Result<TagSet, TrackerError> {
        Ok(self.tags.get(workspace_id).cloned().unwrap_or_default())
    }

    fn fetch_entries(
        &self,
        workspace_id: &str,
        _range: &DateRange,
    ) -> Result<Vec<TimeEntry>, TrackerError> {
        if let Some(err) = &self.fetch_error {
            return Err(err.clone());
        }
        Ok(self.entries.get(workspace_id).cloned().unwrap_or_default())
    }

    fn update_entry(
        &self,
        workspace_id: &str,
        entry: &TimeEntry,
    ) -> Result<UpdatedEntry, TrackerError> {
        self.pushed
            .lock()
            .unwrap()
            .push((workspace_id.to_string(), entry.clone()));
        match &self.update_response {
            Some(response) => response.clone(),
            None => Ok(UpdatedEntry {
                tag_ids: entry.tags.ids(),
            }),
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeIssueTracker {
    pub(crate) failing_issues: Vec<String>,
    pub(crate) created: Mutex<Vec<(String, Worklog)>>,
}

impl FakeIssueTracker {
    pub(crate) fn worklogs(&self) -> Vec<(String, Worklog)> {
        self.created.lock().unwrap().clone()
    }
}

impl IssueTracker for FakeIssueTracker {
    fn create_worklog(
        &self,
        credentials: &Client,
        worklog: &Worklog,
    ) -> Result<(), IssueTrackerError> {
        if self.failing_issues.contains(&worklog.issue_id) {
            return Err(IssueTrackerError::IssueNotFound(worklog.issue_id.clone()));
        }
        self.created
            .lock()
            .unwrap()
            .push((credentials.jira_username.clone(), worklog.clone()));
        Ok(())
    }
}

/// Resolved workspace `ws-1` with the default tag names and the given `(id, enabled, precision)` clients.
pub(crate) fn workspace_with_clients(clients: &[(&str, bool, u32)]) -> Workspace {
    let clients: Clients = clients
        .iter()
        .map(|(id, enabled, precision)| {
            (
                id.to_string(),
                Client {
                    jira_host: "https://jira.example.net".to_string(),
                    jira_username: format!("{id}@example.net"),
                    jira_password: "secret".to_string(),
                    precision: *precision,
                    enabled: *enabled,
                    ..Client::default()
                },
            )
        })
        .collect();

    Workspace {
        workspace_id: "ws-1".to_string(),
        jira_migration_failed_tag: "jira-migration-failed".to_string(),
        jira_migration_skip_tag: "jira-migration-skip".to_string(),
        jira_migration_success_tag: "logged".to_string(),
        clients,
    }
}
