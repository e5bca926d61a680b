use thiserror::Error;

use crate::clockify::TimeTracker;
use crate::config::{Client, Workspace};
use crate::jira::IssueTrackerError;
use crate::models::{Tag, TagSet, TimeEntry};
use crate::validation::{UpdateError, confirm_update};

/// `apply` and `debug` are validated as mutually exclusive before a run starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunMode {
    pub apply: bool,
    pub debug: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MigrationError {
    #[error("Tag {tag} is not defined in workspace {workspace}")]
    MissingWorkspaceTag { workspace: String, tag: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoDuration,
    AlreadyMigrated,
    MarkedSkip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Misconfiguration {
    MissingProject,
    ClientNotSelected(String),
    ClientNotFound(String),
    ClientDisabled(String),
    MissingIssueId,
    InvalidInterval,
}

/// Everything needed to log one eligible entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate<'w> {
    pub client_key: String,
    pub client: &'w Client,
    pub issue_id: String,
    pub elapsed_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility<'w> {
    Eligible(Candidate<'w>),
    Skip(SkipReason),
    Misconfigured(Misconfiguration),
}

/// Decides from tags alone whether an entry is up for processing.
/// Debug mode re-opens migrated and skipped entries; a missing duration always skips.
pub fn check_tags(entry: &TimeEntry, workspace: &Workspace, mode: RunMode) -> Option<SkipReason> {
    if !entry.has_logged_duration() {
        return Some(SkipReason::NoDuration);
    }

    if mode.debug {
        return None;
    }

    if entry.is_tagged_with(&workspace.jira_migration_success_tag) {
        return Some(SkipReason::AlreadyMigrated);
    }

    if entry.is_tagged_with(&workspace.jira_migration_skip_tag) {
        return Some(SkipReason::MarkedSkip);
    }

    None
}

pub fn assess<'w>(
    entry: &TimeEntry,
    workspace: &'w Workspace,
    client_selector: &[String],
    mode: RunMode,
) -> Eligibility<'w> {
    if let Some(reason) = check_tags(entry, workspace, mode) {
        return Eligibility::Skip(reason);
    }

    if entry.project_id.is_none() {
        return Eligibility::Misconfigured(Misconfiguration::MissingProject);
    }

    let client_key = entry.client_key();
    if !client_selector.is_empty() && !client_selector.contains(&client_key) {
        return Eligibility::Misconfigured(Misconfiguration::ClientNotSelected(client_key));
    }

    let client = match workspace.get_client(&client_key) {
        Ok(client) => client,
        Err(_) => return Eligibility::Misconfigured(Misconfiguration::ClientNotFound(client_key)),
    };

    if !client.enabled {
        return Eligibility::Misconfigured(Misconfiguration::ClientDisabled(client_key));
    }

    let Some(issue_id) = entry.issue_id() else {
        return Eligibility::Misconfigured(Misconfiguration::MissingIssueId);
    };

    let Some(elapsed_seconds) = entry.elapsed_seconds() else {
        return Eligibility::Misconfigured(Misconfiguration::InvalidInterval);
    };

    Eligibility::Eligible(Candidate {
        client_key,
        client,
        issue_id,
        elapsed_seconds,
    })
}

/// The workspace's `success` and `failed` tags as the tracker knows them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationTags {
    pub success: Tag,
    pub failed: Tag,
}

impl MigrationTags {
    pub fn resolve(workspace: &Workspace, available: &TagSet) -> Result<Self, MigrationError> {
        let lookup = |name: &str| {
            available
                .get(name)
                .cloned()
                .ok_or_else(|| MigrationError::MissingWorkspaceTag {
                    workspace: workspace.workspace_id.clone(),
                    tag: name.to_string(),
                })
        };

        Ok(Self {
            success: lookup(&workspace.jira_migration_success_tag)?,
            failed: lookup(&workspace.jira_migration_failed_tag)?,
        })
    }
}

pub fn mark_success(entry: &mut TimeEntry, tags: &MigrationTags) {
    entry.remove_tag(&tags.failed.name);
    entry.add_tag(tags.success.clone());
}

/// Prior `success` or `skip` tags are left in place.
pub fn mark_failed(entry: &mut TimeEntry, tags: &MigrationTags) {
    entry.add_tag(tags.failed.clone());
}

/// Tags the entry for the worklog outcome, then always pushes and verifies the new tag set.
pub fn record_outcome<T>(
    tracker: &T,
    workspace_id: &str,
    entry: &mut TimeEntry,
    worklog: &Result<(), IssueTrackerError>,
    tags: &MigrationTags,
) -> Result<(), UpdateError>
where
    T: TimeTracker + ?Sized,
{
    match worklog {
        Ok(()) => mark_success(entry, tags),
        Err(_) => mark_failed(entry, tags),
    }

    let result = tracker.update_entry(workspace_id, entry);
    confirm_update(&entry.tags, result)
}
