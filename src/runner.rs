use std::sync::mpsc;
use std::thread;

use tracing::{debug, error, info, info_span, warn};

use crate::clockify::TimeTracker;
use crate::config::{Workspace, Workspaces};
use crate::dates::DateRange;
use crate::jira::{IssueTracker, Worklog, issue_url};
use crate::migration::{
    Candidate, Eligibility, MigrationTags, Misconfiguration, RunMode, assess, record_outcome,
};
use crate::models::TimeEntry;
use crate::report::WorklogReport;
use crate::rounding::round_duration;
use crate::summary::RunSummary;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub mode: RunMode,
    /// Lower-cased client keys; empty means every client.
    pub clients: Vec<String>,
}

/// Migrates every workspace on its own scoped thread and returns one summary per workspace,
/// ordered by workspace key.
pub fn run<T, I>(
    workspaces: &Workspaces,
    range: DateRange,
    options: &RunOptions,
    tracker: &T,
    issues: &I,
) -> Vec<RunSummary>
where
    T: TimeTracker + Sync,
    I: IssueTracker + Sync,
{
    let expected = workspaces.len();
    let (sender, receiver) = mpsc::channel();

    let mut summaries: Vec<RunSummary> = thread::scope(|scope| {
        for (key, workspace) in workspaces {
            let sender = sender.clone();
            scope.spawn(move || {
                let summary = migrate_workspace(key, workspace, range, options, tracker, issues);
                // The receiver outlives every worker inside this scope.
                let _ = sender.send(summary);
            });
        }
        drop(sender);

        (0..expected).map_while(|_| receiver.recv().ok()).collect()
    });

    summaries.sort_by(|left, right| left.workspace.cmp(&right.workspace));
    summaries
}

/// Processes one workspace sequentially, oldest fetched entry first.
pub fn migrate_workspace<T, I>(
    key: &str,
    workspace: &Workspace,
    range: DateRange,
    options: &RunOptions,
    tracker: &T,
    issues: &I,
) -> RunSummary
where
    T: TimeTracker + ?Sized,
    I: IssueTracker + ?Sized,
{
    let _span = info_span!("workspace", workspace = %key).entered();
    let mut summary = RunSummary::new(key, range);

    let tags = if options.mode.apply {
        let available = match tracker.fetch_tags(&workspace.workspace_id) {
            Ok(available) => available,
            Err(err) => {
                error!(error = %err, "Cannot fetch workspace tags");
                summary.abort(format!("Cannot fetch workspace tags: {err}"));
                return summary;
            }
        };
        match MigrationTags::resolve(workspace, &available) {
            Ok(tags) => Some(tags),
            Err(err) => {
                error!(error = %err, solution = "create the tag in Clockify or fix the workspace tag names", "Workspace is not ready for migration");
                summary.abort(err.to_string());
                return summary;
            }
        }
    } else {
        None
    };

    let mut entries = match tracker.fetch_entries(&workspace.workspace_id, &range) {
        Ok(entries) => entries,
        Err(err) => {
            error!(error = %err, "Cannot fetch time entries");
            summary.abort(format!("Cannot fetch time entries: {err}"));
            return summary;
        }
    };
    entries.reverse();
    debug!(count = entries.len(), "Fetched time entries");

    for entry in entries {
        process_entry(key, workspace, entry, options, tags.as_ref(), tracker, issues, &mut summary);
    }

    summary
}

#[allow(clippy::too_many_arguments)]
fn process_entry<T, I>(
    key: &str,
    workspace: &Workspace,
    mut entry: TimeEntry,
    options: &RunOptions,
    tags: Option<&MigrationTags>,
    tracker: &T,
    issues: &I,
    summary: &mut RunSummary,
) where
    T: TimeTracker + ?Sized,
    I: IssueTracker + ?Sized,
{
    let candidate = match assess(&entry, workspace, &options.clients, options.mode) {
        Eligibility::Eligible(candidate) => candidate,
        Eligibility::Skip(reason) => {
            debug!(entry = %entry.id, ?reason, "Skipping time entry");
            return;
        }
        Eligibility::Misconfigured(problem) => {
            report_misconfiguration(key, &entry, &problem);
            if !matches!(problem, Misconfiguration::ClientNotSelected(_)) {
                summary.record_misconfigured();
            }
            return;
        }
    };

    let Candidate {
        client_key,
        client,
        issue_id,
        elapsed_seconds,
    } = candidate;

    let rounded = round_duration(elapsed_seconds, client.precision);
    summary.record(elapsed_seconds, &rounded, client.precision);

    // Migration tags are only resolved in apply mode.
    if let Some(tags) = tags {
        let worklog = Worklog {
            issue_id: issue_id.clone(),
            started: entry.worklog_start(),
            time_spent_seconds: rounded.seconds,
            comment: entry.issue_comment(),
        };
        let outcome = issues.create_worklog(client, &worklog);
        let mut failed = false;
        match &outcome {
            Ok(()) => info!(entry = %entry.id, issue = %issue_id, url = %issue_url(&client.jira_host, &issue_id), "Worklog created"),
            Err(err) => {
                error!(entry = %entry.id, client = %client_key, issue = %issue_id, error = %err, "Cannot create worklog");
                failed = true;
            }
        }

        if let Err(err) = record_outcome(tracker, &workspace.workspace_id, &mut entry, &outcome, tags) {
            error!(entry = %entry.id, client = %client_key, error = %err, "Cannot update time entry tags");
            failed = true;
        }

        if failed {
            summary.record_failure();
        }
    }

    let comment = entry.issue_comment();
    let report = WorklogReport {
        description: &entry.description,
        workspace: key,
        client: &entry.client_name,
        project: &entry.project_name,
        date: entry.start,
        time_spent: &rounded,
        precision: client.precision,
        comment: &comment,
        tags: entry.tags.names(),
    };
    info!("\n{}", report.render());
}

fn report_misconfiguration(key: &str, entry: &TimeEntry, problem: &Misconfiguration) {
    match problem {
        Misconfiguration::ClientNotSelected(client) => {
            info!(entry = %entry.id, client = %client, "Client not selected, skipping");
        }
        Misconfiguration::ClientDisabled(client) => {
            warn!(
                entry = %entry.id,
                client = %client,
                solution = %format!("workspaces.{key}.clients.{client}.enabled"),
                "Client is disabled"
            );
        }
        Misconfiguration::ClientNotFound(client) => {
            error!(
                entry = %entry.id,
                client = %client,
                solution = %format!("workspaces.{key}.clients.{client}"),
                "Client is not configured"
            );
        }
        Misconfiguration::MissingProject => {
            error!(entry = %entry.id, description = %entry.description, "Time entry has no project");
        }
        Misconfiguration::MissingIssueId => {
            error!(entry = %entry.id, "Time entry description has no issue id");
        }
        Misconfiguration::InvalidInterval => {
            error!(entry = %entry.id, "Time entry has no valid start and end");
        }
    }
}
