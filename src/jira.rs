use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use reqwest::blocking::Client as HttpClient;
use serde::Serialize;
use thiserror::Error;

use crate::config::Client;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IssueTrackerError {
    #[error("Jira rejected the credentials")]
    Unauthorized,
    #[error("Issue {0} not found")]
    IssueNotFound(String),
    #[error("Jira API error: {0}")]
    Rejected(String),
    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worklog {
    pub issue_id: String,
    pub started: DateTime<Utc>,
    pub time_spent_seconds: u64,
    pub comment: String,
}

/// Sink for worklogs, authenticated per client.
pub trait IssueTracker {
    fn create_worklog(&self, credentials: &Client, worklog: &Worklog)
    -> Result<(), IssueTrackerError>;
}

#[derive(Clone)]
pub struct JiraClient {
    client: HttpClient,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WorklogBody<'a> {
    comment: &'a str,
    started: String,
    time_spent_seconds: u64,
}

impl JiraClient {
    pub fn new() -> Result<Self, IssueTrackerError> {
        let client = HttpClient::builder()
            .user_agent("clockify-to-jira")
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| IssueTrackerError::Network(err.to_string()))?;
        Ok(Self { client })
    }
}

impl IssueTracker for JiraClient {
    fn create_worklog(
        &self,
        credentials: &Client,
        worklog: &Worklog,
    ) -> Result<(), IssueTrackerError> {
        let url = format!(
            "{}/rest/api/2/issue/{}/worklog",
            credentials.jira_host.trim_end_matches('/'),
            worklog.issue_id
        );
        let auth = STANDARD.encode(format!(
            "{}:{}",
            credentials.jira_username, credentials.jira_password
        ));
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Basic {auth}"))
            .json(&worklog_body(worklog))
            .send()
            .map_err(|err| IssueTrackerError::Network(err.to_string()))?;

        let status = response.status();
        if status == 401 || status == 403 {
            return Err(IssueTrackerError::Unauthorized);
        }

        if status == 404 {
            return Err(IssueTrackerError::IssueNotFound(worklog.issue_id.clone()));
        }

        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(IssueTrackerError::Rejected(format!("{status} {body}")));
        }

        Ok(())
    }
}

pub fn issue_url(host: &str, issue_id: &str) -> String {
    format!("{}/browse/{}", host.trim_end_matches('/'), issue_id)
}

fn worklog_body(worklog: &Worklog) -> WorklogBody<'_> {
    WorklogBody {
        comment: &worklog.comment,
        started: worklog.started.format("%Y-%m-%dT%H:%M:%S%.3f%z").to_string(),
        time_spent_seconds: worklog.time_spent_seconds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn worklog_body_uses_jira_timestamp() {
        let worklog = Worklog {
            issue_id: "ABC-1".to_string(),
            started: Utc.with_ymd_and_hms(2024, 9, 16, 6, 0, 0).unwrap() + Duration::milliseconds(1),
            time_spent_seconds: 900,
            comment: "Comment".to_string(),
        };
        let body = serde_json::to_value(worklog_body(&worklog)).unwrap();
        assert_eq!(body["started"], "2024-09-16T06:00:00.001+0000");
        assert_eq!(body["timeSpentSeconds"], 900);
        assert_eq!(body["comment"], "Comment");
    }

    #[test]
    fn issue_url_trims_trailing_slash() {
        assert_eq!(
            issue_url("https://jira.atlassian.net/", "ABC-1"),
            "https://jira.atlassian.net/browse/ABC-1"
        );
    }
}
