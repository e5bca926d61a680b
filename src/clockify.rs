use std::sync::OnceLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::dates::DateRange;
use crate::models::{Tag, TagSet, TimeEntry};

const BASE_URL: &str = "https://api.clockify.me/api/v1";
const PAGE_SIZE: usize = 1000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    #[error("Clockify rejected the token")]
    Unauthorized,
    #[error("Clockify rate limit reached")]
    RateLimited,
    #[error("Clockify API error: {0}")]
    ServerError(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Cannot parse Clockify response: {0}")]
    Parse(String),
}

/// What the time tracker echoes back after an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatedEntry {
    pub tag_ids: Vec<String>,
}

/// Source of time entries and the place their migration tags are persisted.
pub trait TimeTracker {
    fn fetch_tags(&self, workspace_id: &str) -> Result<TagSet, TrackerError>;

    fn fetch_entries(
        &self,
        workspace_id: &str,
        range: &DateRange,
    ) -> Result<Vec<TimeEntry>, TrackerError>;

    /// Pushes the entry's current tag set.
    fn update_entry(
        &self,
        workspace_id: &str,
        entry: &TimeEntry,
    ) -> Result<UpdatedEntry, TrackerError>;
}

pub struct ClockifyClient {
    client: Client,
    token: String,
    base_url: String,
    user_id: OnceLock<String>,
}

#[derive(Debug, Deserialize)]
struct UserDto {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TagDto {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectDto {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    client_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TimeIntervalDto {
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeEntryDto {
    id: String,
    #[serde(default)]
    description: String,
    project: Option<ProjectDto>,
    time_interval: TimeIntervalDto,
    #[serde(default)]
    tags: Option<Vec<TagDto>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTimeEntryBody<'a> {
    start: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    end: Option<String>,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_id: Option<&'a str>,
    tag_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatedEntryDto {
    #[serde(default)]
    tag_ids: Option<Vec<String>>,
}

impl ClockifyClient {
    pub fn new(token: String) -> Result<Self, TrackerError> {
        Self::with_base_url(token, BASE_URL.to_string())
    }

    pub fn with_base_url(token: String, base_url: String) -> Result<Self, TrackerError> {
        let client = Client::builder()
            .user_agent("clockify-to-jira")
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| TrackerError::Network(err.to_string()))?;
        Ok(Self {
            client,
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
            user_id: OnceLock::new(),
        })
    }

    fn current_user_id(&self) -> Result<String, TrackerError> {
        if let Some(id) = self.user_id.get() {
            return Ok(id.clone());
        }
        let user: UserDto = self.fetch(format!("{}/user", self.base_url))?;
        debug!(user = %user.id, "resolved clockify user");
        Ok(self.user_id.get_or_init(|| user.id).clone())
    }

    fn fetch<T: DeserializeOwned>(&self, url: String) -> Result<T, TrackerError> {
        let response = self
            .client
            .get(url)
            .header("Content-Type", "application/json")
            .header("X-Api-Key", &self.token)
            .send()
            .map_err(|err| TrackerError::Network(err.to_string()))?;

        parse_response(response)
    }
}

impl TimeTracker for ClockifyClient {
    fn fetch_tags(&self, workspace_id: &str) -> Result<TagSet, TrackerError> {
        let url = format!("{}/workspaces/{}/tags", self.base_url, workspace_id);
        let tags: Vec<TagDto> = self.fetch(url)?;
        Ok(tags.into_iter().map(|tag| Tag::new(tag.id, tag.name)).collect())
    }

    fn fetch_entries(
        &self,
        workspace_id: &str,
        range: &DateRange,
    ) -> Result<Vec<TimeEntry>, TrackerError> {
        let user_id = self.current_user_id()?;
        let (start, end) = range.as_utc_query();
        let page_size = PAGE_SIZE.to_string();
        let base = format!(
            "{}/workspaces/{}/user/{}/time-entries",
            self.base_url, workspace_id, user_id
        );
        let url = reqwest::Url::parse_with_params(
            &base,
            &[
                ("start", start.as_str()),
                ("end", end.as_str()),
                ("hydrated", "true"),
                ("page-size", page_size.as_str()),
            ],
        )
        .map_err(|err| TrackerError::Network(err.to_string()))?;

        let entries: Vec<TimeEntryDto> = self.fetch(url.to_string())?;
        if is_full_page(entries.len()) {
            warn!(
                workspace = %workspace_id,
                count = entries.len(),
                "Time entry page is full, older entries of the window are not fetched; shorten --period"
            );
        }
        Ok(entries.into_iter().map(map_time_entry).collect())
    }

    fn update_entry(
        &self,
        workspace_id: &str,
        entry: &TimeEntry,
    ) -> Result<UpdatedEntry, TrackerError> {
        let url = format!(
            "{}/workspaces/{}/time-entries/{}",
            self.base_url, workspace_id, entry.id
        );
        let response = self
            .client
            .put(url)
            .header("X-Api-Key", &self.token)
            .json(&update_body(entry))
            .send()
            .map_err(|err| TrackerError::Network(err.to_string()))?;

        let updated: UpdatedEntryDto = parse_response(response)?;
        Ok(UpdatedEntry {
            tag_ids: updated.tag_ids.unwrap_or_default(),
        })
    }
}

fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, TrackerError> {
    let status = response.status();
    if status == 401 || status == 403 {
        return Err(TrackerError::Unauthorized);
    }

    if status == 429 {
        return Err(TrackerError::RateLimited);
    }

    if !status.is_success() {
        return Err(TrackerError::ServerError(status.to_string()));
    }

    response
        .json::<T>()
        .map_err(|err| TrackerError::Parse(err.to_string()))
}

/// Only one page is requested, so a full page means the window may be truncated.
fn is_full_page(count: usize) -> bool {
    count >= PAGE_SIZE
}

fn map_time_entry(dto: TimeEntryDto) -> TimeEntry {
    let (project_id, project_name, client_name) = match dto.project {
        Some(project) if !project.id.is_empty() => (
            Some(project.id),
            project.name,
            project.client_name.unwrap_or_default(),
        ),
        _ => (None, String::new(), String::new()),
    };

    TimeEntry {
        id: dto.id,
        description: dto.description,
        client_name,
        project_id,
        project_name,
        start: dto.time_interval.start,
        end: dto.time_interval.end,
        duration: dto.time_interval.duration.unwrap_or_default(),
        tags: dto
            .tags
            .unwrap_or_default()
            .into_iter()
            .map(|tag| Tag::new(tag.id, tag.name))
            .collect(),
    }
}

fn update_body(entry: &TimeEntry) -> UpdateTimeEntryBody<'_> {
    UpdateTimeEntryBody {
        start: format_instant(entry.start),
        end: entry.end.map(format_instant),
        description: &entry.description,
        project_id: entry.project_id.as_deref(),
        tag_ids: entry.tags.ids(),
    }
}

fn format_instant(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::entry;

    const ENTRIES: &str = r#"[
        {
            "id": "id1",
            "description": "XYZ-123 Timeentry description",
            "projectId": "projectID1",
            "project": {"id": "projectID1", "name": "projectName1", "clientName": "clientName1"},
            "timeInterval": {"start": "2025-01-08T10:30:00Z", "end": "2025-01-08T17:00:00Z", "duration": "PT6H30M"},
            "tags": [
                {"id": "tagId1", "name": "tagName1", "workspaceId": "ws1"},
                {"id": "tagId2", "name": "tagName2", "workspaceId": "ws1"}
            ]
        },
        {
            "id": "id2",
            "description": "running",
            "project": null,
            "timeInterval": {"start": "2025-01-09T08:00:00Z", "end": null, "duration": null},
            "tags": null
        }
    ]"#;

    fn parsed() -> Vec<TimeEntry> {
        let dtos: Vec<TimeEntryDto> = serde_json::from_str(ENTRIES).unwrap();
        dtos.into_iter().map(map_time_entry).collect()
    }

    #[test]
    fn maps_hydrated_entries() {
        let entries = parsed();
        let first = &entries[0];
        assert_eq!(first.id, "id1");
        assert_eq!(first.client_name, "clientName1");
        assert_eq!(first.project_id.as_deref(), Some("projectID1"));
        assert_eq!(first.project_name, "projectName1");
        assert_eq!(first.duration, "PT6H30M");
        assert_eq!(first.elapsed_seconds(), Some(6 * 3600 + 30 * 60));
        assert_eq!(first.tags.names(), vec!["tagName1", "tagName2"]);
    }

    #[test]
    fn maps_running_entry_without_project() {
        let entries = parsed();
        let running = &entries[1];
        assert_eq!(running.project_id, None);
        assert_eq!(running.client_name, "");
        assert!(!running.has_logged_duration());
        assert!(running.end.is_none());
        assert!(running.tags.is_empty());
    }

    #[test]
    fn update_body_carries_tag_ids() {
        let mut entry = entry("id1", "client", 900);
        entry.add_tag(Tag::new("tagId1", "tag1"));
        entry.add_tag(Tag::new("tagId2", "tag2"));
        let body = serde_json::to_value(update_body(&entry)).unwrap();
        assert_eq!(body["tagIds"], serde_json::json!(["tagId1", "tagId2"]));
        assert_eq!(body["projectId"], "projectID1");
        assert_eq!(body["start"], "2025-01-08T10:30:00Z");
        assert_eq!(body["end"], "2025-01-08T10:45:00Z");
    }

    #[test]
    fn updated_entry_tolerates_missing_tag_ids() {
        let dto: UpdatedEntryDto = serde_json::from_str(r#"{"id": "id1"}"#).unwrap();
        assert!(dto.tag_ids.is_none());

        let dto: UpdatedEntryDto =
            serde_json::from_str(r#"{"id": "id1", "tagIds": ["tagId1"]}"#).unwrap();
        assert_eq!(dto.tag_ids, Some(vec!["tagId1".to_string()]));
    }

    #[test]
    fn full_page_is_flagged_as_truncated() {
        assert!(!is_full_page(0));
        assert!(!is_full_page(PAGE_SIZE - 1));
        assert!(is_full_page(PAGE_SIZE));
    }
}
