use std::collections::BTreeMap;
use std::collections::btree_map::Values;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
}

impl Tag {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Tags keyed by name. Adding a tag whose name is present replaces it,
/// and equality ignores insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: BTreeMap<String, Tag>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: Tag) {
        self.tags.insert(tag.name.clone(), tag);
    }

    pub fn remove(&mut self, name: &str) -> Option<Tag> {
        self.tags.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Tag> {
        self.tags.get(name)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> Values<'_, String, Tag> {
        self.tags.values()
    }

    pub fn ids(&self) -> Vec<String> {
        self.iter().map(|tag| tag.id.clone()).collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.tags.keys().cloned().collect()
    }
}

impl FromIterator<Tag> for TagSet {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeEntry {
    pub id: String,
    pub description: String,
    pub client_name: String,
    pub project_id: Option<String>,
    pub project_name: String,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    /// Duration as reported by the tracker; empty while the timer is running.
    pub duration: String,
    pub tags: TagSet,
}

impl TimeEntry {
    pub fn is_tagged_with(&self, name: &str) -> bool {
        self.tags.contains(name)
    }

    pub fn add_tag(&mut self, tag: Tag) {
        self.tags.insert(tag);
    }

    pub fn remove_tag(&mut self, name: &str) {
        self.tags.remove(name);
    }

    pub fn has_logged_duration(&self) -> bool {
        !self.duration.trim().is_empty()
    }

    /// Seconds between start and end. `None` for running entries or an end before the start.
    pub fn elapsed_seconds(&self) -> Option<u64> {
        let end = self.end?;
        u64::try_from((end - self.start).num_seconds()).ok()
    }

    /// Client names are matched against config keys case-insensitively.
    pub fn client_key(&self) -> String {
        self.client_name.to_lowercase()
    }

    /// First word of the description, e.g. `[ABC-12]` or `ABC-12:` both give `ABC-12`.
    pub fn issue_id(&self) -> Option<String> {
        let first = self.description.split_whitespace().next()?;
        let trimmed = first.strip_prefix('[').unwrap_or(first);
        let trimmed = trimmed.strip_suffix(':').unwrap_or(trimmed);
        let trimmed = trimmed.strip_suffix(']').unwrap_or(trimmed);
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    pub fn issue_comment(&self) -> String {
        self.description
            .split_whitespace()
            .skip(1)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Worklogs start one millisecond after the entry itself.
    pub fn worklog_start(&self) -> DateTime<Utc> {
        self.start + Duration::milliseconds(1)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    pub fn entry(id: &str, client: &str, seconds: i64) -> TimeEntry {
        let start = Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 0).unwrap();
        TimeEntry {
            id: id.to_string(),
            description: "XYZ-123 Timeentry description".to_string(),
            client_name: client.to_string(),
            project_id: Some("projectID1".to_string()),
            project_name: "projectName1".to_string(),
            start,
            end: Some(start + Duration::seconds(seconds)),
            duration: format!("PT{seconds}S"),
            tags: TagSet::new(),
        }
    }
}
