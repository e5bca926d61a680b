use chrono::{DateTime, Local, Utc};

use crate::rounding::RoundedDuration;

/// Audit record printed for every processed entry.
#[derive(Debug, Clone)]
pub struct WorklogReport<'a> {
    pub description: &'a str,
    pub workspace: &'a str,
    pub client: &'a str,
    pub project: &'a str,
    pub date: DateTime<Utc>,
    pub time_spent: &'a RoundedDuration,
    pub precision: u32,
    pub comment: &'a str,
    pub tags: Vec<String>,
}

impl WorklogReport<'_> {
    pub fn render(&self) -> String {
        format!(
            "Worklog: {}\n---------\nWorkspace: {}\nClient: {}\nProject: {}\nDate: {}\nTime spent: {} (clockify: {} precision: {}m)\nComment: {}\nTags: [{}]\n---------\n",
            self.description,
            self.workspace,
            self.client,
            self.project,
            self.date.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
            self.time_spent.rounded,
            self.time_spent.original,
            self.precision,
            self.comment,
            self.tags.join(" "),
        )
    }
}
