use crate::dates::DateRange;
use crate::rounding::{RoundedDuration, format_duration};

/// Per-workspace totals, owned by that workspace's worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub workspace: String,
    pub range: DateRange,
    pub entries: usize,
    pub total_seconds: u64,
    pub total_rounded_seconds: u64,
    pub precision: u32,
    pub misconfigured: usize,
    pub failures: usize,
    pub aborted: Option<String>,
}

impl RunSummary {
    pub fn new(workspace: impl Into<String>, range: DateRange) -> Self {
        Self {
            workspace: workspace.into(),
            range,
            entries: 0,
            total_seconds: 0,
            total_rounded_seconds: 0,
            precision: 0,
            misconfigured: 0,
            failures: 0,
            aborted: None,
        }
    }

    pub fn record(&mut self, elapsed_seconds: u64, rounded: &RoundedDuration, precision: u32) {
        self.entries += 1;
        self.total_seconds += elapsed_seconds;
        self.total_rounded_seconds += rounded.seconds;
        self.precision = precision;
    }

    pub fn record_misconfigured(&mut self) {
        self.misconfigured += 1;
    }

    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    pub fn abort(&mut self, reason: impl Into<String>) {
        self.aborted = Some(reason.into());
    }

    pub fn render(&self) -> String {
        let mut output = format!(
            "Workspace: {}\n-------\nSUMMARY\n-------\nTime entries range: {}\nNumber of time entries: {}\nTotal time: {}\nTotal rounded: {} (t={}m)\n",
            self.workspace,
            self.range.label(),
            self.entries,
            format_duration(self.total_seconds),
            format_duration(self.total_rounded_seconds),
            self.precision,
        );
        if self.misconfigured > 0 {
            output.push_str(&format!("Misconfigured entries: {}\n", self.misconfigured));
        }
        if self.failures > 0 {
            output.push_str(&format!("Failed entries: {}\n", self.failures));
        }
        if let Some(reason) = &self.aborted {
            output.push_str(&format!("Aborted: {reason}\n"));
        }
        output.push_str("---------\n");
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rounding::round_duration;
    use chrono::{Local, TimeZone};

    fn range() -> DateRange {
        let now = Local.with_ymd_and_hms(2024, 5, 11, 21, 34, 1).earliest().unwrap();
        DateRange::lookback(now, 30)
    }

    #[test]
    fn record_accumulates_totals() {
        let mut summary = RunSummary::new("WorkspaceKey", range());
        summary.record(960, &round_duration(960, 15), 15);
        summary.record(1350, &round_duration(1350, 15), 15);
        assert_eq!(summary.entries, 2);
        assert_eq!(summary.total_seconds, 2310);
        assert_eq!(summary.total_rounded_seconds, 2700);
        assert_eq!(summary.precision, 15);
    }

    #[test]
    fn render_matches_template() {
        let mut summary = RunSummary::new("WorkspaceKey", range());
        summary.entries = 12;
        summary.total_seconds = 100;
        summary.total_rounded_seconds = 200;
        summary.precision = 5;

        let want = "Workspace: WorkspaceKey\n-------\nSUMMARY\n-------\nTime entries range: 2024-04-11 21:34:01 - 2024-05-11 21:34:01\nNumber of time entries: 12\nTotal time: 1m40s\nTotal rounded: 3m20s (t=5m)\n---------\n";
        assert_eq!(summary.render(), want);
    }

    #[test]
    fn render_reports_problems() {
        let mut summary = RunSummary::new("WorkspaceKey", range());
        summary.record_misconfigured();
        summary.record_failure();
        summary.abort("Cannot fetch time entries");
        let rendered = summary.render();
        assert!(rendered.contains("Misconfigured entries: 1\n"));
        assert!(rendered.contains("Failed entries: 1\n"));
        assert!(rendered.contains("Aborted: Cannot fetch time entries\n"));
    }
}
