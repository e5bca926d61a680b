use chrono::{DateTime, Days, Duration, Local, Utc};

const LABEL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Window of time entries fetched for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: DateTime<Local>,
    end: DateTime<Local>,
}

impl DateRange {
    /// `period_days` calendar days back from `now`, ending at `now`.
    pub fn lookback(now: DateTime<Local>, period_days: u32) -> Self {
        let start = now
            .checked_sub_days(Days::new(u64::from(period_days)))
            .unwrap_or_else(|| now - Duration::days(i64::from(period_days)));
        Self { start, end: now }
    }

    pub fn start(&self) -> DateTime<Local> {
        self.start
    }

    pub fn end(&self) -> DateTime<Local> {
        self.end
    }

    /// Bounds in UTC with second precision, the form the time tracker expects.
    pub fn as_utc_query(&self) -> (String, String) {
        (utc_query(self.start()), utc_query(self.end()))
    }

    pub fn label(&self) -> String {
        format!(
            "{} - {}",
            self.start().format(LABEL_FORMAT),
            self.end().format(LABEL_FORMAT)
        )
    }
}

fn utc_query(value: DateTime<Local>) -> String {
    value
        .with_timezone(&Utc)
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string()
}
