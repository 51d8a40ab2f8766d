use chrono::{Days, NaiveDate};

/// Inclusive calendar-date range sent to the aggregates endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateWindow {
    /// `to = today`, `from = today - days`. Dates only; no time component.
    pub fn trailing(today: NaiveDate, days: u64) -> Self {
        let from = today.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN);
        Self { from, to: today }
    }

    /// `from` as `YYYY-MM-DD`.
    pub fn from_param(&self) -> String {
        self.from.format("%Y-%m-%d").to_string()
    }

    /// `to` as `YYYY-MM-DD`.
    pub fn to_param(&self) -> String {
        self.to.format("%Y-%m-%d").to_string()
    }
}
