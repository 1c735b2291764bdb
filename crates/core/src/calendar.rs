//! Date windows for the calendar grids.
//!
//! A grid always shows a contiguous, inclusive range of days. The window is
//! validated once at construction so downstream code can iterate it freely.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::CalendarDate;

/// Wire format for calendar days (`YYYY-MM-DD`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Longest window a grid may load, in days (about one quarter).
pub const MAX_WINDOW_DAYS: i64 = 93;

/// Inclusive range of calendar days loaded into a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "WindowBounds")]
pub struct DateWindow {
    from: CalendarDate,
    to: CalendarDate,
}

/// Unvalidated bounds as they arrive over the wire.
#[derive(Deserialize)]
struct WindowBounds {
    from: CalendarDate,
    to: CalendarDate,
}

impl TryFrom<WindowBounds> for DateWindow {
    type Error = CoreError;

    fn try_from(bounds: WindowBounds) -> Result<Self, Self::Error> {
        DateWindow::new(bounds.from, bounds.to)
    }
}

impl DateWindow {
    /// Build a window, rejecting inverted ranges and ranges longer than
    /// [`MAX_WINDOW_DAYS`].
    pub fn new(from: CalendarDate, to: CalendarDate) -> Result<Self, CoreError> {
        if to < from {
            return Err(CoreError::Validation(format!(
                "Date window end {to} is before start {from}"
            )));
        }
        let days = (to - from).num_days() + 1;
        if days > MAX_WINDOW_DAYS {
            return Err(CoreError::Validation(format!(
                "Date window spans {days} days; at most {MAX_WINDOW_DAYS} are allowed"
            )));
        }
        Ok(Self { from, to })
    }

    /// A window covering exactly one day.
    pub fn single(date: CalendarDate) -> Self {
        Self {
            from: date,
            to: date,
        }
    }

    pub fn from(&self) -> CalendarDate {
        self.from
    }

    pub fn to(&self) -> CalendarDate {
        self.to
    }

    /// Number of days in the window (always at least 1).
    pub fn len_days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }

    pub fn contains(&self, date: CalendarDate) -> bool {
        self.from <= date && date <= self.to
    }

    /// Iterate every day of the window in ascending order.
    pub fn days(&self) -> impl Iterator<Item = CalendarDate> {
        let to = self.to;
        self.from.iter_days().take_while(move |d| *d <= to)
    }
}

/// Parse a `YYYY-MM-DD` string into a calendar day.
pub fn parse_date(raw: &str) -> Result<CalendarDate, CoreError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| CoreError::Validation(format!("Invalid date '{raw}', expected YYYY-MM-DD")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn day(s: &str) -> CalendarDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn window_is_inclusive() {
        let window = DateWindow::new(day("2024-03-01"), day("2024-03-03")).unwrap();
        assert_eq!(window.len_days(), 3);
        assert!(window.contains(day("2024-03-01")));
        assert!(window.contains(day("2024-03-03")));
        assert!(!window.contains(day("2024-03-04")));
        assert!(!window.contains(day("2024-02-29")));
    }

    #[test]
    fn days_iterates_every_date_in_order() {
        let window = DateWindow::new(day("2024-02-28"), day("2024-03-01")).unwrap();
        let days: Vec<_> = window.days().collect();
        assert_eq!(days, vec![day("2024-02-28"), day("2024-02-29"), day("2024-03-01")]);
    }

    #[test]
    fn inverted_window_is_rejected() {
        let result = DateWindow::new(day("2024-03-05"), day("2024-03-01"));
        assert_matches!(result, Err(CoreError::Validation(_)));
    }

    #[test]
    fn oversized_window_is_rejected() {
        let from = day("2024-01-01");
        let ok_to = from + chrono::Duration::days(MAX_WINDOW_DAYS - 1);
        assert!(DateWindow::new(from, ok_to).is_ok());
        let too_far = from + chrono::Duration::days(MAX_WINDOW_DAYS);
        assert!(DateWindow::new(from, too_far).is_err());
    }

    #[test]
    fn deserialize_validates_bounds() {
        let ok: DateWindow =
            serde_json::from_str(r#"{"from":"2024-05-01","to":"2024-05-07"}"#).unwrap();
        assert_eq!(ok.len_days(), 7);

        let bad = serde_json::from_str::<DateWindow>(r#"{"from":"2024-05-07","to":"2024-05-01"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert!(parse_date("2024-13-01").is_err());
        assert!(parse_date("yesterday").is_err());
        assert_eq!(parse_date(" 2024-01-31 ").unwrap(), day("2024-01-31"));
    }
}
