//! Pay week model.
//!
//! This module contains the [`PayWeek`] type that bounds one processing run.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// The inclusive date range a batch of punches is reconciled for.
///
/// # Example
///
/// ```
/// use timesheet_engine::models::PayWeek;
/// use chrono::NaiveDate;
///
/// // 2026-01-12 is a Monday
/// let week = PayWeek::starting(NaiveDate::from_ymd_opt(2026, 1, 12).unwrap());
///
/// assert!(week.contains_date(NaiveDate::from_ymd_opt(2026, 1, 16).unwrap()));
/// assert!(!week.contains_date(NaiveDate::from_ymd_opt(2026, 1, 19).unwrap()));
/// assert_eq!(week.working_days().len(), 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayWeek {
    /// The first date of the week (inclusive).
    pub start_date: NaiveDate,
    /// The last date of the week (inclusive).
    pub end_date: NaiveDate,
}

impl PayWeek {
    /// A seven-day week beginning on `start_date`.
    pub fn starting(start_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date: start_date + Duration::days(6),
        }
    }

    /// Checks that the range is not inverted and spans at most 31 days.
    pub fn validate(&self) -> EngineResult<()> {
        if self.end_date < self.start_date {
            return Err(EngineError::InvalidConfig {
                field: "pay_week.end_date".to_string(),
                message: format!(
                    "end date {} is before start date {}",
                    self.end_date, self.start_date
                ),
            });
        }
        if (self.end_date - self.start_date).num_days() > 30 {
            return Err(EngineError::InvalidConfig {
                field: "pay_week.end_date".to_string(),
                message: "a processing run covers at most 31 days".to_string(),
            });
        }
        Ok(())
    }

    /// Checks if a given date falls within this week (inclusive).
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Every date in the week, in order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.start_date
            .iter_days()
            .take_while(|d| *d <= self.end_date)
            .collect()
    }

    /// Monday to Friday dates in the week. These always get a result.
    pub fn working_days(&self) -> Vec<NaiveDate> {
        self.dates()
            .into_iter()
            .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
            .collect()
    }
}
