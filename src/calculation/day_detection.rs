//! Day detection and per-day grouping.
//!
//! This module determines which rule set (Mon-Thu, Friday, weekend) applies
//! to a calendar date and splits an employee's punch stream into calendar
//! days.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::RawPunch;

/// Represents the rule set that applies to a working day.
///
/// # Example
///
/// ```
/// use timesheet_engine::calculation::DayType;
///
/// let day_type = DayType::Friday;
/// assert_eq!(day_type.to_string(), "Friday");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayType {
    /// Monday through Thursday: four slots and the full scenario table.
    Standard,
    /// Friday: Morning-In and Afternoon-Out only.
    Friday,
    /// Saturday or Sunday: Mon-Thu rules, always sent for review.
    Weekend,
}

impl DayType {
    /// Returns true when the four-slot Mon-Thu rules apply.
    pub fn uses_standard_rules(&self) -> bool {
        matches!(self, DayType::Standard | DayType::Weekend)
    }
}

impl std::fmt::Display for DayType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DayType::Standard => write!(f, "Standard"),
            DayType::Friday => write!(f, "Friday"),
            DayType::Weekend => write!(f, "Weekend"),
        }
    }
}

/// Flag raised on every weekend day that has punches.
pub const WEEKEND_FLAG: &str = "Weekend punches - manual review";

/// Determines the day type for a given date.
///
/// # Example
///
/// ```
/// use timesheet_engine::calculation::{get_day_type, DayType};
/// use chrono::NaiveDate;
///
/// // 2026-01-15 is a Thursday
/// assert_eq!(get_day_type(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()), DayType::Standard);
/// // 2026-01-16 is a Friday
/// assert_eq!(get_day_type(NaiveDate::from_ymd_opt(2026, 1, 16).unwrap()), DayType::Friday);
/// // 2026-01-17 is a Saturday
/// assert_eq!(get_day_type(NaiveDate::from_ymd_opt(2026, 1, 17).unwrap()), DayType::Weekend);
/// ```
pub fn get_day_type(date: NaiveDate) -> DayType {
    match date.weekday() {
        Weekday::Fri => DayType::Friday,
        Weekday::Sat | Weekday::Sun => DayType::Weekend,
        _ => DayType::Standard,
    }
}

/// Groups punches by calendar date, keeping import order within each day.
pub fn group_by_day(punches: &[RawPunch]) -> BTreeMap<NaiveDate, Vec<RawPunch>> {
    let mut days: BTreeMap<NaiveDate, Vec<RawPunch>> = BTreeMap::new();
    for punch in punches {
        days.entry(punch.timestamp.date())
            .or_default()
            .push(punch.clone());
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn make_date(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    fn punch(timestamp: &str) -> RawPunch {
        RawPunch {
            person_ref: "1001".to_string(),
            device_label: "Clock In".to_string(),
            timestamp: NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S").unwrap(),
        }
    }

    // ==========================================================================
    // DD-001: Monday to Thursday use the standard rules
    // ==========================================================================
    #[test]
    fn test_dd_001_monday_to_thursday_are_standard() {
        for day in ["2026-01-12", "2026-01-13", "2026-01-14", "2026-01-15"] {
            assert_eq!(get_day_type(make_date(day)), DayType::Standard, "{}", day);
        }
    }

    // ==========================================================================
    // DD-002: Friday has its own rules
    // ==========================================================================
    #[test]
    fn test_dd_002_friday_is_friday() {
        assert_eq!(get_day_type(make_date("2026-01-16")), DayType::Friday);
        assert!(!DayType::Friday.uses_standard_rules());
    }

    // ==========================================================================
    // DD-003: Weekend days fall back to the standard rules
    // ==========================================================================
    #[test]
    fn test_dd_003_weekend_uses_standard_rules() {
        assert_eq!(get_day_type(make_date("2026-01-17")), DayType::Weekend);
        assert_eq!(get_day_type(make_date("2026-01-18")), DayType::Weekend);
        assert!(DayType::Weekend.uses_standard_rules());
    }

    // ==========================================================================
    // DD-004: Grouping splits at midnight and keeps import order
    // ==========================================================================
    #[test]
    fn test_dd_004_group_by_day_keeps_import_order() {
        let punches = vec![
            punch("2026-01-13 16:30:00"),
            punch("2026-01-12 07:30:00"),
            punch("2026-01-13 07:31:00"),
            punch("2026-01-12 23:59:59"),
            punch("2026-01-13 00:00:00"),
        ];

        let days = group_by_day(&punches);
        assert_eq!(days.len(), 2);

        let monday = &days[&make_date("2026-01-12")];
        assert_eq!(monday.len(), 2);
        assert_eq!(monday[0].timestamp.format("%H:%M").to_string(), "07:30");

        let tuesday = &days[&make_date("2026-01-13")];
        let times: Vec<String> = tuesday
            .iter()
            .map(|p| p.timestamp.format("%H:%M").to_string())
            .collect();
        assert_eq!(times, vec!["16:30", "07:31", "00:00"]);
    }

    #[test]
    fn test_group_by_day_empty() {
        assert!(group_by_day(&[]).is_empty());
    }

    #[test]
    fn test_day_type_serialization() {
        assert_eq!(
            serde_json::to_string(&DayType::Weekend).unwrap(),
            "\"weekend\""
        );
    }
}
