//! Reconciliation logic for the timesheet engine.
//!
//! This module contains the per-day stages that turn raw clock scans into
//! paid time: punch import and normalization, clock-slot classification,
//! grace and rounding adjustment, paid-time scenario matching, bathroom
//! break analysis, and the day and week processor that chains them together
//! and records the audit trail.

mod adjuster;
mod bathroom;
mod classifier;
mod day_detection;
mod import;
mod normalizer;
mod paid_time;
mod processor;

use chrono::NaiveDateTime;

pub use adjuster::{Adjustment, LATE_LUNCH_FLAG, LATE_MORNING_FLAG, OVERTIME_FLAG, adjust_day};
pub use bathroom::{
    BathroomAnalysis, ENTRY_WITHOUT_EXIT, EXIT_WITHOUT_ENTRY, WorkWindow, analyze_bathroom,
    work_windows,
};
pub use classifier::{Classification, IMPOSSIBLE_ORDER_FLAG, classify_day, in_slot_window};
pub use day_detection::{DayType, WEEKEND_FLAG, get_day_type, group_by_day};
pub use import::{PunchImport, import_punches, parse_timestamp};
pub use normalizer::{NormalizedPunches, normalize_punches};
pub use paid_time::{PaidTimeCalculation, calculate_paid_time, match_scenario};
pub use processor::{DayOutcome, process_day, process_employee_week, process_week};

pub(crate) fn format_hhmm(time: NaiveDateTime) -> String {
    time.format("%H:%M").to_string()
}
