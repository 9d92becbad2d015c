//! Grace and rounding adjustment.
//!
//! Snaps classified slot times to standard times within the configured grace
//! periods and raises the late, overtime and early-arrival flags. Absent
//! slots stay absent.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::day_detection::DayType;
use super::format_hhmm;
use crate::config::TimeRuleConfig;
use crate::models::{AdjustedDay, AuditStep, ClassifiedDay, Slot};

/// Flag raised when Morning-In is after the late threshold.
pub const LATE_MORNING_FLAG: &str = "Late morning clock in - review required";
/// Flag raised when Lunch-In is after the standard lunch end.
pub const LATE_LUNCH_FLAG: &str = "Late lunch return - review required";
/// Flag raised when a Mon-Thu Afternoon-Out is at or after the overtime threshold.
pub const OVERTIME_FLAG: &str = "Overtime - manual review";

/// The result of adjusting one classified day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjustment {
    /// The adjusted day.
    pub day: AdjustedDay,
    /// The audit step recording this adjustment.
    pub audit_step: AuditStep,
}

fn on_day(date: NaiveDate, time: NaiveTime) -> NaiveDateTime {
    date.and_time(time)
}

fn minutes(value: u32) -> Duration {
    Duration::minutes(i64::from(value))
}

/// Applies grace periods and caps to a classified day.
///
/// # Example
///
/// ```
/// use timesheet_engine::calculation::{adjust_day, get_day_type};
/// use timesheet_engine::config::TimeRuleConfig;
/// use timesheet_engine::models::{ClassifiedDay, ClockSlots};
/// use chrono::{NaiveDate, NaiveDateTime};
/// use std::collections::BTreeSet;
///
/// let date = NaiveDate::from_ymd_opt(2026, 1, 13).unwrap();
/// let at = |t: &str| NaiveDateTime::parse_from_str(&format!("2026-01-13 {}", t), "%Y-%m-%d %H:%M").unwrap();
/// let day = ClassifiedDay {
///     date,
///     day_type: get_day_type(date),
///     slots: ClockSlots { morning_in: Some(at("07:32")), lunch_out: None, lunch_in: None, afternoon_out: None },
///     assignments: vec![],
///     bathroom_events: vec![],
///     dropped: vec![],
///     flags: BTreeSet::new(),
/// };
///
/// let adjusted = adjust_day(&day, &TimeRuleConfig::default(), 3);
/// assert_eq!(adjusted.day.slots.morning_in, Some(at("07:30")));
/// ```
pub fn adjust_day(day: &ClassifiedDay, config: &TimeRuleConfig, step_number: u32) -> Adjustment {
    let date = day.date;
    let mut slots = day.slots;
    let mut flags = day.flags.clone();
    let mut notes: Vec<String> = Vec::new();

    if let Some(actual) = day.slots.morning_in {
        let start = on_day(date, config.standard_start_time());
        let grace_end = start + minutes(config.grace_minutes());

        if actual < start {
            slots.morning_in = Some(start);
            let early_by = (start - actual).num_minutes();
            notes.push(format!(
                "Morning-In {} capped at start {}",
                format_hhmm(actual),
                format_hhmm(start)
            ));
            if let Some(threshold) = config.early_arrival_flag_minutes() {
                if early_by >= i64::from(threshold) {
                    flags.insert(format!(
                        "Early arrival ({} minutes before start) - manual review",
                        early_by
                    ));
                }
            }
        } else if actual <= grace_end {
            slots.morning_in = Some(start);
            notes.push(format!(
                "Morning-In {} within {} minute grace, snapped to {}",
                format_hhmm(actual),
                config.grace_minutes(),
                format_hhmm(start)
            ));
        } else {
            notes.push(format!(
                "Morning-In {} after grace, actual time used",
                format_hhmm(actual)
            ));
        }

        if actual > on_day(date, config.flag_late_after()) {
            flags.insert(LATE_MORNING_FLAG.to_string());
        }
    }

    if let Some(actual) = day.slots.lunch_out {
        let lunch_start = on_day(date, config.lunch_start());
        let grace_end = lunch_start + minutes(config.lunch_out_grace_minutes());
        if actual >= lunch_start && actual <= grace_end {
            slots.lunch_out = Some(lunch_start);
            notes.push(format!(
                "Lunch-Out {} snapped to lunch start {}",
                format_hhmm(actual),
                format_hhmm(lunch_start)
            ));
        }
    }

    if let Some(actual) = day.slots.lunch_in {
        if actual > on_day(date, config.lunch_end()) {
            flags.insert(LATE_LUNCH_FLAG.to_string());
            notes.push(format!(
                "Lunch-In {} after lunch end {}",
                format_hhmm(actual),
                config.lunch_end().format("%H:%M")
            ));
        }
    }

    if let Some(actual) = day.slots.afternoon_out {
        let overtime_from = on_day(date, config.flag_overtime_after());
        if day.day_type != DayType::Friday && actual >= overtime_from {
            flags.insert(OVERTIME_FLAG.to_string());
            notes.push(format!(
                "Afternoon-Out {} at or after {}",
                format_hhmm(actual),
                format_hhmm(overtime_from)
            ));
        }
    }

    let changed: Vec<String> = Slot::ALL
        .into_iter()
        .filter(|s| day.slots.get(*s) != slots.get(*s))
        .map(|s| s.to_string())
        .collect();

    let reasoning = if notes.is_empty() {
        "No grace or rounding rule applied".to_string()
    } else {
        notes.join("; ")
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "grace_adjustment".to_string(),
        rule_name: "Grace and Rounding Adjustment".to_string(),
        date,
        input: serde_json::json!({
            "slots": day.slots,
            "grace_minutes": config.grace_minutes(),
            "lunch_out_grace_minutes": config.lunch_out_grace_minutes()
        }),
        output: serde_json::json!({
            "slots": slots,
            "adjusted": changed
        }),
        reasoning,
    };

    Adjustment {
        day: AdjustedDay {
            date,
            day_type: day.day_type,
            slots,
            flags,
        },
        audit_step,
    }
}
