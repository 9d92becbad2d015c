//! Day and week processing.
//!
//! Runs the normalize, classify, adjust, pay and bathroom stages for every
//! employee-day and folds the results into a [`WeekReport`]. Configuration
//! problems abort the run before any day is processed; a failure inside one
//! employee-day is recorded on that day as a zero-paid processing error and
//! the run continues.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::adjuster::adjust_day;
use super::bathroom::analyze_bathroom;
use super::classifier::classify_day;
use super::day_detection::{get_day_type, group_by_day};
use super::normalizer::normalize_punches;
use super::paid_time::calculate_paid_time;
use crate::config::TimeRuleConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, BathroomReport, ClockSlots, EmployeePunches, EmployeeWeek, FilteredDuplicate,
    PaidTimeResult, PayWeek, PresencePattern, RawPunch, Scenario, WeekReport,
};

/// Everything produced for one employee-day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayOutcome {
    /// Paid time for the day.
    pub paid: PaidTimeResult,
    /// Bathroom usage for the day.
    pub bathroom: BathroomReport,
    /// Scans collapsed during normalization.
    pub duplicates: Vec<FilteredDuplicate>,
    /// Audit steps, numbered from the step passed in.
    pub audit_steps: Vec<AuditStep>,
}

/// Runs the full pipeline for one employee-day.
///
/// Every punch must fall on `date`; a stray punch is a `CalculationError`.
///
/// # Example
///
/// ```
/// use timesheet_engine::calculation::process_day;
/// use timesheet_engine::config::TimeRuleConfig;
/// use timesheet_engine::models::{RawPunch, Scenario};
/// use chrono::{NaiveDate, NaiveDateTime};
///
/// let date = NaiveDate::from_ymd_opt(2026, 1, 13).unwrap();
/// let punches: Vec<RawPunch> = ["07:32", "12:01", "12:28", "16:35"]
///     .iter()
///     .map(|t| RawPunch {
///         person_ref: "1001".into(),
///         device_label: "Main Clock".into(),
///         timestamp: NaiveDateTime::parse_from_str(&format!("2026-01-13 {}", t), "%Y-%m-%d %H:%M").unwrap(),
///     })
///     .collect();
///
/// let outcome = process_day(date, &punches, &TimeRuleConfig::default(), 1).unwrap();
/// assert_eq!(outcome.paid.scenario, Scenario::Complete);
/// assert_eq!(outcome.paid.paid_minutes, 515);
/// assert_eq!(outcome.audit_steps.len(), 5);
/// ```
pub fn process_day(
    date: NaiveDate,
    punches: &[RawPunch],
    config: &TimeRuleConfig,
    first_step: u32,
) -> EngineResult<DayOutcome> {
    if let Some(stray) = punches.iter().find(|p| p.timestamp.date() != date) {
        return Err(EngineError::CalculationError {
            message: format!("punch at {} does not belong to {}", stray.timestamp, date),
        });
    }

    let mut audit_steps = Vec::with_capacity(5);
    let mut step_number = first_step;

    let normalized = normalize_punches(date, punches, config, step_number);
    audit_steps.push(normalized.audit_step.clone());
    step_number += 1;

    let classification = classify_day(date, &normalized, config, step_number);
    audit_steps.push(classification.audit_step);
    step_number += 1;

    let adjustment = adjust_day(&classification.day, config, step_number);
    audit_steps.push(adjustment.audit_step);
    step_number += 1;

    let paid = calculate_paid_time(&adjustment.day, config, step_number)?;
    audit_steps.push(paid.audit_step);
    step_number += 1;

    let bathroom = analyze_bathroom(&classification.day, config, step_number);
    audit_steps.push(bathroom.audit_step);

    Ok(DayOutcome {
        paid: paid.result,
        bathroom: bathroom.report,
        duplicates: normalized.duplicates,
        audit_steps,
    })
}

fn processing_error_day(
    date: NaiveDate,
    error: &EngineError,
    step_number: u32,
) -> (PaidTimeResult, AuditStep) {
    let flag = format!("Processing error: {}", error);
    let paid = PaidTimeResult {
        date,
        weekday: date.weekday(),
        day_type: get_day_type(date),
        presence: PresencePattern::EMPTY,
        scenario: Scenario::ProcessingError,
        slots: ClockSlots::default(),
        lunch_deducted_minutes: 0,
        paid_minutes: 0,
        flags: BTreeSet::from([flag.clone()]),
    };
    let audit_step = AuditStep {
        step_number,
        rule_id: "processing_error".to_string(),
        rule_name: "Processing Error".to_string(),
        date,
        input: serde_json::json!({ "date": date }),
        output: serde_json::json!({ "paid_minutes": 0, "flag": flag }),
        reasoning: format!("Day recorded with zero paid time: {}", error),
    };
    (paid, audit_step)
}

fn rounded_hours(minutes: u32) -> Decimal {
    (Decimal::from(minutes) / Decimal::from(60)).round_dp(2)
}

/// Processes one employee's punches for a pay week.
///
/// Every Monday to Friday in the week gets a result; weekend days only when
/// they have punches. Punches dated outside the week are ignored and flagged.
pub fn process_employee_week(
    stream: &EmployeePunches,
    week: &PayWeek,
    config: &TimeRuleConfig,
) -> EmployeeWeek {
    let employee = &stream.employee;
    let mut flags = BTreeSet::new();

    for rejected in &stream.rejected {
        warn!(
            employee_id = %employee.id,
            reason = %rejected.reason,
            "Malformed punch dropped"
        );
        flags.insert(format!("Malformed punch dropped: {}", rejected.reason));
    }

    let mut by_day = group_by_day(&stream.punches);
    let outside: Vec<NaiveDate> = by_day
        .keys()
        .copied()
        .filter(|d| !week.contains_date(*d))
        .collect();
    for date in outside {
        by_day.remove(&date);
        warn!(employee_id = %employee.id, %date, "Punches outside pay week ignored");
        flags.insert(format!("Punches on {} outside pay week ignored", date));
    }

    let dates: BTreeSet<NaiveDate> = week
        .working_days()
        .into_iter()
        .chain(by_day.keys().copied())
        .collect();

    let mut days = Vec::with_capacity(dates.len());
    let mut bathroom = Vec::with_capacity(dates.len());
    let mut filtered_duplicates = Vec::new();
    let mut audit_steps = Vec::new();
    let mut step_number: u32 = 1;

    for date in dates {
        let punches = by_day.get(&date).map(Vec::as_slice).unwrap_or(&[]);
        match process_day(date, punches, config, step_number) {
            Ok(outcome) => {
                debug!(
                    employee_id = %employee.id,
                    %date,
                    scenario = ?outcome.paid.scenario,
                    paid_minutes = outcome.paid.paid_minutes,
                    "Day processed"
                );
                step_number += outcome.audit_steps.len() as u32;
                flags.extend(outcome.paid.flags.iter().cloned());
                days.push(outcome.paid);
                bathroom.push(outcome.bathroom);
                filtered_duplicates.extend(outcome.duplicates);
                audit_steps.extend(outcome.audit_steps);
            }
            Err(err) => {
                warn!(
                    employee_id = %employee.id,
                    %date,
                    error = %err,
                    "Day processing failed"
                );
                let (paid, audit_step) = processing_error_day(date, &err, step_number);
                step_number += 1;
                flags.extend(paid.flags.iter().cloned());
                days.push(paid);
                bathroom.push(BathroomReport::empty(date));
                audit_steps.push(audit_step);
            }
        }
    }

    let week_total_paid_minutes: u32 = days.iter().map(|d| d.paid_minutes).sum();
    let gross_pay = (Decimal::from(week_total_paid_minutes) * employee.standard_hourly_rate
        / Decimal::from(60))
    .round_dp(2);

    EmployeeWeek {
        employee_id: employee.id.clone(),
        display_name: employee.display_name.clone(),
        days,
        bathroom,
        week_total_paid_minutes,
        paid_hours: rounded_hours(week_total_paid_minutes),
        gross_pay,
        flags,
        filtered_duplicates,
        audit_steps,
    }
}

/// Reconciles a week of punches for every employee stream.
///
/// Returns `InvalidConfig` without processing anything when the rules or the
/// week are inconsistent. Employees appear in input order; two streams for
/// the same employee are processed as one.
///
/// # Example
///
/// ```
/// use timesheet_engine::calculation::process_week;
/// use timesheet_engine::config::TimeRuleConfig;
/// use timesheet_engine::models::{Employee, EmployeePunches, PayWeek, RawPunch};
/// use chrono::{NaiveDate, NaiveDateTime};
/// use rust_decimal::Decimal;
///
/// let at = |s: &str| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap();
/// let stream = EmployeePunches {
///     employee: Employee {
///         id: "emp_001".into(),
///         display_name: "Thandi M".into(),
///         clock_ref: "1001".into(),
///         standard_hourly_rate: Decimal::new(3000, 2),
///     },
///     punches: vec![
///         RawPunch { person_ref: "1001".into(), device_label: "Clock In".into(), timestamp: at("2026-01-16 07:30") },
///         RawPunch { person_ref: "1001".into(), device_label: "Clock Out".into(), timestamp: at("2026-01-16 13:00") },
///     ],
///     rejected: vec![],
/// };
///
/// let week = PayWeek::starting(NaiveDate::from_ymd_opt(2026, 1, 12).unwrap());
/// let report = process_week(&[stream], &week, &TimeRuleConfig::default()).unwrap();
///
/// let employee = report.employee("emp_001").unwrap();
/// assert_eq!(employee.days.len(), 5);
/// assert_eq!(employee.week_total_paid_minutes, 330);
/// assert_eq!(employee.gross_pay, Decimal::new(16500, 2));
/// ```
pub fn process_week(
    streams: &[EmployeePunches],
    week: &PayWeek,
    config: &TimeRuleConfig,
) -> EngineResult<WeekReport> {
    config.validate()?;
    week.validate()?;

    info!(
        start = %week.start_date,
        end = %week.end_date,
        employees = streams.len(),
        "Processing pay week"
    );

    let mut merged: Vec<EmployeePunches> = Vec::with_capacity(streams.len());
    let mut index_of: BTreeMap<&str, usize> = BTreeMap::new();
    for stream in streams {
        match index_of.get(stream.employee.id.as_str()) {
            Some(&index) => {
                merged[index].punches.extend(stream.punches.iter().cloned());
                merged[index].rejected.extend(stream.rejected.iter().cloned());
            }
            None => {
                index_of.insert(stream.employee.id.as_str(), merged.len());
                merged.push(stream.clone());
            }
        }
    }

    let employees: Vec<EmployeeWeek> = merged
        .iter()
        .map(|stream| process_employee_week(stream, week, config))
        .collect();

    let total_paid_minutes: u64 = employees
        .iter()
        .map(|e| u64::from(e.week_total_paid_minutes))
        .sum();

    info!(
        employees = employees.len(),
        total_paid_minutes,
        flagged_employees = employees.iter().filter(|e| !e.flags.is_empty()).count(),
        "Pay week processed"
    );

    Ok(WeekReport {
        week: *week,
        employees,
        total_paid_minutes,
    })
}
