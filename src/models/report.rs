//! Reconciliation result models.
//!
//! This module contains the per-day [`PaidTimeResult`] and [`BathroomReport`],
//! the per-employee [`EmployeeWeek`] roll-up, and the [`WeekReport`] handed to
//! payroll, together with the [`AuditStep`] trail recorded along the way.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ClockSlots, FilteredDuplicate, PayWeek, PresencePattern};
use crate::calculation::DayType;

/// The presence pattern a day matched in the paid-time scenario table.
///
/// Friday scenarios look only at Morning-In and Afternoon-Out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// {1,2,3,4}: all four scans.
    Complete,
    /// {1,3,4}: lunch out missing, lunch still deducted.
    MissingLunchOut,
    /// {1}
    OnlyMorning,
    /// {4}
    OnlyAfternoon,
    /// {1,4}
    NoLunch,
    /// {1,2,4}
    MissingLunchReturn,
    /// {2,3,4}
    NoMorning,
    /// {1,2,3}
    NoAfternoonOut,
    /// {2,3}
    OnlyLunchScans,
    /// {2}
    OnlyLunchOut,
    /// {3}
    OnlyLunchReturn,
    /// Any other pattern, including no scans at all.
    Irregular,
    /// Friday in and out.
    FridayComplete,
    /// Friday in only.
    FridayMissingOut,
    /// Friday out only.
    FridayMissingIn,
    /// The day's pipeline failed; recorded with zero paid time.
    ProcessingError,
}

impl Scenario {
    /// The flag this scenario raises, if any.
    pub fn flag(&self) -> Option<&'static str> {
        match self {
            Scenario::Complete | Scenario::FridayComplete | Scenario::ProcessingError => None,
            Scenario::MissingLunchOut => Some("Missing lunch out scan - lunch deducted"),
            Scenario::OnlyMorning => Some("Only morning scan - manual adjustment required"),
            Scenario::OnlyAfternoon => Some("Only afternoon scan - manual adjustment required"),
            Scenario::NoLunch => Some("No lunch recorded - investigation required"),
            Scenario::MissingLunchReturn => {
                Some("Missing lunch return - manual adjustment required")
            }
            Scenario::NoMorning => Some("No morning scan - manual adjustment required"),
            Scenario::NoAfternoonOut => Some("No afternoon out - manual adjustment required"),
            Scenario::OnlyLunchScans => Some("Only lunch scans - manual adjustment required"),
            Scenario::OnlyLunchOut => Some("Only lunch out scan - manual adjustment required"),
            Scenario::OnlyLunchReturn => {
                Some("Only lunch return scan - manual adjustment required")
            }
            Scenario::Irregular => Some("Irregular punch pattern - manual adjustment required"),
            Scenario::FridayMissingOut => Some("Missing Friday out - manual adjustment required"),
            Scenario::FridayMissingIn => Some("Missing Friday in - manual adjustment required"),
        }
    }

    /// Whether this scenario pays the scanned time.
    pub fn is_paid(&self) -> bool {
        matches!(
            self,
            Scenario::Complete | Scenario::MissingLunchOut | Scenario::FridayComplete
        )
    }
}

/// Paid time for one employee-day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaidTimeResult {
    /// The calendar date.
    pub date: NaiveDate,
    /// The weekday of the date.
    pub weekday: Weekday,
    /// Which rule set was applied.
    pub day_type: DayType,
    /// Slots present after classification.
    pub presence: PresencePattern,
    /// The scenario table row that matched.
    pub scenario: Scenario,
    /// Adjusted slot times the pay was computed from.
    pub slots: ClockSlots,
    /// Minutes deducted for lunch.
    pub lunch_deducted_minutes: u32,
    /// Minutes paid.
    pub paid_minutes: u32,
    /// Everything a reviewer should look at for this day.
    pub flags: BTreeSet<String>,
}

/// Which work period a bathroom visit was counted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkPeriod {
    /// Morning-In to Lunch-Out.
    Morning,
    /// Lunch-In to Afternoon-Out.
    Afternoon,
    /// Friday Morning-In to Afternoon-Out.
    FullDay,
}

/// One bathroom visit inside a work period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BathroomVisit {
    /// The work period the visit fell in.
    pub period: WorkPeriod,
    /// Entry scan time.
    pub entry_time: NaiveDateTime,
    /// Exit scan time, absent when no exit followed in the same period.
    pub exit_time: Option<NaiveDateTime>,
    /// Minutes between entry and exit when both exist.
    pub duration_minutes: Option<u32>,
}

/// Bathroom usage for one employee-day. Never affects paid time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BathroomReport {
    /// The calendar date.
    pub date: NaiveDate,
    /// Visits in chronological order.
    pub entries: Vec<BathroomVisit>,
    /// Sum of all completed visit durations.
    pub daily_total_minutes: u32,
    /// Scans that fell outside every work period.
    pub excluded_events: u32,
    /// Threshold and pairing warnings.
    pub warnings: BTreeSet<String>,
}

impl BathroomReport {
    /// An empty report for `date`.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            entries: Vec::new(),
            daily_total_minutes: 0,
            excluded_events: 0,
            warnings: BTreeSet::new(),
        }
    }
}

/// A single step in the audit trail recording a pipeline decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number within the employee's week.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The day the step belongs to.
    pub date: NaiveDate,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// One employee's reconciled week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeWeek {
    /// The employee's id.
    pub employee_id: String,
    /// The employee's display name.
    pub display_name: String,
    /// Paid time per day, in date order.
    pub days: Vec<PaidTimeResult>,
    /// Bathroom report per day, in date order.
    pub bathroom: Vec<BathroomReport>,
    /// Sum of the days' paid minutes.
    pub week_total_paid_minutes: u32,
    /// Paid minutes as hours, rounded to two places.
    pub paid_hours: Decimal,
    /// Paid hours at the standard hourly rate, rounded to cents.
    pub gross_pay: Decimal,
    /// Union of every day's flags plus import problems.
    pub flags: BTreeSet<String>,
    /// Scans removed as duplicates, kept for audit.
    pub filtered_duplicates: Vec<FilteredDuplicate>,
    /// Every decision made for this employee.
    pub audit_steps: Vec<AuditStep>,
}

impl EmployeeWeek {
    /// The paid-time result for `date`, if that day was processed.
    pub fn day(&self, date: NaiveDate) -> Option<&PaidTimeResult> {
        self.days.iter().find(|d| d.date == date)
    }

    /// The bathroom report for `date`, if that day was processed.
    pub fn bathroom_on(&self, date: NaiveDate) -> Option<&BathroomReport> {
        self.bathroom.iter().find(|b| b.date == date)
    }
}

/// The reconciliation output consumed by payroll.
///
/// # Example
///
/// ```
/// use timesheet_engine::models::{PayWeek, WeekReport};
/// use chrono::NaiveDate;
///
/// let report = WeekReport {
///     week: PayWeek::starting(NaiveDate::from_ymd_opt(2026, 1, 12).unwrap()),
///     employees: vec![],
///     total_paid_minutes: 0,
/// };
/// assert!(report.employee("emp_001").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekReport {
    /// The week that was processed.
    pub week: PayWeek,
    /// One entry per employee stream, in input order.
    pub employees: Vec<EmployeeWeek>,
    /// Paid minutes across all employees.
    pub total_paid_minutes: u64,
}

impl WeekReport {
    /// Finds an employee's week by id.
    pub fn employee(&self, employee_id: &str) -> Option<&EmployeeWeek> {
        self.employees.iter().find(|e| e.employee_id == employee_id)
    }
}
