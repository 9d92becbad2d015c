//! Paid-time calculation.
//!
//! Dispatches a day's presence pattern onto the fixed scenario table and
//! computes paid minutes from the adjusted slots. Only a complete day, a day
//! missing just the Lunch-Out scan, and a complete Friday are paid; every
//! other pattern pays zero and carries an actionable flag.

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::day_detection::{DayType, WEEKEND_FLAG};
use super::format_hhmm;
use crate::config::TimeRuleConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{AdjustedDay, AuditStep, PaidTimeResult, PresencePattern, Scenario, Slot};

/// The result of calculating paid time for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaidTimeCalculation {
    /// The paid-time result.
    pub result: PaidTimeResult,
    /// The audit step recording the calculation.
    pub audit_step: AuditStep,
}

/// Matches a presence pattern against the scenario table for `day_type`.
///
/// Friday looks only at Morning-In and Afternoon-Out.
///
/// # Example
///
/// ```
/// use timesheet_engine::calculation::{match_scenario, DayType};
/// use timesheet_engine::models::{PresencePattern, Scenario, Slot};
///
/// let pattern = PresencePattern::of(&[Slot::MorningIn, Slot::LunchIn, Slot::AfternoonOut]);
/// assert_eq!(match_scenario(pattern, DayType::Standard), Scenario::MissingLunchOut);
///
/// let friday = PresencePattern::of(&[Slot::MorningIn, Slot::AfternoonOut]);
/// assert_eq!(match_scenario(friday, DayType::Friday), Scenario::FridayComplete);
/// ```
pub fn match_scenario(pattern: PresencePattern, day_type: DayType) -> Scenario {
    use Slot::{AfternoonOut, LunchIn, LunchOut, MorningIn};

    let has = |slot: Slot| pattern.contains(slot);

    if day_type == DayType::Friday {
        return match (has(MorningIn), has(AfternoonOut)) {
            (true, true) => Scenario::FridayComplete,
            (true, false) => Scenario::FridayMissingOut,
            (false, true) => Scenario::FridayMissingIn,
            (false, false) => Scenario::Irregular,
        };
    }

    match (has(MorningIn), has(LunchOut), has(LunchIn), has(AfternoonOut)) {
        (true, true, true, true) => Scenario::Complete,
        (true, false, true, true) => Scenario::MissingLunchOut,
        (true, false, false, false) => Scenario::OnlyMorning,
        (false, false, false, true) => Scenario::OnlyAfternoon,
        (true, false, false, true) => Scenario::NoLunch,
        (true, true, false, true) => Scenario::MissingLunchReturn,
        (false, true, true, true) => Scenario::NoMorning,
        (true, true, true, false) => Scenario::NoAfternoonOut,
        (false, true, true, false) => Scenario::OnlyLunchScans,
        (false, true, false, false) => Scenario::OnlyLunchOut,
        (false, false, true, false) => Scenario::OnlyLunchReturn,
        _ => Scenario::Irregular,
    }
}

fn span_minutes(start: NaiveDateTime, end: NaiveDateTime) -> i64 {
    (end - start).num_minutes()
}

/// Calculates paid time for an adjusted day.
///
/// Returns `CalculationError` when a paid scenario would produce negative
/// minutes; the week processor turns that into a flagged zero-paid day.
///
/// # Example
///
/// ```
/// use timesheet_engine::calculation::{calculate_paid_time, DayType};
/// use timesheet_engine::config::TimeRuleConfig;
/// use timesheet_engine::models::{AdjustedDay, ClockSlots, Scenario};
/// use chrono::{NaiveDate, NaiveDateTime};
/// use std::collections::BTreeSet;
///
/// let at = |t: &str| NaiveDateTime::parse_from_str(&format!("2026-01-14 {}", t), "%Y-%m-%d %H:%M").unwrap();
/// let day = AdjustedDay {
///     date: NaiveDate::from_ymd_opt(2026, 1, 14).unwrap(),
///     day_type: DayType::Standard,
///     slots: ClockSlots {
///         morning_in: Some(at("07:30")),
///         lunch_out: None,
///         lunch_in: Some(at("12:25")),
///         afternoon_out: Some(at("16:30")),
///     },
///     flags: BTreeSet::new(),
/// };
///
/// let paid = calculate_paid_time(&day, &TimeRuleConfig::default(), 4).unwrap();
/// assert_eq!(paid.result.scenario, Scenario::MissingLunchOut);
/// assert_eq!(paid.result.paid_minutes, 510);
/// ```
pub fn calculate_paid_time(
    day: &AdjustedDay,
    config: &TimeRuleConfig,
    step_number: u32,
) -> EngineResult<PaidTimeCalculation> {
    let presence = day.slots.presence();
    let scenario = match_scenario(presence, day.day_type);

    let mut lunch_deducted_minutes = 0;
    let paid_minutes = match (scenario.is_paid(), day.slots.morning_in, day.slots.afternoon_out) {
        (true, Some(morning_in), Some(afternoon_out)) => {
            let deduct_lunch = match day.day_type {
                DayType::Friday => config.apply_lunch_on_friday(),
                DayType::Standard | DayType::Weekend => day.slots.is_filled(Slot::LunchIn),
            };
            if deduct_lunch {
                lunch_deducted_minutes = config.standard_lunch_minutes();
            }
            let minutes =
                span_minutes(morning_in, afternoon_out) - i64::from(lunch_deducted_minutes);
            u32::try_from(minutes).map_err(|_| EngineError::CalculationError {
                message: format!(
                    "negative paid time ({} minutes) from {} to {} on {}",
                    minutes,
                    format_hhmm(morning_in),
                    format_hhmm(afternoon_out),
                    day.date
                ),
            })?
        }
        _ => 0,
    };

    let mut flags = day.flags.clone();
    if let Some(flag) = scenario.flag() {
        flags.insert(flag.to_string());
    }
    if day.day_type == DayType::Weekend {
        flags.insert(WEEKEND_FLAG.to_string());
    }

    let reasoning = if scenario.is_paid() {
        format!(
            "Presence {} matched {:?}: {} minutes paid after {} minute lunch deduction",
            presence, scenario, paid_minutes, lunch_deducted_minutes
        )
    } else {
        format!(
            "Presence {} matched {:?}: not payable without manual adjustment",
            presence, scenario
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "paid_time_scenario".to_string(),
        rule_name: "Paid Time Scenario".to_string(),
        date: day.date,
        input: serde_json::json!({
            "day_type": day.day_type,
            "presence": presence,
            "slots": day.slots,
            "standard_lunch_minutes": config.standard_lunch_minutes()
        }),
        output: serde_json::json!({
            "scenario": scenario,
            "paid_minutes": paid_minutes,
            "lunch_deducted_minutes": lunch_deducted_minutes
        }),
        reasoning,
    };

    Ok(PaidTimeCalculation {
        result: PaidTimeResult {
            date: day.date,
            weekday: day.date.weekday(),
            day_type: day.day_type,
            presence,
            scenario,
            slots: day.slots,
            lunch_deducted_minutes,
            paid_minutes,
            flags,
        },
        audit_step,
    })
}
