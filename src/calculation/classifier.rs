//! Clock classification.
//!
//! Assigns a day's main-clock punches to the four canonical slots. Each punch
//! is tried against an ordered rule list:
//!
//! 1. **Time window**: the punch falls inside an unfilled slot's window. When
//!    windows overlap, the device direction picks the slot, otherwise the
//!    earliest slot wins.
//! 2. **Device hint**: an In/Out labelled punch outside every window takes an
//!    unfilled slot of its direction when it lies strictly between the
//!    neighbouring windows of that slot.
//! 3. **Position** (opt-in): an unlabelled punch takes the slot after the
//!    latest filled one.
//!
//! A punch no rule accepts is dropped and flagged. A labelled punch placed in
//! a slot of the other direction is flagged. Friday only has a Morning-In and
//! an Afternoon-Out.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::day_detection::{DayType, get_day_type};
use super::format_hhmm;
use super::normalizer::NormalizedPunches;
use crate::config::TimeRuleConfig;
use crate::models::{
    AssignmentRule, AuditStep, ClassifiedDay, ClockSlots, DeviceKind, Direction, Punch, Slot,
    SlotAssignment,
};

/// Flag raised when the filled slots are not in time order.
pub const IMPOSSIBLE_ORDER_FLAG: &str = "Impossible punch order - manual review";

/// The result of classifying one employee-day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// The classified day.
    pub day: ClassifiedDay,
    /// The audit step recording this classification.
    pub audit_step: AuditStep,
}

/// Returns true when `time` lies inside the configured window of `slot`.
pub fn in_slot_window(slot: Slot, time: NaiveTime, config: &TimeRuleConfig) -> bool {
    match slot {
        Slot::MorningIn => time <= config.clock1_max_time(),
        Slot::LunchOut => {
            time >= config.clock2_window_start() && time <= config.clock2_window_end()
        }
        Slot::LunchIn => time >= config.clock3_window_start() && time <= config.clock3_window_end(),
        Slot::AfternoonOut => time >= config.clock4_min_time(),
    }
}

/// The Morning-In window already reaches back to midnight, so it has no hint range.
fn in_hint_range(slot: Slot, time: NaiveTime, config: &TimeRuleConfig) -> bool {
    match slot {
        Slot::MorningIn => false,
        Slot::LunchOut => time > config.clock1_max_time() && time < config.clock3_window_start(),
        Slot::LunchIn => time > config.clock2_window_end() && time < config.clock4_min_time(),
        Slot::AfternoonOut => time > config.clock3_window_end(),
    }
}

fn pick_by_window(
    punch: &Punch,
    slots: &ClockSlots,
    config: &TimeRuleConfig,
) -> Option<Slot> {
    let open: Vec<Slot> = Slot::ALL
        .into_iter()
        .filter(|s| !slots.is_filled(*s) && in_slot_window(*s, punch.time(), config))
        .collect();

    match punch.kind.direction() {
        Some(direction) => open
            .iter()
            .copied()
            .find(|s| s.direction() == direction)
            .or_else(|| open.first().copied()),
        None => open.first().copied(),
    }
}

fn pick_by_hint(
    direction: Direction,
    punch: &Punch,
    slots: &ClockSlots,
    config: &TimeRuleConfig,
) -> Option<Slot> {
    Slot::ALL.into_iter().find(|s| {
        !slots.is_filled(*s)
            && s.direction() == direction
            && in_hint_range(*s, punch.time(), config)
    })
}

fn pick_by_position(slots: &ClockSlots) -> Option<Slot> {
    let next = match slots.last_filled() {
        None => Some(Slot::MorningIn),
        Some(last) => Slot::ALL.into_iter().find(|s| *s > last),
    };
    next.filter(|s| !slots.is_filled(*s))
}

struct SlotState {
    slots: ClockSlots,
    assignments: Vec<SlotAssignment>,
    dropped: Vec<Punch>,
    flags: BTreeSet<String>,
}

impl SlotState {
    fn new() -> Self {
        Self {
            slots: ClockSlots::default(),
            assignments: Vec::new(),
            dropped: Vec::new(),
            flags: BTreeSet::new(),
        }
    }

    fn assign(&mut self, slot: Slot, punch: &Punch, rule: AssignmentRule) {
        self.slots.set(slot, Some(punch.timestamp));
        self.assignments.push(SlotAssignment {
            slot,
            time: punch.timestamp,
            rule,
        });
        if punch.kind.direction().is_some_and(|d| d != slot.direction()) {
            self.flags.insert(format!(
                "Punch at {} direction conflicts with slot - review required",
                format_hhmm(punch.timestamp)
            ));
        }
        match rule {
            AssignmentRule::TimeWindow => {}
            AssignmentRule::DeviceHint => {
                self.flags.insert(format!(
                    "Punch at {} assigned by device label - review required",
                    format_hhmm(punch.timestamp)
                ));
            }
            AssignmentRule::Position => {
                self.flags.insert(format!(
                    "Punch at {} assigned by position - review required",
                    format_hhmm(punch.timestamp)
                ));
            }
        }
    }

    fn drop_punch(&mut self, date: NaiveDate, punch: &Punch) {
        warn!(
            %date,
            time = %format_hhmm(punch.timestamp),
            device = %punch.device_label,
            "Unclassified punch dropped"
        );
        self.flags.insert(format!(
            "Unclassified punch at {} ignored",
            format_hhmm(punch.timestamp)
        ));
        self.dropped.push(punch.clone());
    }
}

fn classify_standard(
    date: NaiveDate,
    punches: &[Punch],
    config: &TimeRuleConfig,
    state: &mut SlotState,
) {
    for punch in punches {
        if let Some(slot) = pick_by_window(punch, &state.slots, config) {
            state.assign(slot, punch, AssignmentRule::TimeWindow);
            continue;
        }
        if let Some(slot) = punch
            .kind
            .direction()
            .and_then(|d| pick_by_hint(d, punch, &state.slots, config))
        {
            state.assign(slot, punch, AssignmentRule::DeviceHint);
            continue;
        }
        if config.positional_fallback() && punch.kind == DeviceKind::MainUnknown {
            if let Some(slot) = pick_by_position(&state.slots) {
                state.assign(slot, punch, AssignmentRule::Position);
                continue;
            }
        }
        state.drop_punch(date, punch);
    }
}

fn classify_friday(
    date: NaiveDate,
    punches: &[Punch],
    config: &TimeRuleConfig,
    state: &mut SlotState,
) {
    let morning = punches
        .iter()
        .position(|p| in_slot_window(Slot::MorningIn, p.time(), config));
    let afternoon = punches
        .iter()
        .enumerate()
        .rev()
        .find(|(i, _)| Some(*i) != morning)
        .map(|(i, _)| i);

    for (index, punch) in punches.iter().enumerate() {
        if Some(index) == morning {
            state.assign(Slot::MorningIn, punch, AssignmentRule::TimeWindow);
        } else if Some(index) == afternoon {
            state.assign(Slot::AfternoonOut, punch, AssignmentRule::TimeWindow);
        } else {
            state.drop_punch(date, punch);
        }
    }
}

/// Classifies one employee-day's normalized punches into slots.
///
/// # Example
///
/// ```
/// use timesheet_engine::calculation::{classify_day, normalize_punches};
/// use timesheet_engine::config::TimeRuleConfig;
/// use timesheet_engine::models::{RawPunch, Slot};
/// use chrono::{NaiveDate, NaiveDateTime};
///
/// let date = NaiveDate::from_ymd_opt(2026, 1, 13).unwrap(); // Tuesday
/// let raw: Vec<RawPunch> = ["07:32", "12:01", "12:28", "16:35"]
///     .iter()
///     .map(|t| RawPunch {
///         person_ref: "1001".into(),
///         device_label: "Main Clock".into(),
///         timestamp: NaiveDateTime::parse_from_str(&format!("2026-01-13 {}", t), "%Y-%m-%d %H:%M").unwrap(),
///     })
///     .collect();
///
/// let config = TimeRuleConfig::default();
/// let normalized = normalize_punches(date, &raw, &config, 1);
/// let classification = classify_day(date, &normalized, &config, 2);
///
/// assert_eq!(classification.day.slots.presence().slots(), Slot::ALL.to_vec());
/// assert!(classification.day.flags.is_empty());
/// ```
pub fn classify_day(
    date: NaiveDate,
    punches: &NormalizedPunches,
    config: &TimeRuleConfig,
    step_number: u32,
) -> Classification {
    let day_type = get_day_type(date);
    let mut state = SlotState::new();

    match day_type {
        DayType::Standard | DayType::Weekend => {
            classify_standard(date, &punches.main, config, &mut state)
        }
        DayType::Friday => classify_friday(date, &punches.main, config, &mut state),
    }

    if !state.slots.is_chronological() {
        warn!(%date, "Classified slots out of time order");
        state.flags.insert(IMPOSSIBLE_ORDER_FLAG.to_string());
    }

    let slot_output: serde_json::Map<String, serde_json::Value> = state
        .slots
        .filled()
        .into_iter()
        .map(|(slot, time)| (slot.to_string(), format_hhmm(time).into()))
        .collect();

    let reasoning = format!(
        "{} rules: {} of {} main punches placed, presence {}, {} dropped",
        day_type,
        state.assignments.len(),
        punches.main.len(),
        state.slots.presence(),
        state.dropped.len()
    );

    let audit_step = AuditStep {
        step_number,
        rule_id: "clock_classification".to_string(),
        rule_name: "Clock Classification".to_string(),
        date,
        input: serde_json::json!({
            "day_type": day_type,
            "main_punches": punches
                .main
                .iter()
                .map(|p| serde_json::json!({
                    "time": format_hhmm(p.timestamp),
                    "device": p.kind
                }))
                .collect::<Vec<_>>()
        }),
        output: serde_json::json!({
            "slots": slot_output,
            "assignments": state.assignments,
            "dropped": state
                .dropped
                .iter()
                .map(|p| format_hhmm(p.timestamp))
                .collect::<Vec<_>>()
        }),
        reasoning,
    };

    Classification {
        day: ClassifiedDay {
            date,
            day_type,
            slots: state.slots,
            assignments: state.assignments,
            bathroom_events: punches.bathroom.clone(),
            dropped: state.dropped,
            flags: state.flags,
        },
        audit_step,
    }
}
