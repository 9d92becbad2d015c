//! Per-day punch models.
//!
//! A working day has up to four canonical main-clock [`Slot`]s. The
//! classifier fills a [`ClockSlots`] to produce a [`ClassifiedDay`], and the
//! grace adjuster derives an [`AdjustedDay`] from it.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use super::{Direction, Punch};
use crate::calculation::DayType;

/// One of the four canonical daily punch roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    /// Clock 1.
    MorningIn,
    /// Clock 2.
    LunchOut,
    /// Clock 3.
    LunchIn,
    /// Clock 4.
    AfternoonOut,
}

impl Slot {
    /// All slots in chronological order.
    pub const ALL: [Slot; 4] = [
        Slot::MorningIn,
        Slot::LunchOut,
        Slot::LunchIn,
        Slot::AfternoonOut,
    ];

    /// The clock number (1-4) used on reports.
    pub fn number(&self) -> u8 {
        match self {
            Slot::MorningIn => 1,
            Slot::LunchOut => 2,
            Slot::LunchIn => 3,
            Slot::AfternoonOut => 4,
        }
    }

    /// Whether this slot is an arrival or a departure.
    pub fn direction(&self) -> Direction {
        match self {
            Slot::MorningIn | Slot::LunchIn => Direction::In,
            Slot::LunchOut | Slot::AfternoonOut => Direction::Out,
        }
    }

    fn index(&self) -> usize {
        usize::from(self.number() - 1)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::MorningIn => write!(f, "Morning-In"),
            Slot::LunchOut => write!(f, "Lunch-Out"),
            Slot::LunchIn => write!(f, "Lunch-In"),
            Slot::AfternoonOut => write!(f, "Afternoon-Out"),
        }
    }
}

/// The set of slots that hold a punch on a given day.
///
/// # Example
///
/// ```
/// use timesheet_engine::models::{PresencePattern, Slot};
///
/// let pattern = PresencePattern::of(&[Slot::MorningIn, Slot::LunchIn, Slot::AfternoonOut]);
/// assert!(pattern.contains(Slot::LunchIn));
/// assert!(!pattern.contains(Slot::LunchOut));
/// assert_eq!(pattern.to_string(), "{1,3,4}");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PresencePattern(u8);

impl PresencePattern {
    /// No slots present.
    pub const EMPTY: PresencePattern = PresencePattern(0);

    /// Builds a pattern from a list of slots.
    pub fn of(slots: &[Slot]) -> Self {
        slots
            .iter()
            .fold(Self::EMPTY, |pattern, slot| pattern.with(*slot))
    }

    /// Returns the pattern with `slot` added.
    pub fn with(self, slot: Slot) -> Self {
        PresencePattern(self.0 | (1 << slot.index()))
    }

    /// Returns true when `slot` is present.
    pub fn contains(&self, slot: Slot) -> bool {
        self.0 & (1 << slot.index()) != 0
    }

    /// Returns true when no slot is present.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// The present slots in chronological order.
    pub fn slots(&self) -> Vec<Slot> {
        Slot::ALL
            .into_iter()
            .filter(|s| self.contains(*s))
            .collect()
    }
}

impl fmt::Display for PresencePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let numbers: Vec<String> = self
            .slots()
            .iter()
            .map(|s| s.number().to_string())
            .collect();
        write!(f, "{{{}}}", numbers.join(","))
    }
}

impl Serialize for PresencePattern {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.slots().iter().map(|s| s.number()))
    }
}

impl<'de> Deserialize<'de> for PresencePattern {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let numbers = Vec::<u8>::deserialize(deserializer)?;
        numbers.into_iter().try_fold(Self::EMPTY, |pattern, n| {
            Slot::ALL
                .into_iter()
                .find(|s| s.number() == n)
                .map(|s| pattern.with(s))
                .ok_or_else(|| serde::de::Error::custom(format!("unknown clock number {}", n)))
        })
    }
}

/// The four slot values for one day; absent slots are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockSlots {
    /// Clock 1.
    pub morning_in: Option<NaiveDateTime>,
    /// Clock 2.
    pub lunch_out: Option<NaiveDateTime>,
    /// Clock 3.
    pub lunch_in: Option<NaiveDateTime>,
    /// Clock 4.
    pub afternoon_out: Option<NaiveDateTime>,
}

impl ClockSlots {
    /// The value of `slot`.
    pub fn get(&self, slot: Slot) -> Option<NaiveDateTime> {
        match slot {
            Slot::MorningIn => self.morning_in,
            Slot::LunchOut => self.lunch_out,
            Slot::LunchIn => self.lunch_in,
            Slot::AfternoonOut => self.afternoon_out,
        }
    }

    /// Sets the value of `slot`.
    pub fn set(&mut self, slot: Slot, value: Option<NaiveDateTime>) {
        match slot {
            Slot::MorningIn => self.morning_in = value,
            Slot::LunchOut => self.lunch_out = value,
            Slot::LunchIn => self.lunch_in = value,
            Slot::AfternoonOut => self.afternoon_out = value,
        }
    }

    /// Returns true when `slot` holds a punch.
    pub fn is_filled(&self, slot: Slot) -> bool {
        self.get(slot).is_some()
    }

    /// The presence pattern of these slots.
    pub fn presence(&self) -> PresencePattern {
        Slot::ALL
            .into_iter()
            .filter(|s| self.is_filled(*s))
            .fold(PresencePattern::EMPTY, PresencePattern::with)
    }

    /// Filled slots with their times, in slot order.
    pub fn filled(&self) -> Vec<(Slot, NaiveDateTime)> {
        Slot::ALL
            .into_iter()
            .filter_map(|s| self.get(s).map(|t| (s, t)))
            .collect()
    }

    /// The latest slot (in slot order) that is filled.
    pub fn last_filled(&self) -> Option<Slot> {
        Slot::ALL.into_iter().rev().find(|s| self.is_filled(*s))
    }

    /// Returns true when filled slots are strictly increasing in time.
    pub fn is_chronological(&self) -> bool {
        self.filled().windows(2).all(|pair| pair[0].1 < pair[1].1)
    }
}

/// Type of a bathroom scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BathroomEventKind {
    /// Walked in.
    Entry,
    /// Walked out.
    Exit,
}

/// A bathroom scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BathroomEvent {
    /// Entry or exit.
    pub kind: BathroomEventKind,
    /// When the scan happened.
    pub time: NaiveDateTime,
}

/// How a punch ended up in its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentRule {
    /// The punch fell inside the slot's configured window.
    TimeWindow,
    /// The device label's direction picked the slot.
    DeviceHint,
    /// The next open slot was taken by position.
    Position,
}

/// Records one slot assignment for the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAssignment {
    /// The filled slot.
    pub slot: Slot,
    /// The punch time placed in it.
    pub time: NaiveDateTime,
    /// The rule that placed it.
    pub rule: AssignmentRule,
}

/// A day after clock classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedDay {
    /// The calendar date.
    pub date: NaiveDate,
    /// Which rule set applies.
    pub day_type: DayType,
    /// Actual punch times per slot.
    pub slots: ClockSlots,
    /// How each slot was filled.
    pub assignments: Vec<SlotAssignment>,
    /// Bathroom scans in chronological order.
    pub bathroom_events: Vec<BathroomEvent>,
    /// Main-clock punches that matched no slot.
    pub dropped: Vec<Punch>,
    /// Flags raised while classifying.
    pub flags: BTreeSet<String>,
}

impl ClassifiedDay {
    /// The weekday of the date.
    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }
}

/// A day after grace and rounding adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustedDay {
    /// The calendar date.
    pub date: NaiveDate,
    /// Which rule set applies.
    pub day_type: DayType,
    /// Adjusted slot times used for pay.
    pub slots: ClockSlots,
    /// Flags raised while classifying and adjusting.
    pub flags: BTreeSet<String>,
}
