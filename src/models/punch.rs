//! Punch models.
//!
//! Raw clock exports arrive as [`RawPunchRecord`]s with string timestamps.
//! Once resolved to an employee and parsed they become [`RawPunch`]es, and the
//! normalizer turns those into typed [`Punch`]es tagged with a [`DeviceKind`].

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::Employee;

/// A punch row exactly as exported by the clock device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPunchRecord {
    /// The clock reference (badge or enrolment number) of the person.
    pub person_ref: String,
    /// The name of the device that recorded the scan.
    pub device_label: String,
    /// The timestamp as written in the export.
    pub timestamp: String,
}

/// A punch with a parsed timestamp, not yet classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPunch {
    /// The clock reference of the person.
    pub person_ref: String,
    /// The name of the device that recorded the scan.
    pub device_label: String,
    /// When the scan happened (local time, already resolved by the caller).
    pub timestamp: NaiveDateTime,
}

/// A clock direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Arriving.
    In,
    /// Leaving.
    Out,
}

/// What a device label says about a punch, resolved once per punch.
///
/// # Example
///
/// ```
/// use timesheet_engine::models::DeviceKind;
///
/// assert_eq!(DeviceKind::from_label("Front Clock-In"), DeviceKind::MainIn);
/// assert_eq!(DeviceKind::from_label("Bathroom Exit 2"), DeviceKind::BathroomExit);
/// assert_eq!(DeviceKind::from_label("Reception"), DeviceKind::MainUnknown);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    /// Main clock labelled as an in-clock.
    MainIn,
    /// Main clock labelled as an out-clock.
    MainOut,
    /// Main clock with no direction in its label.
    MainUnknown,
    /// Bathroom entry reader.
    BathroomEntry,
    /// Bathroom exit reader.
    BathroomExit,
}

const IN_LABELS: [&str; 3] = ["Clock In", "Clock-In", "ClockIn"];
const OUT_LABELS: [&str; 3] = ["Clock Out", "Clock-Out", "ClockOut"];

impl DeviceKind {
    /// Resolves a device label. Matching is case-sensitive.
    pub fn from_label(label: &str) -> Self {
        if label.contains("Bathroom Entry") {
            DeviceKind::BathroomEntry
        } else if label.contains("Bathroom Exit") {
            DeviceKind::BathroomExit
        } else if IN_LABELS.iter().any(|l| label.contains(l)) {
            DeviceKind::MainIn
        } else if OUT_LABELS.iter().any(|l| label.contains(l)) {
            DeviceKind::MainOut
        } else {
            DeviceKind::MainUnknown
        }
    }

    /// Returns true for bathroom readers.
    pub fn is_bathroom(&self) -> bool {
        matches!(self, DeviceKind::BathroomEntry | DeviceKind::BathroomExit)
    }

    /// The direction a main-clock label implies, if any.
    pub fn direction(&self) -> Option<Direction> {
        match self {
            DeviceKind::MainIn => Some(Direction::In),
            DeviceKind::MainOut => Some(Direction::Out),
            DeviceKind::MainUnknown | DeviceKind::BathroomEntry | DeviceKind::BathroomExit => None,
        }
    }
}

/// A normalized punch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Punch {
    /// When the scan happened.
    pub timestamp: NaiveDateTime,
    /// The resolved device kind.
    pub kind: DeviceKind,
    /// The original device label, kept for audit output.
    pub device_label: String,
}

impl Punch {
    /// Builds a punch from a raw punch, resolving its device kind.
    pub fn from_raw(raw: &RawPunch) -> Self {
        Self {
            timestamp: raw.timestamp,
            kind: DeviceKind::from_label(&raw.device_label),
            device_label: raw.device_label.clone(),
        }
    }

    /// The calendar date of the punch.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// The time of day of the punch.
    pub fn time(&self) -> NaiveTime {
        self.timestamp.time()
    }
}

/// A scan collapsed into an earlier one by duplicate filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredDuplicate {
    /// The discarded scan.
    pub punch: Punch,
    /// The timestamp of the scan that was kept in its place.
    pub kept_timestamp: NaiveDateTime,
}

/// A raw record the importer could not use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedPunch {
    /// The record as received.
    pub record: RawPunchRecord,
    /// Why it was rejected.
    pub reason: String,
}

/// All punches resolved to one employee for a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeePunches {
    /// The resolved employee.
    pub employee: Employee,
    /// Parsed punches in import order.
    pub punches: Vec<RawPunch>,
    /// Records for this employee that could not be parsed.
    #[serde(default)]
    pub rejected: Vec<RejectedPunch>,
}
