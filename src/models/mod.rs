//! Core data models for the timesheet engine.
//!
//! This module contains the punch, employee, per-day and report models used
//! throughout the pipeline.

mod day;
mod employee;
mod pay_week;
mod punch;
mod report;

pub use day::{
    AdjustedDay, AssignmentRule, BathroomEvent, BathroomEventKind, ClassifiedDay, ClockSlots,
    PresencePattern, Slot, SlotAssignment,
};
pub use employee::{Employee, EmployeeDirectory};
pub use pay_week::PayWeek;
pub use punch::{
    DeviceKind, Direction, EmployeePunches, FilteredDuplicate, Punch, RawPunch, RawPunchRecord,
    RejectedPunch,
};
pub use report::{
    AuditStep, BathroomReport, BathroomVisit, EmployeeWeek, PaidTimeResult, Scenario, WeekReport,
    WorkPeriod,
};
