//! Timesheet Engine for clock-punch reconciliation
//!
//! This crate turns raw badge scans from main clocks and bathroom readers into
//! paid minutes per employee-day, with the review flags, bathroom usage report
//! and audit trail payroll needs to sign off a pay week.

#![warn(missing_docs)]

pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
