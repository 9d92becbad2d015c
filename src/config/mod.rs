//! Configuration loading and management for the timesheet engine.
//!
//! This module provides the immutable [`TimeRuleConfig`] snapshot used for a
//! processing run and the [`ConfigLoader`] that reads it, together with the
//! employee directory, from YAML files.
//!
//! # Example
//!
//! ```no_run
//! use timesheet_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! println!("Lunch minutes: {}", config.time_rules().standard_lunch_minutes());
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{EmployeesConfig, TimeRuleConfig, TimeRuleConfigBuilder, TimeRuleOverrides};
