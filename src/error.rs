//! Error types for the timesheet reconciliation engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate.
//! Configuration errors abort a whole run; everything else is isolated to a
//! single employee-day by the week processor.

use thiserror::Error;

/// The main error type for the timesheet engine.
///
/// # Example
///
/// ```
/// use timesheet_engine::error::EngineError;
///
/// let error = EngineError::InvalidConfig {
///     field: "clock2_window_end".to_string(),
///     message: "must be after clock2_window_start".to_string(),
/// };
/// assert_eq!(
///     error.to_string(),
///     "Invalid configuration field 'clock2_window_end': must be after clock2_window_start"
/// );
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A time rule was malformed or inconsistent with another rule.
    #[error("Invalid configuration field '{field}': {message}")]
    InvalidConfig {
        /// The offending configuration field.
        field: String,
        /// What made the field invalid.
        message: String,
    },

    /// A raw punch could not be turned into a usable punch.
    #[error("Malformed punch for '{person_ref}': {message}")]
    MalformedPunch {
        /// The clock reference the punch was recorded under.
        person_ref: String,
        /// A description of the malformation.
        message: String,
    },

    /// A clock reference did not resolve to an employee.
    #[error("Employee not found for clock reference: {clock_ref}")]
    EmployeeNotFound {
        /// The clock reference that failed to resolve.
        clock_ref: String,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

impl EngineError {
    /// Returns true for errors that must abort the whole batch.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::ConfigNotFound { .. }
                | EngineError::ConfigParseError { .. }
                | EngineError::InvalidConfig { .. }
        )
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
