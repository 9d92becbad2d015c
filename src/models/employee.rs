//! Employee model and directory.
//!
//! The directory maps clock references to employees so the importer can
//! attribute punches before they reach the reconciliation pipeline.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// An employee known to the payroll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: String,
    /// Name shown on reports.
    pub display_name: String,
    /// The reference the time clock records for this employee.
    pub clock_ref: String,
    /// The standard hourly rate used for the weekly pay estimate.
    pub standard_hourly_rate: Decimal,
}

/// Clock-reference lookup over a set of employees.
///
/// # Example
///
/// ```
/// use timesheet_engine::models::{Employee, EmployeeDirectory};
/// use rust_decimal::Decimal;
///
/// let directory = EmployeeDirectory::new(vec![Employee {
///     id: "emp_001".to_string(),
///     display_name: "Thandi M".to_string(),
///     clock_ref: "1001".to_string(),
///     standard_hourly_rate: Decimal::new(2850, 2),
/// }])
/// .unwrap();
///
/// assert_eq!(directory.resolve(" 1001 ").unwrap().id, "emp_001");
/// assert!(directory.resolve("9999").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct EmployeeDirectory {
    employees: Vec<Employee>,
    by_clock_ref: HashMap<String, usize>,
}

fn clock_key(clock_ref: &str) -> String {
    clock_ref.trim().to_lowercase()
}

impl EmployeeDirectory {
    /// Builds a directory, rejecting blank or duplicate clock references.
    pub fn new(employees: Vec<Employee>) -> EngineResult<Self> {
        let mut by_clock_ref = HashMap::with_capacity(employees.len());
        for (index, employee) in employees.iter().enumerate() {
            let key = clock_key(&employee.clock_ref);
            if key.is_empty() {
                return Err(EngineError::InvalidConfig {
                    field: "employees.clock_ref".to_string(),
                    message: format!("employee '{}' has a blank clock reference", employee.id),
                });
            }
            if by_clock_ref.insert(key, index).is_some() {
                return Err(EngineError::InvalidConfig {
                    field: "employees.clock_ref".to_string(),
                    message: format!(
                        "clock reference '{}' is assigned to more than one employee",
                        employee.clock_ref.trim()
                    ),
                });
            }
        }
        Ok(Self {
            employees,
            by_clock_ref,
        })
    }

    /// Resolves a clock reference, ignoring surrounding whitespace and case.
    pub fn resolve(&self, clock_ref: &str) -> Option<&Employee> {
        self.by_clock_ref
            .get(&clock_key(clock_ref))
            .and_then(|&i| self.employees.get(i))
    }

    /// Resolves a clock reference or fails with `EmployeeNotFound`.
    pub fn require(&self, clock_ref: &str) -> EngineResult<&Employee> {
        self.resolve(clock_ref)
            .ok_or_else(|| EngineError::EmployeeNotFound {
                clock_ref: clock_ref.to_string(),
            })
    }

    /// Looks up an employee by id.
    pub fn get(&self, id: &str) -> Option<&Employee> {
        self.employees.iter().find(|e| e.id == id)
    }

    /// Employees in directory order.
    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    /// Number of employees.
    pub fn len(&self) -> usize {
        self.employees.len()
    }

    /// Returns true when the directory is empty.
    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }
}
