//! Punch import.
//!
//! Resolves clock-export rows to employees and parses their timestamps,
//! producing one [`EmployeePunches`] stream per employee. Rows whose clock
//! reference is unknown never reach the pipeline; rows with an unreadable
//! timestamp stay on the employee's stream as rejected records.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{EngineError, EngineResult};
use crate::models::{EmployeeDirectory, EmployeePunches, RawPunch, RawPunchRecord, RejectedPunch};

const TIMESTAMP_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// The outcome of importing a batch of clock-export rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PunchImport {
    /// One stream per employee, in order of first appearance.
    pub streams: Vec<EmployeePunches>,
    /// Rows whose clock reference did not resolve.
    pub unmatched: Vec<RawPunchRecord>,
}

/// Parses a clock-export timestamp.
///
/// # Example
///
/// ```
/// use timesheet_engine::calculation::parse_timestamp;
///
/// let a = parse_timestamp("1001", "2026-01-13 07:32:00").unwrap();
/// let b = parse_timestamp("1001", "13/01/2026 07:32").unwrap();
/// assert_eq!(a, b);
/// assert!(parse_timestamp("1001", "yesterday").is_err());
/// ```
pub fn parse_timestamp(person_ref: &str, value: &str) -> EngineResult<NaiveDateTime> {
    let trimmed = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| EngineError::MalformedPunch {
            person_ref: person_ref.to_string(),
            message: format!("unparseable timestamp '{}'", trimmed),
        })
}

/// Resolves and parses a batch of clock-export rows.
pub fn import_punches(records: &[RawPunchRecord], directory: &EmployeeDirectory) -> PunchImport {
    let mut streams: Vec<EmployeePunches> = Vec::new();
    let mut unmatched = Vec::new();

    for record in records {
        let Some(employee) = directory.resolve(&record.person_ref) else {
            warn!(
                person_ref = %record.person_ref,
                device = %record.device_label,
                "Punch with unknown clock reference excluded"
            );
            unmatched.push(record.clone());
            continue;
        };

        let index = match streams.iter().position(|s| s.employee.id == employee.id) {
            Some(index) => index,
            None => {
                streams.push(EmployeePunches {
                    employee: employee.clone(),
                    punches: Vec::new(),
                    rejected: Vec::new(),
                });
                streams.len() - 1
            }
        };
        let stream = &mut streams[index];

        match parse_timestamp(&record.person_ref, &record.timestamp) {
            Ok(timestamp) => stream.punches.push(RawPunch {
                person_ref: record.person_ref.clone(),
                device_label: record.device_label.clone(),
                timestamp,
            }),
            Err(EngineError::MalformedPunch { message, .. }) => {
                warn!(employee_id = %employee.id, %message, "Malformed punch rejected");
                stream.rejected.push(RejectedPunch {
                    record: record.clone(),
                    reason: message,
                });
            }
            Err(other) => {
                stream.rejected.push(RejectedPunch {
                    record: record.clone(),
                    reason: other.to_string(),
                });
            }
        }
    }

    PunchImport { streams, unmatched }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Employee;
    use rust_decimal::Decimal;

    fn directory() -> EmployeeDirectory {
        EmployeeDirectory::new(vec![
            Employee {
                id: "emp_001".to_string(),
                display_name: "First".to_string(),
                clock_ref: "1001".to_string(),
                standard_hourly_rate: Decimal::new(2850, 2),
            },
            Employee {
                id: "emp_002".to_string(),
                display_name: "Second".to_string(),
                clock_ref: "1002".to_string(),
                standard_hourly_rate: Decimal::new(3125, 2),
            },
        ])
        .unwrap()
    }

    fn record(person_ref: &str, device: &str, timestamp: &str) -> RawPunchRecord {
        RawPunchRecord {
            person_ref: person_ref.to_string(),
            device_label: device.to_string(),
            timestamp: timestamp.to_string(),
        }
    }

    // ==========================================================================
    // IM-001: Every supported timestamp layout parses to the same instant
    // ==========================================================================
    #[test]
    fn test_im_001_supported_formats() {
        let expected = parse_timestamp("1", "2026-01-13 07:32:00").unwrap();
        for value in [
            "2026-01-13T07:32:00",
            "2026-01-13 07:32",
            "13/01/2026 07:32:00",
            " 13/01/2026 07:32 ",
        ] {
            assert_eq!(parse_timestamp("1", value).unwrap(), expected, "{}", value);
        }
    }

    // ==========================================================================
    // IM-002: Streams are grouped per employee in first-seen order
    // ==========================================================================
    #[test]
    fn test_im_002_streams_in_first_seen_order() {
        let records = vec![
            record("1002", "Clock In", "2026-01-13 07:30:00"),
            record("1001", "Clock In", "2026-01-13 07:29:00"),
            record("1002", "Clock Out", "2026-01-13 16:30:00"),
        ];
        let import = import_punches(&records, &directory());

        assert_eq!(import.streams.len(), 2);
        assert_eq!(import.streams[0].employee.id, "emp_002");
        assert_eq!(import.streams[0].punches.len(), 2);
        assert_eq!(import.streams[1].employee.id, "emp_001");
        assert!(import.unmatched.is_empty());
    }

    // ==========================================================================
    // IM-003: Unknown clock references are reported, not imported
    // ==========================================================================
    #[test]
    fn test_im_003_unmatched_reference() {
        let records = vec![
            record("9999", "Clock In", "2026-01-13 07:30:00"),
            record(" 1001 ", "Clock In", "2026-01-13 07:30:00"),
        ];
        let import = import_punches(&records, &directory());

        assert_eq!(import.unmatched.len(), 1);
        assert_eq!(import.unmatched[0].person_ref, "9999");
        assert_eq!(import.streams.len(), 1);
    }

    // ==========================================================================
    // IM-004: Malformed timestamps stay on the stream as rejected records
    // ==========================================================================
    #[test]
    fn test_im_004_malformed_timestamp_rejected() {
        let records = vec![
            record("1001", "Clock In", "31/31/2026 07:30"),
            record("1001", "Clock Out", "2026-01-13 16:30:00"),
        ];
        let import = import_punches(&records, &directory());

        let stream = &import.streams[0];
        assert_eq!(stream.punches.len(), 1);
        assert_eq!(stream.rejected.len(), 1);
        assert_eq!(
            stream.rejected[0].reason,
            "unparseable timestamp '31/31/2026 07:30'"
        );
    }
}
