//! Punch normalization.
//!
//! Sorts one employee-day's raw punches, resolves each device label to a
//! [`DeviceKind`], splits main-clock from bathroom scans and collapses
//! repeated scans. Collapsed scans are returned for audit, never discarded.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TimeRuleConfig;
use crate::models::{
    AuditStep, BathroomEvent, BathroomEventKind, DeviceKind, FilteredDuplicate, Punch, RawPunch,
};

/// The cleaned punches for one employee-day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedPunches {
    /// Main-clock punches, chronological.
    pub main: Vec<Punch>,
    /// Bathroom scans, chronological.
    pub bathroom: Vec<BathroomEvent>,
    /// Scans collapsed into an earlier kept scan.
    pub duplicates: Vec<FilteredDuplicate>,
    /// The audit step recording this normalization.
    pub audit_step: AuditStep,
}

/// Normalizes the raw punches of a single employee-day.
///
/// Main-clock punches closer than `main_clock_duplicate_minutes` to the
/// previous kept main-clock punch collapse onto it, whatever their device.
/// Bathroom scans collapse onto the previous kept scan of the same kind when
/// closer than `bathroom_duplicate_seconds`. A zero window disables the
/// corresponding filter.
///
/// # Example
///
/// ```
/// use timesheet_engine::calculation::normalize_punches;
/// use timesheet_engine::config::TimeRuleConfig;
/// use timesheet_engine::models::RawPunch;
/// use chrono::{NaiveDate, NaiveDateTime};
///
/// let at = |s: &str| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap();
/// let raw = vec![
///     RawPunch { person_ref: "1001".into(), device_label: "Clock In".into(), timestamp: at("2026-01-13 07:31:30") },
///     RawPunch { person_ref: "1001".into(), device_label: "Clock In".into(), timestamp: at("2026-01-13 07:30:00") },
/// ];
///
/// let date = NaiveDate::from_ymd_opt(2026, 1, 13).unwrap();
/// let result = normalize_punches(date, &raw, &TimeRuleConfig::default(), 1);
/// assert_eq!(result.main.len(), 1);
/// assert_eq!(result.duplicates.len(), 1);
/// ```
pub fn normalize_punches(
    date: NaiveDate,
    raw: &[RawPunch],
    config: &TimeRuleConfig,
    step_number: u32,
) -> NormalizedPunches {
    let mut punches: Vec<Punch> = raw.iter().map(Punch::from_raw).collect();
    punches.sort_by_key(|p| p.timestamp);

    let main_window = Duration::minutes(i64::from(config.main_clock_duplicate_minutes()));
    let bathroom_window = Duration::seconds(i64::from(config.bathroom_duplicate_seconds()));

    let mut main: Vec<Punch> = Vec::new();
    let mut bathroom: Vec<Punch> = Vec::new();
    let mut duplicates = Vec::new();

    for punch in punches {
        if punch.kind.is_bathroom() {
            let previous = bathroom
                .iter()
                .rev()
                .find(|kept| kept.kind == punch.kind)
                .map(|kept| kept.timestamp);
            match previous {
                Some(kept_timestamp) if punch.timestamp - kept_timestamp < bathroom_window => {
                    duplicates.push(FilteredDuplicate {
                        punch,
                        kept_timestamp,
                    });
                }
                _ => bathroom.push(punch),
            }
        } else {
            match main.last().map(|kept| kept.timestamp) {
                Some(kept_timestamp) if punch.timestamp - kept_timestamp < main_window => {
                    duplicates.push(FilteredDuplicate {
                        punch,
                        kept_timestamp,
                    });
                }
                _ => main.push(punch),
            }
        }
    }

    for duplicate in &duplicates {
        debug!(
            %date,
            device = %duplicate.punch.device_label,
            time = %duplicate.punch.timestamp.format("%H:%M:%S"),
            kept = %duplicate.kept_timestamp.format("%H:%M:%S"),
            "Filtered duplicate scan"
        );
    }

    let bathroom: Vec<BathroomEvent> = bathroom
        .into_iter()
        .filter_map(|p| {
            let kind = match p.kind {
                DeviceKind::BathroomEntry => BathroomEventKind::Entry,
                DeviceKind::BathroomExit => BathroomEventKind::Exit,
                DeviceKind::MainIn | DeviceKind::MainOut | DeviceKind::MainUnknown => return None,
            };
            Some(BathroomEvent {
                kind,
                time: p.timestamp,
            })
        })
        .collect();

    let reasoning = if duplicates.is_empty() {
        format!(
            "{} raw punches: {} main clock, {} bathroom, no duplicates",
            raw.len(),
            main.len(),
            bathroom.len()
        )
    } else {
        format!(
            "{} raw punches: {} main clock, {} bathroom, {} duplicate scans filtered",
            raw.len(),
            main.len(),
            bathroom.len(),
            duplicates.len()
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "punch_normalization".to_string(),
        rule_name: "Punch Normalization".to_string(),
        date,
        input: serde_json::json!({
            "raw_punches": raw.len(),
            "main_clock_duplicate_minutes": config.main_clock_duplicate_minutes(),
            "bathroom_duplicate_seconds": config.bathroom_duplicate_seconds()
        }),
        output: serde_json::json!({
            "main_clock": main.len(),
            "bathroom": bathroom.len(),
            "duplicates": duplicates
                .iter()
                .map(|d| d.punch.timestamp.format("%H:%M:%S").to_string())
                .collect::<Vec<_>>()
        }),
        reasoning,
    };

    NormalizedPunches {
        main,
        bathroom,
        duplicates,
        audit_step,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn make_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 13).unwrap()
    }

    fn raw(device: &str, time: &str) -> RawPunch {
        RawPunch {
            person_ref: "1001".to_string(),
            device_label: device.to_string(),
            timestamp: NaiveDateTime::parse_from_str(
                &format!("2026-01-13 {}", time),
                "%Y-%m-%d %H:%M:%S",
            )
            .unwrap(),
        }
    }

    fn times(punches: &[Punch]) -> Vec<String> {
        punches
            .iter()
            .map(|p| p.timestamp.format("%H:%M:%S").to_string())
            .collect()
    }

    // ==========================================================================
    // PN-001: Punches are sorted and split by device
    // ==========================================================================
    #[test]
    fn test_pn_001_sorted_and_split() {
        let punches = vec![
            raw("Clock Out", "16:30:00"),
            raw("Bathroom Exit", "10:05:00"),
            raw("Clock In", "07:30:00"),
            raw("Bathroom Entry", "10:00:00"),
        ];
        let result = normalize_punches(make_date(), &punches, &TimeRuleConfig::default(), 1);

        assert_eq!(times(&result.main), vec!["07:30:00", "16:30:00"]);
        assert_eq!(result.bathroom.len(), 2);
        assert_eq!(result.bathroom[0].kind, BathroomEventKind::Entry);
        assert_eq!(result.bathroom[1].kind, BathroomEventKind::Exit);
        assert!(result.duplicates.is_empty());
        assert_eq!(result.audit_step.rule_id, "punch_normalization");
    }

    // ==========================================================================
    // PN-002: Two Clock In scans 90 seconds apart collapse to the earlier
    // ==========================================================================
    #[test]
    fn test_pn_002_main_clock_duplicate_collapses_to_earliest() {
        let punches = vec![raw("Clock In", "07:31:30"), raw("Clock In", "07:30:00")];
        let result = normalize_punches(make_date(), &punches, &TimeRuleConfig::default(), 1);

        assert_eq!(times(&result.main), vec!["07:30:00"]);
        assert_eq!(result.duplicates.len(), 1);
        assert_eq!(
            result.duplicates[0].punch.timestamp.format("%H:%M:%S").to_string(),
            "07:31:30"
        );
        assert_eq!(
            result.duplicates[0].kept_timestamp.format("%H:%M:%S").to_string(),
            "07:30:00"
        );
    }

    // ==========================================================================
    // PN-003: Exactly the duplicate window apart is not a duplicate
    // ==========================================================================
    #[test]
    fn test_pn_003_window_boundary_is_exclusive() {
        let punches = vec![raw("Clock In", "07:30:00"), raw("Clock Out", "07:32:00")];
        let result = normalize_punches(make_date(), &punches, &TimeRuleConfig::default(), 1);
        assert_eq!(result.main.len(), 2);
    }

    // ==========================================================================
    // PN-004: Main-clock duplicates ignore the device direction
    // ==========================================================================
    #[test]
    fn test_pn_004_main_duplicates_across_devices() {
        let punches = vec![raw("Clock Out", "12:00:00"), raw("Clock In", "12:01:00")];
        let result = normalize_punches(make_date(), &punches, &TimeRuleConfig::default(), 1);
        assert_eq!(result.main.len(), 1);
        assert_eq!(result.main[0].kind, DeviceKind::MainOut);
    }

    // ==========================================================================
    // PN-005: Bathroom duplicates are compared per scan kind
    // ==========================================================================
    #[test]
    fn test_pn_005_bathroom_entry_and_exit_not_collapsed_together() {
        let punches = vec![
            raw("Bathroom Entry", "10:00:00"),
            raw("Bathroom Entry", "10:00:30"),
            raw("Bathroom Exit", "10:00:45"),
            raw("Bathroom Exit", "10:01:50"),
        ];
        let result = normalize_punches(make_date(), &punches, &TimeRuleConfig::default(), 1);

        let kinds: Vec<BathroomEventKind> = result.bathroom.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                BathroomEventKind::Entry,
                BathroomEventKind::Exit,
                BathroomEventKind::Exit
            ]
        );
        assert_eq!(result.duplicates.len(), 1);
    }

    // ==========================================================================
    // PN-006: A zero window disables deduplication
    // ==========================================================================
    #[test]
    fn test_pn_006_zero_window_keeps_everything() {
        let config = TimeRuleConfig::builder()
            .main_clock_duplicate_minutes(0)
            .bathroom_duplicate_seconds(0)
            .build()
            .unwrap();
        let punches = vec![
            raw("Clock In", "07:30:00"),
            raw("Clock In", "07:30:00"),
            raw("Bathroom Entry", "10:00:00"),
            raw("Bathroom Entry", "10:00:00"),
        ];
        let result = normalize_punches(make_date(), &punches, &config, 1);
        assert_eq!(result.main.len(), 2);
        assert_eq!(result.bathroom.len(), 2);
        assert!(result.duplicates.is_empty());
    }

    // ==========================================================================
    // PN-007: Renormalizing kept punches removes nothing more
    // ==========================================================================
    #[test]
    fn test_pn_007_deduplication_is_stable() {
        let punches = vec![
            raw("Clock In", "07:30:00"),
            raw("Clock In", "07:30:40"),
            raw("Clock In", "07:31:50"),
            raw("Clock In", "07:32:10"),
            raw("Clock Out", "12:00:00"),
        ];
        let config = TimeRuleConfig::default();
        let first = normalize_punches(make_date(), &punches, &config, 1);

        let kept: Vec<RawPunch> = first
            .main
            .iter()
            .map(|p| RawPunch {
                person_ref: "1001".to_string(),
                device_label: p.device_label.clone(),
                timestamp: p.timestamp,
            })
            .collect();
        let second = normalize_punches(make_date(), &kept, &config, 1);

        assert_eq!(times(&first.main), vec!["07:30:00", "07:32:10", "12:00:00"]);
        assert_eq!(second.main, first.main);
        assert!(second.duplicates.is_empty());
    }
}
