//! Bathroom-break analysis.
//!
//! Pairs bathroom entry and exit scans inside the day's work periods and
//! raises threshold warnings. Work periods come from the classified
//! (unadjusted) main-clock slots; an absent boundary falls back to the
//! configured standard time. Nothing here affects paid time.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::day_detection::DayType;
use super::format_hhmm;
use crate::config::TimeRuleConfig;
use crate::models::{
    AuditStep, BathroomEvent, BathroomEventKind, BathroomReport, BathroomVisit, ClassifiedDay,
    WorkPeriod,
};

/// Warning for an entry scan with no exit in the same work period.
pub const ENTRY_WITHOUT_EXIT: &str = "Bathroom entry without matching exit";
/// Warning for an exit scan with no entry before it in the same work period.
pub const EXIT_WITHOUT_ENTRY: &str = "Bathroom exit without matching entry";

/// A work period during which bathroom visits are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkWindow {
    /// Which period this is.
    pub period: WorkPeriod,
    /// Inclusive start.
    pub start: NaiveDateTime,
    /// Inclusive end.
    pub end: NaiveDateTime,
    /// The clock-in that opened the period, if it was scanned.
    pub clock_in: Option<NaiveDateTime>,
}

impl WorkWindow {
    /// Returns true when `time` falls inside the window.
    pub fn contains(&self, time: NaiveDateTime) -> bool {
        time >= self.start && time <= self.end
    }

    fn early_warning(&self) -> &'static str {
        match self.period {
            WorkPeriod::Afternoon => "Early bathroom after lunch return",
            WorkPeriod::Morning | WorkPeriod::FullDay => "Early bathroom after morning clock in",
        }
    }
}

/// The result of analyzing one day's bathroom scans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BathroomAnalysis {
    /// The bathroom report.
    pub report: BathroomReport,
    /// The audit step recording the analysis.
    pub audit_step: AuditStep,
}

/// Derives the work periods of a classified day.
///
/// Mon-Thu (and weekend) days have a morning period from Morning-In to
/// Lunch-Out and an afternoon period from Lunch-In to Afternoon-Out, so the
/// lunch break belongs to neither. Friday has one period from Morning-In to
/// Afternoon-Out.
pub fn work_windows(day: &ClassifiedDay, config: &TimeRuleConfig) -> Vec<WorkWindow> {
    let at = |time: NaiveTime| day.date.and_time(time);
    let slots = &day.slots;

    match day.day_type {
        DayType::Friday => vec![WorkWindow {
            period: WorkPeriod::FullDay,
            start: slots
                .morning_in
                .unwrap_or_else(|| at(config.standard_start_time())),
            end: slots
                .afternoon_out
                .unwrap_or_else(|| at(config.friday_end_time())),
            clock_in: slots.morning_in,
        }],
        DayType::Standard | DayType::Weekend => vec![
            WorkWindow {
                period: WorkPeriod::Morning,
                start: slots
                    .morning_in
                    .unwrap_or_else(|| at(config.standard_start_time())),
                end: slots.lunch_out.unwrap_or_else(|| at(config.lunch_start())),
                clock_in: slots.morning_in,
            },
            WorkWindow {
                period: WorkPeriod::Afternoon,
                start: slots.lunch_in.unwrap_or_else(|| at(config.lunch_end())),
                end: slots
                    .afternoon_out
                    .unwrap_or_else(|| at(config.standard_end_time())),
                clock_in: slots.lunch_in,
            },
        ],
    }
}

fn whole_minutes(duration: Duration) -> u32 {
    u32::try_from(duration.num_minutes()).unwrap_or(0)
}

/// Pairs and checks the bathroom scans of a classified day.
///
/// # Example
///
/// ```
/// use timesheet_engine::calculation::{analyze_bathroom, classify_day, normalize_punches};
/// use timesheet_engine::config::TimeRuleConfig;
/// use timesheet_engine::models::RawPunch;
/// use chrono::{NaiveDate, NaiveDateTime};
///
/// let date = NaiveDate::from_ymd_opt(2026, 1, 13).unwrap();
/// let punch = |device: &str, t: &str| RawPunch {
///     person_ref: "1001".into(),
///     device_label: device.into(),
///     timestamp: NaiveDateTime::parse_from_str(&format!("2026-01-13 {}", t), "%Y-%m-%d %H:%M").unwrap(),
/// };
/// let raw = vec![
///     punch("Clock In", "07:30"),
///     punch("Bathroom Entry", "10:00"),
///     punch("Bathroom Exit", "10:20"),
///     punch("Clock Out", "12:00"),
/// ];
///
/// let config = TimeRuleConfig::default();
/// let normalized = normalize_punches(date, &raw, &config, 1);
/// let classified = classify_day(date, &normalized, &config, 2).day;
/// let analysis = analyze_bathroom(&classified, &config, 3);
///
/// assert_eq!(analysis.report.daily_total_minutes, 20);
/// assert!(analysis.report.warnings.contains("Long bathroom break: 20 minutes"));
/// ```
pub fn analyze_bathroom(
    day: &ClassifiedDay,
    config: &TimeRuleConfig,
    step_number: u32,
) -> BathroomAnalysis {
    let windows = work_windows(day, config);

    let mut events: Vec<BathroomEvent> = day.bathroom_events.clone();
    events.sort_by_key(|e| e.time);

    let mut per_window: Vec<Vec<BathroomEvent>> = vec![Vec::new(); windows.len()];
    let mut excluded_events = 0u32;
    for event in events {
        match windows.iter().position(|w| w.contains(event.time)) {
            Some(index) => per_window[index].push(event),
            None => excluded_events += 1,
        }
    }

    let early_threshold = Duration::minutes(i64::from(config.early_bathroom_threshold_minutes()));
    let mut entries: Vec<BathroomVisit> = Vec::new();
    let mut warnings = BTreeSet::new();

    for (window, events) in windows.iter().zip(per_window) {
        let mut open_entry: Option<NaiveDateTime> = None;

        for event in events {
            match event.kind {
                BathroomEventKind::Entry => {
                    if let Some(clock_in) = window.clock_in {
                        if event.time >= clock_in && event.time - clock_in <= early_threshold {
                            warnings.insert(window.early_warning().to_string());
                        }
                    }
                    if let Some(unmatched) = open_entry.replace(event.time) {
                        warnings.insert(ENTRY_WITHOUT_EXIT.to_string());
                        entries.push(BathroomVisit {
                            period: window.period,
                            entry_time: unmatched,
                            exit_time: None,
                            duration_minutes: None,
                        });
                    }
                }
                BathroomEventKind::Exit => match open_entry.take() {
                    Some(entry_time) => {
                        let duration = whole_minutes(event.time - entry_time);
                        if duration > config.long_bathroom_threshold_minutes() {
                            warnings.insert(format!("Long bathroom break: {} minutes", duration));
                        }
                        entries.push(BathroomVisit {
                            period: window.period,
                            entry_time,
                            exit_time: Some(event.time),
                            duration_minutes: Some(duration),
                        });
                    }
                    None => {
                        warnings.insert(EXIT_WITHOUT_ENTRY.to_string());
                    }
                },
            }
        }

        if let Some(entry_time) = open_entry {
            warnings.insert(ENTRY_WITHOUT_EXIT.to_string());
            entries.push(BathroomVisit {
                period: window.period,
                entry_time,
                exit_time: None,
                duration_minutes: None,
            });
        }
    }

    entries.sort_by_key(|v| v.entry_time);

    let daily_total_minutes: u32 = entries.iter().filter_map(|v| v.duration_minutes).sum();
    if daily_total_minutes > config.daily_bathroom_threshold_minutes() {
        warnings.insert(format!(
            "Daily bathroom threshold exceeded: {} minutes",
            daily_total_minutes
        ));
    }

    let reasoning = format!(
        "{} visits totalling {} minutes across {} work periods, {} scans outside work periods",
        entries.len(),
        daily_total_minutes,
        windows.len(),
        excluded_events
    );

    let audit_step = AuditStep {
        step_number,
        rule_id: "bathroom_analysis".to_string(),
        rule_name: "Bathroom Break Analysis".to_string(),
        date: day.date,
        input: serde_json::json!({
            "scans": day.bathroom_events.len(),
            "windows": windows
                .iter()
                .map(|w| serde_json::json!({
                    "period": w.period,
                    "start": format_hhmm(w.start),
                    "end": format_hhmm(w.end)
                }))
                .collect::<Vec<_>>(),
            "long_threshold_minutes": config.long_bathroom_threshold_minutes(),
            "daily_threshold_minutes": config.daily_bathroom_threshold_minutes()
        }),
        output: serde_json::json!({
            "visits": entries.len(),
            "daily_total_minutes": daily_total_minutes,
            "excluded_events": excluded_events,
            "warnings": warnings
        }),
        reasoning,
    };

    BathroomAnalysis {
        report: BathroomReport {
            date: day.date,
            entries,
            daily_total_minutes,
            excluded_events,
            warnings,
        },
        audit_step,
    }
}
