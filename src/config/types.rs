//! Configuration types for punch reconciliation.
//!
//! This module contains the immutable [`TimeRuleConfig`] snapshot read by
//! every pipeline stage, the [`TimeRuleConfigBuilder`] that validates it, and
//! the [`TimeRuleOverrides`] document deserialized from YAML.

use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::Employee;

/// Serde helpers for `"HH:MM"` time-of-day fields.
pub(crate) mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn parse(value: &str) -> Result<NaiveTime, chrono::ParseError> {
        NaiveTime::parse_from_str(value.trim(), FORMAT)
    }

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            time: &Option<NaiveTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match time {
                Some(t) => super::serialize(t, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveTime>, D::Error> {
            let raw: Option<String> = Option::deserialize(deserializer)?;
            raw.map(|r| {
                parse(&r).map_err(|e| {
                    serde::de::Error::custom(format!("expected HH:MM time, got '{}': {}", r, e))
                })
            })
            .transpose()
        }
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}

/// The tunable time rules for one processing run.
///
/// Values are read-only once built; construct with [`TimeRuleConfig::default`]
/// or through [`TimeRuleConfig::builder`], which validates the result.
///
/// # Example
///
/// ```
/// use timesheet_engine::config::TimeRuleConfig;
///
/// let config = TimeRuleConfig::builder()
///     .grace_minutes(10)
///     .build()
///     .unwrap();
/// assert_eq!(config.grace_minutes(), 10);
/// assert_eq!(config.standard_lunch_minutes(), 30);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeRuleConfig {
    #[serde(with = "hhmm")]
    standard_start_time: NaiveTime,
    #[serde(with = "hhmm")]
    standard_end_time: NaiveTime,
    #[serde(with = "hhmm")]
    friday_end_time: NaiveTime,
    grace_minutes: u32,
    lunch_out_grace_minutes: u32,
    #[serde(with = "hhmm")]
    clock1_max_time: NaiveTime,
    #[serde(with = "hhmm")]
    clock2_window_start: NaiveTime,
    #[serde(with = "hhmm")]
    clock2_window_end: NaiveTime,
    #[serde(with = "hhmm")]
    clock3_window_start: NaiveTime,
    #[serde(with = "hhmm")]
    clock3_window_end: NaiveTime,
    #[serde(with = "hhmm")]
    clock4_min_time: NaiveTime,
    standard_lunch_minutes: u32,
    apply_lunch_on_friday: bool,
    daily_bathroom_threshold_minutes: u32,
    long_bathroom_threshold_minutes: u32,
    early_bathroom_threshold_minutes: u32,
    bathroom_duplicate_seconds: u32,
    main_clock_duplicate_minutes: u32,
    #[serde(with = "hhmm")]
    flag_overtime_after: NaiveTime,
    #[serde(with = "hhmm")]
    flag_late_after: NaiveTime,
    early_arrival_flag_minutes: Option<u32>,
    positional_fallback: bool,
}

impl Default for TimeRuleConfig {
    fn default() -> Self {
        Self {
            standard_start_time: hm(7, 30),
            standard_end_time: hm(16, 30),
            friday_end_time: hm(13, 0),
            grace_minutes: 5,
            lunch_out_grace_minutes: 10,
            clock1_max_time: hm(11, 50),
            clock2_window_start: hm(12, 0),
            clock2_window_end: hm(12, 10),
            clock3_window_start: hm(12, 10),
            clock3_window_end: hm(13, 0),
            clock4_min_time: hm(13, 5),
            standard_lunch_minutes: 30,
            apply_lunch_on_friday: false,
            daily_bathroom_threshold_minutes: 30,
            long_bathroom_threshold_minutes: 15,
            early_bathroom_threshold_minutes: 10,
            bathroom_duplicate_seconds: 60,
            main_clock_duplicate_minutes: 2,
            flag_overtime_after: hm(16, 30),
            flag_late_after: hm(7, 35),
            early_arrival_flag_minutes: None,
            positional_fallback: false,
        }
    }
}

impl TimeRuleConfig {
    /// Starts a builder seeded with the default rules.
    pub fn builder() -> TimeRuleConfigBuilder {
        TimeRuleConfigBuilder {
            config: Self::default(),
        }
    }

    /// Standard Mon-Thu start of work.
    pub fn standard_start_time(&self) -> NaiveTime {
        self.standard_start_time
    }

    /// Standard Mon-Thu end of work.
    pub fn standard_end_time(&self) -> NaiveTime {
        self.standard_end_time
    }

    /// Standard Friday end of work.
    pub fn friday_end_time(&self) -> NaiveTime {
        self.friday_end_time
    }

    /// Minutes after the start time that still snap back to it.
    pub fn grace_minutes(&self) -> u32 {
        self.grace_minutes
    }

    /// Minutes after lunch start that still snap back to it.
    pub fn lunch_out_grace_minutes(&self) -> u32 {
        self.lunch_out_grace_minutes
    }

    /// Latest time (inclusive) a punch can be the Morning-In.
    pub fn clock1_max_time(&self) -> NaiveTime {
        self.clock1_max_time
    }

    /// Lunch-Out window start (also the standard lunch start).
    pub fn clock2_window_start(&self) -> NaiveTime {
        self.clock2_window_start
    }

    /// Lunch-Out window end (inclusive).
    pub fn clock2_window_end(&self) -> NaiveTime {
        self.clock2_window_end
    }

    /// Lunch-In window start (inclusive).
    pub fn clock3_window_start(&self) -> NaiveTime {
        self.clock3_window_start
    }

    /// Lunch-In window end (inclusive).
    pub fn clock3_window_end(&self) -> NaiveTime {
        self.clock3_window_end
    }

    /// Earliest time (inclusive) a punch can be the Afternoon-Out.
    pub fn clock4_min_time(&self) -> NaiveTime {
        self.clock4_min_time
    }

    /// Lunch minutes deducted on days with a Lunch-In.
    pub fn standard_lunch_minutes(&self) -> u32 {
        self.standard_lunch_minutes
    }

    /// Whether Friday pay also loses the standard lunch.
    pub fn apply_lunch_on_friday(&self) -> bool {
        self.apply_lunch_on_friday
    }

    /// Daily bathroom total above which a warning is raised.
    pub fn daily_bathroom_threshold_minutes(&self) -> u32 {
        self.daily_bathroom_threshold_minutes
    }

    /// Single bathroom visit length above which a warning is raised.
    pub fn long_bathroom_threshold_minutes(&self) -> u32 {
        self.long_bathroom_threshold_minutes
    }

    /// Minutes after clocking in during which a bathroom entry is flagged.
    pub fn early_bathroom_threshold_minutes(&self) -> u32 {
        self.early_bathroom_threshold_minutes
    }

    /// Window in seconds for collapsing repeated bathroom scans.
    pub fn bathroom_duplicate_seconds(&self) -> u32 {
        self.bathroom_duplicate_seconds
    }

    /// Window in minutes for collapsing repeated main-clock scans.
    pub fn main_clock_duplicate_minutes(&self) -> u32 {
        self.main_clock_duplicate_minutes
    }

    /// Afternoon-Out at or after this time is flagged as overtime.
    pub fn flag_overtime_after(&self) -> NaiveTime {
        self.flag_overtime_after
    }

    /// Morning-In after this time is flagged as late.
    pub fn flag_late_after(&self) -> NaiveTime {
        self.flag_late_after
    }

    /// Minutes before start from which an early arrival is flagged, if any.
    pub fn early_arrival_flag_minutes(&self) -> Option<u32> {
        self.early_arrival_flag_minutes
    }

    /// Whether ambiguous punches may be assigned to slots by position.
    pub fn positional_fallback(&self) -> bool {
        self.positional_fallback
    }

    /// Standard lunch start (the Lunch-Out window start).
    pub fn lunch_start(&self) -> NaiveTime {
        self.clock2_window_start
    }

    /// Standard lunch end: lunch start plus the standard lunch length.
    pub fn lunch_end(&self) -> NaiveTime {
        self.clock2_window_start + Duration::minutes(i64::from(self.standard_lunch_minutes))
    }

    pub(crate) fn validate(&self) -> EngineResult<()> {
        ensure_before(
            "clock2_window_end",
            self.clock2_window_start,
            self.clock2_window_end,
            "must be after clock2_window_start",
        )?;
        ensure_before(
            "clock3_window_end",
            self.clock3_window_start,
            self.clock3_window_end,
            "must be after clock3_window_start",
        )?;
        ensure_before(
            "standard_end_time",
            self.standard_start_time,
            self.standard_end_time,
            "must be after standard_start_time",
        )?;
        ensure_before(
            "friday_end_time",
            self.standard_start_time,
            self.friday_end_time,
            "must be after standard_start_time",
        )?;
        if self.flag_late_after < self.standard_start_time {
            return Err(EngineError::InvalidConfig {
                field: "flag_late_after".to_string(),
                message: "must not be before standard_start_time".to_string(),
            });
        }
        if self.grace_minutes >= 24 * 60 || self.lunch_out_grace_minutes >= 24 * 60 {
            return Err(EngineError::InvalidConfig {
                field: "grace_minutes".to_string(),
                message: "grace periods must be shorter than a day".to_string(),
            });
        }
        if self.standard_lunch_minutes >= 24 * 60 {
            return Err(EngineError::InvalidConfig {
                field: "standard_lunch_minutes".to_string(),
                message: "must be shorter than a day".to_string(),
            });
        }
        Ok(())
    }
}

fn ensure_before(
    field: &str,
    start: NaiveTime,
    end: NaiveTime,
    message: &str,
) -> EngineResult<()> {
    if start < end {
        Ok(())
    } else {
        Err(EngineError::InvalidConfig {
            field: field.to_string(),
            message: format!(
                "{} (got {} to {})",
                message,
                start.format("%H:%M"),
                end.format("%H:%M")
            ),
        })
    }
}

/// Builds a validated [`TimeRuleConfig`].
#[derive(Debug, Clone)]
pub struct TimeRuleConfigBuilder {
    config: TimeRuleConfig,
}

macro_rules! setters {
    ($($(#[$doc:meta])* $name:ident: $ty:ty),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name(mut self, value: $ty) -> Self {
                self.config.$name = value;
                self
            }
        )*
    };
}

impl TimeRuleConfigBuilder {
    setters! {
        /// Sets the standard start time.
        standard_start_time: NaiveTime,
        /// Sets the standard end time.
        standard_end_time: NaiveTime,
        /// Sets the Friday end time.
        friday_end_time: NaiveTime,
        /// Sets the morning grace period.
        grace_minutes: u32,
        /// Sets the lunch-out grace period.
        lunch_out_grace_minutes: u32,
        /// Sets the latest Morning-In time.
        clock1_max_time: NaiveTime,
        /// Sets the Lunch-Out window start.
        clock2_window_start: NaiveTime,
        /// Sets the Lunch-Out window end.
        clock2_window_end: NaiveTime,
        /// Sets the Lunch-In window start.
        clock3_window_start: NaiveTime,
        /// Sets the Lunch-In window end.
        clock3_window_end: NaiveTime,
        /// Sets the earliest Afternoon-Out time.
        clock4_min_time: NaiveTime,
        /// Sets the lunch deduction.
        standard_lunch_minutes: u32,
        /// Sets whether Friday loses the lunch deduction too.
        apply_lunch_on_friday: bool,
        /// Sets the daily bathroom threshold.
        daily_bathroom_threshold_minutes: u32,
        /// Sets the long bathroom visit threshold.
        long_bathroom_threshold_minutes: u32,
        /// Sets the early bathroom threshold.
        early_bathroom_threshold_minutes: u32,
        /// Sets the bathroom duplicate window.
        bathroom_duplicate_seconds: u32,
        /// Sets the main clock duplicate window.
        main_clock_duplicate_minutes: u32,
        /// Sets the overtime flag time.
        flag_overtime_after: NaiveTime,
        /// Sets the late flag time.
        flag_late_after: NaiveTime,
        /// Sets the early arrival flag threshold.
        early_arrival_flag_minutes: Option<u32>,
        /// Enables positional slot assignment for ambiguous punches.
        positional_fallback: bool,
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> EngineResult<TimeRuleConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// A partial time-rule document as written in `time_rules.yaml`.
///
/// Every field is optional; absent fields keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeRuleOverrides {
    /// Standard start of work.
    #[serde(default, with = "hhmm::option")]
    pub standard_start_time: Option<NaiveTime>,
    /// Standard end of work.
    #[serde(default, with = "hhmm::option")]
    pub standard_end_time: Option<NaiveTime>,
    /// Friday end of work.
    #[serde(default, with = "hhmm::option")]
    pub friday_end_time: Option<NaiveTime>,
    /// Morning grace period.
    #[serde(default)]
    pub grace_minutes: Option<u32>,
    /// Lunch-out grace period.
    #[serde(default)]
    pub lunch_out_grace_minutes: Option<u32>,
    /// Latest Morning-In time.
    #[serde(default, with = "hhmm::option")]
    pub clock1_max_time: Option<NaiveTime>,
    /// Lunch-Out window start.
    #[serde(default, with = "hhmm::option")]
    pub clock2_window_start: Option<NaiveTime>,
    /// Lunch-Out window end.
    #[serde(default, with = "hhmm::option")]
    pub clock2_window_end: Option<NaiveTime>,
    /// Lunch-In window start.
    #[serde(default, with = "hhmm::option")]
    pub clock3_window_start: Option<NaiveTime>,
    /// Lunch-In window end.
    #[serde(default, with = "hhmm::option")]
    pub clock3_window_end: Option<NaiveTime>,
    /// Earliest Afternoon-Out time.
    #[serde(default, with = "hhmm::option")]
    pub clock4_min_time: Option<NaiveTime>,
    /// Lunch deduction in minutes.
    #[serde(default)]
    pub standard_lunch_minutes: Option<u32>,
    /// Friday lunch deduction switch.
    #[serde(default)]
    pub apply_lunch_on_friday: Option<bool>,
    /// Daily bathroom threshold.
    #[serde(default)]
    pub daily_bathroom_threshold_minutes: Option<u32>,
    /// Long bathroom visit threshold.
    #[serde(default)]
    pub long_bathroom_threshold_minutes: Option<u32>,
    /// Early bathroom threshold.
    #[serde(default)]
    pub early_bathroom_threshold_minutes: Option<u32>,
    /// Bathroom duplicate window in seconds.
    #[serde(default)]
    pub bathroom_duplicate_seconds: Option<u32>,
    /// Main clock duplicate window in minutes.
    #[serde(default)]
    pub main_clock_duplicate_minutes: Option<u32>,
    /// Overtime flag time.
    #[serde(default, with = "hhmm::option")]
    pub flag_overtime_after: Option<NaiveTime>,
    /// Late flag time.
    #[serde(default, with = "hhmm::option")]
    pub flag_late_after: Option<NaiveTime>,
    /// Early arrival flag threshold.
    #[serde(default)]
    pub early_arrival_flag_minutes: Option<u32>,
    /// Positional fallback switch.
    #[serde(default)]
    pub positional_fallback: Option<bool>,
}

impl TimeRuleOverrides {
    /// Merges the present fields onto `builder`.
    pub fn apply_to(&self, builder: TimeRuleConfigBuilder) -> TimeRuleConfigBuilder {
        macro_rules! merge {
            ($src:ident, $dst:ident; $($field:ident),*) => {
                $(
                    if let Some(value) = $src.$field {
                        $dst = $dst.$field(value);
                    }
                )*
            };
        }
        let overrides = self;
        let mut b = builder;
        merge!(
            overrides, b;
            standard_start_time,
            standard_end_time,
            friday_end_time,
            grace_minutes,
            lunch_out_grace_minutes,
            clock1_max_time,
            clock2_window_start,
            clock2_window_end,
            clock3_window_start,
            clock3_window_end,
            clock4_min_time,
            standard_lunch_minutes,
            apply_lunch_on_friday,
            daily_bathroom_threshold_minutes,
            long_bathroom_threshold_minutes,
            early_bathroom_threshold_minutes,
            bathroom_duplicate_seconds,
            main_clock_duplicate_minutes,
            flag_overtime_after,
            flag_late_after,
            positional_fallback
        );
        if let Some(minutes) = overrides.early_arrival_flag_minutes {
            b = b.early_arrival_flag_minutes(Some(minutes));
        }
        b
    }

    /// Merges onto the defaults and validates.
    pub fn into_config(self) -> EngineResult<TimeRuleConfig> {
        self.apply_to(TimeRuleConfig::builder()).build()
    }
}

/// The employee directory document as written in `employees.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeesConfig {
    /// Employees in directory order.
    pub employees: Vec<Employee>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = TimeRuleConfig::default();
        assert_eq!(config.standard_start_time(), hm(7, 30));
        assert_eq!(config.standard_end_time(), hm(16, 30));
        assert_eq!(config.friday_end_time(), hm(13, 0));
        assert_eq!(config.clock1_max_time(), hm(11, 50));
        assert_eq!(config.clock4_min_time(), hm(13, 5));
        assert_eq!(config.flag_late_after(), hm(7, 35));
        assert_eq!(config.main_clock_duplicate_minutes(), 2);
        assert!(!config.apply_lunch_on_friday());
        assert!(!config.positional_fallback());
        assert_eq!(config.early_arrival_flag_minutes(), None);
    }

    #[test]
    fn test_defaults_pass_validation() {
        assert!(TimeRuleConfig::builder().build().is_ok());
    }

    #[test]
    fn test_lunch_end_is_start_plus_lunch() {
        let config = TimeRuleConfig::default();
        assert_eq!(config.lunch_start(), hm(12, 0));
        assert_eq!(config.lunch_end(), hm(12, 30));
    }

    #[test]
    fn test_inverted_clock2_window_rejected() {
        let result = TimeRuleConfig::builder()
            .clock2_window_start(hm(12, 10))
            .clock2_window_end(hm(12, 0))
            .build();

        match result {
            Err(EngineError::InvalidConfig { field, .. }) => {
                assert_eq!(field, "clock2_window_end");
            }
            other => panic!("Expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_clock3_window_rejected() {
        let result = TimeRuleConfig::builder()
            .clock3_window_start(hm(12, 30))
            .clock3_window_end(hm(12, 30))
            .build();
        assert!(matches!(
            result,
            Err(EngineError::InvalidConfig { ref field, .. }) if field == "clock3_window_end"
        ));
    }

    #[test]
    fn test_late_flag_before_start_rejected() {
        let result = TimeRuleConfig::builder().flag_late_after(hm(7, 0)).build();
        assert!(matches!(
            result,
            Err(EngineError::InvalidConfig { ref field, .. }) if field == "flag_late_after"
        ));
    }

    #[test]
    fn test_overrides_deserialize_from_yaml() {
        let yaml = r#"
standard_start_time: "08:00"
flag_late_after: "08:05"
grace_minutes: 3
positional_fallback: true
"#;
        let overrides: TimeRuleOverrides = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(overrides.standard_start_time, Some(hm(8, 0)));
        assert_eq!(overrides.grace_minutes, Some(3));
        assert_eq!(overrides.clock1_max_time, None);

        let config = overrides.into_config().unwrap();
        assert_eq!(config.standard_start_time(), hm(8, 0));
        assert_eq!(config.grace_minutes(), 3);
        assert!(config.positional_fallback());
        // untouched fields keep defaults
        assert_eq!(config.clock2_window_start(), hm(12, 0));
    }

    #[test]
    fn test_overrides_reject_bad_time_format() {
        let yaml = "standard_start_time: \"7.30am\"\n";
        let result: Result<TimeRuleOverrides, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides_reject_negative_minutes() {
        let yaml = "grace_minutes: -5\n";
        let result: Result<TimeRuleOverrides, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides_reject_unknown_field() {
        let yaml = "lunch_window: 30\n";
        let result: Result<TimeRuleOverrides, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_serializes_times_as_hhmm() {
        let json = serde_json::to_value(TimeRuleConfig::default()).unwrap();
        assert_eq!(json["standard_start_time"], "07:30");
        assert_eq!(json["clock2_window_end"], "12:10");
        assert_eq!(json["grace_minutes"], 5);
    }

    #[test]
    fn test_serialized_config_reloads_as_overrides() {
        let config = TimeRuleConfig::builder()
            .clock1_max_time(NaiveTime::from_hms_opt(11, 45, 0).unwrap())
            .flag_overtime_after(NaiveTime::from_hms_opt(17, 0, 0).unwrap())
            .early_arrival_flag_minutes(Some(20))
            .build()
            .unwrap();

        let yaml = serde_yaml::to_string(&config).unwrap();
        let overrides: TimeRuleOverrides = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(overrides.into_config().unwrap(), config);
    }
}
