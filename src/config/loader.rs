//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading time rules and
//! the employee directory from YAML files.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::EmployeeDirectory;

use super::types::{EmployeesConfig, TimeRuleConfig, TimeRuleOverrides};

/// Loads and provides access to a validated configuration snapshot.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// ├── time_rules.yaml   # Partial time-rule overrides, merged onto defaults
/// └── employees.yaml    # Employee directory
/// ```
///
/// # Example
///
/// ```no_run
/// use timesheet_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
/// println!("Start of day: {}", loader.time_rules().standard_start_time());
/// println!("Employees: {}", loader.directory().len());
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    time_rules: TimeRuleConfig,
    directory: EmployeeDirectory,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// Returns an error if either file is missing (`ConfigNotFound`), holds
    /// invalid YAML or unknown fields (`ConfigParseError`), or describes an
    /// inconsistent rule set or directory (`InvalidConfig`).
    ///
    /// # Example
    ///
    /// ```no_run
    /// use timesheet_engine::config::ConfigLoader;
    ///
    /// let loader = ConfigLoader::load("./config/default")?;
    /// # Ok::<(), timesheet_engine::error::EngineError>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let overrides = Self::load_yaml::<TimeRuleOverrides>(&path.join("time_rules.yaml"))?;
        let time_rules = overrides.into_config()?;

        let employees = Self::load_yaml::<EmployeesConfig>(&path.join("employees.yaml"))?;
        let directory = EmployeeDirectory::new(employees.employees)?;

        debug!(
            path = %path.display(),
            employees = directory.len(),
            "Loaded configuration"
        );

        Ok(Self {
            time_rules,
            directory,
        })
    }

    /// Parses a `time_rules.yaml` document and merges it onto the defaults.
    ///
    /// # Example
    ///
    /// ```
    /// use timesheet_engine::config::ConfigLoader;
    ///
    /// let config = ConfigLoader::from_yaml_str("grace_minutes: 3\n").unwrap();
    /// assert_eq!(config.grace_minutes(), 3);
    /// ```
    pub fn from_yaml_str(yaml: &str) -> EngineResult<TimeRuleConfig> {
        let overrides: TimeRuleOverrides =
            serde_yaml::from_str(yaml).map_err(|e| EngineError::ConfigParseError {
                path: "<inline>".to_string(),
                message: e.to_string(),
            })?;
        overrides.into_config()
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the validated time rules.
    pub fn time_rules(&self) -> &TimeRuleConfig {
        &self.time_rules
    }

    /// Returns the employee directory.
    pub fn directory(&self) -> &EmployeeDirectory {
        &self.directory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn config_path() -> &'static str {
        "./config/default"
    }

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "timesheet-engine-{}-{}",
            name,
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_load_valid_configuration() {
        let result = ConfigLoader::load(config_path());
        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());

        let loader = result.unwrap();
        assert_eq!(
            loader.time_rules().standard_start_time(),
            NaiveTime::from_hms_opt(7, 30, 0).unwrap()
        );
        assert_eq!(loader.time_rules().standard_lunch_minutes(), 30);
        assert_eq!(loader.directory().len(), 3);
    }

    #[test]
    fn test_directory_rates_are_decimal() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let employee = loader.directory().resolve("1001").unwrap();
        assert_eq!(employee.id, "emp_001");
        assert_eq!(
            employee.standard_hourly_rate,
            Decimal::from_str("28.50").unwrap()
        );
    }

    #[test]
    fn test_load_missing_directory_returns_error() {
        let result = ConfigLoader::load("./config/nonexistent");
        match result {
            Err(EngineError::ConfigNotFound { path }) => {
                assert!(path.contains("time_rules.yaml"));
            }
            other => panic!("Expected ConfigNotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_invalid_yaml_returns_parse_error() {
        let dir = scratch_dir("bad-yaml");
        fs::write(dir.join("time_rules.yaml"), "grace_minutes: [oops\n").unwrap();
        fs::write(dir.join("employees.yaml"), "employees: []\n").unwrap();

        let result = ConfigLoader::load(&dir);
        assert!(matches!(result, Err(EngineError::ConfigParseError { .. })));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_inconsistent_rules_returns_invalid_config() {
        let dir = scratch_dir("inverted-window");
        fs::write(
            dir.join("time_rules.yaml"),
            "clock2_window_start: \"12:10\"\nclock2_window_end: \"12:00\"\n",
        )
        .unwrap();
        fs::write(dir.join("employees.yaml"), "employees: []\n").unwrap();

        let result = ConfigLoader::load(&dir);
        match result {
            Err(EngineError::InvalidConfig { field, .. }) => {
                assert_eq!(field, "clock2_window_end");
            }
            other => panic!("Expected InvalidConfig error, got {:?}", other),
        }
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_from_yaml_str_merges_onto_defaults() {
        let config = ConfigLoader::from_yaml_str("apply_lunch_on_friday: true\n").unwrap();
        assert!(config.apply_lunch_on_friday());
        assert_eq!(config.grace_minutes(), 5);
    }

    #[test]
    fn test_from_yaml_str_rejects_unknown_fields() {
        let result = ConfigLoader::from_yaml_str("lunch_start: \"12:00\"\n");
        assert!(matches!(result, Err(EngineError::ConfigParseError { .. })));
    }
}
