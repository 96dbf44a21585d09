use serde::{Deserialize, Serialize};

/// Configuration from cadence.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub tasks: TaskConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Days shown before today when the document has no calendar range
    #[serde(default = "default_window")]
    pub days_before: u32,
    /// Days shown after today when the document has no calendar range
    #[serde(default = "default_window")]
    pub days_after: u32,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        CalendarConfig {
            days_before: default_window(),
            days_after: default_window(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Interval given to tasks created without an explicit one
    #[serde(default = "default_interval_days")]
    pub default_interval_days: u32,
}

impl Default for TaskConfig {
    fn default() -> Self {
        TaskConfig {
            default_interval_days: default_interval_days(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum undo depth. Absent = unbounded.
    #[serde(default)]
    pub limit: Option<usize>,
}

fn default_window() -> u32 {
    15
}

fn default_interval_days() -> u32 {
    7
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.calendar.days_before, 15);
        assert_eq!(config.calendar.days_after, 15);
        assert_eq!(config.tasks.default_interval_days, 7);
        assert_eq!(config.history.limit, None);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
[calendar]
days_after = 30

[history]
limit = 50
"#,
        )
        .unwrap();
        assert_eq!(config.calendar.days_before, 15);
        assert_eq!(config.calendar.days_after, 30);
        assert_eq!(config.history.limit, Some(50));
    }
}
