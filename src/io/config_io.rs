use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::AppConfig;

/// Name of the config file looked up beside the document
pub const CONFIG_FILE_NAME: &str = "cadence.toml";

/// Written by `cad init`. Every key shows its default.
pub const CONFIG_TEMPLATE: &str = r##"# cadence configuration

[calendar]
# Days shown around today when the document has no calendarRange
days_before = 15
days_after = 15

[tasks]
# Interval for tasks added without --interval
default_interval_days = 7

[history]
# Maximum undo depth in `cad shell`. Unset keeps every step.
# limit = 500
"##;

/// Error type for config files
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Read and parse one config file.
pub fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::ParseError {
        path: path.to_path_buf(),
        source,
    })
}

/// `cadence.toml` in the document's directory.
pub fn config_path_for(document: &Path) -> PathBuf {
    match document.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(CONFIG_FILE_NAME),
        _ => PathBuf::from(CONFIG_FILE_NAME),
    }
}

/// Resolve the config: an explicit path must exist; otherwise the file
/// beside the document is used when present, and defaults when not.
pub fn load_config(explicit: Option<&Path>, document: &Path) -> Result<AppConfig, ConfigError> {
    if let Some(path) = explicit {
        return read_config(path);
    }
    let beside = config_path_for(document);
    if beside.exists() {
        read_config(&beside)
    } else {
        tracing::debug!(path = %beside.display(), "no config file, using defaults");
        Ok(AppConfig::default())
    }
}

/// Write the commented default config.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    fs::write(path, CONFIG_TEMPLATE).map_err(|source| ConfigError::WriteError {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_template_parses_to_defaults() {
        let config: AppConfig = toml::from_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_config_beside_document() {
        let tmp = TempDir::new().unwrap();
        let doc = tmp.path().join("habits.json");
        fs::write(tmp.path().join(CONFIG_FILE_NAME), "[tasks]\ndefault_interval_days = 3\n").unwrap();

        let config = load_config(None, &doc).unwrap();
        assert_eq!(config.tasks.default_interval_days, 3);
        assert_eq!(config.calendar.days_before, 15);
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(None, &tmp.path().join("habits.json")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("other.toml");
        let err = load_config(Some(&missing), &tmp.path().join("doc.json")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn test_parse_error_names_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.toml");
        fs::write(&path, "[calendar]\ndays_before = \"many\"\n").unwrap();
        let err = read_config(&path).unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn test_write_default_round_trips() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        write_default_config(&path).unwrap();
        assert_eq!(read_config(&path).unwrap(), AppConfig::default());
        assert_eq!(config_path_for(Path::new("cadence.json")), PathBuf::from(CONFIG_FILE_NAME));
    }
}
