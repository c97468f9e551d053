//! INI file configuration adapter.

use crate::domain::error::QuantError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, QuantError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| QuantError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, QuantError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| QuantError::ConfigParse {
                file: "<string>".into(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_sections() {
        let content = r#"
[backtest]
ticker = AAPL
initial_capital = 100000.0

[strategy]
kind = mean_reversion
bb_period = 20
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(adapter.get_string("backtest", "ticker"), Some("AAPL".to_string()));
        assert_eq!(
            adapter.get_string("strategy", "kind"),
            Some("mean_reversion".to_string())
        );
        assert_eq!(adapter.get_int("strategy", "bb_period", 0), 20);
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\ninitial_capital = 100\n").unwrap();
        assert_eq!(adapter.get_string("backtest", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_default_for_non_numeric() {
        let adapter = FileConfigAdapter::from_string("[risk]\nsimulations = many\n").unwrap();
        assert_eq!(adapter.get_int("risk", "simulations", 42), 42);
        assert_eq!(adapter.get_int("risk", "missing", 7), 7);
    }

    #[test]
    fn get_double_reads_scientific_notation() {
        let adapter = FileConfigAdapter::from_string("[optimizer]\ntolerance = 1e-9\n").unwrap();
        assert!((adapter.get_double("optimizer", "tolerance", 0.0) - 1e-9).abs() < f64::EPSILON);
    }

    #[test]
    fn get_double_returns_default_for_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\ninitial_capital = not_a_number\n").unwrap();
        assert!((adapter.get_double("backtest", "initial_capital", 99.9) - 99.9).abs() < f64::EPSILON);
    }

    #[test]
    fn get_bool_accepts_common_spellings() {
        let adapter =
            FileConfigAdapter::from_string("[flags]\na = true\nb = no\nc = 1\nd = maybe\n").unwrap();
        assert!(adapter.get_bool("flags", "a", false));
        assert!(!adapter.get_bool("flags", "b", true));
        assert!(adapter.get_bool("flags", "c", false));
        assert!(adapter.get_bool("flags", "d", true));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[sqlite]\npath = /tmp/quantdesk.db\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("sqlite", "path"),
            Some("/tmp/quantdesk.db".to_string())
        );
    }

    #[test]
    fn from_file_missing_file_is_config_parse_error() {
        let err = FileConfigAdapter::from_file("/nonexistent/path/config.ini").unwrap_err();
        assert!(matches!(err, QuantError::ConfigParse { .. }));
    }
}
