//! Runtime configuration for the desktop app.
//!
//! Values start from defaults, are overridden by environment variables, and
//! finally by command-line flags.

use log::LevelFilter;
use std::path::{Path, PathBuf};

pub const LOG_FILE_VAR: &str = "PDF_EDITOR_LOG_FILE";
pub const LOG_LEVEL_VAR: &str = "PDF_EDITOR_LOG_LEVEL";
pub const PDFIUM_DIR_VAR: &str = "PDF_EDITOR_PDFIUM_DIR";

#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    /// Append-mode log file
    pub log_file: PathBuf,
    pub log_level: LevelFilter,
    /// Directory holding the PDFium shared library, searched first
    pub pdfium_dir: Option<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            log_file: Self::default_log_file(),
            log_level: LevelFilter::Debug,
            pdfium_dir: None,
        }
    }
}

impl EditorConfig {
    /// Returns the default log file for the current platform.
    ///
    /// - macOS: ~/Library/Application Support/pdf-editor/pdf_editor.log
    /// - Linux: ~/.local/share/pdf-editor/pdf_editor.log
    /// - Windows: %LOCALAPPDATA%\pdf-editor\pdf_editor.log
    pub fn default_log_file() -> PathBuf {
        match dirs::data_local_dir() {
            Some(dir) => dir.join("pdf-editor").join("pdf_editor.log"),
            None => PathBuf::from("pdf_editor.log"),
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PDF_EDITOR_LOG_FILE`: log file path
    /// - `PDF_EDITOR_LOG_LEVEL`: `off`, `error`, `warn`, `info`, `debug` or `trace`
    /// - `PDF_EDITOR_PDFIUM_DIR`: directory containing the PDFium library
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var(LOG_FILE_VAR) {
            if val.trim().is_empty() {
                return Err(ConfigError::InvalidValue(LOG_FILE_VAR.to_string()));
            }
            config.log_file = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var(LOG_LEVEL_VAR) {
            config.log_level = parse_level(&val)
                .ok_or_else(|| ConfigError::InvalidValue(LOG_LEVEL_VAR.to_string()))?;
        }

        if let Ok(val) = std::env::var(PDFIUM_DIR_VAR) {
            config.pdfium_dir = Some(PathBuf::from(val));
        }

        Ok(config)
    }

    pub fn with_log_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.log_file = path.as_ref().to_path_buf();
        self
    }

    pub fn with_log_level(mut self, level: LevelFilter) -> Self {
        self.log_level = level;
        self
    }

    pub fn with_pdfium_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.pdfium_dir = Some(path.as_ref().to_path_buf());
        self
    }
}

pub fn parse_level(value: &str) -> Option<LevelFilter> {
    value.trim().parse::<LevelFilter>().ok()
}

/// Errors that can occur while building the configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Invalid value for a configuration key
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(key) => {
                write!(f, "Invalid value for configuration key: {}", key)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    struct EnvGuard {
        vars: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new(var_names: &[&str]) -> Self {
            let vars = var_names
                .iter()
                .map(|name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in var_names {
                env::remove_var(name);
            }
            Self { vars }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (name, value) in &self.vars {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ALL_VARS: [&str; 3] = [LOG_FILE_VAR, LOG_LEVEL_VAR, PDFIUM_DIR_VAR];

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert!(config.log_file.ends_with("pdf_editor.log"));
        assert!(config.pdfium_dir.is_none());
    }

    #[test]
    fn test_builder_methods() {
        let config = EditorConfig::default()
            .with_log_file("/tmp/editor.log")
            .with_log_level(LevelFilter::Warn)
            .with_pdfium_dir("/opt/pdfium");

        assert_eq!(config.log_file, PathBuf::from("/tmp/editor.log"));
        assert_eq!(config.log_level, LevelFilter::Warn);
        assert_eq!(config.pdfium_dir, Some(PathBuf::from("/opt/pdfium")));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        let _guard = EnvGuard::new(&ALL_VARS);

        env::set_var(LOG_FILE_VAR, "/tmp/test-editor.log");
        env::set_var(LOG_LEVEL_VAR, "INFO");
        env::set_var(PDFIUM_DIR_VAR, "/tmp/pdfium");

        let config = EditorConfig::from_env().unwrap();
        assert_eq!(config.log_file, PathBuf::from("/tmp/test-editor.log"));
        assert_eq!(config.log_level, LevelFilter::Info);
        assert_eq!(config.pdfium_dir, Some(PathBuf::from("/tmp/pdfium")));
    }

    #[test]
    #[serial]
    fn test_from_env_without_overrides_matches_default() {
        let _guard = EnvGuard::new(&ALL_VARS);
        assert_eq!(EditorConfig::from_env().unwrap(), EditorConfig::default());
    }

    #[test]
    #[serial]
    fn test_invalid_env_values() {
        let _guard = EnvGuard::new(&ALL_VARS);

        env::set_var(LOG_LEVEL_VAR, "loud");
        match EditorConfig::from_env() {
            Err(ConfigError::InvalidValue(key)) => assert_eq!(key, LOG_LEVEL_VAR),
            other => panic!("expected invalid value error, got {other:?}"),
        }

        env::remove_var(LOG_LEVEL_VAR);
        env::set_var(LOG_FILE_VAR, "  ");
        assert!(EditorConfig::from_env().is_err());
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Some(LevelFilter::Trace));
        assert_eq!(parse_level(" Off "), Some(LevelFilter::Off));
        assert_eq!(parse_level("verbose"), None);
    }
}
