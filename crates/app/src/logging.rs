use crate::config::EditorConfig;
use anyhow::{Context, Result};
use simplelog::{Config, WriteLogger};
use std::fs::{self, File, OpenOptions};
use std::path::Path;

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))
}

/// Installs the global file logger.
pub fn init(config: &EditorConfig) -> Result<()> {
    let file = open_log_file(&config.log_file)?;
    WriteLogger::init(config.log_level, Config::default(), file)
        .context("failed to install logger")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_log_file_is_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("editor.log");

        writeln!(open_log_file(&path).unwrap(), "first").unwrap();
        writeln!(open_log_file(&path).unwrap(), "second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }
}
