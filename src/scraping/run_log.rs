//! Per-run log file for a scrape.
//!
//! Each scrape writes `<log_dir>/<output-base-name>.log` with lines of the form
//! `2024-05-01 12:00:00 - WARNING - message`. Every entry is also forwarded to
//! the `log` facade so it shows up on the console when a logger is installed.

use crate::scraping::error::ScrapeError;
use crate::types::month::Month;
use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        }
    }

    fn level(&self) -> log::Level {
        match self {
            Severity::Info => log::Level::Info,
            Severity::Warning => log::Level::Warn,
            Severity::Error => log::Level::Error,
        }
    }

    fn token(&self) -> String {
        format!(" - {} - ", self.as_str())
    }
}

/// Line counts of a run log by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogSummary {
    pub total: usize,
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
}

/// Logger scoped to one scrape invocation.
#[derive(Debug, Clone)]
pub struct RunLogger {
    path: PathBuf,
}

impl RunLogger {
    /// Opens the log for the scrape producing `output_file_name`.
    ///
    /// Existing logs for the same output are appended to.
    pub fn create(log_dir: &Path, output_file_name: &str) -> Result<Self, ScrapeError> {
        fs::create_dir_all(log_dir).map_err(|e| ScrapeError::RunLog(log_dir.to_path_buf(), e))?;
        let stem = Path::new(output_file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(output_file_name);
        let path = log_dir.join(format!("{stem}.log"));
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| ScrapeError::RunLog(path.clone(), e))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self, msg: &str) {
        self.write(Severity::Info, msg);
    }

    pub fn warning(&self, msg: &str) {
        self.write(Severity::Warning, msg);
    }

    pub fn error(&self, msg: &str) {
        self.write(Severity::Error, msg);
    }

    pub fn scraping_start(&self, start: Month, end: Month) {
        self.info(&format!(
            "Starting data collection for {} - {}",
            start.dotted(),
            end.dotted()
        ));
    }

    pub fn scraping_end(&self, total_records: usize) {
        self.info(&format!(
            "Data collection finished. Records collected: {total_records}"
        ));
    }

    pub fn missing_data(&self, month: Month, reason: &str) {
        self.warning(&format!(
            "Data not found: {} | Reason: {reason}",
            month.dotted()
        ));
    }

    pub fn request_error(&self, url: &str, error: &dyn std::error::Error) {
        let mut text = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            text.push_str(": ");
            text.push_str(&cause.to_string());
            source = cause.source();
        }
        self.error(&format!("Request to URL {url} failed: {text}"));
    }

    /// Counts the lines written so far by severity.
    pub fn summary(&self) -> Result<LogSummary, ScrapeError> {
        let contents =
            fs::read_to_string(&self.path).map_err(|e| ScrapeError::RunLog(self.path.clone(), e))?;
        let (errors, warnings, info) = (
            Severity::Error.token(),
            Severity::Warning.token(),
            Severity::Info.token(),
        );
        let mut summary = LogSummary::default();
        for line in contents.lines() {
            summary.total += 1;
            if line.contains(&errors) {
                summary.errors += 1;
            } else if line.contains(&warnings) {
                summary.warnings += 1;
            } else if line.contains(&info) {
                summary.info += 1;
            }
        }
        Ok(summary)
    }

    fn write(&self, severity: Severity, msg: &str) {
        let msg = msg.replace('\n', " ");
        log::log!(severity.level(), "{msg}");

        let line = format!(
            "{} - {} - {msg}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            severity.as_str()
        );
        if let Err(e) = self.append(&line) {
            log::warn!("Lost a line of run log {}: {e}", self.path.display());
        }
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?
            .write_all(line.as_bytes())
    }
}
