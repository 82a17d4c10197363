//! Runtime settings: where to scrape from and where files are written.

use crate::error::WeatherDiaryError;
use bon::Builder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings shared by every operation of [`crate::WeatherDiary`].
///
/// Build one with [`Settings::builder`], or load it from JSON with
/// [`Settings::from_json_file`]. Fields missing from the JSON keep their defaults.
///
/// # Examples
///
/// ```
/// use weather_diary::Settings;
///
/// let settings = Settings::builder()
///     .station_id("4368".to_string())
///     .city("moscow".to_string())
///     .build();
/// assert_eq!(settings.month_url_prefix(), "https://www.gismeteo.ru/diary/4368");
/// assert_eq!(settings.dataset_dir.to_str(), Some("dataset"));
/// ```
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Gismeteo station identifier. 5233 is Sochi.
    #[builder(default = "5233".to_string())]
    pub station_id: String,
    /// Slug used in output file names, e.g. `sochi_weather_202401-202403.csv`.
    #[builder(default = "sochi".to_string())]
    pub city: String,
    #[builder(default = "https://www.gismeteo.ru/diary".to_string())]
    pub base_url: String,
    #[builder(default = "Mozilla/5.0".to_string())]
    pub user_agent: String,
    /// Per-request timeout in seconds. `None` leaves the transport default.
    pub request_timeout_secs: Option<u64>,
    #[builder(default = PathBuf::from("dataset"))]
    pub dataset_dir: PathBuf,
    #[builder(default = PathBuf::from("weather_logs"))]
    pub log_dir: PathBuf,
    #[builder(default = PathBuf::from("analysis_data"))]
    pub analysis_dir: PathBuf,
    #[builder(default = PathBuf::from("filtered_data"))]
    pub filtered_dir: PathBuf,
    #[builder(default = PathBuf::from("average_temperature"))]
    pub averages_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings::builder().build()
    }
}

impl Settings {
    pub fn from_json_file(path: &Path) -> Result<Self, WeatherDiaryError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| WeatherDiaryError::ConfigRead(path.to_path_buf(), e))?;
        serde_json::from_str(&contents)
            .map_err(|e| WeatherDiaryError::ConfigParse(path.to_path_buf(), e))
    }

    pub fn month_url_prefix(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), self.station_id)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.station_id, "5233");
        assert_eq!(settings.city, "sochi");
        assert_eq!(settings.user_agent, "Mozilla/5.0");
        assert_eq!(settings.request_timeout(), None);
        assert_eq!(settings.log_dir, PathBuf::from("weather_logs"));
    }

    #[test]
    fn test_partial_json_keeps_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = NamedTempFile::new()?;
        write!(
            file,
            r#"{{ "city": "adler", "request_timeout_secs": 20, "dataset_dir": "/tmp/ds" }}"#
        )?;

        let settings = Settings::from_json_file(file.path())?;
        assert_eq!(settings.city, "adler");
        assert_eq!(settings.station_id, "5233");
        assert_eq!(settings.request_timeout(), Some(Duration::from_secs(20)));
        assert_eq!(settings.dataset_dir, PathBuf::from("/tmp/ds"));
        Ok(())
    }

    #[test]
    fn test_invalid_json_is_config_error() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = NamedTempFile::new()?;
        write!(file, "not json")?;
        let result = Settings::from_json_file(file.path());
        assert!(matches!(result, Err(WeatherDiaryError::ConfigParse(..))));
        Ok(())
    }
}
