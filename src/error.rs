use crate::scraping::error::ScrapeError;
use crate::table::error::TableError;
use crate::types::month::MonthParseError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeatherDiaryError {
    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Month(#[from] MonthParseError),

    #[error("Failed to read settings file '{0}'")]
    ConfigRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse settings file '{0}'")]
    ConfigParse(PathBuf, #[source] serde_json::Error),
}
