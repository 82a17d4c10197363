mod config;
mod diary;
mod error;
mod scraping;
mod table;
mod types;

pub use config::Settings;
pub use diary::*;
pub use error::WeatherDiaryError;

pub use types::cloudiness::Cloudiness;
pub use types::month::{Month, MonthParseError};
pub use types::record::{Reading, WeatherRecord, DATE_COLUMN, RAW_HEADER};
pub use types::schema::{ColumnKind, ColumnSpec, TableSchema};
pub use types::wind::{Wind, WindDirection, SPEED_UNIT};

pub use scraping::fetcher::{PageFetcher, PageSource};
pub use scraping::orchestrator::*;
pub use scraping::parser::{parse_month, MonthTable, SkippedRow};
pub use scraping::run_log::{LogSummary, RunLogger, Severity};

pub use table::analysis::{
    describe, month_series, monthly_averages, temperature_series, temperature_stats,
    FeatureLazyFrame, MonthlyAverages, Period, TableFilter, TemperatureSeries,
};
pub use table::annotate::{column_infos, create_annotation, read_annotation, ColumnInfo};
pub use table::features::{
    finalize_features, normalize_name, save_processed, translate_name, MissingColumn,
    MissingValueReport, NO_DATA,
};
pub use table::io::{read_raw_table, read_table};
pub use table::preprocess::{normalize_temperature, preprocess, preprocess_frame, save_preprocessed};
pub use table::retrieval::{
    file_name_range, lookup_in_range_folder, lookup_in_split, lookup_in_table, DateLookup, Row,
    WeatherRows,
};
pub use table::split::{range_file_name, split_by_week, split_by_year, split_features};

pub use scraping::error::ScrapeError;
pub use table::error::TableError;
