//! The main entry point: scraping runs and the batch operations over stored
//! tables, all rooted at the directories named in [`Settings`].

use crate::config::Settings;
use crate::error::WeatherDiaryError;
use crate::scraping::orchestrator::{
    spawn_scrape, NullProgress, ScrapeHandle, ScrapeOrchestrator, ScrapeProgress,
};
use crate::table::analysis::{self, MonthlyAverages, TableFilter, TemperatureSeries};
use crate::table::annotate::create_annotation;
use crate::table::features::{finalize_features, save_processed, MissingValueReport};
use crate::table::io::{file_stem, read_table};
use crate::table::preprocess::{self, save_preprocessed};
use crate::table::retrieval::{self, DateLookup, Row, WeatherRows};
use crate::table::split;
use crate::types::month::Month;
use bon::bon;
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};

/// Directory under the dataset directory that preprocessed tables are saved to.
pub const PREPROCESSED_DIR: &str = "preprocessed";

/// Result of [`WeatherDiary::filter`].
#[derive(Debug, Clone)]
pub struct FilteredTable {
    pub table: DataFrame,
    /// Where the table was saved. Only temperature filters save.
    pub saved: Option<PathBuf>,
}

/// Scrapes diary pages and works with the CSV tables they produce.
///
/// # Examples
///
/// ```no_run
/// use weather_diary::{Month, WeatherDiary, WeatherDiaryError};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), WeatherDiaryError> {
/// let diary = WeatherDiary::default();
/// let file_name = diary.scrape(Month(2024, 1), Month(2024, 3)).await?;
///
/// let input = diary.settings().dataset_dir.join(&file_name);
/// let features = diary.preprocess(&input)?;
/// println!("{features}");
///
/// if let Some(weekly) = diary.split_by_week(&input) {
///     println!("Weekly files in {}", weekly.display());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct WeatherDiary {
    settings: Settings,
}

#[bon]
impl WeatherDiary {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Loads settings from a JSON file.
    pub fn from_config_file(path: &Path) -> Result<Self, WeatherDiaryError> {
        Ok(Self::new(Settings::from_json_file(path)?))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Scrapes `start..=end` and returns the name of the CSV written to the
    /// dataset directory.
    pub async fn scrape(&self, start: Month, end: Month) -> Result<String, WeatherDiaryError> {
        self.scrape_with_progress(start, end, &NullProgress).await
    }

    pub async fn scrape_with_progress(
        &self,
        start: Month,
        end: Month,
        progress: &dyn ScrapeProgress,
    ) -> Result<String, WeatherDiaryError> {
        let orchestrator = ScrapeOrchestrator::from_settings(&self.settings)?;
        Ok(orchestrator.run(start, end, progress).await?)
    }

    /// Starts a scrape on a background task. See [`ScrapeHandle`].
    pub fn spawn_scrape(&self, start: Month, end: Month) -> Result<ScrapeHandle, WeatherDiaryError> {
        let orchestrator = ScrapeOrchestrator::from_settings(&self.settings)?;
        Ok(spawn_scrape(orchestrator, start, end))
    }

    pub fn preprocess(&self, input: &Path) -> Result<DataFrame, WeatherDiaryError> {
        Ok(preprocess::preprocess(input)?)
    }

    /// Preprocesses `input` and saves it to
    /// `<dataset_dir>/preprocessed/<base>_preprocessed.csv`.
    pub fn preprocess_to_file(&self, input: &Path) -> Result<PathBuf, WeatherDiaryError> {
        let mut df = preprocess::preprocess(input)?;
        let output = self
            .settings
            .dataset_dir
            .join(PREPROCESSED_DIR)
            .join(format!("{}_preprocessed.csv", file_stem(input)));
        save_preprocessed(&mut df, &output)?;
        Ok(output)
    }

    /// Finalises a preprocessed table and saves it to the analysis directory.
    pub fn finalize(
        &self,
        input: &Path,
        translate: bool,
    ) -> Result<(PathBuf, MissingValueReport), WeatherDiaryError> {
        let (mut df, report) = finalize_features(&read_table(input)?, translate)?;
        let saved = save_processed(&mut df, &self.settings.analysis_dir, input)?;
        Ok((saved, report))
    }

    /// Writes an annotation of `input` to `output`. `Ok(None)` when the input
    /// cannot be read.
    pub fn annotate(&self, input: &Path, output: &Path) -> Result<Option<PathBuf>, WeatherDiaryError> {
        Ok(create_annotation(input, output)?)
    }

    pub fn split_by_week(&self, input: &Path) -> Option<PathBuf> {
        split::split_by_week(input, &self.settings.dataset_dir)
    }

    pub fn split_by_year(&self, input: &Path) -> Option<PathBuf> {
        split::split_by_year(input, &self.settings.dataset_dir)
    }

    pub fn split_features(&self, input: &Path) -> Option<PathBuf> {
        split::split_features(input, &self.settings.dataset_dir)
    }

    pub fn lookup(&self, date: NaiveDate, input: &Path) -> Result<DateLookup, WeatherDiaryError> {
        Ok(retrieval::lookup_in_table(date, input)?)
    }

    pub fn lookup_in_split(
        &self,
        date: NaiveDate,
        x_file: &Path,
        y_file: &Path,
    ) -> Result<Option<Row>, WeatherDiaryError> {
        Ok(retrieval::lookup_in_split(date, x_file, y_file)?)
    }

    /// Looks `date` up in a folder of weekly or yearly split files.
    pub fn lookup_in_folder(&self, date: NaiveDate, folder: &Path) -> Result<Option<Row>, WeatherDiaryError> {
        Ok(retrieval::lookup_in_range_folder(date, folder)?)
    }

    pub fn rows(&self, input: &Path) -> Result<WeatherRows, WeatherDiaryError> {
        Ok(WeatherRows::open(input)?)
    }

    /// Filters a feature table. Tables filtered by temperature are saved to the
    /// filtered-data directory.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use weather_diary::{WeatherDiary, WeatherDiaryError};
    /// use std::path::Path;
    ///
    /// # fn main() -> Result<(), WeatherDiaryError> {
    /// let diary = WeatherDiary::default();
    /// let warm = diary
    ///     .filter()
    ///     .input(Path::new("analysis_data/sochi_weather_202401-202412_processed.csv"))
    ///     .min_day_temperature(20.0)
    ///     .call()?;
    /// println!("{} warm days, saved to {:?}", warm.table.height(), warm.saved);
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub fn filter(
        &self,
        input: &Path,
        min_day_temperature: Option<f64>,
        min_evening_temperature: Option<f64>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<FilteredTable, WeatherDiaryError> {
        let filter = TableFilter {
            min_day_temperature,
            min_evening_temperature,
            start,
            end,
        };
        let mut table = filter.apply(&read_table(input)?)?;
        let saved = filter.save(&mut table, &self.settings.filtered_dir, input)?;
        Ok(FilteredTable { table, saved })
    }

    /// Monthly temperature means of `input`, saved to the averages directory.
    pub fn monthly_averages(&self, input: &Path) -> Result<(MonthlyAverages, PathBuf), WeatherDiaryError> {
        let mut averages = analysis::monthly_averages(&read_table(input)?)?;
        let saved = averages.save(&self.settings.averages_dir)?;
        Ok((averages, saved))
    }

    pub fn temperature_stats(&self, input: &Path) -> Result<DataFrame, WeatherDiaryError> {
        Ok(analysis::temperature_stats(&read_table(input)?)?)
    }

    /// Day temperatures of `input` over its whole period, or over one month.
    pub fn temperature_series(
        &self,
        input: &Path,
        month: Option<Month>,
    ) -> Result<TemperatureSeries, WeatherDiaryError> {
        let df = read_table(input)?;
        Ok(match month {
            Some(month) => analysis::month_series(&df, month)?,
            None => analysis::temperature_series(&df)?,
        })
    }
}
