//! Filtering and temperature summaries over feature tables.
//!
//! Works on raw-named (`Температура (день)`), normalised (`температура_(день)`)
//! and translated (`temperature_day`) tables alike: columns are found by kind
//! and period rather than by exact name.

use crate::table::error::TableError;
use crate::table::features::celsius_to_fahrenheit;
use crate::table::io::{date_values, file_stem, float_values, take_rows, write_csv, ISO_DATE};
use crate::types::month::Month;
use crate::types::schema::{ColumnKind, TableSchema};
use bon::Builder;
use chrono::NaiveDate;
use log::info;
use polars::prelude::*;
use std::path::{Path, PathBuf};

pub const MONTH_KEY: &str = "month_year";
pub const STAT_COLUMN: &str = "statistic";
pub const STAT_LABELS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day,
    Evening,
}

impl Period {
    fn matches(self, name: &str) -> bool {
        let lower = name.to_lowercase();
        match self {
            Period::Day => lower.contains("day") || lower.contains("день"),
            Period::Evening => lower.contains("evening") || lower.contains("вечер"),
        }
    }
}

/// The Celsius temperature column for `period`, if the table has one.
pub fn temperature_column(schema: &TableSchema, period: Period) -> Option<&str> {
    schema
        .of_kind(ColumnKind::Temperature)
        .find(|c| period.matches(&c.name))
        .map(|c| c.name.as_str())
}

fn is_temperature_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("temperature") || lower.contains("температура")
}

/// A lazily evaluated feature table.
///
/// # Examples
///
/// ```no_run
/// use weather_diary::FeatureLazyFrame;
/// use polars::prelude::*;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let df = CsvReadOptions::default()
///     .try_into_reader_with_file_path(Some("analysis_data/sochi_processed.csv".into()))?
///     .finish()?;
/// let warm = FeatureLazyFrame::new(df.lazy())
///     .min_temperature("temperature_day", 20.0)
///     .frame
///     .collect()?;
/// println!("{warm}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FeatureLazyFrame {
    pub frame: LazyFrame,
}

impl FeatureLazyFrame {
    pub fn new(frame: LazyFrame) -> Self {
        Self { frame }
    }

    pub fn filter(&self, predicate: Expr) -> FeatureLazyFrame {
        FeatureLazyFrame::new(self.frame.clone().filter(predicate))
    }

    /// Keeps rows where `column` is at least `min`. Non-numeric cells never match.
    pub fn min_temperature(&self, column: &str, min: f64) -> FeatureLazyFrame {
        self.filter(col(column).cast(DataType::Float64).gt_eq(lit(min)))
    }

    /// Keeps rows whose ISO date in `date_column` lies within `start..=end`.
    pub fn date_range(&self, date_column: &str, start: NaiveDate, end: NaiveDate) -> FeatureLazyFrame {
        let date = col(date_column).cast(DataType::String);
        self.filter(
            date.clone()
                .gt_eq(lit(start.format(ISO_DATE).to_string()))
                .and(date.lt_eq(lit(end.format(ISO_DATE).to_string()))),
        )
    }
}

/// Row filters over a feature table. Unset bounds do not filter.
#[derive(Debug, Clone, Default, PartialEq, Builder)]
pub struct TableFilter {
    pub min_day_temperature: Option<f64>,
    pub min_evening_temperature: Option<f64>,
    /// Inclusive date bounds; both must be set for the range to apply.
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl TableFilter {
    pub fn has_temperature_filter(&self) -> bool {
        self.min_day_temperature.is_some() || self.min_evening_temperature.is_some()
    }

    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame, TableError> {
        let schema = TableSchema::of_frame(df);
        let mut lazy = FeatureLazyFrame::new(df.clone().lazy());

        for (min, period) in [
            (self.min_day_temperature, Period::Day),
            (self.min_evening_temperature, Period::Evening),
        ] {
            if let Some(min) = min {
                let column = temperature_column(&schema, period).ok_or_else(|| {
                    TableError::MissingColumn(format!("{period:?} temperature").to_lowercase())
                })?;
                lazy = lazy.min_temperature(column, min);
            }
        }
        if let (Some(start), Some(end)) = (self.start, self.end) {
            let date_column = schema.date_column().ok_or(TableError::NoDateColumn)?;
            lazy = lazy.date_range(date_column, start, end);
        }
        Ok(lazy.frame.collect()?)
    }

    /// `<base>_temp_day<X>_evening<Y>.csv`, leaving out unset parts.
    pub fn output_file_name(&self, source: &Path) -> String {
        let mut parts = Vec::new();
        if let Some(min) = self.min_day_temperature {
            parts.push(format!("day{min}"));
        }
        if let Some(min) = self.min_evening_temperature {
            parts.push(format!("evening{min}"));
        }
        format!("{}_temp_{}.csv", file_stem(source), parts.join("_"))
    }

    /// Writes a filtered table under `filtered_dir` when a temperature bound
    /// is set. Date-only filters are not saved.
    pub fn save(
        &self,
        filtered: &mut DataFrame,
        filtered_dir: &Path,
        source: &Path,
    ) -> Result<Option<PathBuf>, TableError> {
        if !self.has_temperature_filter() {
            return Ok(None);
        }
        let output = filtered_dir.join(self.output_file_name(source));
        write_csv(filtered, &output)?;
        info!("Saved {} filtered rows to {}", filtered.height(), output.display());
        Ok(Some(output))
    }
}

/// Mean temperatures per calendar month.
#[derive(Debug, Clone)]
pub struct MonthlyAverages {
    /// `month_year` (`YYYY-MM`) followed by one column per temperature column.
    pub table: DataFrame,
    pub first: Month,
    pub last: Month,
}

impl MonthlyAverages {
    pub fn output_file_name(&self) -> String {
        format!(
            "monthly_avg_{}_to_{}.csv",
            self.first.compact(),
            self.last.compact()
        )
    }

    pub fn save(&mut self, averages_dir: &Path) -> Result<PathBuf, TableError> {
        let output = averages_dir.join(self.output_file_name());
        write_csv(&mut self.table, &output)?;
        info!("Saved monthly averages to {}", output.display());
        Ok(output)
    }
}

/// Groups rows by `YYYY-MM` and averages every temperature column, rounded to
/// two decimals.
pub fn monthly_averages(df: &DataFrame) -> Result<MonthlyAverages, TableError> {
    let schema = TableSchema::of_frame(df);
    let date_column = schema.date_column().ok_or(TableError::NoDateColumn)?;
    let dates = date_values(df, date_column)?;
    let (Some(&first), Some(&last)) = (dates.iter().min(), dates.iter().max()) else {
        return Err(TableError::EmptyTable);
    };

    let temperature: Vec<&str> = schema
        .columns()
        .iter()
        .map(|c| c.name.as_str())
        .filter(|n| is_temperature_name(n))
        .collect();
    if temperature.is_empty() {
        return Err(TableError::MissingColumn("temperature".to_string()));
    }

    let keys: Vec<String> = dates.iter().map(|d| d.format("%Y-%m").to_string()).collect();
    let mut keyed = df.select(temperature.iter().copied())?;
    keyed.with_column(Column::new(MONTH_KEY.into(), keys))?;

    let means: Vec<Expr> = temperature
        .iter()
        .map(|n| col(*n).cast(DataType::Float64).mean())
        .collect();
    let mut table = keyed
        .lazy()
        .group_by([col(MONTH_KEY)])
        .agg(means)
        .sort([MONTH_KEY], SortMultipleOptions::default())
        .collect()?;

    for name in &temperature {
        let rounded: Vec<Option<f64>> = float_values(&table, name)?
            .into_iter()
            .map(|v| v.map(round2))
            .collect();
        table.with_column(Column::new((*name).into(), rounded))?;
    }

    Ok(MonthlyAverages {
        table,
        first: Month::from(first),
        last: Month::from(last),
    })
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Descriptive statistics of every temperature column, Celsius columns first.
///
/// One row per label in [`STAT_LABELS`]; `std` is the sample deviation and
/// quartiles interpolate linearly between ranks.
pub fn temperature_stats(df: &DataFrame) -> Result<DataFrame, TableError> {
    let names: Vec<&str> = df
        .get_column_names()
        .into_iter()
        .map(|n| n.as_str())
        .filter(|n| is_temperature_name(n))
        .collect();
    let (fahrenheit, celsius): (Vec<&str>, Vec<&str>) = names
        .into_iter()
        .partition(|n| n.to_lowercase().contains("fahrenheit"));
    if celsius.is_empty() && fahrenheit.is_empty() {
        return Err(TableError::MissingColumn("temperature".to_string()));
    }

    let mut columns = vec![Column::new(STAT_COLUMN.into(), STAT_LABELS.to_vec())];
    for name in celsius.into_iter().chain(fahrenheit) {
        let values: Vec<f64> = float_values(df, name)?.into_iter().flatten().collect();
        columns.push(Column::new(name.into(), describe(&values).to_vec()));
    }
    Ok(DataFrame::new(columns)?)
}

/// `[count, mean, std, min, 25%, 50%, 75%, max]`; NaN where undefined.
pub fn describe(values: &[f64]) -> [f64; 8] {
    let n = values.len();
    if n == 0 {
        return [0.0, f64::NAN, f64::NAN, f64::NAN, f64::NAN, f64::NAN, f64::NAN, f64::NAN];
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mean = sorted.iter().sum::<f64>() / n as f64;
    let std = if n > 1 {
        (sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt()
    } else {
        f64::NAN
    };
    [
        n as f64,
        mean,
        std,
        sorted[0],
        quantile(&sorted, 0.25),
        quantile(&sorted, 0.5),
        quantile(&sorted, 0.75),
        sorted[n - 1],
    ]
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (position - lower as f64)
}

/// Day temperatures over time, in both units, for a chart to plot.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureSeries {
    pub dates: Vec<NaiveDate>,
    pub celsius: Vec<f64>,
    pub fahrenheit: Vec<f64>,
}

impl TemperatureSeries {
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn mean_celsius(&self) -> Option<f64> {
        mean(&self.celsius)
    }

    pub fn median_celsius(&self) -> Option<f64> {
        median(&self.celsius)
    }

    pub fn mean_fahrenheit(&self) -> Option<f64> {
        mean(&self.fahrenheit)
    }

    pub fn median_fahrenheit(&self) -> Option<f64> {
        median(&self.fahrenheit)
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(quantile(&sorted, 0.5))
}

/// The day-temperature series of the whole table, in date order.
///
/// Fahrenheit values come from the `<column>_fahrenheit` companion when the
/// table has one, and are converted otherwise.
pub fn temperature_series(df: &DataFrame) -> Result<TemperatureSeries, TableError> {
    let schema = TableSchema::of_frame(df);
    let date_column = schema.date_column().ok_or(TableError::NoDateColumn)?;
    let celsius_column = temperature_column(&schema, Period::Day)
        .ok_or_else(|| TableError::MissingColumn("day temperature".to_string()))?;

    let dates = date_values(df, date_column)?;
    let mut order: Vec<usize> = (0..dates.len()).collect();
    order.sort_by_key(|&i| dates[i]);
    let sorted = take_rows(df, &order)?;

    let celsius: Vec<f64> = float_values(&sorted, celsius_column)?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect();
    let companion = format!("{celsius_column}_fahrenheit");
    let fahrenheit: Vec<f64> = match sorted.column(&companion) {
        Ok(_) => float_values(&sorted, &companion)?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect(),
        Err(_) => celsius.iter().map(|c| celsius_to_fahrenheit(*c)).collect(),
    };

    Ok(TemperatureSeries {
        dates: order.iter().map(|&i| dates[i]).collect(),
        celsius,
        fahrenheit,
    })
}

/// [`temperature_series`] restricted to one calendar month. Empty when the
/// table has no rows for it.
pub fn month_series(df: &DataFrame, month: Month) -> Result<TemperatureSeries, TableError> {
    let full = temperature_series(df)?;
    let keep: Vec<usize> = full
        .dates
        .iter()
        .enumerate()
        .filter(|(_, d)| Month::from(**d) == month)
        .map(|(i, _)| i)
        .collect();
    Ok(TemperatureSeries {
        dates: keep.iter().map(|&i| full.dates[i]).collect(),
        celsius: keep.iter().map(|&i| full.celsius[i]).collect(),
        fahrenheit: keep.iter().map(|&i| full.fahrenheit[i]).collect(),
    })
}
