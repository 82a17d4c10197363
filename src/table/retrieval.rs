//! Looking up a day in a stored table or in split outputs, and walking a
//! table day by day.

use crate::table::error::TableError;
use crate::table::io::{date_values, read_raw_table, take_rows, ISO_DATE};
use crate::types::record::DATE_COLUMN;
use crate::types::schema::TableSchema;
use chrono::NaiveDate;
use log::debug;
use polars::prelude::*;
use std::fs;
use std::path::Path;

/// One table row as ordered `(column, value)` pairs. Missing cells are empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub fields: Vec<(String, String)>,
}

impl Row {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateLookup {
    Found(Row),
    /// The date lies outside the table's `min..=max` dates.
    OutOfRange { min: NaiveDate, max: NaiveDate },
    /// The date is within range but has no row, or the table is empty.
    Missing,
}

/// Looks `date` up in a primary table.
pub fn lookup_in_table(date: NaiveDate, path: &Path) -> Result<DateLookup, TableError> {
    let df = read_raw_table(path)?;
    let schema = TableSchema::of_frame(&df);
    let date_column = schema.date_column().ok_or(TableError::NoDateColumn)?;
    let dates = date_values(&df, date_column)?;

    if let Some(index) = dates.iter().position(|d| *d == date) {
        return Ok(DateLookup::Found(row_at(&df, index)?));
    }
    match (dates.iter().min(), dates.iter().max()) {
        (Some(&min), Some(&max)) if date < min || date > max => {
            Ok(DateLookup::OutOfRange { min, max })
        }
        _ => Ok(DateLookup::Missing),
    }
}

/// Looks `date` up in an `X.csv`/`Y.csv` pair written by the feature split.
///
/// The returned row starts with the date under `Дата`, followed by the `Y.csv` fields.
pub fn lookup_in_split(date: NaiveDate, x_file: &Path, y_file: &Path) -> Result<Option<Row>, TableError> {
    let x = read_raw_table(x_file)?;
    let first = x
        .get_column_names()
        .first()
        .map(|n| n.to_string())
        .ok_or(TableError::NoDateColumn)?;
    let Some(index) = date_values(&x, &first)?.iter().position(|d| *d == date) else {
        return Ok(None);
    };

    let y = read_raw_table(y_file)?;
    if index >= y.height() {
        return Ok(None);
    }
    let mut row = row_at(&y, index)?;
    row.fields
        .insert(0, (DATE_COLUMN.to_string(), date.format(ISO_DATE).to_string()));
    Ok(Some(row))
}

/// Looks `date` up in a folder of weekly or yearly split files.
///
/// Only files whose `YYYYMMDD_YYYYMMDD.csv` name covers the date are opened.
pub fn lookup_in_range_folder(date: NaiveDate, folder: &Path) -> Result<Option<Row>, TableError> {
    let entries = fs::read_dir(folder).map_err(|e| TableError::Io(folder.to_path_buf(), e))?;
    let mut candidates = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| TableError::Io(folder.to_path_buf(), e))?.path();
        let covers = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(file_name_range)
            .is_some_and(|(first, last)| first <= date && date <= last);
        if covers {
            candidates.push(path);
        }
    }
    candidates.sort();

    for path in candidates {
        debug!("Searching {} for {}", path.display(), date);
        if let DateLookup::Found(row) = lookup_in_table(date, &path)? {
            return Ok(Some(row));
        }
    }
    Ok(None)
}

/// Parses `YYYYMMDD_YYYYMMDD.csv` into its date bounds.
pub fn file_name_range(name: &str) -> Option<(NaiveDate, NaiveDate)> {
    let stem = name.strip_suffix(".csv")?;
    let (first, last) = stem.split_once('_')?;
    let first = NaiveDate::parse_from_str(first, "%Y%m%d").ok()?;
    let last = NaiveDate::parse_from_str(last, "%Y%m%d").ok()?;
    Some((first, last))
}

fn row_at(df: &DataFrame, index: usize) -> Result<Row, TableError> {
    let mut fields = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let text = column.cast(&DataType::String)?;
        let value = text.str()?.get(index).unwrap_or_default().to_string();
        fields.push((column.name().to_string(), value));
    }
    Ok(Row { fields })
}

/// Date-ordered walk over the rows of a table.
///
/// Exhaustion is the normal end of a pass; [`WeatherRows::rewind`] starts a
/// new one.
///
/// # Examples
///
/// ```no_run
/// use weather_diary::WeatherRows;
/// use std::path::Path;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut rows = WeatherRows::open(Path::new("dataset/sochi_weather_202401-202403.csv"))?;
/// for (date, row) in rows.by_ref() {
///     println!("{date}: {:?}", row.get("Температура (день)"));
/// }
/// rows.rewind();
/// assert!(rows.next().is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct WeatherRows {
    frame: DataFrame,
    dates: Vec<NaiveDate>,
    position: usize,
}

impl WeatherRows {
    pub fn open(path: &Path) -> Result<Self, TableError> {
        Self::from_frame(read_raw_table(path)?)
    }

    pub fn from_frame(df: DataFrame) -> Result<Self, TableError> {
        let schema = TableSchema::of_frame(&df);
        let date_column = schema.date_column().ok_or(TableError::NoDateColumn)?;
        let dates = date_values(&df, date_column)?;

        let mut order: Vec<usize> = (0..dates.len()).collect();
        order.sort_by_key(|&i| dates[i]);
        let frame = take_rows(&df, &order)?;
        let dates = order.iter().map(|&i| dates[i]).collect();

        Ok(Self {
            frame,
            dates,
            position: 0,
        })
    }

    pub fn rewind(&mut self) {
        self.position = 0;
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

impl Iterator for WeatherRows {
    type Item = (NaiveDate, Row);

    fn next(&mut self) -> Option<Self::Item> {
        let date = *self.dates.get(self.position)?;
        let row = row_at(&self.frame, self.position).ok()?;
        self.position += 1;
        Some((date, row))
    }
}
