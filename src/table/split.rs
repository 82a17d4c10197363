//! Partitioning of a weather table by ISO week, by year, or into a date file
//! and a feature file.
//!
//! All three operations fail soft: a missing input or any processing error is
//! logged and `None` is returned. Cells are read and written as text, so the
//! outputs carry the input's values unchanged.

use crate::table::error::TableError;
use crate::table::io::{date_values, file_stem, read_raw_table, take_rows, write_csv};
use crate::types::schema::TableSchema;
use chrono::{Datelike, NaiveDate};
use log::{debug, error, info};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const WEEKLY_DIR: &str = "weekly_data";
pub const YEARLY_DIR: &str = "yearly_data";
pub const FEATURE_SPLIT_DIR: &str = "split_csv";
pub const X_FILE: &str = "X.csv";
pub const Y_FILE: &str = "Y.csv";

/// Writes one file per ISO week to `<dataset_dir>/weekly_data/<input base name>/`.
///
/// Each file is named after the first and last date it holds,
/// `YYYYMMDD_YYYYMMDD.csv`. Returns the output directory.
pub fn split_by_week(input: &Path, dataset_dir: &Path) -> Option<PathBuf> {
    soft(
        "weekly split",
        input,
        split_grouped(input, &dataset_dir.join(WEEKLY_DIR), |d| {
            let week = d.iso_week();
            (week.year(), week.week())
        }),
    )
}

/// Writes one file per calendar year to `<dataset_dir>/yearly_data/<input base name>/`.
pub fn split_by_year(input: &Path, dataset_dir: &Path) -> Option<PathBuf> {
    soft(
        "yearly split",
        input,
        split_grouped(input, &dataset_dir.join(YEARLY_DIR), |d| (d.year(), 0)),
    )
}

/// Splits a table into `X.csv`, holding only the first column under the
/// header `Date`, and `Y.csv`, holding every other column.
///
/// Every value of the first column must be a `YYYY-MM-DD` date; otherwise
/// nothing is written and `None` is returned.
pub fn split_features(input: &Path, dataset_dir: &Path) -> Option<PathBuf> {
    soft(
        "feature split",
        input,
        try_split_features(input, &dataset_dir.join(FEATURE_SPLIT_DIR)),
    )
}

fn soft(operation: &str, input: &Path, result: Result<PathBuf, TableError>) -> Option<PathBuf> {
    match result {
        Ok(dir) => {
            info!("{} of {} written to {}", operation, input.display(), dir.display());
            Some(dir)
        }
        Err(e) => {
            error!("{} of {} failed: {}", operation, input.display(), e);
            None
        }
    }
}

/// `YYYYMMDD_YYYYMMDD.csv` for a group spanning `first..=last`.
pub fn range_file_name(first: NaiveDate, last: NaiveDate) -> String {
    format!("{}_{}.csv", first.format("%Y%m%d"), last.format("%Y%m%d"))
}

fn split_grouped<K, F>(input: &Path, root: &Path, key: F) -> Result<PathBuf, TableError>
where
    K: Ord,
    F: Fn(NaiveDate) -> K,
{
    let df = read_raw_table(input)?;
    let schema = TableSchema::of_frame(&df);
    let date_column = schema.date_column().ok_or(TableError::NoDateColumn)?;
    let dates = date_values(&df, date_column)?;

    let mut groups: BTreeMap<K, Vec<usize>> = BTreeMap::new();
    for (row, date) in dates.iter().enumerate() {
        groups.entry(key(*date)).or_default().push(row);
    }

    let out_dir = root.join(file_stem(input));
    fs::create_dir_all(&out_dir).map_err(|e| TableError::OutputDirCreation(out_dir.clone(), e))?;

    for rows in groups.values() {
        let (Some(first), Some(last)) = (
            rows.iter().map(|&r| dates[r]).min(),
            rows.iter().map(|&r| dates[r]).max(),
        ) else {
            continue;
        };
        let mut part = take_rows(&df, rows)?;
        let path = out_dir.join(range_file_name(first, last));
        write_csv(&mut part, &path)?;
        debug!("Wrote {} rows to {}", part.height(), path.display());
    }
    Ok(out_dir)
}

fn try_split_features(input: &Path, root: &Path) -> Result<PathBuf, TableError> {
    let df = read_raw_table(input)?;
    let first = df
        .get_column_names()
        .first()
        .map(|n| n.to_string())
        .ok_or(TableError::NoDateColumn)?;
    date_values(&df, &first)?;

    let mut x = df.select([first.as_str()])?;
    x.set_column_names(["Date"])?;
    let mut y = df.drop(&first)?;

    let out_dir = root.join(file_stem(input));
    write_csv(&mut x, &out_dir.join(X_FILE))?;
    write_csv(&mut y, &out_dir.join(Y_FILE))?;
    Ok(out_dir)
}
