//! Final clean-up of a preprocessed table before analysis.

use crate::table::error::TableError;
use crate::table::io::{file_stem, float_values, is_numeric, write_csv};
use crate::types::cloudiness::Cloudiness;
use crate::types::schema::{ColumnKind, TableSchema};
use crate::types::wind::WindDirection;
use log::{info, warn};
use polars::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};

/// Fill value for text cells that are missing.
pub const NO_DATA: &str = "Нет данных";

#[derive(Debug, Clone, PartialEq)]
pub struct MissingColumn {
    pub name: String,
    pub count: usize,
    /// Share of rows missing, 0..=100.
    pub percent: f64,
}

/// Missing values per column, counted before imputation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MissingValueReport {
    pub rows: usize,
    pub columns: Vec<MissingColumn>,
}

impl MissingValueReport {
    pub fn has_missing(&self) -> bool {
        !self.columns.is_empty()
    }

    pub fn total(&self) -> usize {
        self.columns.iter().map(|c| c.count).sum()
    }
}

impl fmt::Display for MissingValueReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.has_missing() {
            return write!(f, "No missing values (0 missing values in every column)");
        }
        writeln!(f, "Missing values:")?;
        for column in &self.columns {
            writeln!(
                f,
                "{}: {} ({:.2}%)",
                column.name, column.count, column.percent
            )?;
        }
        Ok(())
    }
}

/// Lowercases column names and replaces spaces with underscores, e.g.
/// `Облачность (день)-Ясно` -> `облачность_(день)-ясно`.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// Maps a normalised column name to the English vocabulary, e.g.
/// `ветер_(вечер)-сз` -> `wind_direction_evening_nw`.
///
/// Names outside the vocabulary return `None`.
pub fn translate_name(name: &str) -> Option<String> {
    if name == "дата" {
        return Some("date".to_string());
    }
    let (base, rest) = name.split_once("_(")?;
    let (period, tail) = rest.split_once(')')?;
    let period = match period {
        "день" => "day",
        "вечер" => "evening",
        _ => return None,
    };

    match (base, tail) {
        ("температура", "") => Some(format!("temperature_{period}")),
        ("давление", "") => Some(format!("pressure_{period}")),
        ("ветер", "_(м/с)") => Some(format!("wind_speed_{period}")),
        ("облачность", tail) => {
            let label = tail.strip_prefix('-')?;
            Cloudiness::CANONICAL
                .iter()
                .find(|c| normalize_name(c.label()) == label)
                .map(|c| format!("cloudiness_{period}_{}", c.english()))
        }
        ("ветер", tail) => {
            let token = tail.strip_prefix('-')?;
            WindDirection::ALL
                .iter()
                .find(|d| d.token().to_lowercase() == token)
                .map(|d| format!("wind_direction_{period}_{}", d.english()))
        }
        _ => None,
    }
}

/// Prepares a feature table for analysis.
///
/// Column names are normalised (and translated when `translate` is set),
/// missing numeric values take their column mean, missing text takes
/// [`NO_DATA`] and every temperature column gains a `<name>_fahrenheit`
/// companion. The returned report describes the table as it came in.
pub fn finalize_features(
    df: &DataFrame,
    translate: bool,
) -> Result<(DataFrame, MissingValueReport), TableError> {
    let mut out = df.clone();
    let names: Vec<String> = out
        .get_column_names()
        .into_iter()
        .map(|n| {
            let normalized = normalize_name(n.as_str());
            if translate {
                translate_name(&normalized).unwrap_or(normalized)
            } else {
                normalized
            }
        })
        .collect();
    out.set_column_names(names.iter().map(String::as_str))?;

    let report = missing_values(&out);
    if report.has_missing() {
        warn!("{} missing values across {} columns", report.total(), report.columns.len());
    }

    let schema = TableSchema::of_frame(&out);
    for spec in schema.columns() {
        let column = out.column(&spec.name)?;
        if column.null_count() == 0 {
            continue;
        }
        if is_numeric(column.dtype()) {
            let values = float_values(&out, &spec.name)?;
            let present: Vec<f64> = values.iter().flatten().copied().collect();
            if present.is_empty() {
                continue;
            }
            let mean = present.iter().sum::<f64>() / present.len() as f64;
            let filled: Vec<f64> = values.into_iter().map(|v| v.unwrap_or(mean)).collect();
            out.with_column(Column::new(spec.name.as_str().into(), filled))?;
        } else if column.dtype() == &DataType::String && spec.kind != ColumnKind::Date {
            let filled: Vec<String> = column
                .str()?
                .into_iter()
                .map(|v| v.unwrap_or(NO_DATA).to_string())
                .collect();
            out.with_column(Column::new(spec.name.as_str().into(), filled))?;
        }
    }

    for spec in schema.of_kind(ColumnKind::Temperature) {
        let target = format!("{}_fahrenheit", spec.name);
        if out.column(&target).is_ok() {
            continue;
        }
        let fahrenheit: Vec<Option<f64>> = float_values(&out, &spec.name)?
            .into_iter()
            .map(|c| c.map(celsius_to_fahrenheit))
            .collect();
        out.with_column(Column::new(target.into(), fahrenheit))?;
    }

    Ok((out, report))
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

fn missing_values(df: &DataFrame) -> MissingValueReport {
    let rows = df.height();
    let columns = df
        .get_columns()
        .iter()
        .filter(|c| c.null_count() > 0)
        .map(|c| MissingColumn {
            name: c.name().to_string(),
            count: c.null_count(),
            percent: if rows == 0 {
                0.0
            } else {
                c.null_count() as f64 / rows as f64 * 100.0
            },
        })
        .collect();
    MissingValueReport { rows, columns }
}

/// Writes a finalised table to `<analysis_dir>/<input base name>_processed.csv`.
pub fn save_processed(
    df: &mut DataFrame,
    analysis_dir: &Path,
    source: &Path,
) -> Result<PathBuf, TableError> {
    let output = analysis_dir.join(format!("{}_processed.csv", file_stem(source)));
    write_csv(df, &output)?;
    info!("Saved processed table to {}", output.display());
    Ok(output)
}
