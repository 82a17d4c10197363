//! Turns a raw scraped table into a model-ready feature table.
//!
//! Columns are handled by their [`ColumnKind`]:
//!
//! * cloudiness becomes one 0/1 indicator per canonical category, named
//!   `<column>-<label>`;
//! * wind becomes a speed column `<column> (м/с)` plus one 0/1 indicator per
//!   compass point, named `<column>-<token>`;
//! * temperature has its sign glyphs normalised and is parsed as `f64`;
//! * pressure is parsed as `f64` with unparseable values set to `0`.
//!
//! Everything else, including columns an earlier pass produced, is kept. The
//! row count never changes and remaining nulls are filled with zero.

use crate::table::error::TableError;
use crate::table::io::{read_raw_table, write_csv};
use crate::types::cloudiness::Cloudiness;
use crate::types::schema::{ColumnKind, TableSchema};
use crate::types::wind::{Wind, WindDirection, SPEED_UNIT};
use log::{debug, info};
use polars::prelude::*;
use std::path::Path;

const UNKNOWN_MARKER: &str = "Неизвестно";

/// Reads the CSV at `path` and preprocesses it.
pub fn preprocess(path: &Path) -> Result<DataFrame, TableError> {
    let raw = read_raw_table(path)?;
    let df = preprocess_frame(&raw)?;
    info!(
        "Preprocessed {}: {} rows, {} -> {} columns",
        path.display(),
        df.height(),
        raw.width(),
        df.width()
    );
    Ok(df)
}

/// Preprocesses an in-memory table.
///
/// Kept columns stay in their original order; cloudiness indicator groups
/// follow them, then the wind groups.
pub fn preprocess_frame(raw: &DataFrame) -> Result<DataFrame, TableError> {
    let schema = TableSchema::of_frame(raw);
    let mut kept: Vec<Column> = Vec::with_capacity(raw.width());
    let mut cloudiness: Vec<Column> = Vec::new();
    let mut wind: Vec<Column> = Vec::new();

    for spec in schema.columns() {
        let name = spec.name.as_str();
        match spec.kind {
            ColumnKind::Cloudiness => cloudiness.extend(cloudiness_indicators(raw, name)?),
            ColumnKind::Wind => wind.extend(wind_features(raw, name)?),
            ColumnKind::Temperature => kept.push(temperature_column(raw, name)?),
            ColumnKind::Pressure => kept.push(pressure_column(raw, name)?),
            ColumnKind::Date | ColumnKind::Derived | ColumnKind::Other => {
                kept.push(pass_through(raw, name)?)
            }
        }
    }
    debug!(
        "Encoded {} cloudiness and {} wind feature columns",
        cloudiness.len(),
        wind.len()
    );

    kept.extend(cloudiness);
    kept.extend(wind);
    Ok(DataFrame::new(kept)?)
}

/// Writes a preprocessed table to `output`.
pub fn save_preprocessed(df: &mut DataFrame, output: &Path) -> Result<(), TableError> {
    write_csv(df, output)?;
    info!("Saved preprocessed table to {}", output.display());
    Ok(())
}

fn text(raw: &DataFrame, name: &str) -> Result<StringChunked, TableError> {
    let column = raw
        .column(name)
        .map_err(|_| TableError::MissingColumn(name.to_string()))?;
    Ok(column.cast(&DataType::String)?.str()?.clone())
}

fn cloudiness_indicators(raw: &DataFrame, name: &str) -> Result<Vec<Column>, TableError> {
    let values = text(raw, name)?;
    Ok(Cloudiness::CANONICAL
        .iter()
        .map(|category| {
            let label = category.label();
            let flags: Vec<i64> = values
                .into_iter()
                .map(|v| i64::from(v.map(str::trim) == Some(label)))
                .collect();
            Column::new(format!("{name}-{label}").into(), flags)
        })
        .collect())
}

fn wind_features(raw: &DataFrame, name: &str) -> Result<Vec<Column>, TableError> {
    let parsed: Vec<Wind> = text(raw, name)?
        .into_iter()
        .map(|v| Wind::parse(v.unwrap_or("")))
        .collect();

    let speeds: Vec<f64> = parsed.iter().map(|w| w.speed).collect();
    let mut columns = vec![Column::new(
        format!("{name} ({SPEED_UNIT})").into(),
        speeds,
    )];
    for direction in WindDirection::ALL {
        let flags: Vec<i64> = parsed
            .iter()
            .map(|w| i64::from(w.direction == Some(direction)))
            .collect();
        columns.push(Column::new(
            format!("{name}-{}", direction.token()).into(),
            flags,
        ));
    }
    Ok(columns)
}

/// `+5` -> `5`, `−3` -> `-3`, the unknown marker -> `0`.
pub fn normalize_temperature(cell: &str) -> Option<f64> {
    cell.replace('+', "")
        .replace('−', "-")
        .replace(UNKNOWN_MARKER, "0")
        .trim()
        .parse::<f64>()
        .ok()
}

fn temperature_column(raw: &DataFrame, name: &str) -> Result<Column, TableError> {
    if let Some(numeric) = numeric_as_f64(raw, name)? {
        return Ok(numeric);
    }
    let values: Vec<f64> = text(raw, name)?
        .into_iter()
        .map(|v| v.and_then(normalize_temperature).unwrap_or(0.0))
        .collect();
    Ok(Column::new(name.into(), values))
}

fn pressure_column(raw: &DataFrame, name: &str) -> Result<Column, TableError> {
    if let Some(numeric) = numeric_as_f64(raw, name)? {
        return Ok(numeric);
    }
    let values: Vec<f64> = text(raw, name)?
        .into_iter()
        .map(|v| v.and_then(|s| s.trim().parse::<f64>().ok()).unwrap_or(0.0))
        .collect();
    Ok(Column::new(name.into(), values))
}

/// Already numeric columns are widened to `f64` with nulls set to zero.
fn numeric_as_f64(raw: &DataFrame, name: &str) -> Result<Option<Column>, TableError> {
    let column = raw
        .column(name)
        .map_err(|_| TableError::MissingColumn(name.to_string()))?;
    if column.dtype() == &DataType::String {
        return Ok(None);
    }
    let values: Vec<f64> = column
        .cast(&DataType::Float64)?
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .collect();
    Ok(Some(Column::new(name.into(), values)))
}

/// Keeps a column, restoring integer or float type for text columns whose
/// every value parses, and filling nulls with zero.
fn pass_through(raw: &DataFrame, name: &str) -> Result<Column, TableError> {
    let column = raw
        .column(name)
        .map_err(|_| TableError::MissingColumn(name.to_string()))?;
    let kind = ColumnKind::classify(name);

    match column.dtype() {
        DataType::String if kind != ColumnKind::Date => {
            let values = column.str()?;
            let present: Vec<&str> = values.into_iter().flatten().collect();
            if !present.is_empty() && present.iter().all(|s| s.trim().parse::<i64>().is_ok()) {
                let parsed: Vec<i64> = values
                    .into_iter()
                    .map(|v| v.and_then(|s| s.trim().parse().ok()).unwrap_or(0))
                    .collect();
                return Ok(Column::new(name.into(), parsed));
            }
            if !present.is_empty() && present.iter().all(|s| s.trim().parse::<f64>().is_ok()) {
                let parsed: Vec<f64> = values
                    .into_iter()
                    .map(|v| v.and_then(|s| s.trim().parse().ok()).unwrap_or(0.0))
                    .collect();
                return Ok(Column::new(name.into(), parsed));
            }
            let filled: Vec<&str> = values.into_iter().map(|v| v.unwrap_or("0")).collect();
            Ok(Column::new(name.into(), filled))
        }
        DataType::String => {
            let filled: Vec<&str> = column.str()?.into_iter().map(|v| v.unwrap_or("0")).collect();
            Ok(Column::new(name.into(), filled))
        }
        DataType::Int64 => {
            let filled: Vec<i64> = column.i64()?.into_iter().map(|v| v.unwrap_or(0)).collect();
            Ok(Column::new(name.into(), filled))
        }
        DataType::Float64 => {
            let filled: Vec<f64> = column.f64()?.into_iter().map(|v| v.unwrap_or(0.0)).collect();
            Ok(Column::new(name.into(), filled))
        }
        _ => Ok(column.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::io::tests::{write_sample, SAMPLE_CSV};
    use crate::table::io::read_table;
    use tempfile::tempdir;

    fn floats(df: &DataFrame, name: &str) -> Result<Vec<f64>, PolarsError> {
        Ok(df.column(name)?.f64()?.into_no_null_iter().collect())
    }

    fn ints(df: &DataFrame, name: &str) -> Result<Vec<i64>, PolarsError> {
        Ok(df.column(name)?.i64()?.into_no_null_iter().collect())
    }

    #[test]
    fn test_temperature_glyphs() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let df = preprocess(&write_sample(dir.path(), "raw.csv", SAMPLE_CSV))?;

        assert_eq!(floats(&df, "Температура (день)")?, vec![5.0, -3.0, 0.0]);
        assert_eq!(floats(&df, "Температура (вечер)")?, vec![-3.0, 1.0, 0.0]);
        Ok(())
    }

    #[test]
    fn test_pressure_falls_back_to_zero() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let df = preprocess(&write_sample(dir.path(), "raw.csv", SAMPLE_CSV))?;
        assert_eq!(floats(&df, "Давление (день)")?, vec![750.0, 749.0, 0.0]);
        Ok(())
    }

    #[test]
    fn test_column_layout_and_row_count() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let df = preprocess(&write_sample(dir.path(), "raw.csv", SAMPLE_CSV))?;

        assert_eq!(df.height(), 3);
        // date + 2 temperature + 2 pressure + 2 * 4 cloudiness + 2 * (1 + 8) wind
        assert_eq!(df.width(), 31);
        let names: Vec<&str> = df.get_column_names().into_iter().map(|n| n.as_str()).collect();
        assert_eq!(names[0], "Дата");
        assert_eq!(names[5], "Облачность (день)-Ясно");
        assert_eq!(names[13], "Ветер (день) (м/с)");
        assert_eq!(names[14], "Ветер (день)-С");
        assert!(!names.contains(&"Облачность (день)"));
        assert!(!names.contains(&"Ветер (вечер)"));
        Ok(())
    }

    #[test]
    fn test_cloudiness_indicators_are_exclusive() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let df = preprocess(&write_sample(dir.path(), "raw.csv", SAMPLE_CSV))?;

        for period in ["день", "вечер"] {
            let groups: Vec<Vec<i64>> = Cloudiness::CANONICAL
                .iter()
                .map(|c| ints(&df, &format!("Облачность ({period})-{}", c.label())))
                .collect::<Result<_, _>>()?;
            for row in 0..df.height() {
                let hot: i64 = groups.iter().map(|g| g[row]).sum();
                assert!(hot <= 1, "row {row} of {period} has {hot} indicators set");
            }
        }

        assert_eq!(ints(&df, "Облачность (день)-Ясно")?, vec![1, 0, 0]);
        assert_eq!(ints(&df, "Облачность (день)-Малооблачно")?, vec![0, 1, 0]);
        // "Нет данных" and "Неизвестно" set no indicator
        assert_eq!(ints(&df, "Облачность (вечер)-Пасмурно")?, vec![1, 0, 0]);
        assert_eq!(
            ints(&df, "Облачность (вечер)-Переменная облачность")?,
            vec![0, 0, 1]
        );
        Ok(())
    }

    #[test]
    fn test_wind_speed_and_direction() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let df = preprocess(&write_sample(dir.path(), "raw.csv", SAMPLE_CSV))?;

        assert_eq!(floats(&df, "Ветер (день) (м/с)")?, vec![5.0, 3.0, 1.0]);
        assert_eq!(floats(&df, "Ветер (вечер) (м/с)")?, vec![2.0, 0.0, 4.0]);
        assert_eq!(ints(&df, "Ветер (день)-С")?, vec![1, 0, 0]);
        assert_eq!(ints(&df, "Ветер (день)-СВ")?, vec![0, 1, 0]);
        assert_eq!(ints(&df, "Ветер (вечер)-ЮЗ")?, vec![1, 0, 0]);
        // calm
        for direction in WindDirection::ALL {
            let flags = ints(&df, &format!("Ветер (вечер)-{}", direction.token()))?;
            assert_eq!(flags[1], 0);
        }
        Ok(())
    }

    #[test]
    fn test_second_pass_is_a_no_op() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let once = preprocess(&write_sample(dir.path(), "raw.csv", SAMPLE_CSV))?;
        let twice = preprocess_frame(&once)?;
        assert!(once.equals(&twice));

        let mut saved = once.clone();
        let out = dir.path().join("pre").join("once.csv");
        save_preprocessed(&mut saved, &out)?;
        let reread = preprocess(&out)?;
        assert_eq!(reread.get_column_names(), once.get_column_names());
        assert_eq!(ints(&reread, "Ветер (день)-СВ")?, vec![0, 1, 0]);
        assert_eq!(floats(&reread, "Ветер (вечер) (м/с)")?, vec![2.0, 0.0, 4.0]);

        let inferred = read_table(&out)?;
        assert_eq!(inferred.shape(), once.shape());
        Ok(())
    }

    #[test]
    fn test_normalize_temperature() {
        assert_eq!(normalize_temperature("+12"), Some(12.0));
        assert_eq!(normalize_temperature("−7"), Some(-7.0));
        assert_eq!(normalize_temperature("Неизвестно"), Some(0.0));
        assert_eq!(normalize_temperature("n/a"), None);
    }
}
