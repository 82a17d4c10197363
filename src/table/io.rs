//! CSV reading and writing shared by the batch transforms.

use crate::table::error::TableError;
use chrono::NaiveDate;
use log::debug;
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const ISO_DATE: &str = "%Y-%m-%d";

/// Reads a CSV keeping every column as text, so cells survive a rewrite unchanged.
pub fn read_raw_table(path: &Path) -> Result<DataFrame, TableError> {
    read_csv(path, Some(0))
}

/// Reads a CSV with column types inferred from every row, so a late
/// non-numeric cell turns its column into text instead of failing the read.
pub fn read_table(path: &Path) -> Result<DataFrame, TableError> {
    read_csv(path, None)
}

fn read_csv(path: &Path, infer_schema_length: Option<usize>) -> Result<DataFrame, TableError> {
    if !path.is_file() {
        return Err(TableError::InputNotFound(path.to_path_buf()));
    }
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(infer_schema_length)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| TableError::CsvRead(path.to_path_buf(), e))?
        .finish()
        .map_err(|e| TableError::CsvRead(path.to_path_buf(), e))?;
    debug!(
        "Read {} rows x {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

/// Writes `df` to `path`, creating parent directories.
///
/// The file is written next to its destination and moved into place, so a
/// failed write never leaves a truncated CSV behind.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<(), TableError> {
    write_csv_with(df, path, QuoteStyle::Necessary)
}

/// Like [`write_csv`], quoting every field.
pub fn write_csv_quoted(df: &mut DataFrame, path: &Path) -> Result<(), TableError> {
    write_csv_with(df, path, QuoteStyle::Always)
}

fn write_csv_with(df: &mut DataFrame, path: &Path, quote_style: QuoteStyle) -> Result<(), TableError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| TableError::OutputDirCreation(dir.clone(), e))?;

    let mut temp = NamedTempFile::new_in(&dir).map_err(|e| TableError::Io(dir.clone(), e))?;
    CsvWriter::new(temp.as_file_mut())
        .include_header(true)
        .with_quote_style(quote_style)
        .finish(df)
        .map_err(|e| TableError::CsvWrite(path.to_path_buf(), e))?;
    temp.persist(path)
        .map_err(|e| TableError::Io(path.to_path_buf(), e.error))?;
    Ok(())
}

/// Base name of a file without its extension, e.g. `sochi_weather_202401-202402`.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// The values of a column rendered as text.
pub fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, TableError> {
    let column = df
        .column(name)
        .map_err(|_| TableError::MissingColumn(name.to_string()))?;
    let as_text = column.cast(&DataType::String)?;
    Ok(as_text
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Numeric view of a column; values that do not convert become `None`.
pub fn float_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, TableError> {
    let column = df
        .column(name)
        .map_err(|_| TableError::MissingColumn(name.to_string()))?;
    if column.dtype() == &DataType::String {
        return Ok(column
            .str()?
            .into_iter()
            .map(|v| v.and_then(|s| s.trim().parse::<f64>().ok()))
            .collect());
    }
    let as_float = column.cast(&DataType::Float64)?;
    Ok(as_float.f64()?.into_iter().collect())
}

pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), ISO_DATE).ok()
}

/// Parses every value of a date column, failing on the first one that is not `YYYY-MM-DD`.
pub fn date_values(df: &DataFrame, name: &str) -> Result<Vec<NaiveDate>, TableError> {
    string_values(df, name)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            let value = value.unwrap_or_default();
            parse_iso_date(&value).ok_or_else(|| TableError::InvalidDate {
                column: name.to_string(),
                row,
                value,
            })
        })
        .collect()
}

pub fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Rows of `df` at `indices`, in that order.
pub fn take_rows(df: &DataFrame, indices: &[usize]) -> Result<DataFrame, TableError> {
    let idx: Vec<IdxSize> = indices.iter().map(|&i| i as IdxSize).collect();
    Ok(df.take(&IdxCa::from_vec("idx".into(), idx))?)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::tempdir;

    pub(crate) const SAMPLE_CSV: &str = "\
Дата,Температура (день),Давление (день),Облачность (день),Ветер (день),Температура (вечер),Давление (вечер),Облачность (вечер),Ветер (вечер)
2024-01-01,+5,750,Ясно,С 5 м/с,−3,752,Пасмурно,ЮЗ 2м/с
2024-01-02,−3,749,Малооблачно,СВ 3м/с,+1,751,Неизвестно,Ш
2024-01-03,Неизвестно,,Нет данных,В 1м/с,0,748,Переменная облачность,З 4м/с
";

    pub(crate) fn write_sample(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).expect("write sample csv");
        path
    }

    #[test]
    fn test_raw_read_keeps_text() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = write_sample(dir.path(), "raw.csv", SAMPLE_CSV);

        let df = read_raw_table(&path)?;
        assert_eq!(df.shape(), (3, 9));
        assert_eq!(df.column("Давление (день)")?.dtype(), &DataType::String);
        assert_eq!(
            string_values(&df, "Температура (день)")?,
            vec![
                Some("+5".to_string()),
                Some("−3".to_string()),
                Some("Неизвестно".to_string())
            ]
        );
        Ok(())
    }

    #[test]
    fn test_missing_input() {
        let result = read_raw_table(Path::new("/definitely/not/here.csv"));
        assert!(matches!(result, Err(TableError::InputNotFound(_))));
    }

    #[test]
    fn test_write_creates_directories() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let mut df = read_raw_table(&write_sample(dir.path(), "raw.csv", SAMPLE_CSV))?;
        let out = dir.path().join("a").join("b").join("copy.csv");

        write_csv(&mut df, &out)?;
        assert_eq!(fs::read_to_string(&out)?, SAMPLE_CSV);
        Ok(())
    }

    #[test]
    fn test_date_values_reports_bad_row() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = write_sample(dir.path(), "d.csv", "Дата,x\n2024-01-01,1\n01.02.2024,2\n");
        let df = read_raw_table(&path)?;

        match date_values(&df, "Дата") {
            Err(TableError::InvalidDate { row, value, .. }) => {
                assert_eq!(row, 1);
                assert_eq!(value, "01.02.2024");
            }
            other => panic!("expected InvalidDate, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem(Path::new("dataset/sochi_weather_202401-202402.csv")), "sochi_weather_202401-202402");
    }
}
