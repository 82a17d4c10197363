//! Descriptive sidecar file for a weather table.
//!
//! The annotation is a quote-all CSV with the header `Параметр,Значение`: a
//! general block (file name, shape, date bounds) followed by one row per
//! column describing its type, cardinality and a few sampled values.

use crate::table::error::TableError;
use crate::table::io::{read_table, string_values, write_csv_quoted};
use crate::types::schema::TableSchema;
use log::{info, warn};
use polars::prelude::*;
use rand::seq::index::sample;
use std::path::{Path, PathBuf};

pub const PARAMETER_HEADER: &str = "Параметр";
pub const VALUE_HEADER: &str = "Значение";
const MAX_SAMPLES: usize = 5;

/// Per-column summary line of an annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub dtype: String,
    pub unique: usize,
    pub samples: Vec<String>,
}

impl ColumnInfo {
    pub fn describe(&self) -> String {
        format!(
            "Тип: {}, Уникальных значений: {}, Примеры: {}",
            self.dtype,
            self.unique,
            self.samples.join(", ")
        )
    }
}

/// Writes the annotation of `input` to `output`.
///
/// A missing or unreadable input is logged and yields `Ok(None)`. Failing to
/// write the annotation is an error.
pub fn create_annotation(input: &Path, output: &Path) -> Result<Option<PathBuf>, TableError> {
    let df = match read_table(input) {
        Ok(df) => df,
        Err(e) => {
            warn!("Cannot annotate {}: {}", input.display(), e);
            return Ok(None);
        }
    };

    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (start, end) = date_bounds(&df)?;

    let mut parameters: Vec<String> = vec![
        "Имя файла".to_string(),
        "Количество строк".to_string(),
        "Количество столбцов".to_string(),
        "Начальная дата".to_string(),
        "Конечная дата".to_string(),
    ];
    let mut values: Vec<String> = vec![
        file_name,
        df.height().to_string(),
        df.width().to_string(),
        start,
        end,
    ];
    for info in column_infos(&df)? {
        values.push(info.describe());
        parameters.push(info.name);
    }

    let mut annotation = DataFrame::new(vec![
        Column::new(PARAMETER_HEADER.into(), parameters),
        Column::new(VALUE_HEADER.into(), values),
    ])?;
    write_csv_quoted(&mut annotation, output)?;
    info!("Annotation of {} written to {}", input.display(), output.display());
    Ok(Some(output.to_path_buf()))
}

/// Loads an annotation file back as a two-column table.
pub fn read_annotation(path: &Path) -> Result<DataFrame, TableError> {
    crate::table::io::read_raw_table(path)
}

/// Type, distinct count and up to five randomly sampled values of every column.
///
/// Sampling draws rows without replacement and is not seeded.
pub fn column_infos(df: &DataFrame) -> Result<Vec<ColumnInfo>, TableError> {
    let mut rng = rand::rng();
    let mut infos = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let name = column.name().to_string();
        let unique = column.as_materialized_series().drop_nulls().n_unique()?;
        let rendered = string_values(df, &name)?;
        let amount = MAX_SAMPLES.min(unique).min(rendered.len());
        let samples = sample(&mut rng, rendered.len(), amount)
            .into_iter()
            .map(|i| rendered[i].clone().unwrap_or_default())
            .collect();
        infos.push(ColumnInfo {
            name,
            dtype: column.dtype().to_string(),
            unique,
            samples,
        });
    }
    Ok(infos)
}

fn date_bounds(df: &DataFrame) -> Result<(String, String), TableError> {
    let schema = TableSchema::of_frame(df);
    let Some(date_column) = schema.date_column() else {
        return Ok((String::new(), String::new()));
    };
    let dates: Vec<String> = string_values(df, date_column)?.into_iter().flatten().collect();
    Ok((
        dates.iter().min().cloned().unwrap_or_default(),
        dates.iter().max().cloned().unwrap_or_default(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::io::tests::{write_sample, SAMPLE_CSV};
    use crate::table::io::read_raw_table;
    use tempfile::tempdir;

    #[test]
    fn test_annotation_layout() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let input = write_sample(dir.path(), "sochi_weather_202401-202401.csv", SAMPLE_CSV);
        let output = dir.path().join("notes").join("annotation.csv");

        let written = create_annotation(&input, &output)?;
        assert_eq!(written.as_deref(), Some(output.as_path()));

        let annotation = read_annotation(&output)?;
        assert_eq!(annotation.shape(), (5 + 9, 2));
        let names: Vec<&str> = annotation
            .get_column_names()
            .into_iter()
            .map(|n| n.as_str())
            .collect();
        assert_eq!(names, vec![PARAMETER_HEADER, VALUE_HEADER]);

        let values = string_values(&annotation, VALUE_HEADER)?;
        assert_eq!(values[0].as_deref(), Some("sochi_weather_202401-202401.csv"));
        assert_eq!(values[1].as_deref(), Some("3"));
        assert_eq!(values[2].as_deref(), Some("9"));
        assert_eq!(values[3].as_deref(), Some("2024-01-01"));
        assert_eq!(values[4].as_deref(), Some("2024-01-03"));

        let parameters = string_values(&annotation, PARAMETER_HEADER)?;
        assert_eq!(parameters[5].as_deref(), Some("Дата"));
        let date_info = values[5].clone().unwrap_or_default();
        assert!(date_info.starts_with("Тип: "));
        assert!(date_info.contains("Уникальных значений: 3"));
        Ok(())
    }

    #[test]
    fn test_every_field_is_quoted() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let input = write_sample(dir.path(), "raw.csv", SAMPLE_CSV);
        let output = dir.path().join("annotation.csv");
        create_annotation(&input, &output)?;

        let text = std::fs::read_to_string(&output)?;
        let second = text.lines().nth(1).ok_or("annotation too short")?;
        assert_eq!(second, "\"Имя файла\",\"raw.csv\"");
        Ok(())
    }

    #[test]
    fn test_sample_count_bounded_by_distinct_values() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let input = write_sample(
            dir.path(),
            "few.csv",
            "Дата,flag\n2024-01-01,a\n2024-01-02,a\n2024-01-03,b\n2024-01-04,a\n2024-01-05,b\n2024-01-06,a\n",
        );
        let infos = column_infos(&read_raw_table(&input)?)?;

        assert_eq!(infos[0].unique, 6);
        assert_eq!(infos[0].samples.len(), 5);
        assert_eq!(infos[1].unique, 2);
        assert_eq!(infos[1].samples.len(), 2);
        assert!(infos[1].samples.iter().all(|s| s == "a" || s == "b"));
        Ok(())
    }

    #[test]
    fn test_late_text_cell_in_numeric_column() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let mut csv = String::from("Дата,Температура (день),Давление (день)\n");
        let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("date")?;
        for (i, day) in start.iter_days().take(150).enumerate() {
            let pressure = if i == 119 { "н/д" } else { "750" };
            csv.push_str(&format!("{},+12,{pressure}\n", day.format("%Y-%m-%d")));
        }
        let input = write_sample(dir.path(), "long.csv", &csv);
        let output = dir.path().join("annotation.csv");

        assert_eq!(create_annotation(&input, &output)?, Some(output.clone()));
        let annotation = read_annotation(&output)?;
        assert_eq!(annotation.height(), 5 + 3);
        let values = string_values(&annotation, VALUE_HEADER)?;
        assert_eq!(values[1].as_deref(), Some("150"));
        let pressure = values[7].clone().unwrap_or_default();
        assert!(pressure.starts_with("Тип: str"), "{pressure}");
        assert!(pressure.contains("Уникальных значений: 2"));
        Ok(())
    }

    #[test]
    fn test_missing_input_is_soft() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let result = create_annotation(&dir.path().join("nope.csv"), &dir.path().join("a.csv"))?;
        assert_eq!(result, None);
        assert!(!dir.path().join("a.csv").exists());
        Ok(())
    }
}
