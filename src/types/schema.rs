//! Column schema of a weather table, resolved once from the header.
//!
//! Raw tables use Cyrillic headers, finalised feature tables use lowercase
//! (optionally English) ones. Both resolve to the same [`ColumnKind`]s, and
//! columns that were already produced by an encoding pass resolve to
//! [`ColumnKind::Derived`] so a second pass leaves them alone.

use polars::prelude::DataFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Date,
    Temperature,
    Pressure,
    Cloudiness,
    Wind,
    /// Indicator, speed or Fahrenheit columns created by an earlier pass.
    Derived,
    Other,
}

impl ColumnKind {
    pub fn classify(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower == "дата" || lower == "date" {
            return ColumnKind::Date;
        }
        if lower.contains('-')
            || lower.contains("(м/с)")
            || lower.contains("fahrenheit")
            || lower.starts_with("cloudiness_")
            || lower.starts_with("wind_")
        {
            return ColumnKind::Derived;
        }
        if lower.contains("температура") || lower.contains("temperature") {
            ColumnKind::Temperature
        } else if lower.contains("давление") || lower.contains("pressure") {
            ColumnKind::Pressure
        } else if lower.contains("облачность") {
            ColumnKind::Cloudiness
        } else if lower.contains("ветер") {
            ColumnKind::Wind
        } else {
            ColumnKind::Other
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

/// Ordered `{name, kind}` pairs for every column of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    columns: Vec<ColumnSpec>,
}

impl TableSchema {
    pub fn resolve<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let columns = names
            .into_iter()
            .map(|name| ColumnSpec {
                name: name.as_ref().to_string(),
                kind: ColumnKind::classify(name.as_ref()),
            })
            .collect();
        Self { columns }
    }

    pub fn of_frame(df: &DataFrame) -> Self {
        Self::resolve(df.get_column_names().into_iter().map(|n| n.as_str()))
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn of_kind(&self, kind: ColumnKind) -> impl Iterator<Item = &ColumnSpec> {
        self.columns.iter().filter(move |c| c.kind == kind)
    }

    /// The date column: the first one named as such, falling back to the first column.
    pub fn date_column(&self) -> Option<&str> {
        self.of_kind(ColumnKind::Date)
            .next()
            .or_else(|| self.columns.first())
            .map(|c| c.name.as_str())
    }
}
