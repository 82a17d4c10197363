//! Extraction of the monthly diary table.
//!
//! The page has a single data table laid out with legacy attributes
//! (`align="center" valign="top" border="0"`). After two header rows each row
//! is one day, with cells at fixed positions:
//!
//! | index | content                |
//! |-------|------------------------|
//! | 0     | day of month           |
//! | 1..=5 | day readings           |
//! | 6..=10| evening readings       |
//!
//! Within a reading block: temperature, pressure, cloudiness icon, (unused),
//! wind.

use crate::types::cloudiness::Cloudiness;
use crate::types::month::Month;
use crate::types::record::{Reading, WeatherRecord};
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

pub const MIN_CELLS: usize = 11;
const HEADER_ROWS: usize = 2;
const EVENING_OFFSET: usize = 5;

static TABLE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"table[align="center"][valign="top"][border="0"]"#)
        .expect("static table selector")
});
static ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("static row selector"));
static CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("static cell selector"));
static ICON: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img.screen_icon").expect("static icon selector"));

/// A table row that did not yield a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkippedRow {
    TooFewCells { row: usize, cells: usize },
    InvalidDay { row: usize, text: String },
}

impl std::fmt::Display for SkippedRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkippedRow::TooFewCells { row, cells } => write!(
                f,
                "row {row} has {cells} cells, expected at least {MIN_CELLS}"
            ),
            SkippedRow::InvalidDay { row, text } => {
                write!(f, "row {row} has an invalid day of month '{text}'")
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthTable {
    pub records: Vec<WeatherRecord>,
    pub skipped: Vec<SkippedRow>,
}

/// Parses one month's diary page.
///
/// Returns `None` when the data table is missing from the page.
pub fn parse_month(html: &str, month: Month) -> Option<MonthTable> {
    let document = Html::parse_document(html);
    let table = document.select(&TABLE).next()?;

    let mut parsed = MonthTable::default();
    for (index, row) in table.select(&ROW).enumerate().skip(HEADER_ROWS) {
        let cells: Vec<ElementRef> = row.select(&CELL).collect();
        if cells.len() < MIN_CELLS {
            parsed.skipped.push(SkippedRow::TooFewCells {
                row: index,
                cells: cells.len(),
            });
            continue;
        }

        let day_text = cell_text(&cells[0]);
        let Some(date) = day_text
            .parse::<u32>()
            .ok()
            .and_then(|day| NaiveDate::from_ymd_opt(month.year(), month.month(), day))
        else {
            parsed.skipped.push(SkippedRow::InvalidDay {
                row: index,
                text: day_text,
            });
            continue;
        };

        parsed.records.push(WeatherRecord {
            date,
            day: reading(&cells, 1),
            evening: reading(&cells, 1 + EVENING_OFFSET),
        });
    }
    Some(parsed)
}

/// Resolves the cloudiness icon inside a table cell.
///
/// An icon with a known file name maps to its category, an unknown one to
/// [`Cloudiness::Unknown`], and a cell without an icon to [`Cloudiness::NoData`].
pub fn resolve_cloudiness(cell: &ElementRef) -> Cloudiness {
    cell.select(&ICON)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(Cloudiness::from_icon)
        .unwrap_or(Cloudiness::NoData)
}

fn reading(cells: &[ElementRef], start: usize) -> Reading {
    Reading {
        temperature: cell_text(&cells[start]),
        pressure: cell_text(&cells[start + 1]),
        cloudiness: resolve_cloudiness(&cells[start + 2]),
        wind: last_line(&cells[start + 4]),
    }
}

fn cell_text(cell: &ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// The wind cell holds an icon caption line above the reading; the reading is the last line.
fn last_line(cell: &ElementRef) -> String {
    let text = cell.text().collect::<String>();
    text.trim().lines().last().unwrap_or("").trim().to_string()
}
