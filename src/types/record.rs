use crate::types::cloudiness::Cloudiness;
use chrono::NaiveDate;

pub const DATE_COLUMN: &str = "Дата";

/// Header of every scraped CSV, in column order.
pub const RAW_HEADER: [&str; 9] = [
    DATE_COLUMN,
    "Температура (день)",
    "Давление (день)",
    "Облачность (день)",
    "Ветер (день)",
    "Температура (вечер)",
    "Давление (вечер)",
    "Облачность (вечер)",
    "Ветер (вечер)",
];

/// Readings taken at one time of day. Text is kept exactly as scraped.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub temperature: String,
    pub pressure: String,
    pub cloudiness: Cloudiness,
    pub wind: String,
}

/// One day of the diary.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRecord {
    pub date: NaiveDate,
    pub day: Reading,
    pub evening: Reading,
}

impl WeatherRecord {
    /// The record as a raw CSV row, matching [`RAW_HEADER`].
    pub fn to_row(&self) -> [String; 9] {
        [
            self.date.format("%Y-%m-%d").to_string(),
            self.day.temperature.clone(),
            self.day.pressure.clone(),
            self.day.cloudiness.label().to_string(),
            self.day.wind.clone(),
            self.evening.temperature.clone(),
            self.evening.pressure.clone(),
            self.evening.cloudiness.label().to_string(),
            self.evening.wind.clone(),
        ]
    }
}
