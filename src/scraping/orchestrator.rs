//! Month-by-month scraping run.

use crate::config::Settings;
use crate::scraping::error::ScrapeError;
use crate::scraping::fetcher::{PageFetcher, PageSource};
use crate::scraping::parser::parse_month;
use crate::scraping::run_log::RunLogger;
use crate::table::error::TableError;
use crate::table::io::write_csv;
use crate::types::month::Month;
use crate::types::record::{WeatherRecord, RAW_HEADER};
use log::{error, info};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, oneshot};

/// Receives notifications while a scrape runs.
pub trait ScrapeProgress: Send + Sync {
    /// Human-readable status, sent before each month is fetched.
    fn status(&self, _msg: &str) {}

    /// Percentage of months processed, sent after each month.
    fn progress(&self, _percent: u8) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl ScrapeProgress for NullProgress {}

/// Forwards notifications into the channels of a [`ScrapeHandle`].
pub struct ChannelProgress {
    progress: mpsc::UnboundedSender<u8>,
    status: mpsc::UnboundedSender<String>,
}

impl ScrapeProgress for ChannelProgress {
    fn status(&self, msg: &str) {
        let _ = self.status.send(msg.to_string());
    }

    fn progress(&self, percent: u8) {
        let _ = self.progress.send(percent);
    }
}

/// Receiving side of a scrape started with [`spawn_scrape`].
///
/// `completion` resolves exactly once, with the output file name or `None` if
/// the run failed. The progress and status channels close when the worker ends.
pub struct ScrapeHandle {
    pub progress: mpsc::UnboundedReceiver<u8>,
    pub status: mpsc::UnboundedReceiver<String>,
    pub completion: oneshot::Receiver<Option<String>>,
}

pub struct ScrapeOrchestrator<S> {
    source: S,
    city: String,
    dataset_dir: PathBuf,
    log_dir: PathBuf,
}

impl ScrapeOrchestrator<PageFetcher> {
    pub fn from_settings(settings: &Settings) -> Result<Self, ScrapeError> {
        Ok(Self::new(PageFetcher::new(settings)?, settings))
    }
}

impl<S: PageSource> ScrapeOrchestrator<S> {
    pub fn new(source: S, settings: &Settings) -> Self {
        Self {
            source,
            city: settings.city.clone(),
            dataset_dir: settings.dataset_dir.clone(),
            log_dir: settings.log_dir.clone(),
        }
    }

    /// Name of the CSV a run over `start..=end` produces.
    pub fn output_file_name(&self, start: Month, end: Month) -> String {
        format!(
            "{}_weather_{}-{}.csv",
            self.city,
            start.compact(),
            end.compact()
        )
    }

    /// Scrapes every month in `start..=end` and writes the result to the dataset directory.
    ///
    /// Months that fail to download or parse are logged and contribute no rows.
    /// Returns the file name (not the full path) of the written CSV.
    ///
    /// # Errors
    ///
    /// Only failing to open the run log or to write the output file is an error.
    pub async fn run(
        &self,
        start: Month,
        end: Month,
        progress: &dyn ScrapeProgress,
    ) -> Result<String, ScrapeError> {
        let file_name = self.output_file_name(start, end);
        let logger = RunLogger::create(&self.log_dir, &file_name)?;
        logger.scraping_start(start, end);

        let total_months = start.months_until(end);
        let mut records = Vec::new();
        let mut processed = 0;
        let mut current = start;

        while processed < total_months {
            progress.status(&format!("Fetching data for {}", current.dotted()));
            records.extend(self.scrape_month(current, &logger).await);
            current = current.next();
            processed += 1;
            progress.progress(percent(processed, total_months));
        }

        let path = self.dataset_dir.join(&file_name);
        if let Err(e) = write_records(&records, &path) {
            logger.error(&format!("Failed to save {}: {e}", path.display()));
            return Err(e);
        }
        logger.scraping_end(records.len());

        match logger.summary() {
            Ok(summary) => logger.info(&format!(
                "Collection summary: {} log lines, {} errors, {} warnings, {} info messages",
                summary.total, summary.errors, summary.warnings, summary.info
            )),
            Err(e) => error!("Could not summarise run log: {e}"),
        }

        Ok(file_name)
    }

    async fn scrape_month(&self, month: Month, logger: &RunLogger) -> Vec<WeatherRecord> {
        let url = self.source.url(month);
        let html = match self.source.fetch_page(month).await {
            Ok(html) => html,
            Err(e) => {
                logger.request_error(&url, &e);
                return Vec::new();
            }
        };

        match parse_month(&html, month) {
            None => {
                logger.missing_data(month, "data table not found on the page");
                Vec::new()
            }
            Some(table) => {
                for skipped in &table.skipped {
                    logger.warning(&format!("Partial data for {}: {skipped}", month.dotted()));
                }
                info!("Parsed {} days for {}", table.records.len(), month);
                table.records
            }
        }
    }
}

/// Runs a scrape on a background task.
///
/// The caller never blocks: progress, status and completion arrive on the
/// returned handle's channels. Must be called from within a tokio runtime.
pub fn spawn_scrape<S>(orchestrator: ScrapeOrchestrator<S>, start: Month, end: Month) -> ScrapeHandle
where
    S: PageSource + Send + Sync + 'static,
{
    let (progress_tx, progress_rx) = mpsc::unbounded_channel();
    let (status_tx, status_rx) = mpsc::unbounded_channel();
    let (done_tx, done_rx) = oneshot::channel();

    tokio::spawn(async move {
        let sink = ChannelProgress {
            progress: progress_tx,
            status: status_tx,
        };
        let outcome = match orchestrator.run(start, end, &sink).await {
            Ok(file_name) => Some(file_name),
            Err(e) => {
                error!("Scrape {start} - {end} failed: {e}");
                None
            }
        };
        drop(sink);
        let _ = done_tx.send(outcome);
    });

    ScrapeHandle {
        progress: progress_rx,
        status: status_rx,
        completion: done_rx,
    }
}

fn percent(processed: u32, total: u32) -> u8 {
    if total == 0 {
        return 100;
    }
    ((processed as f64 / total as f64) * 100.0).round().min(100.0) as u8
}

fn records_to_frame(records: &[WeatherRecord]) -> PolarsResult<DataFrame> {
    let rows: Vec<[String; 9]> = records.iter().map(WeatherRecord::to_row).collect();
    let columns = RAW_HEADER
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let values: Vec<String> = rows.iter().map(|row| row[i].clone()).collect();
            Column::new((*name).into(), values)
        })
        .collect();
    DataFrame::new(columns)
}

fn write_records(records: &[WeatherRecord], path: &Path) -> Result<(), ScrapeError> {
    let output_error = |e: TableError| ScrapeError::OutputWrite(path.to_path_buf(), e);
    let mut df = records_to_frame(records).map_err(|e| output_error(e.into()))?;
    write_csv(&mut df, path).map_err(output_error)?;
    info!("Saved {} records to {}", records.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraping::parser::tests::{day_row, page};
    use std::fs;
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Serves canned pages; months without a page fail like an unreachable host.
    struct CannedPages(HashMap<Month, String>);

    impl PageSource for CannedPages {
        fn url(&self, month: Month) -> String {
            format!("canned://{month}")
        }

        fn fetch_page(
            &self,
            month: Month,
        ) -> impl Future<Output = Result<String, ScrapeError>> + Send {
            let page = self.0.get(&month).cloned();
            let url = self.url(month);
            async move {
                match page {
                    Some(page) => Ok(page),
                    None => {
                        let e = reqwest::Client::new()
                            .get("not a url")
                            .send()
                            .await
                            .expect_err("invalid URL must fail");
                        Err(ScrapeError::NetworkRequest(url, e))
                    }
                }
            }
        }
    }

    #[derive(Default)]
    struct Recorded {
        statuses: Mutex<Vec<String>>,
        percents: Mutex<Vec<u8>>,
    }

    impl ScrapeProgress for Recorded {
        fn status(&self, msg: &str) {
            self.statuses.lock().unwrap().push(msg.to_string());
        }
        fn progress(&self, percent: u8) {
            self.percents.lock().unwrap().push(percent);
        }
    }

    fn settings_in(dir: &Path) -> Settings {
        Settings::builder()
            .dataset_dir(dir.join("dataset"))
            .log_dir(dir.join("weather_logs"))
            .build()
    }

    fn canned() -> CannedPages {
        let mut pages = HashMap::new();
        pages.insert(
            Month(2024, 1),
            page(&[
                day_row("1", Some("sun.png"), Some("dull.png")),
                day_row("2", None, Some("sunc.png")),
            ]),
        );
        pages.insert(
            Month(2024, 2),
            "<html><body><p>maintenance</p></body></html>".to_string(),
        );
        CannedPages(pages)
    }

    #[tokio::test]
    async fn test_run_skips_failed_months() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let settings = settings_in(dir.path());
        let orchestrator = ScrapeOrchestrator::new(canned(), &settings);
        let recorded = Recorded::default();

        let file_name = orchestrator
            .run(Month(2024, 1), Month(2024, 3), &recorded)
            .await?;
        assert_eq!(file_name, "sochi_weather_202401-202403.csv");

        let csv = fs::read_to_string(settings.dataset_dir.join(&file_name))?;
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], RAW_HEADER.join(","));
        assert!(lines[1].starts_with("2024-01-01,+5,750,Ясно,С 3м/с,−2,752,Пасмурно,ЮЗ 1м/с"));
        assert!(lines[2].starts_with("2024-01-02,+5,750,Нет данных,"));

        assert_eq!(*recorded.percents.lock().unwrap(), vec![33, 67, 100]);
        assert_eq!(
            *recorded.statuses.lock().unwrap(),
            vec![
                "Fetching data for 01.2024",
                "Fetching data for 02.2024",
                "Fetching data for 03.2024"
            ]
        );

        let log = fs::read_to_string(settings.log_dir.join("sochi_weather_202401-202403.log"))?;
        assert_eq!(log.matches(" - WARNING - ").count(), 1);
        assert_eq!(log.matches(" - ERROR - ").count(), 1);
        assert!(log.contains("canned://2024-03"));
        assert!(log.contains("Records collected: 2"));
        assert!(log.contains("Collection summary: 4 log lines, 1 errors, 1 warnings, 2 info messages"));
        Ok(())
    }

    #[tokio::test]
    async fn test_reversed_range_writes_header_only() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let settings = settings_in(dir.path());
        let orchestrator = ScrapeOrchestrator::new(canned(), &settings);
        let recorded = Recorded::default();

        let file_name = orchestrator
            .run(Month(2024, 3), Month(2024, 1), &recorded)
            .await?;

        let csv = fs::read_to_string(settings.dataset_dir.join(file_name))?;
        assert_eq!(csv.lines().count(), 1);
        assert!(recorded.percents.lock().unwrap().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_spawned_scrape_reports_through_channels() -> Result<(), Box<dyn std::error::Error>>
    {
        let dir = tempdir()?;
        let settings = settings_in(dir.path());
        let orchestrator = ScrapeOrchestrator::new(canned(), &settings);

        let mut handle = spawn_scrape(orchestrator, Month(2024, 1), Month(2024, 2));
        let outcome = (&mut handle.completion).await?;
        assert_eq!(outcome.as_deref(), Some("sochi_weather_202401-202402.csv"));

        let mut percents = Vec::new();
        while let Some(p) = handle.progress.recv().await {
            percents.push(p);
        }
        assert_eq!(percents, vec![50, 100]);

        let mut statuses = 0;
        while handle.status.recv().await.is_some() {
            statuses += 1;
        }
        assert_eq!(statuses, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_unwritable_output_fails_the_run() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let blocker = dir.path().join("dataset");
        fs::write(&blocker, "not a directory")?;
        let settings = settings_in(dir.path());
        let orchestrator = ScrapeOrchestrator::new(canned(), &settings);

        let result = orchestrator
            .run(Month(2024, 1), Month(2024, 1), &NullProgress)
            .await;
        assert!(matches!(
            result,
            Err(ScrapeError::OutputWrite(_, TableError::OutputDirCreation(..)))
        ));
        Ok(())
    }

    #[test]
    fn test_failed_save_leaves_no_partial_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let records: Vec<WeatherRecord> = Vec::new();
        // A directory in place of the output file makes the final rename fail.
        let target = dir.path().join("sochi_weather_202401-202401.csv");
        fs::create_dir(&target)?;

        let result = write_records(&records, &target);
        assert!(matches!(result, Err(ScrapeError::OutputWrite(..))));
        let leftovers: Vec<_> = fs::read_dir(dir.path())?.collect::<Result<_, _>>()?;
        assert_eq!(leftovers.len(), 1);
        assert!(target.is_dir());

        let good = dir.path().join("out").join("sochi_weather_202402-202402.csv");
        write_records(&records, &good)?;
        assert_eq!(fs::read_dir(dir.path().join("out"))?.count(), 1);
        let header = fs::read_to_string(&good)?;
        assert!(header.starts_with(RAW_HEADER[0]));
        Ok(())
    }

    #[test]
    fn test_percent_rounds() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(3, 3), 100);
        assert_eq!(percent(0, 0), 100);
    }
}
