use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use weather_diary::{DateLookup, Month, Settings, WeatherDiary};

#[derive(Parser)]
#[command(name = "weather-diary")]
#[command(about = "Scrape the Gismeteo weather diary and prepare the tables for analysis")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true, help = "JSON settings file")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape an inclusive range of months into the dataset directory
    Scrape {
        #[arg(help = "First month, MM.YYYY")]
        start: Month,
        #[arg(help = "Last month, MM.YYYY")]
        end: Month,
    },

    /// One-hot encode cloudiness and wind and clean numeric columns
    Preprocess { input: PathBuf },

    /// Normalise column names, impute gaps and add Fahrenheit columns
    Finalize {
        input: PathBuf,
        #[arg(long, help = "Keep the original (Russian) column names")]
        no_translate: bool,
    },

    /// Write a descriptive annotation file next to a table
    Annotate {
        input: PathBuf,
        #[arg(short, long, help = "Annotation path [default: <input>_annotation.csv]")]
        output: Option<PathBuf>,
    },

    /// One file per ISO week
    SplitWeek { input: PathBuf },

    /// One file per calendar year
    SplitYear { input: PathBuf },

    /// Dates into X.csv, everything else into Y.csv
    SplitXy { input: PathBuf },

    /// Find the row for a date in a table, an X/Y pair or a split folder
    Lookup {
        #[arg(help = "Date, YYYY-MM-DD")]
        date: NaiveDate,
        #[arg(help = "A CSV table or a weekly/yearly split folder")]
        path: PathBuf,
        #[arg(long, help = "Y.csv to pair with an X.csv given as the path")]
        y_file: Option<PathBuf>,
    },

    /// Average temperatures per month
    MonthlyAvg { input: PathBuf },

    /// Descriptive temperature statistics
    Stats { input: PathBuf },

    /// Filter a feature table by temperature and date
    Filter {
        input: PathBuf,
        #[arg(long, allow_negative_numbers = true)]
        min_day: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        min_evening: Option<f64>,
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_json_file(path)?,
        None => Settings::default(),
    };
    run(WeatherDiary::new(settings), cli.command).await
}

async fn run(diary: WeatherDiary, command: Commands) -> Result<()> {
    match command {
        Commands::Scrape { start, end } => {
            let mut handle = diary.spawn_scrape(start, end)?;
            loop {
                tokio::select! {
                    Some(status) = handle.status.recv() => println!("{status}"),
                    Some(percent) = handle.progress.recv() => println!("{percent}%"),
                    else => break,
                }
            }
            match handle.completion.await.context("scrape worker ended without reporting")? {
                Some(file_name) => println!(
                    "Saved {}",
                    diary.settings().dataset_dir.join(file_name).display()
                ),
                None => bail!("scrape failed, see the log for details"),
            }
        }
        Commands::Preprocess { input } => {
            let saved = diary.preprocess_to_file(&input)?;
            println!("Saved {}", saved.display());
        }
        Commands::Finalize { input, no_translate } => {
            let (saved, report) = diary.finalize(&input, !no_translate)?;
            println!("{report}");
            println!("Saved {}", saved.display());
        }
        Commands::Annotate { input, output } => {
            let output = output.unwrap_or_else(|| annotation_path(&input));
            match diary.annotate(&input, &output)? {
                Some(path) => println!("Annotation written to {}", path.display()),
                None => bail!("cannot annotate {}", input.display()),
            }
        }
        Commands::SplitWeek { input } => report_split(diary.split_by_week(&input), &input)?,
        Commands::SplitYear { input } => report_split(diary.split_by_year(&input), &input)?,
        Commands::SplitXy { input } => report_split(diary.split_features(&input), &input)?,
        Commands::Lookup { date, path, y_file } => {
            let row = if let Some(y_file) = y_file {
                diary.lookup_in_split(date, &path, &y_file)?
            } else if path.is_dir() {
                diary.lookup_in_folder(date, &path)?
            } else {
                match diary.lookup(date, &path)? {
                    DateLookup::Found(row) => Some(row),
                    DateLookup::OutOfRange { min, max } => {
                        bail!("{date} is outside the table's range {min} - {max}")
                    }
                    DateLookup::Missing => None,
                }
            };
            match row {
                Some(row) => {
                    for (column, value) in row.fields {
                        println!("{column}: {value}");
                    }
                }
                None => println!("No data for {date}"),
            }
        }
        Commands::MonthlyAvg { input } => {
            let (averages, saved) = diary.monthly_averages(&input)?;
            println!("{}", averages.table);
            println!("Saved {}", saved.display());
        }
        Commands::Stats { input } => println!("{}", diary.temperature_stats(&input)?),
        Commands::Filter {
            input,
            min_day,
            min_evening,
            from,
            to,
        } => {
            let filtered = diary
                .filter()
                .input(&input)
                .maybe_min_day_temperature(min_day)
                .maybe_min_evening_temperature(min_evening)
                .maybe_start(from)
                .maybe_end(to)
                .call()?;
            println!("{}", filtered.table);
            if let Some(saved) = filtered.saved {
                println!("Saved {}", saved.display());
            }
        }
    }
    Ok(())
}

fn annotation_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "table".to_string());
    input.with_file_name(format!("{stem}_annotation.csv"))
}

fn report_split(result: Option<PathBuf>, input: &Path) -> Result<()> {
    match result {
        Some(dir) => {
            println!("Files written to {}", dir.display());
            Ok(())
        }
        None => bail!("splitting {} failed, see the log for details", input.display()),
    }
}
