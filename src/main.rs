mod batch;
mod browser;
mod config;
mod dates;
mod error;
mod output;
mod parser;
mod records;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use crate::browser::ChromeSession;
use crate::config::Config;
use crate::records::StationRecord;

const PREVIEW_STATIONS: usize = 10;

#[derive(Parser)]
#[command(name = "kai_scraper", about = "KAI train schedule and station code scraper")]
struct Cli {
    /// JSON config file; anything it leaves out uses the built-in defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search every route and date through the booking site and save schedules as CSV
    Schedules {
        /// Run Chrome without a window
        #[arg(long)]
        headless: bool,
        /// Chrome/Chromium executable (default: search PATH)
        #[arg(long)]
        browser: Option<PathBuf>,
        /// First date to search, YYYY-MM-DD
        #[arg(long)]
        start: Option<String>,
        /// Number of consecutive days to search
        #[arg(short = 'n', long)]
        days: Option<u32>,
        /// Seconds to wait between searches
        #[arg(long)]
        delay: Option<u64>,
        /// CSV output path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Extract station name/code pairs from a saved Wikipedia page
    Stations {
        /// Saved HTML page
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Text output path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the effective configuration as JSON
    ShowConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load config")?;

    let result = match cli.command {
        Commands::Schedules {
            headless,
            browser,
            start,
            days,
            delay,
            output,
        } => {
            if headless {
                config.browser.headless = true;
            }
            if browser.is_some() {
                config.browser.executable = browser;
            }
            if let Some(start) = start {
                config.start_date = dates::parse_date(&start)?;
            }
            if let Some(days) = days {
                config.days = days;
            }
            if let Some(delay) = delay {
                config.delay_secs = delay;
            }
            if let Some(output) = output {
                config.schedules_output = output;
            }
            run_schedules(&config).await
        }
        Commands::Stations { input, output } => {
            let input = input.unwrap_or_else(|| config.stations_input.clone());
            let output = output.unwrap_or_else(|| config.stations_output.clone());
            run_stations(&input, &output)
        }
        Commands::ShowConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn run_schedules(config: &Config) -> anyhow::Result<()> {
    let queries = batch::plan_queries(
        &config.origins,
        &config.destinations,
        config.start_date,
        config.days,
        &config.month_names,
    );
    if queries.is_empty() {
        println!("Nothing to search: no origins, destinations or days configured.");
        return Ok(());
    }
    info!(
        "Passengers: {} adult, {} infant (not entered into the form)",
        config.passengers.adult, config.passengers.infant
    );

    let session = ChromeSession::launch(&config.browser)
        .await
        .context("Could not start the browser, stopping")?;

    println!("Running {} searches...", queries.len());
    let (records, stats) = batch::run_batch(&session, &queries, config.delay()).await;
    session.shutdown().await;

    println!(
        "Searched {} queries ({} pages, {} failed).",
        stats.queries, stats.pages, stats.failed
    );
    if records.is_empty() {
        println!("No schedules were extracted from any query.");
        return Ok(());
    }

    println!("Extracted {} schedules in total.", records.len());
    output::write_schedules_csv(&records, &config.schedules_output)
        .with_context(|| format!("Could not save CSV to {:?}", config.schedules_output))?;
    println!("Saved to {}", config.schedules_output.display());
    Ok(())
}

fn run_stations(input: &Path, output_path: &Path) -> anyhow::Result<()> {
    println!("Extracting stations from {}", input.display());

    let stations: Vec<StationRecord> = match output::read_markup(input) {
        Ok(html) => parser::process_station_page(&html),
        Err(e) if e.is_not_found() => {
            error!("Input file {:?} not found", input);
            Vec::new()
        }
        Err(e) => {
            error!("{}", e);
            Vec::new()
        }
    };

    if stations.is_empty() {
        println!("No stations were extracted.");
        println!("Possible causes:");
        println!("- the input file is missing or unreadable");
        println!("- the page has no table with class 'wikitable'");
        println!("- table headers and contents don't look like station names and codes");
        return Ok(());
    }

    println!("Extracted {} stations:", stations.len());
    for (i, s) in stations.iter().take(PREVIEW_STATIONS).enumerate() {
        println!("  {:>2}. {} -> {}", i + 1, s.name, s.code);
    }
    if stations.len() > PREVIEW_STATIONS {
        println!("  ... and {} more", stations.len() - PREVIEW_STATIONS);
    }

    output::write_stations(&stations, output_path)
        .with_context(|| format!("Could not save stations to {:?}", output_path))?;
    println!("Saved to {}", output_path.display());
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_formats() {
        assert_eq!(format_duration(std::time::Duration::from_millis(2500)), "2.5s");
        assert_eq!(format_duration(std::time::Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(std::time::Duration::from_secs(3725)), "1h 2m 5s");
    }

    #[test]
    fn stations_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("stasiun.txt");
        run_stations(Path::new("tests/fixtures/wikipedia.html"), &out).unwrap();
        let text = std::fs::read_to_string(&out).unwrap();
        assert_eq!(text.lines().count(), 6);
        assert_eq!(text.lines().next(), Some(r#"("GAMBIR", "GMR"),"#));
    }

    #[test]
    fn missing_station_input_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("stasiun.txt");
        run_stations(Path::new("tests/fixtures/absent.html"), &out).unwrap();
        assert!(!out.exists());
    }

    #[test]
    fn cli_parses_overrides() {
        let cli = Cli::try_parse_from([
            "kai_scraper",
            "schedules",
            "--headless",
            "--start",
            "2025-07-01",
            "-n",
            "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Schedules {
                headless,
                start,
                days,
                ..
            } => {
                assert!(headless);
                assert_eq!(start.as_deref(), Some("2025-07-01"));
                assert_eq!(days, Some(3));
            }
            _ => panic!("expected schedules"),
        }
    }
}
