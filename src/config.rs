use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::MonthNames;
use crate::error::{Result, ScrapeError};
use crate::records::StationRef;

pub const BOOKING_URL: &str = "https://booking.kai.id/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Chrome/Chromium binary. Absent or blank: look it up on PATH.
    pub executable: Option<PathBuf>,
    pub headless: bool,
    /// Extra wait after the results appear, for late-loading content.
    pub settle_secs: u64,
    /// Upper bound on waiting for any single form element or the results.
    pub element_timeout_secs: u64,
    pub booking_url: String,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        BrowserSettings {
            executable: None,
            headless: false,
            settle_secs: 3,
            element_timeout_secs: 20,
            booking_url: BOOKING_URL.to_string(),
        }
    }
}

impl BrowserSettings {
    pub fn executable(&self) -> Option<&Path> {
        self.executable
            .as_deref()
            .filter(|p| !p.to_string_lossy().trim().is_empty())
    }

    pub fn settle(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }

    pub fn element_timeout(&self) -> Duration {
        Duration::from_secs(self.element_timeout_secs)
    }
}

/// Not entered into the form yet; logged with each run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Passengers {
    pub adult: u32,
    pub infant: u32,
}

impl Default for Passengers {
    fn default() -> Self {
        Passengers { adult: 1, infant: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub browser: BrowserSettings,
    pub origins: Vec<StationRef>,
    pub destinations: Vec<StationRef>,
    pub start_date: NaiveDate,
    pub days: u32,
    pub passengers: Passengers,
    /// Pause after every query before the next one.
    pub delay_secs: u64,
    pub month_names: MonthNames,
    pub schedules_output: PathBuf,
    pub stations_input: PathBuf,
    pub stations_output: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            browser: BrowserSettings::default(),
            origins: vec![
                StationRef::new("SURABAYA PASAR TURI", "SBI"),
                StationRef::new("SURABAYA", "SBI"),
            ],
            destinations: vec![
                StationRef::new("PASARSENEN", "PSE"),
                StationRef::new("GAMBIR", "GMR"),
                StationRef::new("JAKARTA KOTA", "JAKK"),
                StationRef::new("JATINEGARA", "JNG"),
            ],
            start_date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap_or_default(),
            days: 30,
            passengers: Passengers::default(),
            delay_secs: 5,
            month_names: MonthNames::default(),
            schedules_output: PathBuf::from("jadwal_kereta_selenium.csv"),
            stations_input: PathBuf::from("wikipedia.html"),
            stations_output: PathBuf::from("stasiun.txt"),
        }
    }
}

impl Config {
    /// Defaults when `path` is `None`; otherwise the file, with any missing
    /// keys falling back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Config::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|e| ScrapeError::io(path, e))?;
        serde_json::from_str(&raw).map_err(|source| ScrapeError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}
