use std::collections::{BTreeSet, HashMap};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Result, ScrapeError};
use crate::records::{ScheduleRecord, StationRecord};

const HIDDEN_PREFIX: &str = "hidden_";

pub fn read_markup(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| ScrapeError::io(path, e))
}

/// Record fields in declared order, then one sorted `hidden_*` column per
/// query-context key seen in any record.
pub fn csv_header(records: &[ScheduleRecord]) -> Vec<String> {
    let hidden: BTreeSet<String> = records
        .iter()
        .flat_map(|r| r.query.entries())
        .map(|(key, _)| format!("{}{}", HIDDEN_PREFIX, key))
        .collect();
    ScheduleRecord::BASE_FIELDS
        .iter()
        .map(|f| f.to_string())
        .chain(hidden)
        .collect()
}

/// Write all records as CSV. Returns `false` (and touches nothing) when
/// there is nothing to write.
pub fn write_schedules_csv(records: &[ScheduleRecord], path: &Path) -> Result<bool> {
    if records.is_empty() {
        warn!("No schedules to save");
        return Ok(false);
    }
    let header = csv_header(records);
    let hidden_columns = &header[ScheduleRecord::BASE_FIELDS.len()..];

    write_atomically(path, |out| {
        let mut wtr = csv::Writer::from_writer(out);
        wtr.write_record(&header)?;
        for record in records {
            let context: HashMap<String, &str> = record
                .query
                .entries()
                .into_iter()
                .map(|(k, v)| (format!("{}{}", HIDDEN_PREFIX, k), v))
                .collect();
            let row = record.base_values().into_iter().chain(
                hidden_columns
                    .iter()
                    .map(|col| context.get(col).copied().unwrap_or_default().to_string()),
            );
            wtr.write_record(row)?;
        }
        wtr.flush().map_err(|e| ScrapeError::io(path, e))?;
        Ok(())
    })?;
    info!("Saved {} schedules to {:?}", records.len(), path);
    Ok(true)
}

/// One `("NAME", "CODE"),` line per station.
pub fn write_stations(stations: &[StationRecord], path: &Path) -> Result<()> {
    write_atomically(path, |out| {
        for station in stations {
            writeln!(out, "{}", station).map_err(|e| ScrapeError::io(path, e))?;
        }
        Ok(())
    })?;
    info!("Saved {} stations to {:?}", stations.len(), path);
    Ok(())
}

/// Write to a sibling temp file and rename over `path` only on success, so
/// a failed write never leaves a truncated file behind.
fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let tmp = temp_path(path);
    let result = File::create(&tmp)
        .map_err(|e| ScrapeError::io(&tmp, e))
        .and_then(|file| {
            let mut out = BufWriter::new(file);
            write(&mut out)?;
            out.flush().map_err(|e| ScrapeError::io(&tmp, e))
        })
        .and_then(|()| fs::rename(&tmp, path).map_err(|e| ScrapeError::io(path, e)));
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
