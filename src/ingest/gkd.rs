/// GKD water-temperature CSV reader
///
/// The Bavarian GKD portal exports once-daily mean water temperatures as
/// `;`-separated CSV files with 9 lines of station metadata ahead of the
/// header row and decimal-comma values. Files are named `temp_*.csv`.
///
/// Readings are concatenated across files, sorted chronologically, and
/// expanded to all 24 hours of each day by repetition (the daily mean is
/// assumed constant across the day).

use chrono::NaiveDate;
use std::error::Error;
use std::path::Path;

use crate::logging::{self, DataSource};
use crate::model::{DailyTemperature, HourlyTemperature};

/// Metadata lines ahead of the header row in a GKD export.
const SKIP_ROWS: usize = 9;

/// Header names of the two columns we use.
const DATE_COLUMN: &str = "Datum";
const VALUE_COLUMN: &str = "Mittelwert";

// ============================================================================
// Directory and file reading
// ============================================================================

/// Read every `temp_*.csv` export in a directory and return the combined
/// readings in chronological order.
pub fn read_temperature_dir(dir: &Path) -> Result<Vec<DailyTemperature>, Box<dyn Error>> {
    let mut all = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.starts_with("temp_") || !name.ends_with(".csv") {
            continue;
        }
        let readings = read_temperature_file(&entry.path())?;
        all.extend(readings);
    }

    all.sort_by_key(|r| r.date);
    Ok(all)
}

/// Read a single GKD export.
pub fn read_temperature_file(path: &Path) -> Result<Vec<DailyTemperature>, Box<dyn Error>> {
    let contents = std::fs::read_to_string(path)?;

    // Drop the station metadata block; the header row follows it.
    let data: String = contents
        .lines()
        .skip(SKIP_ROWS)
        .collect::<Vec<_>>()
        .join("\n");

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(data.as_bytes());

    let headers = reader.headers()?.clone();
    let date_idx = column_index(&headers, DATE_COLUMN)
        .ok_or_else(|| format!("{}: missing column '{}'", path.display(), DATE_COLUMN))?;
    let value_idx = column_index(&headers, VALUE_COLUMN)
        .ok_or_else(|| format!("{}: missing column '{}'", path.display(), VALUE_COLUMN))?;

    let mut readings = Vec::new();
    let mut total = 0;

    for record in reader.records() {
        let record = record?;
        total += 1;

        let date = record
            .get(date_idx)
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok());
        let value = record
            .get(value_idx)
            .and_then(|s| s.trim().replace(',', ".").parse::<f64>().ok());

        match (date, value) {
            (Some(date), Some(water_temp_c)) => {
                readings.push(DailyTemperature { date, water_temp_c })
            }
            _ => continue, // gauge outage rows carry "--" or empty fields
        }
    }

    logging::log_read_summary(
        DataSource::Gkd,
        &format!("{}", path.display()),
        total,
        readings.len(),
        total - readings.len(),
    );

    Ok(readings)
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

// ============================================================================
// Hourly expansion
// ============================================================================

/// Expand once-daily readings to all 24 hours of each day by repetition.
pub fn expand_to_hours(daily: &[DailyTemperature]) -> Vec<HourlyTemperature> {
    let mut hourly = Vec::with_capacity(daily.len() * 24);
    for reading in daily {
        for hour in 0..24 {
            hourly.push(HourlyTemperature {
                date: reading.date,
                hour,
                water_temp_c: reading.water_temp_c,
            });
        }
    }
    hourly
}

// ============================================================================
// Tests
// ============================================================================
