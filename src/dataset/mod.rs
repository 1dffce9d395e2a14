/// Observation records and CSV file handoff between pipeline stages.
///
/// Every stage exchanges data through one flat CSV schema:
/// `date,hour,water_temp,air_temp,water_level,weather_condition[,surfer_count]`.
/// The label column is present only in training files. Reading tolerates
/// missing feature columns by filling them with 0 (the training contract),
/// but reports which columns were absent so callers can log the fill.

pub mod merge;
pub mod synthetic;

use chrono::NaiveDate;
use std::error::Error;
use std::path::Path;

use crate::logging::{self, DataSource};
use crate::model::WeatherCondition;

/// One row of the merged feature table. `surfer_count` is the training
/// label and absent outside labeled files.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRow {
    pub date: NaiveDate,
    pub hour: u32,
    pub water_temp: f64,
    pub air_temp: f64,
    pub water_level: f64,
    pub weather_condition: Option<WeatherCondition>,
    pub surfer_count: Option<u32>,
}

/// Feature column names, in file order.
const FEATURE_FILE_COLUMNS: [&str; 6] = [
    "date",
    "hour",
    "water_temp",
    "air_temp",
    "water_level",
    "weather_condition",
];

const LABEL_COLUMN: &str = "surfer_count";

/// Result of reading an observation CSV.
pub struct LoadedDataset {
    pub rows: Vec<ObservationRow>,
    /// Expected feature columns that were absent from the header and
    /// filled with defaults. Non-empty means the effective feature
    /// distribution was silently shifted; callers should warn.
    pub missing_columns: Vec<String>,
    /// Whether the file carried a `surfer_count` column.
    pub has_label: bool,
}

// ============================================================================
// Writing
// ============================================================================

/// Write observation rows. The label column is emitted only when at least
/// one row carries a label.
pub fn write_observations(path: &Path, rows: &[ObservationRow]) -> Result<(), Box<dyn Error>> {
    let with_labels = rows.iter().any(|r| r.surfer_count.is_some());

    let mut writer = csv::Writer::from_path(path)?;

    let mut header: Vec<&str> = FEATURE_FILE_COLUMNS.to_vec();
    if with_labels {
        header.push(LABEL_COLUMN);
    }
    writer.write_record(&header)?;

    for row in rows {
        let mut record = vec![
            row.date.format("%Y-%m-%d").to_string(),
            row.hour.to_string(),
            row.water_temp.to_string(),
            row.air_temp.to_string(),
            row.water_level.to_string(),
            row.weather_condition
                .map(|c| c.as_str().to_string())
                .unwrap_or_default(),
        ];
        if with_labels {
            record.push(
                row.surfer_count
                    .map(|c| c.to_string())
                    .unwrap_or_default(),
            );
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

// ============================================================================
// Reading
// ============================================================================

/// Read an observation CSV, filling missing feature columns with defaults.
/// Rows whose present fields fail to parse are skipped and counted in the
/// logged summary.
pub fn read_observations(path: &Path) -> Result<LoadedDataset, Box<dyn Error>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let index_of = |name: &str| headers.iter().position(|h| h.trim() == name);

    let date_idx = index_of("date");
    let hour_idx = index_of("hour");
    let water_temp_idx = index_of("water_temp");
    let air_temp_idx = index_of("air_temp");
    let water_level_idx = index_of("water_level");
    let weather_idx = index_of("weather_condition");
    let label_idx = index_of(LABEL_COLUMN);

    let missing_columns: Vec<String> = FEATURE_FILE_COLUMNS
        .iter()
        .zip([
            date_idx,
            hour_idx,
            water_temp_idx,
            air_temp_idx,
            water_level_idx,
            weather_idx,
        ])
        .filter(|(_, idx)| idx.is_none())
        .map(|(name, _)| name.to_string())
        .collect();

    let mut rows = Vec::new();
    let mut total = 0;
    let mut skipped = 0;

    for record in reader.records() {
        let record = record?;
        total += 1;

        let date = match date_idx {
            Some(i) => match record
                .get(i)
                .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
            {
                Some(d) => d,
                None => {
                    skipped += 1;
                    continue;
                }
            },
            // Default-fill epoch for files without a date column.
            None => NaiveDate::from_ymd_opt(1970, 1, 1).unwrap(),
        };

        let hour = match parse_numeric_field::<u32>(&record, hour_idx, 0) {
            Some(h) if h < 24 => h,
            Some(_) | None => {
                skipped += 1;
                continue;
            }
        };
        let Some(water_temp) = parse_numeric_field::<f64>(&record, water_temp_idx, 0.0) else {
            skipped += 1;
            continue;
        };
        let Some(air_temp) = parse_numeric_field::<f64>(&record, air_temp_idx, 0.0) else {
            skipped += 1;
            continue;
        };
        let Some(water_level) = parse_numeric_field::<f64>(&record, water_level_idx, 0.0) else {
            skipped += 1;
            continue;
        };

        let weather_condition = weather_idx
            .and_then(|i| record.get(i))
            .and_then(WeatherCondition::parse);

        let surfer_count = match label_idx {
            Some(i) => match record.get(i).map(str::trim) {
                Some("") | None => None,
                Some(s) => match s.parse::<u32>() {
                    Ok(v) => Some(v),
                    Err(_) => {
                        skipped += 1;
                        continue;
                    }
                },
            },
            None => None,
        };

        rows.push(ObservationRow {
            date,
            hour,
            water_temp,
            air_temp,
            water_level,
            weather_condition,
            surfer_count,
        });
    }

    logging::log_read_summary(
        DataSource::Dataset,
        &format!("{}", path.display()),
        total,
        rows.len(),
        skipped,
    );

    Ok(LoadedDataset {
        rows,
        missing_columns,
        has_label: label_idx.is_some(),
    })
}

/// Parse a numeric field, falling back to `default` when the column is
/// absent entirely. A column that exists but fails to parse yields `None`
/// so the row can be skipped.
fn parse_numeric_field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    idx: Option<usize>,
    default: T,
) -> Option<T> {
    match idx {
        None => Some(default),
        Some(i) => record.get(i).and_then(|s| s.trim().parse().ok()),
    }
}

// ============================================================================
// Tests
// ============================================================================
