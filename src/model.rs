/// Core data types for the surfer prediction service.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no I/O — only types, their conversions, and the ingest error
/// enum.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Weather categories
// ---------------------------------------------------------------------------

/// Canonical weather categories used throughout the pipeline.
///
/// `Sunny` is the one-hot baseline: it produces all-zero indicator flags
/// (see `features::one_hot_flags`). CSV files and the wire payload carry
/// the lowercase string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherCondition {
    Sunny,
    Cloudy,
    Rainy,
    Snow,
    Stormy,
}

impl WeatherCondition {
    /// All categories, baseline first.
    pub const ALL: [WeatherCondition; 5] = [
        WeatherCondition::Sunny,
        WeatherCondition::Cloudy,
        WeatherCondition::Rainy,
        WeatherCondition::Snow,
        WeatherCondition::Stormy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherCondition::Sunny => "sunny",
            WeatherCondition::Cloudy => "cloudy",
            WeatherCondition::Rainy => "rainy",
            WeatherCondition::Snow => "snow",
            WeatherCondition::Stormy => "stormy",
        }
    }

    /// Parse the lowercase string form. Unknown strings map to `None`
    /// (treated as the baseline downstream).
    pub fn parse(s: &str) -> Option<WeatherCondition> {
        match s.trim() {
            "sunny" => Some(WeatherCondition::Sunny),
            "cloudy" => Some(WeatherCondition::Cloudy),
            "rainy" => Some(WeatherCondition::Rainy),
            "snow" => Some(WeatherCondition::Snow),
            "stormy" => Some(WeatherCondition::Stormy),
            _ => None,
        }
    }

    /// Map a WMO weather code (Open-Meteo `weathercode` field) onto the
    /// canonical categories. Codes outside the known ranges map to `None`.
    pub fn from_wmo_code(code: i64) -> Option<WeatherCondition> {
        match code {
            0 => Some(WeatherCondition::Sunny),
            1..=3 | 45..=48 => Some(WeatherCondition::Cloudy),
            51..=67 | 80..=82 => Some(WeatherCondition::Rainy),
            71..=77 | 85..=86 => Some(WeatherCondition::Snow),
            c if c >= 95 => Some(WeatherCondition::Stormy),
            _ => None,
        }
    }
}

impl std::fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// A single water-level measurement scraped from the HND Bayern history
/// table. Timestamps on the page are local gauge time at minute
/// resolution (`DD.MM.YYYY HH:MM`).
#[derive(Debug, Clone, PartialEq)]
pub struct WaterLevelReading {
    pub timestamp: NaiveDateTime,
    pub level_cm: f64,
}

impl WaterLevelReading {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }
}

/// One once-daily mean water temperature from a GKD CSV export.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyTemperature {
    pub date: NaiveDate,
    pub water_temp_c: f64,
}

/// A daily temperature repeated out to a specific hour of that day.
/// Produced by `ingest::gkd::expand_to_hours`.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyTemperature {
    pub date: NaiveDate,
    pub hour: u32,
    pub water_temp_c: f64,
}

/// One hour of Open-Meteo archive data: air temperature plus the mapped
/// weather category. `condition` is `None` when the WMO code did not fall
/// in a known range.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyWeather {
    pub date: NaiveDate,
    pub hour: u32,
    pub air_temp_c: f64,
    pub condition: Option<WeatherCondition>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when fetching or parsing external data sources.
#[derive(Debug)]
pub enum FetchError {
    /// Non-2xx HTTP response from the scraped page or the weather API.
    HttpError(u16),
    /// The transport failed (connect, timeout, TLS).
    Transport(String),
    /// The HND page did not contain the expected `table.tblsort` structure.
    MissingTable,
    /// A response body could not be parsed.
    ParseError(String),
    /// The source responded but contained no usable rows.
    NoData(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::HttpError(code) => write!(f, "HTTP error: {}", code),
            FetchError::Transport(msg) => write!(f, "Transport error: {}", msg),
            FetchError::MissingTable => {
                write!(f, "Failed to find the water level table in the HTML")
            }
            FetchError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            FetchError::NoData(what) => write!(f, "No data available: {}", what),
        }
    }
}

impl std::error::Error for FetchError {}
