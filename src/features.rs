/// The fixed feature schema shared by training and serving.
///
/// Four numeric features plus drop-first one-hot flags over the weather
/// categories (`sunny` is the baseline and encodes as all zeros). The
/// trained artifact embeds this column list and the loader refuses an
/// artifact whose schema differs, so the two sides cannot drift apart.

use crate::dataset::ObservationRow;
use crate::model::WeatherCondition;

/// Feature columns, in matrix order.
pub const FEATURE_COLUMNS: [&str; 8] = [
    "hour",
    "water_temp",
    "air_temp",
    "water_level",
    "weather_cloudy",
    "weather_rainy",
    "weather_snow",
    "weather_stormy",
];

/// Number of one-hot weather flags (categories minus the baseline).
pub const WEATHER_FLAGS: usize = 4;

/// The schema as owned strings, for embedding in the model artifact.
pub fn schema() -> Vec<String> {
    FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect()
}

/// Drop-first one-hot flags in column order: cloudy, rainy, snow, stormy.
/// `None` (missing or unknown category) encodes as the baseline.
pub fn one_hot_flags(condition: Option<WeatherCondition>) -> [f64; WEATHER_FLAGS] {
    let mut flags = [0.0; WEATHER_FLAGS];
    match condition {
        Some(WeatherCondition::Cloudy) => flags[0] = 1.0,
        Some(WeatherCondition::Rainy) => flags[1] = 1.0,
        Some(WeatherCondition::Snow) => flags[2] = 1.0,
        Some(WeatherCondition::Stormy) => flags[3] = 1.0,
        Some(WeatherCondition::Sunny) | None => {}
    }
    flags
}

/// Assemble one feature vector in `FEATURE_COLUMNS` order.
pub fn encode(
    hour: u32,
    water_temp: f64,
    air_temp: f64,
    water_level: f64,
    condition: Option<WeatherCondition>,
) -> Vec<f64> {
    let flags = one_hot_flags(condition);
    let mut features = Vec::with_capacity(FEATURE_COLUMNS.len());
    features.push(hour as f64);
    features.push(water_temp);
    features.push(air_temp);
    features.push(water_level);
    features.extend_from_slice(&flags);
    features
}

/// Feature vector for a dataset row.
pub fn encode_row(row: &ObservationRow) -> Vec<f64> {
    encode(
        row.hour,
        row.water_temp,
        row.air_temp,
        row.water_level,
        row.weather_condition,
    )
}
