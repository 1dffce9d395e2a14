/// (date, hour)-keyed joins between the ingest time series.
///
/// Temperature and water level combine with an inner join: hours present
/// on only one side are dropped. Weather is a left join onto the merged
/// rows, so hours the archive lacks keep their default air temperature and
/// no weather category.

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::dataset::ObservationRow;
use crate::model::{HourlyTemperature, HourlyWeather, WaterLevelReading};

type Key = (NaiveDate, u32);

/// Inner-join hourly temperatures with water-level readings on
/// (date, hour). Output order follows the temperature side. Duplicate
/// level readings within the same hour resolve to the last one.
pub fn merge_levels_inner(
    temps: &[HourlyTemperature],
    levels: &[WaterLevelReading],
) -> Vec<ObservationRow> {
    let mut level_by_key: HashMap<Key, f64> = HashMap::with_capacity(levels.len());
    for reading in levels {
        level_by_key.insert((reading.date(), reading.hour()), reading.level_cm);
    }

    let mut rows = Vec::new();
    for temp in temps {
        let Some(&water_level) = level_by_key.get(&(temp.date, temp.hour)) else {
            continue;
        };
        rows.push(ObservationRow {
            date: temp.date,
            hour: temp.hour,
            water_temp: temp.water_temp_c,
            air_temp: 0.0,
            water_level,
            weather_condition: None,
            surfer_count: None,
        });
    }
    rows
}

/// Left-join hourly weather onto merged rows. Every row is kept; rows with
/// a matching (date, hour) get the archive's air temperature and weather
/// category, the rest keep their existing values. Returns the number of
/// rows matched.
pub fn merge_weather_left(rows: &mut [ObservationRow], weather: &[HourlyWeather]) -> usize {
    let mut weather_by_key: HashMap<Key, &HourlyWeather> = HashMap::with_capacity(weather.len());
    for hour in weather {
        weather_by_key.insert((hour.date, hour.hour), hour);
    }

    let mut matched = 0;
    for row in rows.iter_mut() {
        if let Some(hour) = weather_by_key.get(&(row.date, row.hour)) {
            row.air_temp = hour.air_temp_c;
            row.weather_condition = hour.condition;
            matched += 1;
        }
    }
    matched
}
