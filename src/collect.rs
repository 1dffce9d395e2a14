/// The feature-collection pipeline driver.
///
/// Runs the offline stages in order: read GKD temperature exports, scrape
/// the HND water-level table, expand daily temperatures to hours,
/// inner-join on (date, hour), left-join Open-Meteo weather (or fill
/// placeholders), and write the merged feature CSV. An empty result at any
/// stage logs and returns `Ok(None)` — emptiness is reported, not treated
/// as an error. Fetch failures on the weather stage degrade to placeholder
/// fills; failures on the mandatory stages propagate to the caller.

use std::error::Error;
use std::path::Path;
use std::time::Duration;

use crate::config::Config;
use crate::dataset::{self, merge, synthetic, ObservationRow};
use crate::ingest::{gkd, hnd, meteo::MeteoClient};
use crate::logging::{self, DataSource};

/// HTTP timeout for the scrape and archive requests.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Run the full collection pipeline. Returns the number of rows written,
/// or `None` when a stage came up empty.
pub fn run_collection(config: &Config) -> Result<Option<usize>, Box<dyn Error>> {
    logging::info(DataSource::Dataset, None, "Processing temperature data...");
    let daily = gkd::read_temperature_dir(Path::new(&config.paths.temperature_dir))?;
    if daily.is_empty() {
        logging::warn(
            DataSource::Gkd,
            None,
            "Temperature data is empty! Check the temperature directory and its temp_*.csv files.",
        );
        return Ok(None);
    }
    logging::info(
        DataSource::Gkd,
        None,
        &format!("{} daily temperature readings", daily.len()),
    );

    logging::info(DataSource::Dataset, None, "Scraping water level data...");
    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()?;
    let levels = hnd::fetch_water_level_history(&client, &config.sources.hnd_url)?;
    if levels.is_empty() {
        logging::warn(
            DataSource::Hnd,
            None,
            "Water level data is empty! Check the history URL.",
        );
        return Ok(None);
    }
    logging::info(
        DataSource::Hnd,
        None,
        &format!("{} water level readings", levels.len()),
    );

    logging::info(
        DataSource::Dataset,
        None,
        "Expanding temperature data to all hours...",
    );
    let hourly = gkd::expand_to_hours(&daily);

    logging::info(
        DataSource::Dataset,
        None,
        "Merging temperature and water level data...",
    );
    let mut rows = merge::merge_levels_inner(&hourly, &levels);
    if rows.is_empty() {
        logging::warn(
            DataSource::Dataset,
            None,
            "Combined data is empty! Temperature and water level dates do not overlap.",
        );
        return Ok(None);
    }
    logging::info(
        DataSource::Dataset,
        None,
        &format!("{} merged rows", rows.len()),
    );

    attach_weather(config, &client, &mut rows);

    let out_path = Path::new(&config.paths.feature_csv);
    dataset::write_observations(out_path, &rows)?;
    logging::info(
        DataSource::Dataset,
        None,
        &format!("Combined feature data saved to {}", out_path.display()),
    );

    Ok(Some(rows.len()))
}

/// Left-join archive weather onto the rows, or fill placeholders when the
/// API is disabled or fails.
fn attach_weather(config: &Config, client: &reqwest::blocking::Client, rows: &mut [ObservationRow]) {
    if config.collect.use_weather_api {
        logging::info(DataSource::Dataset, None, "Fetching hourly weather data...");
        let start = rows.iter().map(|r| r.date).min().unwrap();
        let end = rows.iter().map(|r| r.date).max().unwrap();

        let meteo = MeteoClient::new(
            client.clone(),
            Some(config.paths.weather_cache_dir.clone().into()),
        );
        match meteo.fetch_hourly(config.sources.latitude, config.sources.longitude, start, end) {
            Ok(weather) => {
                let matched = merge::merge_weather_left(rows, &weather);
                logging::info(
                    DataSource::Meteo,
                    None,
                    &format!("weather matched {}/{} rows", matched, rows.len()),
                );
                if matched < rows.len() {
                    // Hours the archive lacks get placeholder values.
                    let covered: std::collections::HashSet<_> =
                        weather.iter().map(|w| (w.date, w.hour)).collect();
                    fill_placeholders(rows, |row| !covered.contains(&(row.date, row.hour)));
                }
                return;
            }
            Err(e) => {
                logging::log_fetch_failure(DataSource::Meteo, None, "hourly weather fetch", &e);
            }
        }
    }

    fill_placeholders(rows, |_| true);
}

/// Random air temperature and weather category for rows the archive did
/// not cover (the historical pipeline has no other source for either).
fn fill_placeholders(rows: &mut [ObservationRow], needs_fill: impl Fn(&ObservationRow) -> bool) {
    logging::info(
        DataSource::Dataset,
        None,
        "Filling placeholder air_temp and weather_condition...",
    );
    let mut rng = rand::thread_rng();
    for row in rows.iter_mut().filter(|r| needs_fill(r)) {
        row.air_temp = synthetic::random_air_temp(&mut rng);
        row.weather_condition = Some(synthetic::random_condition(&mut rng));
    }
}
