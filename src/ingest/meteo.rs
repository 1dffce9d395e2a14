/// Open-Meteo archive API client
///
/// Retrieves hourly air temperature and WMO weather codes for the spot's
/// coordinates over a date range. The archive is static history, so raw
/// responses are cached on disk keyed by the request parameters; reruns of
/// the collection pipeline inside the cache TTL never refetch.
///
/// Transient failures (connect errors, HTTP 429/5xx) are retried a bounded
/// number of times with exponential backoff. Other HTTP errors fail fast.
///
/// API documentation: https://open-meteo.com/en/docs/historical-weather-api

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::logging::{self, DataSource};
use crate::model::{FetchError, HourlyWeather, WeatherCondition};

const ARCHIVE_BASE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";

/// Total attempts per request, including the first.
const RETRY_ATTEMPTS: u32 = 3;

/// Backoff before attempt n+1 is `RETRY_BASE_DELAY_MS << n`.
const RETRY_BASE_DELAY_MS: u64 = 250;

/// Cached responses older than this are refetched.
const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

// ============================================================================
// API Response Structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    hourly: HourlyBlock,
}

#[derive(Debug, Deserialize)]
struct HourlyBlock {
    /// ISO timestamps, e.g. "2024-05-01T12:00"
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
    weathercode: Vec<Option<i64>>,
}

// ============================================================================
// Client
// ============================================================================

pub struct MeteoClient {
    http: reqwest::blocking::Client,
    base_url: String,
    cache_dir: Option<PathBuf>,
}

impl MeteoClient {
    pub fn new(http: reqwest::blocking::Client, cache_dir: Option<PathBuf>) -> Self {
        MeteoClient {
            http,
            base_url: ARCHIVE_BASE_URL.to_string(),
            cache_dir,
        }
    }

    /// Point the client at a different archive endpoint.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    /// Fetch hourly air temperature and weather category for a coordinate
    /// and date range (inclusive). Hours with no temperature value are
    /// dropped.
    pub fn fetch_hourly(
        &self,
        latitude: f64,
        longitude: f64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HourlyWeather>, FetchError> {
        let url = format!(
            "{}?latitude={:.6}&longitude={:.6}&start_date={}&end_date={}&hourly=temperature_2m,weathercode&timezone=UTC",
            self.base_url,
            latitude,
            longitude,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d"),
        );
        let cache_key = format!(
            "meteo_{:.4}_{:.4}_{}_{}.json",
            latitude,
            longitude,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d"),
        );

        if let Some(body) = self.read_cache(&cache_key) {
            logging::debug(DataSource::Meteo, None, &format!("cache hit: {}", cache_key));
            return parse_archive_body(&body);
        }

        let body = self.fetch_with_retry(&url)?;
        self.write_cache(&cache_key, &body);
        parse_archive_body(&body)
    }

    fn fetch_with_retry(&self, url: &str) -> Result<String, FetchError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let error = match self.http.get(url).send() {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response
                            .text()
                            .map_err(|e| FetchError::ParseError(e.to_string()));
                    }
                    if status.as_u16() == 429 || status.is_server_error() {
                        FetchError::HttpError(status.as_u16())
                    } else {
                        // Client errors will not improve on retry.
                        return Err(FetchError::HttpError(status.as_u16()));
                    }
                }
                Err(e) if e.is_connect() || e.is_timeout() => {
                    FetchError::Transport(e.to_string())
                }
                Err(e) => return Err(FetchError::Transport(e.to_string())),
            };

            if attempt >= RETRY_ATTEMPTS {
                return Err(error);
            }

            let delay = RETRY_BASE_DELAY_MS << (attempt - 1);
            logging::warn(
                DataSource::Meteo,
                None,
                &format!(
                    "attempt {}/{} failed ({}), retrying in {}ms",
                    attempt, RETRY_ATTEMPTS, error, delay
                ),
            );
            std::thread::sleep(Duration::from_millis(delay));
        }
    }

    // ------------------------------------------------------------------
    // Disk cache. Failures here are logged and ignored; the cache only
    // ever saves a refetch.
    // ------------------------------------------------------------------

    fn cache_path(&self, key: &str) -> Option<PathBuf> {
        self.cache_dir.as_ref().map(|dir| dir.join(key))
    }

    fn read_cache(&self, key: &str) -> Option<String> {
        let path = self.cache_path(key)?;
        let modified = std::fs::metadata(&path).ok()?.modified().ok()?;
        let age = modified.elapsed().ok()?;
        if age > CACHE_TTL {
            return None;
        }
        std::fs::read_to_string(&path).ok()
    }

    fn write_cache(&self, key: &str, body: &str) {
        let Some(path) = self.cache_path(key) else {
            return;
        };
        if let Err(e) = write_cache_file(&path, body) {
            logging::warn(
                DataSource::Meteo,
                None,
                &format!("failed to cache response at {}: {}", path.display(), e),
            );
        }
    }
}

fn write_cache_file(path: &Path, body: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, body)
}

// ============================================================================
// Response parsing
// ============================================================================

fn parse_archive_body(body: &str) -> Result<Vec<HourlyWeather>, FetchError> {
    let response: ArchiveResponse =
        serde_json::from_str(body).map_err(|e| FetchError::ParseError(e.to_string()))?;

    let hourly = response.hourly;
    let mut out = Vec::with_capacity(hourly.time.len());

    for (i, time) in hourly.time.iter().enumerate() {
        let timestamp = NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M")
            .map_err(|e| FetchError::ParseError(format!("bad timestamp '{}': {}", time, e)))?;
        let Some(Some(air_temp_c)) = hourly.temperature_2m.get(i).copied() else {
            continue;
        };
        let condition = hourly
            .weathercode
            .get(i)
            .copied()
            .flatten()
            .and_then(WeatherCondition::from_wmo_code);

        out.push(HourlyWeather {
            date: timestamp.date(),
            hour: chrono::Timelike::hour(&timestamp.time()),
            air_temp_c,
            condition,
        });
    }

    if out.is_empty() {
        return Err(FetchError::NoData("hourly weather archive".to_string()));
    }
    Ok(out)
}

// ============================================================================
// Tests
// ============================================================================
