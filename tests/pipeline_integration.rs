/// Offline end-to-end tests for the data pipeline.
///
/// No live services: the HND page and the Open-Meteo archive are played
/// back by a loopback HTTP server with canned responses, temperature
/// exports are fixture files in a scratch directory, and stages hand off
/// through real CSV and JSON files exactly as the binaries do.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use surfmon_service::collect;
use surfmon_service::config::Config;
use surfmon_service::dataset::{self, synthetic};
use surfmon_service::ingest::hnd;
use surfmon_service::ingest::meteo::MeteoClient;
use surfmon_service::model::FetchError;
use surfmon_service::predict::{predict_surfers, PredictRequest};
use surfmon_service::regression::{self, LinearModel};

// ============================================================================
// Loopback HTTP fixtures
// ============================================================================

/// Serve one canned response per accepted connection, in order, counting
/// requests. The listener closes after the last response.
fn spawn_server(responses: Vec<String>) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&requests);
    std::thread::spawn(move || {
        for response in responses {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            counter.fetch_add(1, Ordering::SeqCst);
            let mut buf = [0u8; 8192];
            let _ = stream.read(&mut buf);
            let _ = stream.write_all(response.as_bytes());
        }
    });

    (format!("http://{}", addr), requests)
}

fn http_response(status: &str, content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        content_type,
        body.len(),
        body
    )
}

fn http_client() -> reqwest::blocking::Client {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

// ============================================================================
// Fixture data
// ============================================================================

const GKD_METADATA: &str = "\
Messstellen-Nr.;16515005
Messstellenname;München Himmelreichbrücke
Gewässer;Isar
Ostwert;691763
Nordwert;5334442
Parameter;Wassertemperatur [°C]
Aussage;Tagesmittelwerte
Quelle;www.gkd.bayern.de
Stand;01.06.2024
";

/// A GKD export covering May 1-3 2024.
fn gkd_fixture() -> String {
    format!(
        "{}Datum;Mittelwert;Maximum;Minimum\n\
         2024-05-01;12,4;13,0;11,9\n\
         2024-05-02;12,9;13,4;12,1\n\
         2024-05-03;13,1;13,8;12,5\n",
        GKD_METADATA
    )
}

/// An HND history table with one reading per hour for May 1-3 2024,
/// water levels cycling through the surfable band.
fn hnd_fixture() -> String {
    let mut rows = String::new();
    for day in 1..=3 {
        for hour in 0..24 {
            rows.push_str(&format!(
                "<tr><td>0{}.05.2024 {:02}:00</td><td>{},5</td></tr>\n",
                day,
                hour,
                132 + (hour * 7 + day * 3) % 20,
            ));
        }
    }
    format!(
        "<html><body><table class=\"tblsort\"><tbody>\n{}</tbody></table></body></html>",
        rows
    )
}

// ============================================================================
// Collection pipeline
// ============================================================================

fn pipeline_config(dir: &Path, hnd_url: &str) -> Config {
    let mut config = Config::default();
    config.paths.temperature_dir = dir.join("temperature-data").to_string_lossy().into_owned();
    config.paths.feature_csv = dir.join("features.csv").to_string_lossy().into_owned();
    config.paths.training_csv = dir.join("training.csv").to_string_lossy().into_owned();
    config.paths.model_artifact = dir.join("model.json").to_string_lossy().into_owned();
    config.paths.weather_cache_dir = dir.join("cache").to_string_lossy().into_owned();
    config.sources.hnd_url = hnd_url.to_string();
    config.collect.use_weather_api = false;
    config
}

#[test]
fn test_collection_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let temp_dir = dir.path().join("temperature-data");
    std::fs::create_dir(&temp_dir).unwrap();
    std::fs::write(temp_dir.join("temp_2024.csv"), gkd_fixture()).unwrap();

    let (url, _) = spawn_server(vec![http_response("200 OK", "text/html", &hnd_fixture())]);
    let config = pipeline_config(dir.path(), &url);

    let rows_written = collect::run_collection(&config).unwrap();
    // 3 days x 24 hourly level readings, all matching an expanded
    // temperature hour.
    assert_eq!(rows_written, Some(72));

    let loaded = dataset::read_observations(Path::new(&config.paths.feature_csv)).unwrap();
    assert!(loaded.missing_columns.is_empty());
    assert!(!loaded.has_label);
    assert_eq!(loaded.rows.len(), 72);
    for row in &loaded.rows {
        assert!(row.hour < 24);
        assert!(row.water_level >= 132.0);
        // Placeholder fill ran for every row
        assert!(row.weather_condition.is_some());
    }
}

#[test]
fn test_collection_with_disjoint_dates_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let temp_dir = dir.path().join("temperature-data");
    std::fs::create_dir(&temp_dir).unwrap();
    // Temperatures from a different year than the level table.
    std::fs::write(
        temp_dir.join("temp_2023.csv"),
        gkd_fixture().replace("2024-05", "2023-05"),
    )
    .unwrap();

    let (url, _) = spawn_server(vec![http_response("200 OK", "text/html", &hnd_fixture())]);
    let config = pipeline_config(dir.path(), &url);

    assert_eq!(collect::run_collection(&config).unwrap(), None);
    assert!(!Path::new(&config.paths.feature_csv).exists());
}

// ============================================================================
// Scraper failure modes
// ============================================================================

#[test]
fn test_scraper_fails_on_non_200() {
    let (url, _) = spawn_server(vec![http_response(
        "503 Service Unavailable",
        "text/html",
        "unavailable",
    )]);

    match hnd::fetch_water_level_history(&http_client(), &url) {
        Err(FetchError::HttpError(503)) => {}
        other => panic!("expected HttpError(503), got {:?}", other),
    }
}

#[test]
fn test_scraper_fails_on_missing_table() {
    let (url, _) = spawn_server(vec![http_response(
        "200 OK",
        "text/html",
        "<html><body><p>Wartungsarbeiten</p></body></html>",
    )]);

    match hnd::fetch_water_level_history(&http_client(), &url) {
        Err(FetchError::MissingTable) => {}
        other => panic!("expected MissingTable, got {:?}", other),
    }
}

// ============================================================================
// Weather client: retry and cache
// ============================================================================

const METEO_BODY: &str = r#"{
    "hourly": {
        "time": ["2024-05-01T00:00", "2024-05-01T01:00"],
        "temperature_2m": [11.2, 10.8],
        "weathercode": [0, 3]
    }
}"#;

fn may(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
}

#[test]
fn test_meteo_retries_transient_failures() {
    let (url, requests) = spawn_server(vec![
        http_response("500 Internal Server Error", "text/plain", "boom"),
        http_response("500 Internal Server Error", "text/plain", "boom"),
        http_response("200 OK", "application/json", METEO_BODY),
    ]);

    let client = MeteoClient::new(http_client(), None).with_base_url(&url);
    let hours = client.fetch_hourly(48.1372, 11.5761, may(1), may(1)).unwrap();

    assert_eq!(hours.len(), 2);
    assert_eq!(requests.load(Ordering::SeqCst), 3);
}

#[test]
fn test_meteo_does_not_retry_client_errors() {
    let (url, requests) = spawn_server(vec![
        http_response("400 Bad Request", "text/plain", "bad"),
        http_response("200 OK", "application/json", METEO_BODY),
    ]);

    let client = MeteoClient::new(http_client(), None).with_base_url(&url);
    match client.fetch_hourly(48.1372, 11.5761, may(1), may(1)) {
        Err(FetchError::HttpError(400)) => {}
        other => panic!("expected HttpError(400), got {:?}", other),
    }
    assert_eq!(requests.load(Ordering::SeqCst), 1);
}

#[test]
fn test_meteo_serves_second_request_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    let (url, requests) = spawn_server(vec![http_response(
        "200 OK",
        "application/json",
        METEO_BODY,
    )]);

    let client = MeteoClient::new(http_client(), Some(dir.path().to_path_buf()))
        .with_base_url(&url);

    let first = client.fetch_hourly(48.1372, 11.5761, may(1), may(1)).unwrap();
    let second = client.fetch_hourly(48.1372, 11.5761, may(1), may(1)).unwrap();

    assert_eq!(first, second);
    assert_eq!(requests.load(Ordering::SeqCst), 1, "second fetch must hit the cache");
}

#[test]
fn test_meteo_cache_is_keyed_by_request() {
    let dir = tempfile::tempdir().unwrap();
    let (url, requests) = spawn_server(vec![
        http_response("200 OK", "application/json", METEO_BODY),
        http_response("200 OK", "application/json", METEO_BODY),
    ]);

    let client = MeteoClient::new(http_client(), Some(dir.path().to_path_buf()))
        .with_base_url(&url);

    client.fetch_hourly(48.1372, 11.5761, may(1), may(1)).unwrap();
    // Different date range, same cache dir: must fetch again.
    client.fetch_hourly(48.1372, 11.5761, may(1), may(2)).unwrap();
    assert_eq!(requests.load(Ordering::SeqCst), 2);
}

// ============================================================================
// Train from CSV, serve from artifact
// ============================================================================

#[test]
fn test_train_from_csv_and_predict_from_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let training_path = dir.path().join("training.csv");
    let artifact_path = dir.path().join("model.json");

    // The synthetic generator is the canonical training fixture.
    let rows = synthetic::generate(400, synthetic::DEFAULT_SEED);
    dataset::write_observations(&training_path, &rows).unwrap();

    let loaded = dataset::read_observations(&training_path).unwrap();
    assert!(loaded.has_label);
    assert_eq!(loaded.rows.len(), 400);

    let model = regression::train(&loaded.rows).unwrap();
    assert_eq!(model.samples, 400);
    assert!(model.holdout_mse.is_finite());
    model.save(&artifact_path).unwrap();

    let served = LinearModel::load(&artifact_path).unwrap();
    assert_eq!(served, model);

    // Served predictions satisfy the endpoint contract.
    let below = predict_surfers(
        &served,
        &PredictRequest {
            hour: 12,
            water_temp: 14.0,
            air_temp: 22.0,
            water_level: 120.0,
            weather_condition: Some("sunny".to_string()),
        },
    );
    assert_eq!(below.surfer_count, 0);

    let above = predict_surfers(
        &served,
        &PredictRequest {
            hour: 12,
            water_temp: 14.0,
            air_temp: 22.0,
            water_level: 148.0,
            weather_condition: Some("sunny".to_string()),
        },
    );
    assert!(above.surfer_count >= 0);
}
