/// Feature-collection stage: scrape, merge, and write the feature CSV.
///
/// Mirrors the manual pipeline contract: every failure is caught at this
/// outermost call, logged, and discarded — the process exits 0 either way
/// and the operator inspects the log and the output CSV.

use dotenv::dotenv;
use surfmon_service::config::Config;
use surfmon_service::logging::{self, DataSource, LogLevel};
use surfmon_service::collect;

fn main() {
    dotenv().ok();
    logging::init_logger(LogLevel::Info, None, true);

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            logging::error(DataSource::System, None, &format!("config error: {}", e));
            return;
        }
    };

    match collect::run_collection(&config) {
        Ok(Some(rows)) => {
            logging::info(
                DataSource::System,
                None,
                &format!("Collection finished: {} rows", rows),
            );
        }
        Ok(None) => {
            logging::warn(DataSource::System, None, "Collection produced no data");
        }
        Err(e) => {
            logging::error(DataSource::System, None, &format!("An error occurred: {}", e));
        }
    }
}
