/// Synthetic-data stage: fabricate a labeled bootstrap dataset.

use dotenv::dotenv;
use std::error::Error;
use std::path::Path;

use surfmon_service::config::Config;
use surfmon_service::dataset::{self, synthetic};
use surfmon_service::logging::{self, DataSource, LogLevel};

fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    logging::init_logger(LogLevel::Info, None, true);

    let config = Config::load()?;
    let rows = synthetic::generate(synthetic::DEFAULT_ROWS, synthetic::DEFAULT_SEED);

    let path = Path::new(&config.paths.synthetic_csv);
    dataset::write_observations(path, &rows)?;
    logging::info(
        DataSource::Dataset,
        None,
        &format!("Dummy data saved to {}", path.display()),
    );
    Ok(())
}
