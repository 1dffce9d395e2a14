/// Training stage: read the labeled CSV, fit OLS, persist the artifact.
///
/// A missing feature column is filled with 0 and warned about (the fill
/// silently shifts the feature distribution); a missing label column is an
/// error. The artifact is overwritten unconditionally.

use dotenv::dotenv;
use std::error::Error;
use std::path::Path;

use surfmon_service::config::Config;
use surfmon_service::dataset;
use surfmon_service::logging::{self, DataSource, LogLevel};
use surfmon_service::regression;

fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    logging::init_logger(LogLevel::Info, None, true);

    let config = Config::load()?;
    let training_path = Path::new(&config.paths.training_csv);
    let loaded = dataset::read_observations(training_path)?;

    for column in &loaded.missing_columns {
        logging::warn(
            DataSource::Model,
            None,
            &format!(
                "training CSV is missing column '{}'; filled with 0 for every row",
                column
            ),
        );
    }
    if !loaded.has_label {
        return Err(format!(
            "{}: no surfer_count column, nothing to train on",
            training_path.display()
        )
        .into());
    }

    let model = regression::train(&loaded.rows)?;
    logging::info(
        DataSource::Model,
        None,
        &format!("Mean Squared Error: {}", model.holdout_mse),
    );

    let artifact_path = Path::new(&config.paths.model_artifact);
    model.save(artifact_path)?;
    logging::info(
        DataSource::Model,
        None,
        &format!("Model saved as {}", artifact_path.display()),
    );
    Ok(())
}
