/// Serving stage: load the model artifact once, expose `POST /predict`.
///
/// The artifact's embedded feature schema is verified at load; a mismatch
/// refuses to start rather than serving meaningless predictions.

use dotenv::dotenv;
use std::error::Error;
use std::path::Path;

use surfmon_service::config::Config;
use surfmon_service::logging::{self, LogLevel};
use surfmon_service::regression::LinearModel;
use surfmon_service::serve;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    logging::init_logger(LogLevel::Info, None, true);

    let config = Config::load()?;
    let model = LinearModel::load(Path::new(&config.paths.model_artifact))?;

    serve::run(model, config.server.port).await
}
