/// Surfer count prediction service for the Himmelreichbrücke river wave.
///
/// Four manual pipeline stages, each a binary under `src/bin/`:
/// collect feature data (`generate_features`), fabricate a bootstrap
/// dataset (`generate_synthetic`), fit the regression (`train_model`),
/// and serve predictions over HTTP (`serve`). Stages hand data to each
/// other through CSV files and a JSON model artifact; nothing is
/// orchestrated at runtime.

pub mod collect;
pub mod config;
pub mod dataset;
pub mod features;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod predict;
pub mod regression;
pub mod serve;
pub mod spot;
