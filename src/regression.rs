/// Ordinary least squares training and the serialized model artifact.
///
/// Training is deliberately plain: a seeded 80/20 shuffle split, an OLS
/// fit with intercept, and held-out mean squared error as the sole quality
/// signal. The artifact is JSON carrying the coefficient vector, the
/// intercept, and the feature schema it was fitted against; loading
/// verifies that schema against the serving featurizer so a stale or
/// foreign artifact is refused at startup instead of producing meaningless
/// predictions.

use chrono::{DateTime, Utc};
use linfa::prelude::*;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::dataset::ObservationRow;
use crate::features;

/// Shuffle seed for the train/test split, for reproducible MSE reports.
pub const SPLIT_SEED: u64 = 42;

/// Held-out fraction of the labeled rows.
pub const TEST_FRACTION: f64 = 0.2;

// ============================================================================
// Model artifact
// ============================================================================

/// A fitted linear model plus the metadata needed to trust it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    /// Feature columns the coefficients were fitted against, in order.
    pub schema: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub trained_at: DateTime<Utc>,
    /// Mean squared error on the held-out split.
    pub holdout_mse: f64,
    /// Labeled rows the fit consumed (train + test).
    pub samples: usize,
}

impl LinearModel {
    /// Evaluate the model on one feature vector.
    pub fn predict(&self, features: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(c, x)| c * x)
                .sum::<f64>()
    }

    /// Per-feature linear contribution (coefficient × value), in schema
    /// order. The intercept is not part of any contribution.
    pub fn contributions(&self, features: &[f64]) -> Vec<f64> {
        self.coefficients
            .iter()
            .zip(features)
            .map(|(c, x)| c * x)
            .collect()
    }

    /// Persist the artifact, overwriting any prior file.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load an artifact and verify its schema against the featurizer.
    pub fn load(path: &Path) -> Result<LinearModel, ModelError> {
        let raw = std::fs::read_to_string(path)?;
        let model: LinearModel = serde_json::from_str(&raw)?;

        let expected = features::schema();
        if model.schema != expected || model.coefficients.len() != expected.len() {
            return Err(ModelError::SchemaMismatch {
                expected,
                found: model.schema,
            });
        }
        Ok(model)
    }
}

// ============================================================================
// Training
// ============================================================================

/// Fit a model on the labeled rows of a dataset: seeded 80/20 split, OLS
/// with intercept, held-out MSE. Rows without a label are ignored.
pub fn train(rows: &[ObservationRow]) -> Result<LinearModel, TrainError> {
    let labeled: Vec<(Vec<f64>, f64)> = rows
        .iter()
        .filter_map(|row| {
            row.surfer_count
                .map(|count| (features::encode_row(row), count as f64))
        })
        .collect();

    if labeled.is_empty() {
        return Err(TrainError::MissingLabels);
    }
    let n_samples = labeled.len();
    let test_len = ((n_samples as f64) * TEST_FRACTION).ceil() as usize;
    if test_len == 0 || test_len >= n_samples {
        return Err(TrainError::InsufficientData(n_samples));
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(SPLIT_SEED));
    let (test_idx, train_idx) = indices.split_at(test_len);

    let n_features = features::FEATURE_COLUMNS.len();
    let flat: Vec<f64> = train_idx
        .iter()
        .flat_map(|&i| labeled[i].0.iter().copied())
        .collect();
    let x = Array2::from_shape_vec((train_idx.len(), n_features), flat)
        .map_err(|e| TrainError::ArrayShape(e.to_string()))?;
    let y = Array1::from_iter(train_idx.iter().map(|&i| labeled[i].1));

    let dataset = Dataset::new(x, y);
    let fitted = LinearRegression::default()
        .with_intercept(true)
        .fit(&dataset)
        .map_err(|e: linfa_linear::LinearError<f64>| TrainError::Fit(e.to_string()))?;

    let model = LinearModel {
        schema: features::schema(),
        coefficients: fitted.params().to_vec(),
        intercept: fitted.intercept(),
        trained_at: Utc::now(),
        holdout_mse: 0.0,
        samples: n_samples,
    };

    // Held-out error, the sole quality signal.
    let predictions: Vec<f64> = test_idx.iter().map(|&i| model.predict(&labeled[i].0)).collect();
    let targets: Vec<f64> = test_idx.iter().map(|&i| labeled[i].1).collect();
    let holdout_mse = calculate_mse(&predictions, &targets);

    Ok(LinearModel { holdout_mse, ..model })
}

/// Mean squared error.
pub fn calculate_mse(predictions: &[f64], targets: &[f64]) -> f64 {
    if predictions.is_empty() || predictions.len() != targets.len() {
        return f64::MAX;
    }
    let sum_sq_error: f64 = predictions
        .iter()
        .zip(targets)
        .map(|(p, t)| (p - t).powi(2))
        .sum();
    sum_sq_error / predictions.len() as f64
}

// ============================================================================
// Error types
// ============================================================================

/// Errors from fitting.
#[derive(Debug, Clone)]
pub enum TrainError {
    /// No row carried a surfer_count label.
    MissingLabels,
    /// Too few labeled rows to hold out a test split.
    InsufficientData(usize),
    ArrayShape(String),
    Fit(String),
}

impl std::fmt::Display for TrainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrainError::MissingLabels => write!(f, "no labeled rows (surfer_count) in dataset"),
            TrainError::InsufficientData(n) => {
                write!(f, "insufficient data for an 80/20 split: {} samples", n)
            }
            TrainError::ArrayShape(e) => write!(f, "array shape error: {}", e),
            TrainError::Fit(e) => write!(f, "model fitting error: {}", e),
        }
    }
}

impl std::error::Error for TrainError {}

/// Errors from persisting or loading the artifact.
#[derive(Debug)]
pub enum ModelError {
    Io(std::io::Error),
    Json(serde_json::Error),
    /// The artifact was fitted against a different feature schema than the
    /// one this binary serves.
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::Io(e) => write!(f, "model artifact IO error: {}", e),
            ModelError::Json(e) => write!(f, "model artifact JSON error: {}", e),
            ModelError::SchemaMismatch { expected, found } => write!(
                f,
                "model schema mismatch: artifact was trained on [{}], server expects [{}]",
                found.join(", "),
                expected.join(", ")
            ),
        }
    }
}

impl std::error::Error for ModelError {}

impl From<std::io::Error> for ModelError {
    fn from(e: std::io::Error) -> Self {
        ModelError::Io(e)
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(e: serde_json::Error) -> Self {
        ModelError::Json(e)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WeatherCondition;
    use chrono::NaiveDate;

    /// Rows whose label is an exact linear function of hour and water
    /// level, with the remaining features varying but carrying zero weight.
    fn exact_linear_rows(n: usize) -> Vec<ObservationRow> {
        (0..n)
            .map(|i| {
                let hour = (i % 24) as u32;
                let water_level = 130.0 + (i % 20) as f64;
                let label = 2 * hour + (i % 20) as u32;
                ObservationRow {
                    date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    hour,
                    water_temp: (i % 13) as f64,
                    air_temp: (i % 7) as f64,
                    water_level,
                    weather_condition: Some(WeatherCondition::ALL[i % 5]),
                    surfer_count: Some(label),
                }
            })
            .collect()
    }

    #[test]
    fn test_ols_recovers_exact_linear_coefficients() {
        // label = 2*hour + (water_level - 130) = 2*hour + 1*water_level - 130
        let rows = exact_linear_rows(200);
        let model = train(&rows).unwrap();

        assert_eq!(model.samples, 200);
        assert!((model.coefficients[0] - 2.0).abs() < 1e-6, "hour coefficient");
        assert!((model.coefficients[3] - 1.0).abs() < 1e-6, "water_level coefficient");
        assert!((model.intercept + 130.0).abs() < 1e-4, "intercept");
        for (i, c) in model.coefficients.iter().enumerate() {
            if i != 0 && i != 3 {
                assert!(c.abs() < 1e-6, "coefficient {} should be ~0", i);
            }
        }
        assert!(model.holdout_mse < 1e-8);
    }

    #[test]
    fn test_training_is_reproducible() {
        let rows = exact_linear_rows(100);
        let a = train(&rows).unwrap();
        let b = train(&rows).unwrap();
        assert_eq!(a.coefficients, b.coefficients);
        assert_eq!(a.holdout_mse, b.holdout_mse);
    }

    #[test]
    fn test_unlabeled_rows_are_rejected() {
        let mut rows = exact_linear_rows(10);
        for row in &mut rows {
            row.surfer_count = None;
        }
        assert!(matches!(train(&rows), Err(TrainError::MissingLabels)));
    }

    #[test]
    fn test_too_few_rows_are_rejected() {
        let rows = exact_linear_rows(1);
        assert!(matches!(train(&rows), Err(TrainError::InsufficientData(1))));
    }

    #[test]
    fn test_artifact_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        let model = train(&exact_linear_rows(100)).unwrap();
        model.save(&path).unwrap();
        let loaded = LinearModel::load(&path).unwrap();

        assert_eq!(loaded, model);
    }

    #[test]
    fn test_save_overwrites_prior_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        let first = train(&exact_linear_rows(100)).unwrap();
        first.save(&path).unwrap();
        let mut second = first.clone();
        second.intercept = 99.0;
        second.save(&path).unwrap();

        assert_eq!(LinearModel::load(&path).unwrap().intercept, 99.0);
    }

    #[test]
    fn test_load_refuses_schema_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        let mut model = train(&exact_linear_rows(100)).unwrap();
        model.schema[0] = "weekday".to_string();
        model.save(&path).unwrap();

        assert!(matches!(
            LinearModel::load(&path),
            Err(ModelError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_calculate_mse() {
        let predictions = vec![10.0, 20.0, 30.0];
        let targets = vec![12.0, 18.0, 32.0];
        assert!((calculate_mse(&predictions, &targets) - 4.0).abs() < 1e-10);
    }
}
