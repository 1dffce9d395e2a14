/// The prediction contract behind `POST /predict`.
///
/// One business override sits ahead of the model: below the surfable
/// water-level threshold the answer is zero surfers with an all-zero
/// explanation, and the model is never consulted. Above it, the model's
/// raw output is truncated to an integer and floored at zero, and the
/// explanation maps each payload field to its linear contribution — the
/// four one-hot flag contributions collapse into the single
/// `weather_condition` entry so the response mirrors the request schema.

use serde::{Deserialize, Serialize};

use crate::features;
use crate::model::WeatherCondition;
use crate::regression::LinearModel;
use crate::spot;

#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    pub hour: u32,
    pub water_temp: f64,
    pub air_temp: f64,
    pub water_level: f64,
    /// Canonical category string; absent or unknown reads as the baseline.
    #[serde(default)]
    pub weather_condition: Option<String>,
}

/// Per-field linear contribution (coefficient × value). All zeros on the
/// override path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub hour: f64,
    pub water_temp: f64,
    pub air_temp: f64,
    pub water_level: f64,
    pub weather_condition: f64,
}

impl Explanation {
    pub fn zero() -> Explanation {
        Explanation {
            hour: 0.0,
            water_temp: 0.0,
            air_temp: 0.0,
            water_level: 0.0,
            weather_condition: 0.0,
        }
    }

    /// Sum of all contributions (the model output minus the intercept).
    pub fn total(&self) -> f64 {
        self.hour + self.water_temp + self.air_temp + self.water_level + self.weather_condition
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub surfer_count: i64,
    pub explanation: Explanation,
}

/// Evaluate one prediction request against a loaded model.
pub fn predict_surfers(model: &LinearModel, request: &PredictRequest) -> PredictResponse {
    // Business override: below the threshold the wave does not form.
    if request.water_level < spot::SPOT.min_surfable_level_cm {
        return PredictResponse {
            surfer_count: 0,
            explanation: Explanation::zero(),
        };
    }

    let condition = request
        .weather_condition
        .as_deref()
        .and_then(WeatherCondition::parse);
    let feature_vec = features::encode(
        request.hour,
        request.water_temp,
        request.air_temp,
        request.water_level,
        condition,
    );

    let raw = model.predict(&feature_vec);
    let surfer_count = (raw.trunc() as i64).max(0);

    let contributions = model.contributions(&feature_vec);
    let explanation = Explanation {
        hour: contributions[0],
        water_temp: contributions[1],
        air_temp: contributions[2],
        water_level: contributions[3],
        weather_condition: contributions[4..].iter().sum(),
    };

    PredictResponse {
        surfer_count,
        explanation,
    }
}
