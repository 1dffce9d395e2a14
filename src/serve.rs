/// HTTP serving of the prediction endpoint.
///
/// One route, `POST /predict`. The handler is straight-line code sharing
/// only the read-only loaded model; request concurrency is the
/// framework's. Malformed payloads surface as axum's extractor rejection
/// (422/400) — the endpoint itself performs no validation beyond presence
/// and JSON types.

use axum::{extract::State, routing::post, Json, Router};
use std::error::Error;
use std::sync::Arc;

use crate::logging::{self, DataSource};
use crate::predict::{predict_surfers, PredictRequest, PredictResponse};
use crate::regression::LinearModel;

#[derive(Clone)]
pub struct AppState {
    pub model: Arc<LinearModel>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/predict", post(predict_handler))
        .with_state(state)
}

pub async fn predict_handler(
    State(state): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> Json<PredictResponse> {
    Json(predict_surfers(&state.model, &request))
}

/// Bind and serve until the process is killed.
pub async fn run(model: LinearModel, port: u16) -> Result<(), Box<dyn Error>> {
    logging::info(
        DataSource::Server,
        None,
        &format!(
            "model trained {} on {} samples, holdout MSE {:.3}",
            model.trained_at.format("%Y-%m-%d %H:%M UTC"),
            model.samples,
            model.holdout_mse
        ),
    );

    let state = AppState {
        model: Arc::new(model),
    };
    let app = router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    logging::info(DataSource::Server, None, &format!("listening on {}", addr));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
