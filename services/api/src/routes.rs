use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use prabhav_kpi::error::AppError;
use prabhav_kpi::kpi::{
    kpi_router, score_breakdown, KpiRepository, KpiSubmissionService, ParameterScore,
    ParameterSet, ParticipantDirectory,
};
use prabhav_kpi::kpi::scoring::round_score;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct ScoreRequest {
    #[serde(alias = "kpiData")]
    pub(crate) kpi_data: ParameterSet,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScoreResponse {
    pub(crate) vasa_score: f64,
    pub(crate) raw_score: f64,
    pub(crate) entropy: f64,
    pub(crate) processed_parameters: usize,
    pub(crate) parameters: Vec<ParameterScore>,
}

pub(crate) fn with_kpi_routes<R, D>(service: Arc<KpiSubmissionService<R, D>>) -> axum::Router
where
    R: KpiRepository + 'static,
    D: ParticipantDirectory + 'static,
{
    kpi_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route("/api/v1/vasa/score", axum::routing::post(score_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Scores a parameter object without touching the KPI store.
pub(crate) async fn score_endpoint(
    Json(payload): Json<ScoreRequest>,
) -> Result<Json<ScoreResponse>, AppError> {
    let breakdown = score_breakdown(&payload.kpi_data)?;

    Ok(Json(ScoreResponse {
        vasa_score: round_score(breakdown.score),
        raw_score: breakdown.score,
        entropy: breakdown.entropy,
        processed_parameters: breakdown.parameters.len(),
        parameters: breakdown.parameters,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use prabhav_kpi::kpi::InvalidInput;

    fn request(kpi_data: serde_json::Value) -> ScoreRequest {
        serde_json::from_value(json!({ "kpiData": kpi_data })).expect("valid request")
    }

    #[tokio::test]
    async fn score_endpoint_returns_breakdown() {
        let Json(body) = score_endpoint(Json(request(json!({
            "parameter1": [75, 78, 76, 74, 77],
            "parameter2": [15, 12, 10, 18, 13],
            "parameter3": [88, 90, 85, 91, 87],
            "parameter4": [3, 4, 2, 5, 3],
            "parameter5": [60, 62, 61, 59, 63],
        }))))
        .await
        .expect("scores");

        assert_eq!(body.vasa_score, 45.0);
        assert_eq!(body.processed_parameters, 5);
        assert!((body.raw_score - 45.004399551275256).abs() < 1e-9);
        assert_eq!(body.parameters[3].normalized, 1.0);
    }

    #[tokio::test]
    async fn score_endpoint_rejects_single_parameter() {
        let result = score_endpoint(Json(request(json!({ "parameter1": [1, 2, 3] })))).await;

        match result {
            Err(AppError::Scoring(InvalidInput::TooFewParameters { found: 1 })) => {}
            other => panic!("expected scoring error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn score_request_rejects_non_array_values() {
        let parsed = serde_json::from_value::<ScoreRequest>(json!({
            "kpi_data": { "parameter1": 4 }
        }));
        assert!(parsed.is_err());
    }
}
