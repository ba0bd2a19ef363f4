use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::domain::{KpiKey, ProjectId, UserId};
use super::repository::{KpiRecord, KpiRepository, ParticipantDirectory, RepositoryError};
use super::service::{
    KpiServiceError, KpiSubmissionRequest, KpiSubmissionService, REQUIRED_FIELDS,
};

/// Router builder exposing KPI submission and lookup endpoints.
pub fn kpi_router<R, D>(service: Arc<KpiSubmissionService<R, D>>) -> Router
where
    R: KpiRepository + 'static,
    D: ParticipantDirectory + 'static,
{
    Router::new()
        .route("/api/v1/kpis", post(submit_handler::<R, D>))
        .route("/api/v1/kpis/:project_id", get(project_handler::<R, D>))
        .route(
            "/api/v1/kpis/:project_id/users/:user_id/periods/:period",
            get(record_handler::<R, D>),
        )
        .with_state(service)
}

pub(crate) async fn submit_handler<R, D>(
    State(service): State<Arc<KpiSubmissionService<R, D>>>,
    payload: Result<axum::Json<KpiSubmissionRequest>, JsonRejection>,
) -> Response
where
    R: KpiRepository + 'static,
    D: ParticipantDirectory + 'static,
{
    let request = match payload {
        Ok(axum::Json(request)) => request,
        Err(rejection) => {
            return error_response(KpiServiceError::InvalidBody(rejection.body_text()));
        }
    };

    match service.submit(request) {
        Ok(receipt) => (StatusCode::CREATED, axum::Json(receipt)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn project_handler<R, D>(
    State(service): State<Arc<KpiSubmissionService<R, D>>>,
    Path(project_id): Path<String>,
) -> Response
where
    R: KpiRepository + 'static,
    D: ParticipantDirectory + 'static,
{
    let project_id = ProjectId(project_id);
    match service.project_records(&project_id) {
        Ok(records) => {
            let kpis: Vec<_> = records.iter().map(KpiRecord::view).collect();
            let payload = json!({
                "project_id": project_id,
                "count": kpis.len(),
                "kpis": kpis,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn record_handler<R, D>(
    State(service): State<Arc<KpiSubmissionService<R, D>>>,
    Path((project_id, user_id, period)): Path<(String, String, String)>,
) -> Response
where
    R: KpiRepository + 'static,
    D: ParticipantDirectory + 'static,
{
    let period = match period.parse() {
        Ok(period) => period,
        Err(error) => return error_response(KpiServiceError::InvalidPeriod(error)),
    };
    let key = KpiKey {
        user_id: UserId(user_id),
        period,
        project_id: ProjectId(project_id),
    };

    match service.get(&key) {
        Ok(record) => (StatusCode::OK, axum::Json(record.view())).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: KpiServiceError) -> Response {
    let (status, payload) = match &error {
        KpiServiceError::MissingFields => (
            StatusCode::BAD_REQUEST,
            json!({
                "error": "Missing required fields",
                "required": REQUIRED_FIELDS,
            }),
        ),
        KpiServiceError::InvalidBody(detail) => (
            StatusCode::BAD_REQUEST,
            json!({
                "error": "Invalid request body",
                "message": detail,
                "required": REQUIRED_FIELDS,
            }),
        ),
        KpiServiceError::InvalidPeriod(_) => (
            StatusCode::BAD_REQUEST,
            json!({
                "error": "Invalid period format",
                "message": error.to_string(),
            }),
        ),
        KpiServiceError::InvalidKpiData(_) => (
            StatusCode::BAD_REQUEST,
            json!({
                "error": "Invalid kpi_data format",
                "message": error.to_string(),
            }),
        ),
        KpiServiceError::ParameterCount { .. } => (
            StatusCode::BAD_REQUEST,
            json!({
                "error": "Unexpected parameter count",
                "message": error.to_string(),
            }),
        ),
        KpiServiceError::Scoring(source) => (
            StatusCode::BAD_REQUEST,
            json!({
                "error": "Failed to compute KPI score",
                "message": "Ensure kpi_data has valid numeric arrays for all parameters",
                "detail": source.to_string(),
            }),
        ),
        KpiServiceError::UserNotFound(_) => {
            (StatusCode::NOT_FOUND, json!({ "error": "User not found" }))
        }
        KpiServiceError::ProjectNotFound(_) => {
            (StatusCode::NOT_FOUND, json!({ "error": "Project not found" }))
        }
        KpiServiceError::Repository(RepositoryError::NotFound) => (
            StatusCode::NOT_FOUND,
            json!({ "error": "KPI record not found" }),
        ),
        KpiServiceError::Repository(RepositoryError::Unavailable(_)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": error.to_string() }),
        ),
    };

    (status, axum::Json(payload)).into_response()
}
