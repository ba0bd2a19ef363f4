use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::KpiConfig;

use super::domain::{InvalidPeriod, KpiItem, KpiKey, ProjectId, UserId};
use super::parameters::{ParameterSet, ParameterSetError};
use super::repository::{
    KpiRecord, KpiRecordView, KpiRepository, ParticipantDirectory, RepositoryError,
};
use super::scoring::{compute_score, round_score, InvalidInput};

/// Fields every submission must carry.
pub const REQUIRED_FIELDS: [&str; 4] = ["user_id", "period", "project_id", "kpi_data"];

/// Raw submission payload. Fields stay optional so missing values can be reported together.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KpiSubmissionRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default, alias = "projectId")]
    pub project_id: Option<String>,
    #[serde(default, alias = "kpiData")]
    pub kpi_data: Option<Value>,
}

/// Successful submission result.
#[derive(Debug, Clone, Serialize)]
pub struct KpiSubmissionReceipt {
    pub message: &'static str,
    pub kpi: KpiRecordView,
    pub vasa_score: f64,
    pub processed_parameters: usize,
    #[serde(skip)]
    pub created: bool,
}

/// Validates submissions, scores them, and replaces the stored record for their key.
pub struct KpiSubmissionService<R, D> {
    repository: Arc<R>,
    directory: Arc<D>,
    config: KpiConfig,
}

impl<R, D> KpiSubmissionService<R, D>
where
    R: KpiRepository + 'static,
    D: ParticipantDirectory + 'static,
{
    pub fn new(repository: Arc<R>, directory: Arc<D>, config: KpiConfig) -> Self {
        Self {
            repository,
            directory,
            config,
        }
    }

    /// Score a submission and create or replace the record for its key.
    ///
    /// Nothing is written unless every check and the score computation succeed.
    pub fn submit(
        &self,
        request: KpiSubmissionRequest,
    ) -> Result<KpiSubmissionReceipt, KpiServiceError> {
        let KpiSubmissionRequest {
            user_id,
            period,
            project_id,
            kpi_data,
        } = request;

        let (Some(user_id), Some(period), Some(project_id), Some(kpi_data)) = (
            non_blank(user_id),
            non_blank(period),
            non_blank(project_id),
            kpi_data.filter(|value| !value.is_null()),
        ) else {
            return Err(KpiServiceError::MissingFields);
        };

        let key = KpiKey {
            user_id: UserId(user_id),
            period: period.parse()?,
            project_id: ProjectId(project_id),
        };

        if !kpi_data.is_object() {
            return Err(KpiServiceError::InvalidKpiData(ParameterSetError::NotAnObject));
        }
        if !self.directory.user_exists(&key.user_id)? {
            return Err(KpiServiceError::UserNotFound(key.user_id));
        }
        if !self.directory.project_exists(&key.project_id)? {
            return Err(KpiServiceError::ProjectNotFound(key.project_id));
        }

        let parameters = ParameterSet::from_json(&kpi_data)?;
        if let Some(expected) = self.config.required_parameter_count {
            if parameters.len() != expected {
                return Err(KpiServiceError::ParameterCount {
                    expected,
                    found: parameters.len(),
                });
            }
        }

        let score = compute_score(&parameters).map_err(|err| {
            warn!(
                user = %key.user_id,
                project = %key.project_id,
                period = %key.period,
                error = %err,
                "kpi score rejected"
            );
            KpiServiceError::Scoring(err)
        })?;

        let now = Utc::now();
        let record = KpiRecord {
            key,
            kpis: parameters
                .iter()
                .map(|series| KpiItem {
                    kpi_code: series.name.clone(),
                    computed_values: series.values.clone(),
                })
                .collect(),
            vasa_score: score,
            created_at: now,
            updated_at: now,
        };

        let outcome = self.repository.upsert(record)?;
        let created = outcome.was_created();
        let record = outcome.into_record();

        info!(
            user = %record.key.user_id,
            project = %record.key.project_id,
            period = %record.key.period,
            score,
            created,
            "kpi record stored"
        );

        Ok(KpiSubmissionReceipt {
            message: "KPI created/updated successfully",
            kpi: record.view(),
            vasa_score: round_score(score),
            processed_parameters: parameters.len(),
            created,
        })
    }

    pub fn get(&self, key: &KpiKey) -> Result<KpiRecord, KpiServiceError> {
        let record = self
            .repository
            .fetch(key)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    pub fn project_records(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<KpiRecord>, KpiServiceError> {
        let records = self.repository.by_project(project_id)?;
        debug!(project = %project_id, count = records.len(), "listed kpi records");
        Ok(records)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|raw| !raw.trim().is_empty())
}

/// Error raised by the KPI submission service.
#[derive(Debug, thiserror::Error)]
pub enum KpiServiceError {
    #[error("missing required fields")]
    MissingFields,
    #[error("malformed request body: {0}")]
    InvalidBody(String),
    #[error(transparent)]
    InvalidPeriod(#[from] InvalidPeriod),
    #[error(transparent)]
    InvalidKpiData(#[from] ParameterSetError),
    #[error("user '{0}' not found")]
    UserNotFound(UserId),
    #[error("project '{0}' not found")]
    ProjectNotFound(ProjectId),
    #[error("expected exactly {expected} parameters, got {found}")]
    ParameterCount { expected: usize, found: usize },
    #[error("failed to compute KPI score: {0}")]
    Scoring(#[source] InvalidInput),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
