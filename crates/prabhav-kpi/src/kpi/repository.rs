use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{KpiItem, KpiKey, Period, ProjectId, UserId};
use super::scoring::round_score;

/// Stored KPI submission for one user, period and project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiRecord {
    pub key: KpiKey,
    pub kpis: Vec<KpiItem>,
    pub vasa_score: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl KpiRecord {
    pub fn view(&self) -> KpiRecordView {
        KpiRecordView {
            user_id: self.key.user_id.clone(),
            period: self.key.period,
            project_id: self.key.project_id.clone(),
            kpis: self.kpis.clone(),
            vasa_score: round_score(self.vasa_score),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Flattened record representation returned by the HTTP API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiRecordView {
    pub user_id: UserId,
    pub period: Period,
    pub project_id: ProjectId,
    pub kpis: Vec<KpiItem>,
    pub vasa_score: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Whether an upsert created the record or replaced an existing one.
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome {
    Created(KpiRecord),
    Replaced(KpiRecord),
}

impl UpsertOutcome {
    pub fn record(&self) -> &KpiRecord {
        match self {
            UpsertOutcome::Created(record) | UpsertOutcome::Replaced(record) => record,
        }
    }

    pub fn into_record(self) -> KpiRecord {
        match self {
            UpsertOutcome::Created(record) | UpsertOutcome::Replaced(record) => record,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, UpsertOutcome::Created(_))
    }
}

/// KPI record storage.
///
/// `upsert` must be atomic per key: finding an existing record and replacing its items and
/// score cannot interleave with another write for the same key. A replacement keeps the
/// original `created_at`.
pub trait KpiRepository: Send + Sync {
    fn upsert(&self, record: KpiRecord) -> Result<UpsertOutcome, RepositoryError>;
    fn fetch(&self, key: &KpiKey) -> Result<Option<KpiRecord>, RepositoryError>;
    /// Records of one project ordered by period, then user.
    fn by_project(&self, project_id: &ProjectId) -> Result<Vec<KpiRecord>, RepositoryError>;
}

/// Lookup of the users and projects a KPI record may reference.
pub trait ParticipantDirectory: Send + Sync {
    fn user_exists(&self, user_id: &UserId) -> Result<bool, RepositoryError>;
    fn project_exists(&self, project_id: &ProjectId) -> Result<bool, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
