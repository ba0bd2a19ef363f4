use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::{json, Value};

use crate::config::KpiConfig;
use crate::kpi::domain::{KpiKey, ProjectId, UserId};
use crate::kpi::repository::{
    KpiRecord, KpiRepository, ParticipantDirectory, RepositoryError, UpsertOutcome,
};
use crate::kpi::service::{KpiSubmissionRequest, KpiSubmissionService};
use crate::kpi::kpi_router;

pub(super) const USER: &str = "fw-1042";
pub(super) const PROJECT: &str = "land-survey-07";
pub(super) const PERIOD: &str = "2025-12";

pub(super) fn kpi_data() -> Value {
    json!({
        "parameter1": [75, 78, 76, 74, 77],
        "parameter2": [15, 12, 10, 18, 13],
        "parameter3": [88, 90, 85, 91, 87],
        "parameter4": [3, 4, 2, 5, 3],
        "parameter5": [60, 62, 61, 59, 63],
    })
}

pub(super) fn request() -> KpiSubmissionRequest {
    KpiSubmissionRequest {
        user_id: Some(USER.to_string()),
        period: Some(PERIOD.to_string()),
        project_id: Some(PROJECT.to_string()),
        kpi_data: Some(kpi_data()),
    }
}

pub(super) fn request_with_data(kpi_data: Value) -> KpiSubmissionRequest {
    KpiSubmissionRequest {
        kpi_data: Some(kpi_data),
        ..request()
    }
}

pub(super) fn key() -> KpiKey {
    KpiKey {
        user_id: UserId(USER.to_string()),
        period: PERIOD.parse().expect("valid period"),
        project_id: ProjectId(PROJECT.to_string()),
    }
}

pub(super) fn build_service() -> (
    KpiSubmissionService<MemoryRepository, MemoryDirectory>,
    Arc<MemoryRepository>,
) {
    build_service_with(KpiConfig::default())
}

pub(super) fn build_service_with(
    config: KpiConfig,
) -> (
    KpiSubmissionService<MemoryRepository, MemoryDirectory>,
    Arc<MemoryRepository>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let directory = Arc::new(MemoryDirectory::with(&[USER], &[PROJECT]));
    let service = KpiSubmissionService::new(repository.clone(), directory, config);
    (service, repository)
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    records: Mutex<BTreeMap<KpiKey, KpiRecord>>,
}

impl MemoryRepository {
    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("repository mutex poisoned").len()
    }
}

impl KpiRepository for MemoryRepository {
    fn upsert(&self, mut record: KpiRecord) -> Result<UpsertOutcome, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let existing = guard.get(&record.key).map(|stored| stored.created_at);
        if let Some(created_at) = existing {
            record.created_at = created_at;
        }
        guard.insert(record.key.clone(), record.clone());
        Ok(match existing {
            Some(_) => UpsertOutcome::Replaced(record),
            None => UpsertOutcome::Created(record),
        })
    }

    fn fetch(&self, key: &KpiKey) -> Result<Option<KpiRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(key).cloned())
    }

    fn by_project(&self, project_id: &ProjectId) -> Result<Vec<KpiRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut records: Vec<KpiRecord> = guard
            .values()
            .filter(|record| &record.key.project_id == project_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            (a.key.period, &a.key.user_id).cmp(&(b.key.period, &b.key.user_id))
        });
        Ok(records)
    }
}

pub(super) struct MemoryDirectory {
    users: HashSet<String>,
    projects: HashSet<String>,
}

impl MemoryDirectory {
    pub(super) fn with(users: &[&str], projects: &[&str]) -> Self {
        Self {
            users: users.iter().map(|id| id.to_string()).collect(),
            projects: projects.iter().map(|id| id.to_string()).collect(),
        }
    }
}

impl ParticipantDirectory for MemoryDirectory {
    fn user_exists(&self, user_id: &UserId) -> Result<bool, RepositoryError> {
        Ok(self.users.contains(&user_id.0))
    }

    fn project_exists(&self, project_id: &ProjectId) -> Result<bool, RepositoryError> {
        Ok(self.projects.contains(&project_id.0))
    }
}

pub(super) struct UnavailableRepository;

impl KpiRepository for UnavailableRepository {
    fn upsert(&self, _record: KpiRecord) -> Result<UpsertOutcome, RepositoryError> {
        Err(RepositoryError::Unavailable("document store offline".to_string()))
    }

    fn fetch(&self, _key: &KpiKey) -> Result<Option<KpiRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("document store offline".to_string()))
    }

    fn by_project(&self, _project_id: &ProjectId) -> Result<Vec<KpiRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("document store offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn kpi_router_with_service(
    service: KpiSubmissionService<MemoryRepository, MemoryDirectory>,
) -> axum::Router {
    kpi_router(Arc::new(service))
}
