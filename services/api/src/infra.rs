use metrics_exporter_prometheus::PrometheusHandle;
use prabhav_kpi::config::DirectoryConfig;
use prabhav_kpi::kpi::{
    KpiKey, KpiRecord, KpiRepository, ParticipantDirectory, ProjectId, RepositoryError,
    UpsertOutcome, UserId,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// KPI store keyed by (user, period, project). The whole find-and-replace runs under one lock.
#[derive(Default, Clone)]
pub(crate) struct InMemoryKpiRepository {
    records: Arc<Mutex<BTreeMap<KpiKey, KpiRecord>>>,
}

impl KpiRepository for InMemoryKpiRepository {
    fn upsert(&self, mut record: KpiRecord) -> Result<UpsertOutcome, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let previous_created_at = guard.get(&record.key).map(|stored| stored.created_at);
        if let Some(created_at) = previous_created_at {
            record.created_at = created_at;
        }
        guard.insert(record.key.clone(), record.clone());

        Ok(if previous_created_at.is_some() {
            UpsertOutcome::Replaced(record)
        } else {
            UpsertOutcome::Created(record)
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

/// Known users and projects. A `None` list accepts every identifier of that kind.
#[derive(Debug, Default, Clone)]
pub(crate) struct InMemoryDirectory {
    users: Option<HashSet<String>>,
    projects: Option<HashSet<String>>,
}

impl InMemoryDirectory {
    pub(crate) fn from_config(config: &DirectoryConfig) -> Self {
        let to_set = |ids: &Vec<String>| ids.iter().cloned().collect::<HashSet<_>>();
        Self {
            users: config.known_users.as_ref().map(to_set),
            projects: config.known_projects.as_ref().map(to_set),
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.users.is_none() && self.projects.is_none()
    }
}

impl ParticipantDirectory for InMemoryDirectory {
    fn user_exists(&self, user_id: &UserId) -> Result<bool, RepositoryError> {
        Ok(self
            .users
            .as_ref()
            .map_or(true, |users| users.contains(&user_id.0)))
    }

    fn project_exists(&self, project_id: &ProjectId) -> Result<bool, RepositoryError> {
        Ok(self
            .projects
            .as_ref()
            .map_or(true, |projects| projects.contains(&project_id.0)))
    }
}
