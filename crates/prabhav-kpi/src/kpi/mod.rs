//! KPI scoring and the submission workflow around it.
//!
//! Field workers submit named parameter series per user, period and project. Each submission
//! is scored with VASA and replaces whatever was stored for that key.

pub mod domain;
pub mod import;
pub mod parameters;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{InvalidPeriod, KpiItem, KpiKey, Period, ProjectId, UserId};
pub use import::{ParameterFileFormat, ParameterImportError, ParameterSetImporter};
pub use parameters::{ParameterSeries, ParameterSet, ParameterSetError};
pub use repository::{
    KpiRecord, KpiRecordView, KpiRepository, ParticipantDirectory, RepositoryError,
    UpsertOutcome,
};
pub use router::kpi_router;
pub use scoring::{compute_score, score_breakdown, InvalidInput, ParameterScore, ScoreBreakdown};
pub use service::{
    KpiServiceError, KpiSubmissionReceipt, KpiSubmissionRequest, KpiSubmissionService,
};
