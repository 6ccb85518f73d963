use std::sync::Mutex;

use serde_json::Value;

use super::super::domain::{CandidateId, CandidateRecord, CandidateStatus, JobRequirements, SourceChannel};
use super::normalizer::candidate_from_raw;
use super::{rank_by_skill_overlap, CandidateRepository, RepositoryError, SourcedRecord};

/// A status write-back observed by an in-memory repository.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub id: CandidateId,
    pub status: CandidateStatus,
    pub notes: Option<String>,
}

/// Repository over a fixed candidate list, used by the CLI, HTTP service, and tests.
#[derive(Debug, Default)]
pub struct InMemoryCandidateRepository {
    records: Vec<CandidateRecord>,
    rejected: Vec<super::NormalizeError>,
    updates: Mutex<Vec<StatusUpdate>>,
}

impl InMemoryCandidateRepository {
    pub fn new(records: Vec<CandidateRecord>) -> Self {
        Self {
            records,
            rejected: Vec::new(),
            updates: Mutex::new(Vec::new()),
        }
    }

    /// Normalize raw channel payloads; unusable entries are reported on every query.
    pub fn from_raw(channel: SourceChannel, values: &[Value]) -> Self {
        let mut records = Vec::new();
        let mut rejected = Vec::new();
        for value in values {
            match candidate_from_raw(value, channel) {
                Ok(record) => records.push(record),
                Err(err) => rejected.push(err),
            }
        }
        Self {
            records,
            rejected,
            updates: Mutex::new(Vec::new()),
        }
    }

    pub fn status_updates(&self) -> Vec<StatusUpdate> {
        self.updates
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl CandidateRepository for InMemoryCandidateRepository {
    fn query(
        &self,
        job: &JobRequirements,
        max_results: usize,
    ) -> Result<Vec<SourcedRecord>, RepositoryError> {
        let mut ranked = self.records.clone();
        rank_by_skill_overlap(&mut ranked, job);
        ranked.truncate(max_results);

        let mut results: Vec<SourcedRecord> = ranked.into_iter().map(Ok).collect();
        results.extend(self.rejected.iter().cloned().map(Err));
        Ok(results)
    }

    fn update_status(
        &self,
        id: &CandidateId,
        status: CandidateStatus,
        notes: Option<&str>,
    ) -> Result<(), RepositoryError> {
        if !self.records.iter().any(|record| &record.id == id) {
            return Err(RepositoryError::NotFound);
        }
        let mut guard = self
            .updates
            .lock()
            .map_err(|_| RepositoryError::Unavailable("status log lock poisoned".to_string()))?;
        guard.push(StatusUpdate {
            id: id.clone(),
            status,
            notes: notes.map(str::to_string),
        });
        Ok(())
    }
}
