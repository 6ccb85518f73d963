//! Candidate sourcing: repository seam, per-channel normalization, and the sourcing stage.

mod import;
mod memory;
pub mod normalizer;

pub use import::{CandidateImportError, CsvCandidateRepository};
pub use memory::{InMemoryCandidateRepository, StatusUpdate};
pub use normalizer::{candidate_from_raw, completeness, NormalizeError, ProfileCompleteness};

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::context::RunContext;
use super::domain::{CandidateId, CandidateRecord, CandidateStatus, JobRequirements, SourceChannel};
use super::stage::{AuditKind, StageError, StageKind, StageProgress, StageState, StageWorker};

/// One repository result: a usable candidate or the reason the record was unusable.
pub type SourcedRecord = Result<CandidateRecord, NormalizeError>;

/// Storage abstraction for candidate lookups and status write-back.
pub trait CandidateRepository: Send + Sync {
    fn query(
        &self,
        job: &JobRequirements,
        max_results: usize,
    ) -> Result<Vec<SourcedRecord>, RepositoryError>;

    fn update_status(
        &self,
        id: &CandidateId,
        status: CandidateStatus,
        notes: Option<&str>,
    ) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("candidate not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Channels to query, in the order they were registered.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    channels: Vec<(SourceChannel, Arc<dyn CandidateRepository>)>,
}

impl SourceRegistry {
    /// Registering a channel twice replaces the earlier repository in place.
    pub fn register(&mut self, channel: SourceChannel, repository: Arc<dyn CandidateRepository>) {
        match self.channels.iter_mut().find(|(existing, _)| *existing == channel) {
            Some(slot) => slot.1 = repository,
            None => self.channels.push((channel, repository)),
        }
    }

    pub fn with(mut self, channel: SourceChannel, repository: Arc<dyn CandidateRepository>) -> Self {
        self.register(channel, repository);
        self
    }

    pub fn get(&self, channel: SourceChannel) -> Option<&Arc<dyn CandidateRepository>> {
        self.channels
            .iter()
            .find(|(existing, _)| *existing == channel)
            .map(|(_, repository)| repository)
    }

    pub fn channels(&self) -> Vec<SourceChannel> {
        self.channels.iter().map(|(channel, _)| *channel).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("channels", &self.channels())
            .finish()
    }
}

/// Candidates yielded by one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMetrics {
    pub channel: SourceChannel,
    pub returned: usize,
    pub admitted: usize,
    pub duplicates: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcingOutput {
    pub candidates: Vec<CandidateRecord>,
    pub channels: BTreeMap<SourceChannel, ChannelMetrics>,
}

/// Queries one channel per processing pass and deduplicates across channels.
pub struct SourcingWorker {
    job: JobRequirements,
    max_per_channel: usize,
    queue: Vec<(SourceChannel, Arc<dyn CandidateRepository>)>,
    seen: HashSet<String>,
    admitted: Vec<CandidateRecord>,
    channels: BTreeMap<SourceChannel, ChannelMetrics>,
    returned: usize,
}

impl SourcingWorker {
    pub fn new(job: JobRequirements, max_per_channel: usize) -> Self {
        Self {
            job,
            max_per_channel,
            queue: Vec::new(),
            seen: HashSet::new(),
            admitted: Vec::new(),
            channels: BTreeMap::new(),
            returned: 0,
        }
    }
}

impl StageWorker for SourcingWorker {
    type Output = SourcingOutput;

    fn kind(&self) -> StageKind {
        StageKind::Sourcing
    }

    fn initialize(&mut self, ctx: &mut RunContext) -> Result<(), StageError> {
        let registry = ctx.sources().clone();
        self.queue = registry.channels.into_iter().rev().collect();
        if self.queue.is_empty() {
            ctx.audit(
                StageKind::Sourcing,
                StageState::Initializing,
                AuditKind::Warning,
                "no sourcing channels configured",
            );
        }
        Ok(())
    }

    fn has_pending_work(&self) -> bool {
        !self.queue.is_empty()
    }

    fn process_next(&mut self, ctx: &mut RunContext) {
        let Some((channel, repository)) = self.queue.pop() else {
            return;
        };

        let mut metrics = ChannelMetrics {
            channel,
            returned: 0,
            admitted: 0,
            duplicates: 0,
            rejected: 0,
        };

        match repository.query(&self.job, self.max_per_channel) {
            Ok(records) => {
                metrics.returned = records.len();
                for sourced in records {
                    let mut record = match sourced {
                        Ok(record) => record,
                        Err(err) => {
                            metrics.rejected += 1;
                            ctx.record_error(StageKind::Sourcing, Some(channel.label()), err.to_string());
                            continue;
                        }
                    };

                    let key = record.dedupe_key();
                    if key.as_ref().is_some_and(|key| self.seen.contains(key)) {
                        metrics.duplicates += 1;
                        continue;
                    }

                    // Ids are only unique within a channel.
                    if ctx.roster().contains(&record.id) {
                        record.qualify_id();
                        debug!(candidate = %record.id, %channel, "qualified a candidate id already in use");
                    }
                    if !ctx.roster_mut().admit(record.clone()) {
                        metrics.rejected += 1;
                        ctx.record_error(
                            StageKind::Sourcing,
                            Some(record.id.as_str()),
                            format!(
                                "candidate id {} is already taken in this run",
                                record.source_id()
                            ),
                        );
                        continue;
                    }
                    if let Some(key) = key {
                        self.seen.insert(key);
                    }
                    if !completeness(&record).is_contactable() {
                        debug!(candidate = %record.id, %channel, "sourced profile is missing contact fields");
                    }
                    metrics.admitted += 1;
                    self.admitted.push(record);
                }
            }
            Err(err) => {
                warn!(%channel, error = %err, "channel query failed");
                ctx.record_error(
                    StageKind::Sourcing,
                    Some(channel.label()),
                    format!("channel query failed: {err}"),
                );
            }
        }

        self.returned += metrics.returned;
        ctx.audit(
            StageKind::Sourcing,
            StageState::Processing,
            AuditKind::Progress,
            format!(
                "{channel}: {} returned, {} admitted, {} duplicates",
                metrics.returned, metrics.admitted, metrics.duplicates
            ),
        );
        self.channels.insert(channel, metrics);
    }

    fn progress(&self) -> StageProgress {
        StageProgress {
            items_in: self.returned,
            items_out: self.admitted.len(),
        }
    }

    fn finalize(self, _ctx: &mut RunContext) -> SourcingOutput {
        SourcingOutput {
            candidates: self.admitted,
            channels: self.channels,
        }
    }
}

/// Rank by overlap with the job's skills, keeping input order for ties.
pub(crate) fn rank_by_skill_overlap(records: &mut [CandidateRecord], job: &JobRequirements) {
    let wanted: HashSet<String> = job
        .required_skills
        .iter()
        .chain(job.preferred_skills.iter())
        .map(|skill| skill.trim().to_lowercase())
        .collect();

    records.sort_by_cached_key(|record| {
        let overlap = record
            .skills
            .iter()
            .filter(|skill| wanted.contains(&skill.trim().to_lowercase()))
            .count();
        std::cmp::Reverse(overlap)
    });
}
