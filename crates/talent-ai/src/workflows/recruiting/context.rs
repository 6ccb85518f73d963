use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::warn;

use crate::clock::Clock;

use super::domain::{CandidateId, CandidateRecord, CandidateStatus};
use super::responses::{ReviewEntry, SlotPool};
use super::sourcing::SourceRegistry;
use super::stage::{AuditEntry, AuditKind, AuditLog, ItemError, StageKind, StageState};

/// Candidates seen in this run, kept in sourcing order.
#[derive(Debug, Clone, Default)]
pub struct CandidateRoster {
    order: Vec<CandidateId>,
    records: HashMap<CandidateId, CandidateRecord>,
}

impl CandidateRoster {
    /// Returns `false` when a record with the same id is already present.
    pub fn admit(&mut self, record: CandidateRecord) -> bool {
        if self.records.contains_key(&record.id) {
            return false;
        }
        self.order.push(record.id.clone());
        self.records.insert(record.id.clone(), record);
        true
    }

    pub fn contains(&self, id: &CandidateId) -> bool {
        self.records.contains_key(id)
    }

    pub fn get(&self, id: &CandidateId) -> Option<&CandidateRecord> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &CandidateRecord> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    /// Case-insensitive lookup used to attribute inbound replies.
    pub fn find_by_email(&self, email: &str) -> Option<&CandidateRecord> {
        let wanted = email.trim();
        self.records().find(|record| {
            record
                .email
                .as_deref()
                .map(|candidate| candidate.trim().eq_ignore_ascii_case(wanted))
                .unwrap_or(false)
        })
    }

    fn get_mut(&mut self, id: &CandidateId) -> Option<&mut CandidateRecord> {
        self.records.get_mut(id)
    }
}

/// Mutable state scoped to a single pipeline execution.
///
/// Everything a stage shares with later stages lives here: the audit trail, collected
/// per-item errors, the candidate roster, the interview slot pool, conversation counts,
/// and the human review queue. Nothing survives the run.
pub struct RunContext {
    run_id: String,
    clock: Arc<dyn Clock>,
    audit: AuditLog,
    errors: Vec<ItemError>,
    roster: CandidateRoster,
    sources: SourceRegistry,
    slots: SlotPool,
    conversations: HashMap<CandidateId, u32>,
    review_queue: Vec<ReviewEntry>,
}

impl RunContext {
    pub fn new(run_id: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            run_id: run_id.into(),
            clock,
            audit: AuditLog::default(),
            errors: Vec::new(),
            roster: CandidateRoster::default(),
            sources: SourceRegistry::default(),
            slots: SlotPool::default(),
            conversations: HashMap::new(),
            review_queue: Vec::new(),
        }
    }

    pub fn with_sources(mut self, sources: SourceRegistry) -> Self {
        self.sources = sources;
        self
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn audit(
        &mut self,
        stage: StageKind,
        state: StageState,
        kind: AuditKind,
        content: impl Into<String>,
    ) {
        let at = self.now();
        self.audit.push(AuditEntry {
            at,
            stage,
            state,
            kind,
            content: content.into(),
        });
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    pub fn record_error(
        &mut self,
        stage: StageKind,
        item: Option<&str>,
        message: impl Into<String>,
    ) {
        let at = self.now();
        self.errors.push(ItemError {
            stage,
            item: item.map(str::to_string),
            message: message.into(),
            at,
        });
    }

    pub fn errors(&self) -> &[ItemError] {
        &self.errors
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn roster(&self) -> &CandidateRoster {
        &self.roster
    }

    pub fn roster_mut(&mut self) -> &mut CandidateRoster {
        &mut self.roster
    }

    pub fn sources(&self) -> &SourceRegistry {
        &self.sources
    }

    /// Advance a candidate and mirror the change to its source repository.
    ///
    /// Returns whether the candidate now holds `status`. Illegal transitions and persistence
    /// failures are recorded as item errors for `stage`.
    pub fn advance_candidate(
        &mut self,
        stage: StageKind,
        id: &CandidateId,
        status: CandidateStatus,
        note: Option<String>,
    ) -> bool {
        let Some(record) = self.roster.get_mut(id) else {
            self.record_error(stage, Some(id.as_str()), "candidate is not part of this run");
            return false;
        };
        let source = record.source;
        let source_id = record.source_id().clone();

        match record.advance(status, note.clone()) {
            Ok(false) => true,
            Ok(true) => {
                let persisted = match self.sources.get(source) {
                    Some(repository) => {
                        repository.update_status(&source_id, status, note.as_deref())
                    }
                    None => Ok(()),
                };
                if let Err(err) = persisted {
                    warn!(candidate = %id, %status, error = %err, "status update not persisted");
                    self.record_error(
                        stage,
                        Some(id.as_str()),
                        format!("failed to persist status {status}: {err}"),
                    );
                }
                true
            }
            Err(err) => {
                self.record_error(stage, Some(id.as_str()), err.to_string());
                false
            }
        }
    }

    pub fn slots(&self) -> &SlotPool {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut SlotPool {
        &mut self.slots
    }

    /// Increment and return how many replies this candidate has sent in the run.
    pub fn next_response_count(&mut self, id: &CandidateId) -> u32 {
        let count = self.conversations.entry(id.clone()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn enqueue_review(&mut self, entry: ReviewEntry) {
        self.review_queue.push(entry);
    }

    pub fn review_queue(&self) -> &[ReviewEntry] {
        &self.review_queue
    }
}
