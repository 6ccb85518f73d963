use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::super::context::RunContext;
use super::super::domain::{CandidateRecord, CandidateStatus, JobRequirements};
use super::super::stage::{AuditKind, StageError, StageKind, StageProgress, StageState, StageWorker};
use super::{ScreeningEngine, ScreeningResult, ScreeningSummary};

const DEFAULT_BATCH_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningOutput {
    pub results: Vec<ScreeningResult>,
    pub summary: ScreeningSummary,
    pub recommendations: Vec<String>,
    /// Candidates forwarded to outreach, in input order.
    pub shortlisted: Vec<CandidateRecord>,
}

/// Screens candidates in fixed-size batches, one batch per processing pass.
pub struct ScreeningWorker {
    engine: ScreeningEngine,
    job: JobRequirements,
    batch_size: usize,
    pending: VecDeque<CandidateRecord>,
    received: usize,
    results: Vec<ScreeningResult>,
    shortlisted: Vec<CandidateRecord>,
    errors_at_start: usize,
    errors_seen: usize,
}

impl ScreeningWorker {
    pub fn new(engine: ScreeningEngine, job: JobRequirements, candidates: Vec<CandidateRecord>) -> Self {
        Self {
            engine,
            job,
            batch_size: DEFAULT_BATCH_SIZE,
            received: candidates.len(),
            pending: candidates.into(),
            results: Vec::new(),
            shortlisted: Vec::new(),
            errors_at_start: 0,
            errors_seen: 0,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    fn screen_one(&mut self, candidate: CandidateRecord, ctx: &mut RunContext) {
        let result = match self.engine.try_screen(&candidate, &self.job) {
            Ok(result) => result,
            Err(err) => {
                ctx.record_error(StageKind::Screening, Some(candidate.id.as_str()), err.to_string());
                let result =
                    ScreeningResult::failed(&candidate, &self.job, self.engine.criteria(), &err);
                ctx.advance_candidate(
                    StageKind::Screening,
                    &candidate.id,
                    CandidateStatus::Rejected,
                    Some("screening failed".to_string()),
                );
                self.results.push(result);
                return;
            }
        };

        let note = result.decision_summary();
        ctx.advance_candidate(
            StageKind::Screening,
            &candidate.id,
            CandidateStatus::Screened,
            Some(note.clone()),
        );

        let next = if result.recommended_for_shortlist {
            Some(CandidateStatus::Shortlisted)
        } else if !result.passes_screening {
            Some(CandidateStatus::Rejected)
        } else {
            None
        };

        let forwarded = match next {
            Some(status) => {
                ctx.advance_candidate(StageKind::Screening, &candidate.id, status, Some(note))
                    && status == CandidateStatus::Shortlisted
            }
            None => false,
        };

        if forwarded {
            if let Some(record) = ctx.roster().get(&candidate.id) {
                self.shortlisted.push(record.clone());
            }
        }
        self.results.push(result);
    }
}

impl StageWorker for ScreeningWorker {
    type Output = ScreeningOutput;

    fn kind(&self) -> StageKind {
        StageKind::Screening
    }

    fn initialize(&mut self, ctx: &mut RunContext) -> Result<(), StageError> {
        self.errors_at_start = ctx.error_count();
        if self.pending.is_empty() {
            ctx.audit(
                StageKind::Screening,
                StageState::Initializing,
                AuditKind::Warning,
                "no candidates to screen",
            );
        }
        Ok(())
    }

    fn has_pending_work(&self) -> bool {
        !self.pending.is_empty()
    }

    fn process_next(&mut self, ctx: &mut RunContext) {
        let take = self.batch_size.min(self.pending.len());
        let batch: Vec<CandidateRecord> = self.pending.drain(..take).collect();
        for candidate in batch {
            self.screen_one(candidate, ctx);
        }
        self.errors_seen = ctx.error_count() - self.errors_at_start;

        ctx.audit(
            StageKind::Screening,
            StageState::Processing,
            AuditKind::Progress,
            format!(
                "screened {} of {} candidates, {} shortlisted",
                self.results.len(),
                self.received,
                self.shortlisted.len()
            ),
        );
    }

    fn progress(&self) -> StageProgress {
        StageProgress {
            items_in: self.received,
            items_out: self.shortlisted.len(),
        }
    }

    fn finalize(self, _ctx: &mut RunContext) -> ScreeningOutput {
        let summary = ScreeningSummary::from_results(&self.results, self.errors_seen);
        let recommendations = summary.recommendations();
        ScreeningOutput {
            results: self.results,
            summary,
            recommendations,
            shortlisted: self.shortlisted,
        }
    }
}
