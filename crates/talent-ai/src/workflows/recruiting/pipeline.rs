use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::RecruitingConfig;

use super::context::RunContext;
use super::domain::{CandidateRecord, JobRequirements, JobRequirementsError, SourceChannel};
use super::outreach::{MessageDispatch, OutreachMetrics, OutreachRecord, OutreachWorker, RecruiterProfile};
use super::responses::{
    CandidateResponse, FollowUpRouter, FollowUpTask, InterviewSlot, PendingAction, ReplySource,
    ResponseClassifier, ResponseMetrics, ResponseSettings, ResponseWorker, ReviewEntry,
    RoutingConfig, ScheduledInterview, SlotGenerationRule, SuppressionEntry,
};
use super::screening::{
    CriteriaError, ScreeningCriteria, ScreeningEngine, ScreeningResult, ScreeningSummary,
    ScreeningWorker,
};
use super::sourcing::{ChannelMetrics, SourceRegistry, SourcingWorker};
use super::stage::{AuditEntry, ItemError, StageMetrics, StageOrchestrator};

/// Configuration problems that stop a run before any stage starts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid job requirements: {0}")]
    Job(#[from] JobRequirementsError),
    #[error("invalid screening criteria: {0}")]
    Criteria(#[from] CriteriaError),
    #[error("confidence threshold {value} must be between 0 and 1")]
    InvalidConfidenceThreshold { value: f64 },
    #[error("max candidates per channel must be greater than zero")]
    InvalidCandidateLimit,
}

/// Per-run knobs outside the screening criteria.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub max_candidates_per_channel: usize,
    pub screening_batch_size: usize,
    pub routing: RoutingConfig,
    pub recruiter: RecruiterProfile,
    pub responses: ResponseSettings,
    pub slot_rule: SlotGenerationRule,
    /// Replaces the generated slot pool when set.
    pub slots: Option<Vec<InterviewSlot>>,
}

impl PipelineSettings {
    pub fn from_config(config: &RecruitingConfig) -> Self {
        Self {
            max_candidates_per_channel: config.max_candidates_per_channel,
            screening_batch_size: 10,
            routing: RoutingConfig {
                confidence_threshold: config.confidence_threshold,
                ..RoutingConfig::default()
            },
            recruiter: RecruiterProfile::from(config),
            responses: ResponseSettings {
                interviewer_email: config.recruiter_email.clone(),
                ..ResponseSettings::default()
            },
            slot_rule: SlotGenerationRule::default().with_interviewer(config.interviewer.clone()),
            slots: None,
        }
    }

    fn validate(&self) -> Result<(), PipelineError> {
        let threshold = self.routing.confidence_threshold;
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(PipelineError::InvalidConfidenceThreshold { value: threshold });
        }
        if self.max_candidates_per_channel == 0 {
            return Err(PipelineError::InvalidCandidateLimit);
        }
        Ok(())
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&RecruitingConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub run_id: String,
    pub job_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stages: Vec<StageMetrics>,
    pub total_errors: usize,
    pub errors: Vec<ItemError>,
    /// Every sourced candidate with its final status, in sourcing order.
    pub candidates: Vec<CandidateRecord>,
    pub channels: BTreeMap<SourceChannel, ChannelMetrics>,
    pub screening_results: Vec<ScreeningResult>,
    pub screening_summary: ScreeningSummary,
    pub recommendations: Vec<String>,
    pub outreach: Vec<OutreachRecord>,
    pub outreach_metrics: OutreachMetrics,
    pub responses: Vec<CandidateResponse>,
    pub scheduled_interviews: Vec<ScheduledInterview>,
    pub pending_actions: Vec<PendingAction>,
    pub follow_ups: Vec<FollowUpTask>,
    pub review_queue: Vec<ReviewEntry>,
    pub suppressed: Vec<SuppressionEntry>,
    pub remaining_slots: usize,
    pub response_metrics: ResponseMetrics,
    pub audit: Vec<AuditEntry>,
}

static RUN_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_run_id() -> String {
    let id = RUN_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("run-{id:06}")
}

/// Chains sourcing, screening, outreach, and response management over one run context.
pub struct PipelineCoordinator {
    sources: SourceRegistry,
    dispatch: Arc<dyn MessageDispatch>,
    classifier: Arc<dyn ResponseClassifier>,
    replies: Arc<dyn ReplySource>,
    clock: Arc<dyn Clock>,
    settings: PipelineSettings,
}

impl PipelineCoordinator {
    pub fn new(
        sources: SourceRegistry,
        dispatch: Arc<dyn MessageDispatch>,
        classifier: Arc<dyn ResponseClassifier>,
        replies: Arc<dyn ReplySource>,
    ) -> Self {
        Self {
            sources,
            dispatch,
            classifier,
            replies,
            clock: Arc::new(SystemClock),
            settings: PipelineSettings::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn run(
        &self,
        job: &JobRequirements,
        criteria: ScreeningCriteria,
    ) -> Result<PipelineReport, PipelineError> {
        self.run_with_id(next_run_id(), job, criteria)
    }

    /// Validate configuration eagerly, then drive all four stages to completion.
    pub fn run_with_id(
        &self,
        run_id: impl Into<String>,
        job: &JobRequirements,
        criteria: ScreeningCriteria,
    ) -> Result<PipelineReport, PipelineError> {
        job.validate()?;
        self.settings.validate()?;
        let engine = ScreeningEngine::new(criteria)?;

        let mut ctx = RunContext::new(run_id, Arc::clone(&self.clock)).with_sources(self.sources.clone());
        let started_at = ctx.now();
        if self.sources.is_empty() {
            warn!(run = ctx.run_id(), "pipeline started without sourcing channels");
        }
        info!(run = ctx.run_id(), job = %job.job_id, "recruiting pipeline started");

        let sourcing = StageOrchestrator::new(SourcingWorker::new(
            job.clone(),
            self.settings.max_candidates_per_channel,
        ))
        .run(&mut ctx);

        let screening = StageOrchestrator::new(
            ScreeningWorker::new(engine, job.clone(), sourcing.output.candidates.clone())
                .with_batch_size(self.settings.screening_batch_size),
        )
        .run(&mut ctx);

        let outreach = StageOrchestrator::new(OutreachWorker::new(
            Arc::clone(&self.dispatch),
            job.clone(),
            self.settings.recruiter.clone(),
            screening.output.shortlisted.clone(),
        ))
        .run(&mut ctx);

        let mut responder = ResponseWorker::new(
            Arc::clone(&self.classifier),
            Arc::clone(&self.replies),
            FollowUpRouter::new(self.settings.routing.clone()),
            job,
            outreach.output.contacted.clone(),
        )
        .with_settings(self.settings.responses.clone())
        .with_slot_rule(self.settings.slot_rule.clone());
        if let Some(slots) = &self.settings.slots {
            responder = responder.with_slots(slots.clone());
        }
        let responses = StageOrchestrator::new(responder).run(&mut ctx);

        let report = PipelineReport {
            run_id: ctx.run_id().to_string(),
            job_id: job.job_id.clone(),
            started_at,
            finished_at: ctx.now(),
            stages: vec![
                sourcing.metrics,
                screening.metrics,
                outreach.metrics,
                responses.metrics,
            ],
            total_errors: ctx.error_count(),
            errors: ctx.errors().to_vec(),
            candidates: ctx.roster().records().cloned().collect(),
            channels: sourcing.output.channels,
            screening_results: screening.output.results,
            screening_summary: screening.output.summary,
            recommendations: screening.output.recommendations,
            outreach: outreach.output.messages,
            outreach_metrics: outreach.output.metrics,
            responses: responses.output.responses,
            scheduled_interviews: responses.output.scheduled,
            pending_actions: responses.output.pending_actions,
            follow_ups: responses.output.follow_ups,
            review_queue: ctx.review_queue().to_vec(),
            suppressed: responses.output.suppressed,
            remaining_slots: ctx.slots().len(),
            response_metrics: responses.output.metrics,
            audit: ctx.audit_log().entries().to_vec(),
        };

        info!(
            run = %report.run_id,
            candidates = report.candidates.len(),
            shortlisted = report.screening_summary.shortlisted,
            interviews = report.scheduled_interviews.len(),
            errors = report.total_errors,
            "recruiting pipeline complete"
        );
        Ok(report)
    }
}
