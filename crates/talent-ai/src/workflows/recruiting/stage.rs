//! Generic stage driver shared by sourcing, screening, outreach, and response management.
//!
//! A stage moves `Pending -> Initializing -> Processing (repeated) -> Finalizing -> Complete`.
//! The worker decides how much work one `Processing` pass performs and when none remains;
//! the orchestrator owns the transitions, the audit trail, and the timing.

use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::context::RunContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Sourcing,
    Screening,
    Outreach,
    ResponseManagement,
}

impl StageKind {
    pub fn label(&self) -> &'static str {
        match self {
            StageKind::Sourcing => "sourcing",
            StageKind::Screening => "screening",
            StageKind::Outreach => "outreach",
            StageKind::ResponseManagement => "response_management",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageState {
    Pending,
    Initializing,
    Processing,
    Finalizing,
    Complete,
}

impl StageState {
    pub fn can_transition_to(&self, next: StageState) -> bool {
        matches!(
            (self, next),
            (StageState::Pending, StageState::Initializing)
                | (StageState::Initializing, StageState::Processing)
                | (StageState::Initializing, StageState::Finalizing)
                | (StageState::Processing, StageState::Processing)
                | (StageState::Processing, StageState::Finalizing)
                | (StageState::Finalizing, StageState::Complete)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    Transition,
    Progress,
    Warning,
}

/// Structured status message; business data is never stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub at: DateTime<Utc>,
    pub stage: StageKind,
    pub state: StageState,
    pub kind: AuditKind,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn push(&mut self, entry: AuditEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn for_stage(&self, stage: StageKind) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter().filter(move |entry| entry.stage == stage)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A failure isolated to one item; the stage keeps going.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemError {
    pub stage: StageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageMetrics {
    pub stage: StageKind,
    pub items_in: usize,
    pub items_out: usize,
    pub errors: usize,
    pub iterations: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageProgress {
    pub items_in: usize,
    pub items_out: usize,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StageError {
    #[error("{stage} stage could not start: {reason}")]
    Initialization { stage: StageKind, reason: String },
}

/// Stage-specific behavior plugged into the orchestrator.
pub trait StageWorker {
    type Output;

    fn kind(&self) -> StageKind;

    /// Prepare the work queue. An error skips processing but the stage still finalizes.
    fn initialize(&mut self, ctx: &mut RunContext) -> Result<(), StageError>;

    /// Continuation predicate checked before every `Processing` pass.
    fn has_pending_work(&self) -> bool;

    /// Perform one unit of work, recording per-item failures on the context.
    fn process_next(&mut self, ctx: &mut RunContext);

    fn progress(&self) -> StageProgress;

    fn finalize(self, ctx: &mut RunContext) -> Self::Output;
}

/// Output of one stage together with its metrics.
#[derive(Debug, Clone)]
pub struct StageRun<O> {
    pub output: O,
    pub metrics: StageMetrics,
}

pub struct StageOrchestrator<W> {
    worker: W,
    state: StageState,
}

impl<W: StageWorker> StageOrchestrator<W> {
    pub fn new(worker: W) -> Self {
        Self {
            worker,
            state: StageState::Pending,
        }
    }

    pub fn state(&self) -> StageState {
        self.state
    }

    pub fn run(mut self, ctx: &mut RunContext) -> StageRun<W::Output> {
        let stage = self.worker.kind();
        let started_at = ctx.now();
        let timer = Instant::now();
        let errors_before = ctx.error_count();

        self.enter(ctx, StageState::Initializing, format!("starting {stage}"));
        let initialized = match self.worker.initialize(ctx) {
            Ok(()) => true,
            Err(err) => {
                warn!(%stage, error = %err, "stage initialization failed");
                ctx.record_error(stage, None, err.to_string());
                ctx.audit(stage, self.state, AuditKind::Warning, err.to_string());
                false
            }
        };

        let mut iterations = 0;
        if initialized {
            while self.worker.has_pending_work() {
                iterations += 1;
                self.enter(
                    ctx,
                    StageState::Processing,
                    format!("{stage} pass {iterations}"),
                );
                self.worker.process_next(ctx);
            }
        }

        let progress = self.worker.progress();
        self.enter(
            ctx,
            StageState::Finalizing,
            format!(
                "{stage} processed {} of {} items",
                progress.items_out, progress.items_in
            ),
        );

        let StageOrchestrator { worker, .. } = self;
        let output = worker.finalize(ctx);

        let errors = ctx.error_count() - errors_before;
        ctx.audit(
            stage,
            StageState::Complete,
            AuditKind::Transition,
            format!("{stage} complete with {errors} error(s)"),
        );
        info!(
            %stage,
            items_in = progress.items_in,
            items_out = progress.items_out,
            errors,
            iterations,
            "stage complete"
        );

        StageRun {
            output,
            metrics: StageMetrics {
                stage,
                items_in: progress.items_in,
                items_out: progress.items_out,
                errors,
                iterations,
                started_at,
                finished_at: ctx.now(),
                elapsed_ms: u64::try_from(timer.elapsed().as_millis()).unwrap_or(u64::MAX),
            },
        }
    }

    fn enter(&mut self, ctx: &mut RunContext, next: StageState, content: String) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal stage transition {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
        ctx.audit(self.worker.kind(), next, AuditKind::Transition, content);
    }
}
