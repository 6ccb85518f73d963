//! Recruiting pipeline: sourcing, screening, outreach, and response management.
//!
//! Each stage is a [`stage::StageWorker`] driven by the shared [`stage::StageOrchestrator`].
//! The [`pipeline::PipelineCoordinator`] chains the four stages over a single
//! [`context::RunContext`], which owns every piece of state that must not outlive the run.

pub mod context;
pub mod domain;
pub mod outreach;
pub mod pipeline;
pub mod responses;
pub mod router;
pub mod screening;
pub mod sourcing;
pub mod stage;

#[cfg(test)]
mod tests;

pub use context::{CandidateRoster, RunContext};
pub use domain::{
    CandidateId, CandidateRecord, CandidateStatus, JobContext, JobRequirements,
    JobRequirementsError, SourceChannel, StatusTransitionError, UNKNOWN_NAME,
};
pub use outreach::{
    DispatchError, InMemoryOutbox, MessageDispatch, OutreachDraft, OutreachMetrics,
    RecruiterProfile,
};
pub use pipeline::{PipelineCoordinator, PipelineError, PipelineReport, PipelineSettings};
pub use responses::{
    CandidateResponse, ClassifierError, FollowUpAction, FollowUpRouter, InMemoryReplySource,
    InboundReply, InterviewSlot, InterviewType, KeywordClassifier, ReplySource,
    ResponseClassifier, ResponseType, ScheduledInterview, SlotPool,
};
pub use router::{recruiting_router, RecruitingService};
pub use screening::{ScreeningCriteria, ScreeningEngine, ScreeningResult, ScreeningSummary};
pub use sourcing::{
    CandidateRepository, CsvCandidateRepository, InMemoryCandidateRepository, RepositoryError,
    SourceRegistry,
};
pub use stage::{StageKind, StageMetrics, StageOrchestrator, StageState, StageWorker};
