//! Response management: classify inbound replies, route them, and execute follow-ups.

pub mod classifier;
pub mod entities;
pub mod follow_up;
pub mod slots;

pub use classifier::{
    classify_or_default, Classification, ClassificationRequest, ClassifierError, FollowUpAction,
    InterviewType, KeywordClassifier, ResponseClassifier, ResponseType, Sentiment,
};
pub use entities::ExtractedEntities;
pub use follow_up::{FollowUpRouter, ReviewTrigger, RoutingConfig, RoutingDecision};
pub use slots::{InterviewSlot, ScheduledInterview, SlotGenerationRule, SlotPool};

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::context::RunContext;
use super::domain::{CandidateId, CandidateRecord, CandidateStatus, JobContext, JobRequirements};
use super::stage::{AuditKind, StageError, StageKind, StageProgress, StageState, StageWorker};

/// An inbound email reply as delivered by the mailbox adapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InboundReply {
    pub from_email: String,
    pub from_name: Option<String>,
    pub subject: String,
    pub content: String,
    pub received_at: Option<DateTime<Utc>>,
}

impl InboundReply {
    fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("from_email", &self.from_email),
            ("subject", &self.subject),
            ("content", &self.content),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplySourceError {
    #[error("reply source unavailable: {0}")]
    Unavailable(String),
}

/// Mailbox seam: pulls replies to the messages sent during outreach.
pub trait ReplySource: Send + Sync {
    fn collect(&self, contacted: &[CandidateRecord]) -> Result<Vec<InboundReply>, ReplySourceError>;
}

/// Replies supplied up front, e.g. from a fixture file or request body.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReplySource {
    replies: Vec<InboundReply>,
}

impl InMemoryReplySource {
    pub fn new(replies: Vec<InboundReply>) -> Self {
        Self { replies }
    }
}

impl ReplySource for InMemoryReplySource {
    fn collect(&self, _contacted: &[CandidateRecord]) -> Result<Vec<InboundReply>, ReplySourceError> {
        Ok(self.replies.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResponse {
    pub response_id: String,
    pub candidate_id: CandidateId,
    pub candidate_name: String,
    pub candidate_email: String,
    pub subject: String,
    pub raw_response: String,
    pub received_at: DateTime<Utc>,
    pub response_type: ResponseType,
    pub sentiment: Sentiment,
    pub confidence: f64,
    pub reasoning: String,
    pub key_phrases: Vec<String>,
    #[serde(flatten)]
    pub entities: ExtractedEntities,
    pub follow_up_action: FollowUpAction,
    pub interview_type: Option<InterviewType>,
    pub priority_level: u8,
    pub human_review_needed: bool,
    pub review_triggers: Vec<ReviewTrigger>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification_error: Option<String>,
    /// 1 for a candidate's first reply in the run, incremented for each repeat.
    pub response_count: u32,
    pub job_id: String,
    pub job_title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingActionKind {
    FindInterviewSlot,
    ManualResponse,
    FollowUpLater,
    HumanReview,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAction {
    pub response_id: String,
    pub candidate_id: CandidateId,
    pub kind: PendingActionKind,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpKind {
    InterviewConfirmation,
    AnswerQuestions,
    SendInfo,
    FutureOpportunities,
}

/// A follow-up message queued for the dispatch adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUpTask {
    pub response_id: String,
    pub candidate_id: CandidateId,
    pub recipient: String,
    pub kind: FollowUpKind,
    pub subject: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewEntry {
    pub response_id: String,
    pub candidate_id: CandidateId,
    pub candidate_email: String,
    pub priority_level: u8,
    pub reasons: Vec<String>,
    pub queued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuppressionEntry {
    pub candidate_id: CandidateId,
    pub email: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetrics {
    pub total_responses: usize,
    pub interested: usize,
    pub not_interested: usize,
    pub questions: usize,
    pub other: usize,
    pub auto_processed: usize,
    pub human_review: usize,
    pub processing_errors: usize,
    pub interviews_scheduled: usize,
    pub automation_rate: f64,
    pub average_confidence: f64,
}

impl ResponseMetrics {
    pub fn compute(responses: &[CandidateResponse], interviews_scheduled: usize, item_errors: usize) -> Self {
        let mut metrics = Self {
            total_responses: responses.len(),
            interviews_scheduled,
            ..Self::default()
        };

        for response in responses {
            match response.response_type {
                ResponseType::Interested => metrics.interested += 1,
                ResponseType::NotInterested => metrics.not_interested += 1,
                ResponseType::Questions => metrics.questions += 1,
                _ => metrics.other += 1,
            }
            if response.human_review_needed {
                metrics.human_review += 1;
            } else {
                metrics.auto_processed += 1;
            }
        }

        let degraded = responses
            .iter()
            .filter(|response| response.classification_error.is_some())
            .count();
        metrics.processing_errors = item_errors + degraded;

        if metrics.total_responses > 0 {
            metrics.automation_rate =
                metrics.auto_processed as f64 / metrics.total_responses as f64 * 100.0;
        }

        let classified: Vec<f64> = responses
            .iter()
            .filter(|response| response.classification_error.is_none())
            .map(|response| response.confidence)
            .collect();
        if !classified.is_empty() {
            metrics.average_confidence = classified.iter().sum::<f64>() / classified.len() as f64;
        }

        metrics
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseOutput {
    pub responses: Vec<CandidateResponse>,
    pub scheduled: Vec<ScheduledInterview>,
    pub pending_actions: Vec<PendingAction>,
    pub follow_ups: Vec<FollowUpTask>,
    pub suppressed: Vec<SuppressionEntry>,
    pub metrics: ResponseMetrics,
    /// Candidates who replied, in the order their first reply was processed.
    pub responded: Vec<CandidateRecord>,
}

/// Behavior switches for follow-up execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseSettings {
    pub auto_respond_to_questions: bool,
    pub interviewer_email: String,
}

impl Default for ResponseSettings {
    fn default() -> Self {
        Self {
            auto_respond_to_questions: true,
            interviewer_email: "recruiting@example.com".to_string(),
        }
    }
}

/// Processes one reply per pass: classify, route, then execute the follow-up.
pub struct ResponseWorker {
    classifier: Arc<dyn ResponseClassifier>,
    replies: Arc<dyn ReplySource>,
    router: FollowUpRouter,
    settings: ResponseSettings,
    slot_rule: SlotGenerationRule,
    fixed_slots: Option<Vec<InterviewSlot>>,
    job: JobContext,
    contacted: Vec<CandidateRecord>,
    contacted_ids: HashSet<CandidateId>,
    pending: VecDeque<InboundReply>,
    received: usize,
    sequence: usize,
    item_errors: usize,
    output: ResponseOutput,
}

impl ResponseWorker {
    pub fn new(
        classifier: Arc<dyn ResponseClassifier>,
        replies: Arc<dyn ReplySource>,
        router: FollowUpRouter,
        job: &JobRequirements,
        contacted: Vec<CandidateRecord>,
    ) -> Self {
        Self {
            classifier,
            replies,
            router,
            settings: ResponseSettings::default(),
            slot_rule: SlotGenerationRule::default(),
            fixed_slots: None,
            job: job.context(),
            contacted_ids: contacted.iter().map(|record| record.id.clone()).collect(),
            contacted,
            pending: VecDeque::new(),
            received: 0,
            sequence: 0,
            item_errors: 0,
            output: ResponseOutput {
                responses: Vec::new(),
                scheduled: Vec::new(),
                pending_actions: Vec::new(),
                follow_ups: Vec::new(),
                suppressed: Vec::new(),
                metrics: ResponseMetrics::default(),
                responded: Vec::new(),
            },
        }
    }

    pub fn with_settings(mut self, settings: ResponseSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_slot_rule(mut self, rule: SlotGenerationRule) -> Self {
        self.slot_rule = rule;
        self
    }

    /// Use these slots instead of generating the pool from the rule.
    pub fn with_slots(mut self, slots: Vec<InterviewSlot>) -> Self {
        self.fixed_slots = Some(slots);
        self
    }

    fn fail_item(&mut self, ctx: &mut RunContext, item: &str, message: String) {
        self.item_errors += 1;
        ctx.record_error(StageKind::ResponseManagement, Some(item), message);
    }

    fn handle(&mut self, reply: InboundReply, ctx: &mut RunContext) {
        let missing = reply.missing_fields();
        if !missing.is_empty() {
            let item = if reply.from_email.trim().is_empty() {
                "unknown sender".to_string()
            } else {
                reply.from_email.clone()
            };
            self.fail_item(
                ctx,
                &item,
                format!("invalid reply: missing {}", missing.join(", ")),
            );
            return;
        }

        let matched = ctx
            .roster()
            .find_by_email(&reply.from_email)
            .filter(|record| self.contacted_ids.contains(&record.id))
            .cloned();
        let Some(candidate) = matched else {
            self.fail_item(
                ctx,
                &reply.from_email,
                format!("reply from {} does not match a contacted candidate", reply.from_email),
            );
            return;
        };

        let response_count = ctx.next_response_count(&candidate.id);
        self.sequence += 1;
        let response_id = format!("{}-resp-{:03}", ctx.run_id(), self.sequence);

        let request = ClassificationRequest {
            text: &reply.content,
            subject: &reply.subject,
            job: &self.job,
        };
        let (classification, classifier_error) =
            classify_or_default(self.classifier.as_ref(), &request);
        if let Some(err) = &classifier_error {
            ctx.audit(
                StageKind::ResponseManagement,
                StageState::Processing,
                AuditKind::Warning,
                format!("{response_id}: {err}, routed to human review"),
            );
        }

        let entities = ExtractedEntities::from_text(&reply.content);
        let decision = self.router.route(&classification, &entities, &self.job);

        let response = CandidateResponse {
            response_id,
            candidate_id: candidate.id.clone(),
            candidate_name: candidate.name.clone(),
            candidate_email: reply.from_email.trim().to_string(),
            subject: reply.subject,
            raw_response: reply.content,
            received_at: reply.received_at.unwrap_or_else(|| ctx.now()),
            response_type: classification.response_type,
            sentiment: classification.sentiment,
            confidence: classification.confidence,
            reasoning: classification.reasoning,
            key_phrases: classification.key_phrases,
            entities,
            follow_up_action: decision.follow_up_action,
            interview_type: decision.interview_type,
            priority_level: decision.priority_level,
            human_review_needed: decision.human_review_needed,
            review_triggers: decision.review_triggers,
            classification_error: classifier_error.map(|err| err.to_string()),
            response_count,
            job_id: self.job.job_id.clone(),
            job_title: self.job.title.clone(),
        };

        debug!(
            response = %response.response_id,
            response_type = %response.response_type,
            action = %response.follow_up_action,
            "reply routed"
        );

        if ctx.advance_candidate(
            StageKind::ResponseManagement,
            &candidate.id,
            CandidateStatus::Responded,
            Some(format!("replied: {}", response.response_type)),
        ) && response_count == 1
        {
            if let Some(record) = ctx.roster().get(&candidate.id) {
                self.output.responded.push(record.clone());
            }
        }

        self.execute(&response, ctx);
        self.output.responses.push(response);
    }

    fn execute(&mut self, response: &CandidateResponse, ctx: &mut RunContext) {
        let pending = |kind: PendingActionKind, reason: &str| PendingAction {
            response_id: response.response_id.clone(),
            candidate_id: response.candidate_id.clone(),
            kind,
            reason: reason.to_string(),
        };
        let task = |kind: FollowUpKind, subject: String| FollowUpTask {
            response_id: response.response_id.clone(),
            candidate_id: response.candidate_id.clone(),
            recipient: response.candidate_email.clone(),
            kind,
            subject,
        };

        match response.follow_up_action {
            FollowUpAction::ScheduleInterview => {
                let wanted = response
                    .interview_type
                    .unwrap_or_else(|| follow_up::default_interview_type(&self.job.title));
                match ctx
                    .slots_mut()
                    .allocate(wanted, response.entities.availability.as_deref())
                {
                    Some(slot) => {
                        let interview = self.schedule(response, slot);
                        self.output.follow_ups.push(task(
                            FollowUpKind::InterviewConfirmation,
                            format!(
                                "Interview Confirmed - {} on {}",
                                interview.job_title,
                                interview.scheduled_time.format("%B %d, %Y")
                            ),
                        ));
                        self.output.scheduled.push(interview);
                    }
                    None => {
                        warn!(response = %response.response_id, "no interview slot available");
                        self.output.pending_actions.push(pending(
                            PendingActionKind::FindInterviewSlot,
                            "No suitable slots available",
                        ));
                    }
                }
            }
            FollowUpAction::AnswerQuestions | FollowUpAction::SendInfo => {
                if self.settings.auto_respond_to_questions {
                    let (kind, subject) = if response.follow_up_action == FollowUpAction::SendInfo {
                        (FollowUpKind::SendInfo, format!("More about the {} role", self.job.title))
                    } else {
                        (FollowUpKind::AnswerQuestions, format!("Re: {}", response.subject))
                    };
                    self.output.follow_ups.push(task(kind, subject));
                } else {
                    self.output.pending_actions.push(pending(
                        PendingActionKind::ManualResponse,
                        "Auto-response disabled for questions",
                    ));
                }
            }
            FollowUpAction::AddToFuturePool => {
                self.output.follow_ups.push(task(
                    FollowUpKind::FutureOpportunities,
                    format!("Thank you for your time - future {} opportunities", self.job.company),
                ));
            }
            FollowUpAction::ScheduleLater => {
                self.output.pending_actions.push(pending(
                    PendingActionKind::FollowUpLater,
                    "Candidate asked to be contacted later",
                ));
            }
            FollowUpAction::EscalateToHuman => {
                self.output.pending_actions.push(pending(
                    PendingActionKind::HumanReview,
                    "Escalated for human review",
                ));
            }
            FollowUpAction::RemoveFromList => {
                self.output.suppressed.push(SuppressionEntry {
                    candidate_id: response.candidate_id.clone(),
                    email: response.candidate_email.clone(),
                    at: ctx.now(),
                });
            }
            FollowUpAction::NoAction => {}
        }

        if response.human_review_needed
            || response.follow_up_action == FollowUpAction::EscalateToHuman
        {
            let mut reasons: Vec<String> = response
                .review_triggers
                .iter()
                .map(|trigger| trigger.describe().to_string())
                .collect();
            if reasons.is_empty() {
                reasons.push("classifier recommended escalation".to_string());
            }
            ctx.enqueue_review(ReviewEntry {
                response_id: response.response_id.clone(),
                candidate_id: response.candidate_id.clone(),
                candidate_email: response.candidate_email.clone(),
                priority_level: response.priority_level,
                reasons,
                queued_at: ctx.now(),
            });
        }
    }

    fn schedule(&self, response: &CandidateResponse, slot: InterviewSlot) -> ScheduledInterview {
        let (details, instructions) = slots::meeting_details(slot.interview_type);
        ScheduledInterview {
            interview_id: format!("{}-interview", response.response_id),
            candidate_id: response.candidate_id.clone(),
            candidate_name: response.candidate_name.clone(),
            candidate_email: response.candidate_email.clone(),
            slot_id: slot.slot_id,
            interview_type: slot.interview_type,
            scheduled_time: slot.start,
            duration_minutes: (slot.end - slot.start).num_minutes(),
            interviewer: slot.interviewer,
            interviewer_email: self.settings.interviewer_email.clone(),
            meeting_details: details.to_string(),
            meeting_instructions: instructions.to_string(),
            job_id: self.job.job_id.clone(),
            job_title: self.job.title.clone(),
        }
    }
}

impl StageWorker for ResponseWorker {
    type Output = ResponseOutput;

    fn kind(&self) -> StageKind {
        StageKind::ResponseManagement
    }

    fn initialize(&mut self, ctx: &mut RunContext) -> Result<(), StageError> {
        let pool = match self.fixed_slots.take() {
            Some(slots) => SlotPool::new(slots),
            None => SlotPool::generate(&self.slot_rule, ctx.today()),
        };
        ctx.audit(
            StageKind::ResponseManagement,
            StageState::Initializing,
            AuditKind::Progress,
            format!("{} interview slots available", pool.len()),
        );
        *ctx.slots_mut() = pool;

        let replies = self
            .replies
            .collect(&self.contacted)
            .map_err(|err| StageError::Initialization {
                stage: StageKind::ResponseManagement,
                reason: err.to_string(),
            })?;
        self.received = replies.len();
        self.pending = replies.into();
        Ok(())
    }

    fn has_pending_work(&self) -> bool {
        !self.pending.is_empty()
    }

    fn process_next(&mut self, ctx: &mut RunContext) {
        if let Some(reply) = self.pending.pop_front() {
            self.handle(reply, ctx);
        }
    }

    fn progress(&self) -> StageProgress {
        StageProgress {
            items_in: self.received,
            items_out: self.output.responses.len(),
        }
    }

    fn finalize(mut self, _ctx: &mut RunContext) -> ResponseOutput {
        self.output.metrics = ResponseMetrics::compute(
            &self.output.responses,
            self.output.scheduled.len(),
            self.item_errors,
        );
        self.output
    }
}
