use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::clock::FixedClock;
use crate::workflows::recruiting::context::RunContext;
use crate::workflows::recruiting::domain::{
    CandidateId, CandidateRecord, CandidateStatus, JobRequirements, SourceChannel,
};
use crate::workflows::recruiting::outreach::InMemoryOutbox;
use crate::workflows::recruiting::pipeline::{PipelineCoordinator, PipelineSettings};
use crate::workflows::recruiting::responses::{
    Classification, ClassificationRequest, ClassifierError, FollowUpAction, InMemoryReplySource,
    InboundReply, InterviewSlot, InterviewType, KeywordClassifier, ReplySource,
    ReplySourceError, ResponseClassifier, ResponseType, Sentiment,
};
use crate::workflows::recruiting::sourcing::{
    CandidateRepository, InMemoryCandidateRepository, RepositoryError, SourceRegistry,
    SourcedRecord,
};

/// Friday 2026-03-06, 09:00 UTC.
pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 6, 9, 0, 0)
        .single()
        .expect("valid instant")
}

pub(super) fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(now()))
}

pub(super) fn context() -> RunContext {
    RunContext::new("run-test", clock())
}

pub(super) fn job() -> JobRequirements {
    JobRequirements {
        job_id: "job-data-eng".to_string(),
        title: "Data Engineer".to_string(),
        company: "Northwind Analytics".to_string(),
        description: "Build and run batch and streaming pipelines.".to_string(),
        required_skills: vec!["Python".to_string(), "SQL".to_string()],
        preferred_skills: vec!["AWS".to_string()],
        min_experience_years: 3.0,
        preferred_experience_years: 6.0,
        location: Some("Austin".to_string()),
        remote_allowed: false,
        education_requirements: Vec::new(),
    }
}

pub(super) fn candidate(
    id: &str,
    name: &str,
    email: &str,
    skills: &[&str],
    years: f64,
) -> CandidateRecord {
    let mut record = CandidateRecord::new(id, SourceChannel::Database, name);
    record.email = Some(email.to_string());
    record.location = Some("Austin, TX".to_string());
    record.skills = skills.iter().map(|skill| skill.to_string()).collect();
    record.experience_years = Some(years);
    record
}

/// Exact matches on everything, seven years: shortlisted.
pub(super) fn ada() -> CandidateRecord {
    candidate(
        "db-1",
        "Ada Lovelace",
        "ada@example.com",
        &["Python", "SQL", "AWS"],
        7.0,
    )
}

/// SQL through the synonym table, six years: shortlisted.
pub(super) fn grace() -> CandidateRecord {
    candidate(
        "db-2",
        "Grace Hopper",
        "grace@example.com",
        &["Python", "Postgres", "AWS"],
        6.0,
    )
}

/// One year of unrelated experience: auto-failed.
pub(super) fn alan() -> CandidateRecord {
    candidate("db-3", "Alan Turing", "alan@example.com", &["Excel"], 1.0)
}

pub(super) fn roster() -> Vec<CandidateRecord> {
    vec![ada(), grace(), alan()]
}

pub(super) fn registry(records: Vec<CandidateRecord>) -> (SourceRegistry, Arc<InMemoryCandidateRepository>) {
    let repository = Arc::new(InMemoryCandidateRepository::new(records));
    let registry = SourceRegistry::default().with(
        SourceChannel::Database,
        Arc::clone(&repository) as Arc<dyn CandidateRepository>,
    );
    (registry, repository)
}

pub(super) fn reply(from: &str, subject: &str, content: &str) -> InboundReply {
    InboundReply {
        from_email: from.to_string(),
        from_name: None,
        subject: subject.to_string(),
        content: content.to_string(),
        received_at: Some(now()),
    }
}

pub(super) fn coordinator(
    records: Vec<CandidateRecord>,
    classifier: Arc<dyn ResponseClassifier>,
    replies: Vec<InboundReply>,
) -> PipelineCoordinator {
    let (sources, _) = registry(records);
    PipelineCoordinator::new(
        sources,
        Arc::new(InMemoryOutbox::new()),
        classifier,
        Arc::new(InMemoryReplySource::new(replies)),
    )
    .with_clock(clock())
}

pub(super) fn keyword_coordinator(
    records: Vec<CandidateRecord>,
    replies: Vec<InboundReply>,
) -> PipelineCoordinator {
    coordinator(records, Arc::new(KeywordClassifier), replies)
}

pub(super) fn settings_with_slots(slots: Vec<InterviewSlot>) -> PipelineSettings {
    PipelineSettings {
        slots: Some(slots),
        ..PipelineSettings::default()
    }
}

pub(super) fn slot(id: &str, day: u32, hour: u32, interview_type: InterviewType) -> InterviewSlot {
    let start = Utc
        .with_ymd_and_hms(2026, 3, day, hour, 0, 0)
        .single()
        .expect("valid slot start");
    InterviewSlot {
        slot_id: id.to_string(),
        start,
        end: start + Duration::minutes(45),
        interviewer: "Dana Reyes".to_string(),
        interview_type,
        available: true,
    }
}

pub(super) fn classification(
    response_type: ResponseType,
    confidence: f64,
    action: FollowUpAction,
) -> Classification {
    Classification {
        response_type,
        sentiment: Sentiment::Neutral,
        confidence,
        recommended_action: action,
        priority_level: 3,
        reasoning: "scripted".to_string(),
        key_phrases: Vec::new(),
    }
}

/// Returns queued answers in order, then reports itself unavailable.
#[derive(Default)]
pub(super) struct ScriptedClassifier {
    answers: Mutex<VecDeque<Result<Classification, ClassifierError>>>,
}

impl ScriptedClassifier {
    pub(super) fn new(answers: Vec<Result<Classification, ClassifierError>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
        }
    }
}

impl ResponseClassifier for ScriptedClassifier {
    fn classify(
        &self,
        _request: &ClassificationRequest<'_>,
    ) -> Result<Classification, ClassifierError> {
        self.answers
            .lock()
            .expect("classifier script lock")
            .pop_front()
            .unwrap_or_else(|| Err(ClassifierError::Unavailable("script exhausted".to_string())))
    }
}

pub(super) struct TimingOutClassifier;

impl ResponseClassifier for TimingOutClassifier {
    fn classify(
        &self,
        _request: &ClassificationRequest<'_>,
    ) -> Result<Classification, ClassifierError> {
        Err(ClassifierError::Timeout(30_000))
    }
}

pub(super) struct UnavailableRepository;

impl CandidateRepository for UnavailableRepository {
    fn query(
        &self,
        _job: &JobRequirements,
        _max_results: usize,
    ) -> Result<Vec<SourcedRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("linkedin api returned 503".to_string()))
    }

    fn update_status(
        &self,
        _id: &CandidateId,
        _status: CandidateStatus,
        _notes: Option<&str>,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("linkedin api returned 503".to_string()))
    }
}

pub(super) struct ClosedMailbox;

impl ReplySource for ClosedMailbox {
    fn collect(&self, _contacted: &[CandidateRecord]) -> Result<Vec<InboundReply>, ReplySourceError> {
        Err(ReplySourceError::Unavailable("imap login rejected".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
