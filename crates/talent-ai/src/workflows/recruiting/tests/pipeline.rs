use super::common::*;
use std::sync::Arc;

use crate::workflows::recruiting::domain::{
    CandidateRecord, CandidateStatus, JobRequirementsError, SourceChannel,
};
use crate::workflows::recruiting::outreach::{DeliveryStatus, InMemoryOutbox};
use crate::workflows::recruiting::pipeline::{PipelineCoordinator, PipelineError, PipelineSettings};
use crate::workflows::recruiting::responses::{InMemoryReplySource, KeywordClassifier, RoutingConfig};
use crate::workflows::recruiting::screening::{CriteriaError, ScreeningCriteria};
use crate::workflows::recruiting::sourcing::{
    CandidateRepository, InMemoryCandidateRepository, SourceRegistry,
};
use crate::workflows::recruiting::stage::{AuditKind, StageKind, StageState};

fn state_order(state: StageState) -> u8 {
    match state {
        StageState::Pending => 0,
        StageState::Initializing => 1,
        StageState::Processing => 2,
        StageState::Finalizing => 3,
        StageState::Complete => 4,
    }
}

#[test]
fn full_run_moves_candidates_forward_only() {
    let database = Arc::new(InMemoryCandidateRepository::new(roster()));
    let mut duplicate = CandidateRecord::new("in-7", SourceChannel::Indeed, "Ada Lovelace");
    duplicate.email = Some("ADA@example.com".to_string());
    let indeed = Arc::new(InMemoryCandidateRepository::new(vec![duplicate]));

    let sources = SourceRegistry::default()
        .with(
            SourceChannel::Database,
            Arc::clone(&database) as Arc<dyn CandidateRepository>,
        )
        .with(SourceChannel::Indeed, indeed as Arc<dyn CandidateRepository>);
    let outbox = Arc::new(InMemoryOutbox::new());
    let replies = vec![reply(
        "ada@example.com",
        "Re: Data Engineer opportunity",
        "Sounds great, I'd be happy to chat next week.",
    )];

    let report = PipelineCoordinator::new(
        sources,
        outbox.clone(),
        Arc::new(KeywordClassifier),
        Arc::new(InMemoryReplySource::new(replies)),
    )
    .with_clock(clock())
    .run_with_id("run-full", &job(), ScreeningCriteria::default())
    .expect("run completes");

    let stages: Vec<StageKind> = report.stages.iter().map(|metrics| metrics.stage).collect();
    assert_eq!(
        stages,
        vec![
            StageKind::Sourcing,
            StageKind::Screening,
            StageKind::Outreach,
            StageKind::ResponseManagement,
        ]
    );

    assert_eq!(report.candidates.len(), 3);
    assert_eq!(report.channels[&SourceChannel::Database].admitted, 3);
    assert_eq!(report.channels[&SourceChannel::Indeed].duplicates, 1);

    let statuses: Vec<(&str, CandidateStatus)> = report
        .candidates
        .iter()
        .map(|record| (record.id.as_str(), record.status))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("db-1", CandidateStatus::Responded),
            ("db-2", CandidateStatus::Contacted),
            ("db-3", CandidateStatus::Rejected),
        ]
    );

    let ada_updates: Vec<CandidateStatus> = database
        .status_updates()
        .into_iter()
        .filter(|update| update.id.as_str() == "db-1")
        .map(|update| update.status)
        .collect();
    assert_eq!(
        ada_updates,
        vec![
            CandidateStatus::Screened,
            CandidateStatus::Shortlisted,
            CandidateStatus::Contacted,
            CandidateStatus::Responded,
        ]
    );
    assert!(ada_updates
        .windows(2)
        .all(|pair| pair[0].rank() <= pair[1].rank()));

    assert_eq!(outbox.sent().len(), 2);
    assert_eq!(report.outreach_metrics.sent, 2);
    assert_eq!(report.outreach_metrics.delivery_rate, 100.0);
    assert_eq!(
        report.outreach[0].draft.as_ref().map(|draft| draft.message_id.as_str()),
        Some("run-full-msg-001")
    );

    assert_eq!(report.scheduled_interviews.len(), 1);
    assert_eq!(report.total_errors, 0);
    assert_eq!(report.run_id, "run-full");
}

#[test]
fn every_stage_walks_the_lifecycle_in_order() {
    let report = keyword_coordinator(roster(), Vec::new())
        .run_with_id("run-audit", &job(), ScreeningCriteria::default())
        .expect("run completes");

    for stage in [
        StageKind::Sourcing,
        StageKind::Screening,
        StageKind::Outreach,
        StageKind::ResponseManagement,
    ] {
        let states: Vec<StageState> = report
            .audit
            .iter()
            .filter(|entry| entry.stage == stage && entry.kind == AuditKind::Transition)
            .map(|entry| entry.state)
            .collect();
        assert_eq!(states.first(), Some(&StageState::Initializing), "{stage}");
        assert_eq!(states.last(), Some(&StageState::Complete), "{stage}");
        assert!(
            states
                .windows(2)
                .all(|pair| state_order(pair[0]) <= state_order(pair[1])),
            "{stage} went backwards: {states:?}"
        );
    }
}

#[test]
fn run_without_candidates_still_completes_all_stages() {
    let report = PipelineCoordinator::new(
        SourceRegistry::default(),
        Arc::new(InMemoryOutbox::new()),
        Arc::new(KeywordClassifier),
        Arc::new(InMemoryReplySource::default()),
    )
    .with_clock(clock())
    .run_with_id("run-empty", &job(), ScreeningCriteria::default())
    .expect("run completes");

    assert_eq!(report.stages.len(), 4);
    assert!(report.stages.iter().all(|metrics| metrics.iterations == 0));
    assert!(report.candidates.is_empty());
    assert_eq!(report.screening_summary.total_candidates, 0);
    assert_eq!(report.outreach_metrics.total, 0);
    assert_eq!(report.response_metrics.total_responses, 0);
    assert_eq!(report.total_errors, 0);
    assert!(report.audit.iter().any(|entry| {
        entry.kind == AuditKind::Warning && entry.content == "no sourcing channels configured"
    }));
    assert_eq!(report.started_at, now());
    assert_eq!(report.finished_at, now());
}

#[test]
fn invalid_configuration_fails_before_any_stage_runs() {
    let (sources, repository) = registry(roster());
    let coordinator = PipelineCoordinator::new(
        sources,
        Arc::new(InMemoryOutbox::new()),
        Arc::new(KeywordClassifier),
        Arc::new(InMemoryReplySource::default()),
    )
    .with_clock(clock());

    let mut no_skills = job();
    no_skills.required_skills = vec!["  ".to_string()];
    assert_eq!(
        coordinator
            .run(&no_skills, ScreeningCriteria::default())
            .err(),
        Some(PipelineError::Job(JobRequirementsError::NoRequiredSkills))
    );

    let no_weight = ScreeningCriteria {
        required_skills_weight: 0.0,
        preferred_skills_weight: 0.0,
        experience_weight: 0.0,
        location_weight: 0.0,
        education_weight: 0.0,
        ..ScreeningCriteria::default()
    };
    assert_eq!(
        coordinator.run(&job(), no_weight).err(),
        Some(PipelineError::Criteria(CriteriaError::NoWeightApplied))
    );

    let strict = coordinator.with_settings(PipelineSettings {
        routing: RoutingConfig {
            confidence_threshold: 1.5,
            ..RoutingConfig::default()
        },
        ..PipelineSettings::default()
    });
    assert!(matches!(
        strict.run(&job(), ScreeningCriteria::default()),
        Err(PipelineError::InvalidConfidenceThreshold { .. })
    ));

    assert!(repository.status_updates().is_empty());
}

#[test]
fn failing_channel_does_not_stop_the_others() {
    let (sources, _) = registry(roster());
    let sources = sources.with(SourceChannel::Linkedin, Arc::new(UnavailableRepository));

    let report = PipelineCoordinator::new(
        sources,
        Arc::new(InMemoryOutbox::new()),
        Arc::new(KeywordClassifier),
        Arc::new(InMemoryReplySource::default()),
    )
    .with_clock(clock())
    .run_with_id("run-channels", &job(), ScreeningCriteria::default())
    .expect("run completes");

    assert_eq!(report.candidates.len(), 3);
    assert_eq!(report.total_errors, 1);
    let error = &report.errors[0];
    assert_eq!(error.stage, StageKind::Sourcing);
    assert_eq!(error.item.as_deref(), Some("linkedin"));
    assert!(error.message.starts_with("channel query failed"));
    assert_eq!(report.channels[&SourceChannel::Linkedin].returned, 0);
}

#[test]
fn refused_delivery_leaves_candidate_shortlisted() {
    let (sources, _) = registry(roster());
    let replies = vec![reply("grace@example.com", "Re: Data Engineer", "Interested!")];

    let report = PipelineCoordinator::new(
        sources,
        Arc::new(InMemoryOutbox::rejecting(["Grace@Example.com"])),
        Arc::new(KeywordClassifier),
        Arc::new(InMemoryReplySource::new(replies)),
    )
    .with_clock(clock())
    .run_with_id("run-bounce", &job(), ScreeningCriteria::default())
    .expect("run completes");

    let grace = report
        .outreach
        .iter()
        .find(|record| record.candidate_id.as_str() == "db-2")
        .expect("outreach record for grace");
    assert_eq!(grace.status, DeliveryStatus::Failed);
    assert_eq!(report.outreach_metrics.failed, 1);
    assert_eq!(report.outreach_metrics.delivery_rate, 50.0);

    let status = report
        .candidates
        .iter()
        .find(|record| record.id.as_str() == "db-2")
        .map(|record| record.status);
    assert_eq!(status, Some(CandidateStatus::Shortlisted));

    assert!(report.responses.is_empty());
    let stages: Vec<StageKind> = report.errors.iter().map(|error| error.stage).collect();
    assert_eq!(stages, vec![StageKind::Outreach, StageKind::ResponseManagement]);
}

#[test]
fn generated_run_ids_are_unique() {
    let coordinator = keyword_coordinator(Vec::new(), Vec::new());
    let first = coordinator
        .run(&job(), ScreeningCriteria::default())
        .expect("first run");
    let second = coordinator
        .run(&job(), ScreeningCriteria::default())
        .expect("second run");
    assert_ne!(first.run_id, second.run_id);
    assert!(first.run_id.starts_with("run-"));
}
