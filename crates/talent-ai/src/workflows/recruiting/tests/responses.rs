use super::common::*;
use std::sync::Arc;

use crate::workflows::recruiting::domain::CandidateStatus;
use crate::workflows::recruiting::outreach::InMemoryOutbox;
use crate::workflows::recruiting::pipeline::{PipelineCoordinator, PipelineReport, PipelineSettings};
use crate::workflows::recruiting::responses::{
    FollowUpAction, FollowUpKind, InterviewType, PendingActionKind, ResponseSettings,
    ResponseType, ReviewTrigger,
};
use crate::workflows::recruiting::screening::ScreeningCriteria;
use crate::workflows::recruiting::stage::{AuditKind, StageKind};

fn status_of(report: &PipelineReport, id: &str) -> Option<CandidateStatus> {
    report
        .candidates
        .iter()
        .find(|record| record.id.as_str() == id)
        .map(|record| record.status)
}

#[test]
fn low_confidence_interest_still_schedules_but_queues_review() {
    let classifier = ScriptedClassifier::new(vec![Ok(classification(
        ResponseType::Interested,
        0.65,
        FollowUpAction::ScheduleInterview,
    ))]);
    let replies = vec![reply("ada@example.com", "Re: Data Engineer", "Yes, let's do it.")];

    let report = coordinator(roster(), Arc::new(classifier), replies)
        .run_with_id("run-low", &job(), ScreeningCriteria::default())
        .expect("run completes");

    let response = &report.responses[0];
    assert_eq!(response.response_id, "run-low-resp-001");
    assert!(response.human_review_needed);
    assert_eq!(response.review_triggers, vec![ReviewTrigger::LowConfidence]);
    assert_eq!(response.interview_type, Some(InterviewType::PhoneScreen));

    assert_eq!(report.review_queue.len(), 1);
    assert_eq!(
        report.review_queue[0].reasons,
        vec![ReviewTrigger::LowConfidence.describe().to_string()]
    );

    assert_eq!(report.scheduled_interviews.len(), 1);
    let interview = &report.scheduled_interviews[0];
    assert_eq!(interview.slot_id, "slot-20260309-10");
    assert_eq!(interview.interview_type, InterviewType::PhoneScreen);
    assert_eq!(interview.duration_minutes, 60);
    assert_eq!(report.remaining_slots, 29);
    assert_eq!(status_of(&report, "db-1"), Some(CandidateStatus::Responded));
}

#[test]
fn each_slot_is_handed_out_once() {
    let replies = vec![
        reply(
            "ada@example.com",
            "Re: Data Engineer",
            "I'm interested, a video call works best for me.",
        ),
        reply(
            "grace@example.com",
            "Re: Data Engineer",
            "Sounds great, happy to chat by phone.",
        ),
        reply(
            "ada@example.com",
            "Re: Data Engineer",
            "Still interested in a second video round as well.",
        ),
    ];
    let settings = settings_with_slots(vec![
        slot("video-1", 10, 15, InterviewType::VideoInterview),
        slot("phone-1", 11, 10, InterviewType::PhoneScreen),
    ]);

    let report = keyword_coordinator(roster(), replies)
        .with_settings(settings)
        .run_with_id("run-slots", &job(), ScreeningCriteria::default())
        .expect("run completes");

    let booked: Vec<(&str, &str)> = report
        .scheduled_interviews
        .iter()
        .map(|interview| (interview.candidate_id.as_str(), interview.slot_id.as_str()))
        .collect();
    assert_eq!(booked, vec![("db-1", "video-1"), ("db-2", "phone-1")]);
    assert_eq!(report.remaining_slots, 0);

    assert_eq!(report.pending_actions.len(), 1);
    assert_eq!(report.pending_actions[0].kind, PendingActionKind::FindInterviewSlot);
    assert_eq!(report.pending_actions[0].response_id, "run-slots-resp-003");

    let counts: Vec<u32> = report
        .responses
        .iter()
        .map(|response| response.response_count)
        .collect();
    assert_eq!(counts, vec![1, 1, 2]);

    let confirmations = report
        .follow_ups
        .iter()
        .filter(|task| task.kind == FollowUpKind::InterviewConfirmation)
        .count();
    assert_eq!(confirmations, 2);
}

#[test]
fn unavailable_interview_type_falls_back_to_any_open_slot() {
    let replies = vec![reply(
        "ada@example.com",
        "Re: Data Engineer",
        "Interested! Remote video works for me.",
    )];
    let settings = settings_with_slots(vec![slot("phone-only", 10, 10, InterviewType::PhoneScreen)]);

    let report = keyword_coordinator(roster(), replies)
        .with_settings(settings)
        .run_with_id("run-fallback", &job(), ScreeningCriteria::default())
        .expect("run completes");

    assert_eq!(report.responses[0].interview_type, Some(InterviewType::VideoInterview));
    assert_eq!(report.scheduled_interviews.len(), 1);
    assert_eq!(report.scheduled_interviews[0].slot_id, "phone-only");
    assert_eq!(
        report.scheduled_interviews[0].interview_type,
        InterviewType::PhoneScreen
    );
}

#[test]
fn classifier_timeout_degrades_to_human_review() {
    let replies = vec![reply(
        "ada@example.com",
        "Re: Data Engineer",
        "Can we talk Thursday?",
    )];

    let report = coordinator(roster(), Arc::new(TimingOutClassifier), replies)
        .run_with_id("run-timeout", &job(), ScreeningCriteria::default())
        .expect("run completes");

    let response = &report.responses[0];
    assert_eq!(response.response_type, ResponseType::Unknown);
    assert_eq!(response.confidence, 0.0);
    assert_eq!(response.follow_up_action, FollowUpAction::EscalateToHuman);
    assert!(response.human_review_needed);
    assert!(response.reasoning.starts_with("Analysis failed:"));
    assert!(response
        .classification_error
        .as_deref()
        .is_some_and(|error| error.contains("30000 ms")));

    assert_eq!(report.pending_actions[0].kind, PendingActionKind::HumanReview);
    assert_eq!(report.review_queue.len(), 1);
    assert_eq!(report.response_metrics.processing_errors, 1);
    assert_eq!(report.response_metrics.average_confidence, 0.0);
    assert_eq!(report.total_errors, 0);
    assert!(report.audit.iter().any(|entry| {
        entry.stage == StageKind::ResponseManagement
            && entry.kind == AuditKind::Warning
            && entry.content.contains("routed to human review")
    }));
}

#[test]
fn unmatched_and_incomplete_replies_are_isolated() {
    let replies = vec![
        reply("stranger@example.com", "Hello", "Interested in any roles?"),
        reply("grace@example.com", "Re: Data Engineer", ""),
        reply("ada@example.com", "Re: Data Engineer", "Sounds great!"),
    ];

    let report = keyword_coordinator(roster(), replies)
        .run_with_id("run-isolated", &job(), ScreeningCriteria::default())
        .expect("run completes");

    assert_eq!(report.responses.len(), 1);
    assert_eq!(report.responses[0].candidate_id.as_str(), "db-1");
    assert_eq!(report.responses[0].response_id, "run-isolated-resp-001");

    let messages: Vec<&str> = report
        .errors
        .iter()
        .filter(|error| error.stage == StageKind::ResponseManagement)
        .map(|error| error.message.as_str())
        .collect();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].contains("does not match a contacted candidate"));
    assert_eq!(messages[1], "invalid reply: missing content");

    assert_eq!(report.response_metrics.processing_errors, 2);
    assert_eq!(status_of(&report, "db-2"), Some(CandidateStatus::Contacted));
}

#[test]
fn declines_and_complaints_are_routed_without_interviews() {
    let replies = vec![
        reply("ada@example.com", "Re: Data Engineer", "No thanks, I'm happy where I am."),
        reply("grace@example.com", "Stop", "Please unsubscribe me from these emails."),
    ];

    let report = keyword_coordinator(roster(), replies)
        .run_with_id("run-declines", &job(), ScreeningCriteria::default())
        .expect("run completes");

    assert!(report.scheduled_interviews.is_empty());
    assert_eq!(report.remaining_slots, 30);

    assert_eq!(report.responses[0].response_type, ResponseType::NotInterested);
    assert_eq!(report.follow_ups.len(), 1);
    assert_eq!(report.follow_ups[0].kind, FollowUpKind::FutureOpportunities);

    assert_eq!(report.responses[1].response_type, ResponseType::SpamComplaint);
    assert_eq!(report.suppressed.len(), 1);
    assert_eq!(report.suppressed[0].email, "grace@example.com");
    assert_eq!(
        report.review_queue[0].reasons,
        vec![ReviewTrigger::RiskyResponseType.describe().to_string()]
    );

    assert_eq!(report.response_metrics.not_interested, 1);
    assert_eq!(report.response_metrics.other, 1);
    assert_eq!(status_of(&report, "db-2"), Some(CandidateStatus::Responded));
}

#[test]
fn questions_wait_for_a_recruiter_when_auto_response_is_off() {
    let replies = vec![reply(
        "ada@example.com",
        "Re: Data Engineer",
        "What does the on-call rotation look like?",
    )];
    let settings = PipelineSettings {
        responses: ResponseSettings {
            auto_respond_to_questions: false,
            ..ResponseSettings::default()
        },
        ..PipelineSettings::default()
    };

    let report = keyword_coordinator(roster(), replies)
        .with_settings(settings)
        .run_with_id("run-questions", &job(), ScreeningCriteria::default())
        .expect("run completes");

    assert_eq!(report.responses[0].response_type, ResponseType::Questions);
    assert!(report.follow_ups.is_empty());
    assert_eq!(report.pending_actions[0].kind, PendingActionKind::ManualResponse);
}

#[test]
fn unreachable_mailbox_still_completes_the_stage() {
    let (sources, _) = registry(roster());
    let report = PipelineCoordinator::new(
        sources,
        Arc::new(InMemoryOutbox::new()),
        Arc::new(ScriptedClassifier::default()),
        Arc::new(ClosedMailbox),
    )
    .with_clock(clock())
    .run_with_id("run-mailbox", &job(), ScreeningCriteria::default())
    .expect("run completes");

    let stage = report
        .stages
        .iter()
        .find(|metrics| metrics.stage == StageKind::ResponseManagement)
        .expect("response stage metrics");
    assert_eq!(stage.errors, 1);
    assert_eq!(stage.iterations, 0);
    assert!(report.responses.is_empty());
    assert_eq!(report.total_errors, 1);
}
