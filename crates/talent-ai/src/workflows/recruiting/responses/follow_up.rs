use serde::{Deserialize, Serialize};

use super::super::domain::JobContext;
use super::classifier::{Classification, FollowUpAction, InterviewType, ResponseType, Sentiment};
use super::entities::ExtractedEntities;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;
const MAX_QUESTIONS_BEFORE_REVIEW: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub confidence_threshold: f64,
    pub max_questions_before_review: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            max_questions_before_review: MAX_QUESTIONS_BEFORE_REVIEW,
        }
    }
}

/// Why a response was routed to a human.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewTrigger {
    LowConfidence,
    RiskyResponseType,
    ComplexQuestions,
}

impl ReviewTrigger {
    pub fn describe(&self) -> &'static str {
        match self {
            ReviewTrigger::LowConfidence => "classification confidence below threshold",
            ReviewTrigger::RiskyResponseType => "spam complaint or unclassified reply",
            ReviewTrigger::ComplexQuestions => "too many questions to answer automatically",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub follow_up_action: FollowUpAction,
    pub interview_type: Option<InterviewType>,
    pub priority_level: u8,
    pub human_review_needed: bool,
    pub review_triggers: Vec<ReviewTrigger>,
}

#[derive(Debug, Clone, Default)]
pub struct FollowUpRouter {
    config: RoutingConfig,
}

impl FollowUpRouter {
    pub fn new(config: RoutingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    pub fn route(
        &self,
        classification: &Classification,
        entities: &ExtractedEntities,
        job: &JobContext,
    ) -> RoutingDecision {
        let review_triggers = self.review_triggers(classification, entities);
        RoutingDecision {
            follow_up_action: classification.recommended_action,
            interview_type: interview_type(classification, job),
            priority_level: priority(classification),
            human_review_needed: !review_triggers.is_empty(),
            review_triggers,
        }
    }

    fn review_triggers(
        &self,
        classification: &Classification,
        entities: &ExtractedEntities,
    ) -> Vec<ReviewTrigger> {
        let mut triggers = Vec::new();
        if classification.confidence < self.config.confidence_threshold {
            triggers.push(ReviewTrigger::LowConfidence);
        }
        if matches!(
            classification.response_type,
            ResponseType::SpamComplaint | ResponseType::Unknown
        ) {
            triggers.push(ReviewTrigger::RiskyResponseType);
        }
        if classification.response_type == ResponseType::Questions
            && entities.questions.len() > self.config.max_questions_before_review
        {
            triggers.push(ReviewTrigger::ComplexQuestions);
        }
        triggers
    }
}

/// Lower is more urgent. Type caps apply before the sentiment nudge.
pub fn priority(classification: &Classification) -> u8 {
    let mut priority = classification.priority_level.clamp(1, 5);
    match classification.response_type {
        ResponseType::Interested => priority = priority.min(2),
        ResponseType::Questions => priority = priority.min(3),
        ResponseType::NotInterested => priority = priority.max(4),
        _ => {}
    }
    match classification.sentiment {
        Sentiment::Positive => priority.saturating_sub(1).max(1),
        Sentiment::Negative => (priority + 1).min(5),
        Sentiment::Neutral | Sentiment::Mixed => priority,
    }
}

pub fn interview_type(classification: &Classification, job: &JobContext) -> Option<InterviewType> {
    if !matches!(
        classification.response_type,
        ResponseType::Interested | ResponseType::Questions
    ) {
        return None;
    }

    let mentions = |needles: &[&str]| {
        classification.key_phrases.iter().any(|phrase| {
            let phrase = phrase.to_lowercase();
            needles.iter().any(|needle| phrase.contains(needle))
        })
    };

    if mentions(&["remote", "video"]) {
        Some(InterviewType::VideoInterview)
    } else if mentions(&["phone", "call"]) {
        Some(InterviewType::PhoneScreen)
    } else {
        Some(default_interview_type(&job.title))
    }
}

/// Senior roles get a video interview, everyone else a phone screen.
pub fn default_interview_type(job_title: &str) -> InterviewType {
    let title = job_title.to_lowercase();
    if ["senior", "lead", "principal"]
        .iter()
        .any(|level| title.contains(level))
    {
        InterviewType::VideoInterview
    } else {
        InterviewType::PhoneScreen
    }
}
