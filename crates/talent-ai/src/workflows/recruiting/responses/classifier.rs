use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::super::domain::JobContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    Interested,
    NotInterested,
    Questions,
    RequestInfo,
    ScheduleLater,
    OutOfOffice,
    SpamComplaint,
    Unknown,
}

impl ResponseType {
    pub fn label(&self) -> &'static str {
        match self {
            ResponseType::Interested => "interested",
            ResponseType::NotInterested => "not_interested",
            ResponseType::Questions => "questions",
            ResponseType::RequestInfo => "request_info",
            ResponseType::ScheduleLater => "schedule_later",
            ResponseType::OutOfOffice => "out_of_office",
            ResponseType::SpamComplaint => "spam_complaint",
            ResponseType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpAction {
    ScheduleInterview,
    SendInfo,
    AnswerQuestions,
    ScheduleLater,
    AddToFuturePool,
    EscalateToHuman,
    NoAction,
    RemoveFromList,
}

impl FollowUpAction {
    pub fn label(&self) -> &'static str {
        match self {
            FollowUpAction::ScheduleInterview => "schedule_interview",
            FollowUpAction::SendInfo => "send_info",
            FollowUpAction::AnswerQuestions => "answer_questions",
            FollowUpAction::ScheduleLater => "schedule_later",
            FollowUpAction::AddToFuturePool => "add_to_future_pool",
            FollowUpAction::EscalateToHuman => "escalate_to_human",
            FollowUpAction::NoAction => "no_action",
            FollowUpAction::RemoveFromList => "remove_from_list",
        }
    }
}

impl fmt::Display for FollowUpAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewType {
    PhoneScreen,
    VideoInterview,
    TechnicalInterview,
    OnSiteInterview,
    PanelInterview,
}

impl InterviewType {
    pub fn label(&self) -> &'static str {
        match self {
            InterviewType::PhoneScreen => "phone screen",
            InterviewType::VideoInterview => "video interview",
            InterviewType::TechnicalInterview => "technical interview",
            InterviewType::OnSiteInterview => "on-site interview",
            InterviewType::PanelInterview => "panel interview",
        }
    }
}

impl fmt::Display for InterviewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a classifier concluded about one reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub response_type: ResponseType,
    pub sentiment: Sentiment,
    pub confidence: f64,
    pub recommended_action: FollowUpAction,
    pub priority_level: u8,
    pub reasoning: String,
    #[serde(default)]
    pub key_phrases: Vec<String>,
}

impl Classification {
    /// Degraded result used whenever the classifier cannot answer.
    pub fn unclassified(reason: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::Unknown,
            sentiment: Sentiment::Neutral,
            confidence: 0.0,
            recommended_action: FollowUpAction::EscalateToHuman,
            priority_level: 3,
            reasoning: reason.into(),
            key_phrases: Vec::new(),
        }
    }

    fn checked(mut self) -> Result<Self, ClassifierError> {
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(ClassifierError::Malformed(format!(
                "confidence {} is outside [0, 1]",
                self.confidence
            )));
        }
        self.priority_level = self.priority_level.clamp(1, 5);
        Ok(self)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ClassificationRequest<'a> {
    pub text: &'a str,
    pub subject: &'a str,
    pub job: &'a JobContext,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifierError {
    #[error("classifier unavailable: {0}")]
    Unavailable(String),
    #[error("classifier did not answer within {0} ms")]
    Timeout(u64),
    #[error("classifier returned a malformed result: {0}")]
    Malformed(String),
}

/// External text-classification capability. Implementations own their time budget and
/// report overruns as [`ClassifierError::Timeout`].
pub trait ResponseClassifier: Send + Sync {
    fn classify(&self, request: &ClassificationRequest<'_>) -> Result<Classification, ClassifierError>;
}

/// Classify, substituting the unclassified default on any adapter failure.
pub fn classify_or_default(
    classifier: &dyn ResponseClassifier,
    request: &ClassificationRequest<'_>,
) -> (Classification, Option<ClassifierError>) {
    match classifier.classify(request).and_then(Classification::checked) {
        Ok(classification) => (classification, None),
        Err(err) => {
            warn!(error = %err, "falling back to unclassified response");
            (Classification::unclassified(format!("Analysis failed: {err}")), Some(err))
        }
    }
}

struct KeywordRule {
    response_type: ResponseType,
    sentiment: Sentiment,
    confidence: f64,
    action: FollowUpAction,
    priority: u8,
    phrases: &'static [&'static str],
}

const RULES: &[KeywordRule] = &[
    KeywordRule {
        response_type: ResponseType::OutOfOffice,
        sentiment: Sentiment::Neutral,
        confidence: 0.9,
        action: FollowUpAction::ScheduleLater,
        priority: 4,
        phrases: &["out of office", "out of the office", "automatic reply", "on vacation", "away until"],
    },
    KeywordRule {
        response_type: ResponseType::SpamComplaint,
        sentiment: Sentiment::Negative,
        confidence: 0.9,
        action: FollowUpAction::RemoveFromList,
        priority: 4,
        phrases: &["unsubscribe", "stop emailing", "stop contacting", "remove me", "spam"],
    },
    KeywordRule {
        response_type: ResponseType::NotInterested,
        sentiment: Sentiment::Neutral,
        confidence: 0.85,
        action: FollowUpAction::AddToFuturePool,
        priority: 4,
        phrases: &["not interested", "no thanks", "no thank you", "not looking", "happy where i am", "pass on this"],
    },
    KeywordRule {
        response_type: ResponseType::ScheduleLater,
        sentiment: Sentiment::Neutral,
        confidence: 0.8,
        action: FollowUpAction::ScheduleLater,
        priority: 3,
        phrases: &["not right now", "next month", "in a few months", "reach out again", "later this year"],
    },
    KeywordRule {
        response_type: ResponseType::Interested,
        sentiment: Sentiment::Positive,
        confidence: 0.85,
        action: FollowUpAction::ScheduleInterview,
        priority: 2,
        phrases: &["interested", "sounds great", "would love", "happy to chat", "let's talk", "let's schedule"],
    },
    KeywordRule {
        response_type: ResponseType::RequestInfo,
        sentiment: Sentiment::Neutral,
        confidence: 0.75,
        action: FollowUpAction::SendInfo,
        priority: 3,
        phrases: &["more information", "more details", "job description", "send me"],
    },
];

const INTERVIEW_HINTS: &[&str] = &["remote", "video", "phone", "call"];

/// Deterministic phrase-matching classifier for runs without an external model.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl ResponseClassifier for KeywordClassifier {
    fn classify(&self, request: &ClassificationRequest<'_>) -> Result<Classification, ClassifierError> {
        let text = format!("{} {}", request.subject, request.text).to_lowercase();
        let hints = INTERVIEW_HINTS
            .iter()
            .filter(|hint| text.contains(*hint))
            .map(|hint| hint.to_string());

        for rule in RULES {
            let matched: Vec<String> = rule
                .phrases
                .iter()
                .filter(|phrase| text.contains(*phrase))
                .map(|phrase| phrase.to_string())
                .collect();
            if matched.is_empty() {
                continue;
            }
            let reasoning = format!("matched {}: {}", rule.response_type, matched.join(", "));
            return Ok(Classification {
                response_type: rule.response_type,
                sentiment: rule.sentiment,
                confidence: rule.confidence,
                recommended_action: rule.action,
                priority_level: rule.priority,
                reasoning,
                key_phrases: matched.into_iter().chain(hints).collect(),
            });
        }

        if text.contains('?') {
            return Ok(Classification {
                response_type: ResponseType::Questions,
                sentiment: Sentiment::Neutral,
                confidence: 0.75,
                recommended_action: FollowUpAction::AnswerQuestions,
                priority_level: 3,
                reasoning: "reply asks questions".to_string(),
                key_phrases: hints.collect(),
            });
        }

        Ok(Classification {
            response_type: ResponseType::Unknown,
            sentiment: Sentiment::Neutral,
            confidence: 0.3,
            recommended_action: FollowUpAction::EscalateToHuman,
            priority_level: 3,
            reasoning: "no known phrases".to_string(),
            key_phrases: hints.collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing(ClassifierError);

    impl ResponseClassifier for Failing {
        fn classify(&self, _: &ClassificationRequest<'_>) -> Result<Classification, ClassifierError> {
            Err(self.0.clone())
        }
    }

    struct Overconfident;

    impl ResponseClassifier for Overconfident {
        fn classify(&self, _: &ClassificationRequest<'_>) -> Result<Classification, ClassifierError> {
            let mut classification = Classification::unclassified("n/a");
            classification.confidence = 1.4;
            Ok(classification)
        }
    }

    fn job() -> JobContext {
        JobContext {
            job_id: "job-1".to_string(),
            title: "Data Engineer".to_string(),
            company: "Acme".to_string(),
            description: String::new(),
        }
    }

    fn request<'a>(text: &'a str, job: &'a JobContext) -> ClassificationRequest<'a> {
        ClassificationRequest {
            text,
            subject: "Re: Data Engineer opportunity",
            job,
        }
    }

    #[test]
    fn keyword_rules_are_checked_in_order() {
        let job = job();
        let not_interested = KeywordClassifier
            .classify(&request("Thanks, but I'm not interested at the moment.", &job))
            .expect("classified");
        assert_eq!(not_interested.response_type, ResponseType::NotInterested);
        assert_eq!(not_interested.recommended_action, FollowUpAction::AddToFuturePool);

        let interested = KeywordClassifier
            .classify(&request("Sounds great, happy to do a video call.", &job))
            .expect("classified");
        assert_eq!(interested.response_type, ResponseType::Interested);
        assert!(interested.key_phrases.contains(&"video".to_string()));
    }

    #[test]
    fn bare_questions_and_unknown_text() {
        let job = job();
        let questions = KeywordClassifier
            .classify(&request("What does the team stack look like?", &job))
            .expect("classified");
        assert_eq!(questions.response_type, ResponseType::Questions);

        let unknown = KeywordClassifier
            .classify(&request("Received.", &job))
            .expect("classified");
        assert_eq!(unknown.response_type, ResponseType::Unknown);
        assert_eq!(unknown.recommended_action, FollowUpAction::EscalateToHuman);
    }

    #[test]
    fn adapter_failures_become_the_unclassified_default() {
        let job = job();
        let (classification, error) =
            classify_or_default(&Failing(ClassifierError::Timeout(2_000)), &request("hi", &job));

        assert_eq!(error, Some(ClassifierError::Timeout(2_000)));
        assert_eq!(classification.response_type, ResponseType::Unknown);
        assert_eq!(classification.sentiment, Sentiment::Neutral);
        assert_eq!(classification.confidence, 0.0);
        assert_eq!(classification.recommended_action, FollowUpAction::EscalateToHuman);
        assert_eq!(classification.priority_level, 3);
    }

    #[test]
    fn out_of_range_confidence_is_treated_as_malformed() {
        let job = job();
        let (classification, error) = classify_or_default(&Overconfident, &request("hi", &job));
        assert!(matches!(error, Some(ClassifierError::Malformed(_))));
        assert_eq!(classification.confidence, 0.0);
    }
}
