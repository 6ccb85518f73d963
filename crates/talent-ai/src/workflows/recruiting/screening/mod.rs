//! Candidate screening: skill matching, component scoring, and the pass/shortlist decision.

mod config;
pub mod matcher;
mod policy;
mod rules;
mod summary;
mod worker;

pub use config::{CriteriaError, ScreeningCriteria};
pub use matcher::{partial_ratio, MatchType, SkillMatch, SkillMatcher};
pub use policy::AutoFailReason;
pub use summary::{LocationCount, ScreeningSummary};
pub use worker::{ScreeningOutput, ScreeningWorker};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::domain::{CandidateId, CandidateRecord, JobRequirements, JobRequirementsError};
use policy::decide_outcome;

/// Stateless scorer that applies one set of criteria to any number of candidates.
#[derive(Debug, Clone)]
pub struct ScreeningEngine {
    criteria: ScreeningCriteria,
    matcher: SkillMatcher,
}

impl ScreeningEngine {
    pub fn new(criteria: ScreeningCriteria) -> Result<Self, CriteriaError> {
        criteria.validate()?;
        if criteria.thresholds_inverted() {
            warn!(
                pass_threshold = criteria.pass_threshold,
                shortlist_threshold = criteria.shortlist_threshold,
                "shortlist threshold is below pass threshold; candidates may be shortlisted without passing"
            );
        }
        Ok(Self {
            criteria,
            matcher: SkillMatcher::default(),
        })
    }

    pub fn with_matcher(mut self, matcher: SkillMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn criteria(&self) -> &ScreeningCriteria {
        &self.criteria
    }

    /// Score a candidate, surfacing input problems as errors.
    pub fn try_screen(
        &self,
        candidate: &CandidateRecord,
        job: &JobRequirements,
    ) -> Result<ScreeningResult, ScreeningError> {
        job.validate()?;
        if let Some(years) = candidate.experience_years {
            if !years.is_finite() || years < 0.0 {
                return Err(ScreeningError::InvalidExperience {
                    id: candidate.id.clone(),
                    value: years,
                });
            }
        }

        let assessment = rules::assess_candidate(candidate, job, &self.criteria, &self.matcher);
        let (overall_score, weighted_score) =
            rules::aggregate(&assessment.components, &self.criteria);
        let decision = decide_outcome(&assessment, weighted_score, &self.criteria);
        let (strengths, concerns) = policy::generate_insights(&assessment, weighted_score);

        debug!(
            candidate = %candidate.id,
            weighted_score,
            passes = decision.passes,
            shortlisted = decision.shortlisted,
            "candidate screened"
        );

        Ok(ScreeningResult {
            candidate_id: candidate.id.clone(),
            candidate_name: candidate.name.clone(),
            candidate_location: candidate.location.clone(),
            job_id: job.job_id.clone(),
            components: assessment.components,
            overall_score,
            weighted_score,
            experience_level_match: Some(assessment.experience_level),
            location_match: assessment.location_match,
            education_match: assessment.education_match,
            skill_matches: assessment.skill_matches,
            missing_critical_skills: assessment.missing_critical_skills,
            passes_screening: decision.passes,
            recommended_for_shortlist: decision.shortlisted,
            auto_fail: decision.auto_fail,
            strengths,
            concerns,
        })
    }

    /// Score a candidate; any failure becomes a zeroed, failing result.
    pub fn screen(&self, candidate: &CandidateRecord, job: &JobRequirements) -> ScreeningResult {
        match self.try_screen(candidate, job) {
            Ok(result) => result,
            Err(err) => {
                warn!(candidate = %candidate.id, error = %err, "screening failed");
                ScreeningResult::failed(candidate, job, &self.criteria, &err)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScreeningError {
    #[error("candidate {id} reports invalid experience ({value} years)")]
    InvalidExperience { id: CandidateId, value: f64 },
    #[error(transparent)]
    Job(#[from] JobRequirementsError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFactor {
    RequiredSkills,
    PreferredSkills,
    Experience,
    Location,
    Education,
}

impl ScoreFactor {
    pub const ALL: [ScoreFactor; 5] = [
        ScoreFactor::RequiredSkills,
        ScoreFactor::PreferredSkills,
        ScoreFactor::Experience,
        ScoreFactor::Location,
        ScoreFactor::Education,
    ];

    pub(crate) fn weight(&self, criteria: &ScreeningCriteria) -> f64 {
        match self {
            ScoreFactor::RequiredSkills => criteria.required_skills_weight,
            ScoreFactor::PreferredSkills => criteria.preferred_skills_weight,
            ScoreFactor::Experience => criteria.experience_weight,
            ScoreFactor::Location => criteria.location_weight,
            ScoreFactor::Education => criteria.education_weight,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevelMatch {
    Under,
    Meets,
    Exceeds,
}

/// One scored factor, kept for transparent review of the decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: ScoreFactor,
    pub score: f64,
    pub weight: f64,
    pub notes: String,
}

/// Immutable screening outcome for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningResult {
    pub candidate_id: CandidateId,
    pub candidate_name: String,
    pub candidate_location: Option<String>,
    pub job_id: String,
    pub components: Vec<ScoreComponent>,
    pub overall_score: f64,
    pub weighted_score: f64,
    /// `None` when scoring failed before experience was assessed.
    pub experience_level_match: Option<ExperienceLevelMatch>,
    pub location_match: bool,
    pub education_match: bool,
    pub skill_matches: Vec<SkillMatch>,
    pub missing_critical_skills: Vec<String>,
    pub passes_screening: bool,
    pub recommended_for_shortlist: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_fail: Option<AutoFailReason>,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
}

impl ScreeningResult {
    pub fn score(&self, factor: ScoreFactor) -> f64 {
        self.components
            .iter()
            .find(|component| component.factor == factor)
            .map(|component| component.score)
            .unwrap_or(0.0)
    }

    pub fn decision_summary(&self) -> String {
        if let Some(reason) = &self.auto_fail {
            return reason.summary();
        }
        match (self.passes_screening, self.recommended_for_shortlist) {
            (true, true) => format!("shortlisted with weighted score {:.1}", self.weighted_score),
            (true, false) => format!("passed with weighted score {:.1}", self.weighted_score),
            (false, true) => format!(
                "shortlisted without passing (weighted score {:.1})",
                self.weighted_score
            ),
            (false, false) => format!("rejected with weighted score {:.1}", self.weighted_score),
        }
    }

    fn failed(
        candidate: &CandidateRecord,
        job: &JobRequirements,
        criteria: &ScreeningCriteria,
        error: &ScreeningError,
    ) -> Self {
        Self {
            candidate_id: candidate.id.clone(),
            candidate_name: candidate.name.clone(),
            candidate_location: candidate.location.clone(),
            job_id: job.job_id.clone(),
            components: ScoreFactor::ALL
                .iter()
                .map(|factor| ScoreComponent {
                    factor: *factor,
                    score: 0.0,
                    weight: factor.weight(criteria),
                    notes: "not scored".to_string(),
                })
                .collect(),
            overall_score: 0.0,
            weighted_score: 0.0,
            experience_level_match: None,
            location_match: false,
            education_match: false,
            skill_matches: Vec::new(),
            missing_critical_skills: Vec::new(),
            passes_screening: false,
            recommended_for_shortlist: false,
            auto_fail: None,
            strengths: Vec::new(),
            concerns: vec![format!("Error during screening: {error}")],
        }
    }
}
