use serde::{Deserialize, Serialize};

use super::config::ScreeningCriteria;
use super::rules::Assessment;
use super::{ExperienceLevelMatch, ScoreFactor};

/// Missing more than this many required skills fails regardless of score.
const MAX_MISSING_REQUIRED_SKILLS: usize = 2;
const MIN_UNDER_EXPERIENCE_SCORE: f64 = 30.0;

/// Hard disqualifiers checked before any threshold comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum AutoFailReason {
    MissingRequiredSkills { missing: Vec<String> },
    InsufficientExperience { experience_score: f64 },
}

impl AutoFailReason {
    pub fn summary(&self) -> String {
        match self {
            AutoFailReason::MissingRequiredSkills { missing } => format!(
                "auto-failed: missing {} required skills ({})",
                missing.len(),
                missing.join(", ")
            ),
            AutoFailReason::InsufficientExperience { experience_score } => format!(
                "auto-failed: experience score {:.1} is below the minimum of {:.0}",
                experience_score, MIN_UNDER_EXPERIENCE_SCORE
            ),
        }
    }
}

pub(crate) struct Decision {
    pub passes: bool,
    pub shortlisted: bool,
    pub auto_fail: Option<AutoFailReason>,
}

pub(crate) fn decide_outcome(
    assessment: &Assessment,
    weighted_score: f64,
    criteria: &ScreeningCriteria,
) -> Decision {
    if assessment.missing_critical_skills.len() > MAX_MISSING_REQUIRED_SKILLS {
        return Decision {
            passes: false,
            shortlisted: false,
            auto_fail: Some(AutoFailReason::MissingRequiredSkills {
                missing: assessment.missing_critical_skills.clone(),
            }),
        };
    }

    let experience_score = assessment.score(ScoreFactor::Experience);
    if assessment.experience_level == ExperienceLevelMatch::Under
        && experience_score < MIN_UNDER_EXPERIENCE_SCORE
    {
        return Decision {
            passes: false,
            shortlisted: false,
            auto_fail: Some(AutoFailReason::InsufficientExperience { experience_score }),
        };
    }

    Decision {
        passes: weighted_score >= criteria.pass_threshold,
        shortlisted: weighted_score >= criteria.shortlist_threshold,
        auto_fail: None,
    }
}

pub(crate) fn generate_insights(
    assessment: &Assessment,
    weighted_score: f64,
) -> (Vec<String>, Vec<String>) {
    let mut strengths = Vec::new();
    let mut concerns = Vec::new();

    let required = assessment.score(ScoreFactor::RequiredSkills);
    if required >= 80.0 {
        strengths.push("Strong technical skills match".to_string());
    } else if required < 50.0 {
        concerns.push("Missing several required skills".to_string());
    }

    if assessment.score(ScoreFactor::PreferredSkills) >= 60.0 {
        strengths.push("Good preferred skills coverage".to_string());
    }

    match assessment.experience_level {
        ExperienceLevelMatch::Exceeds => {
            strengths.push("Highly experienced candidate".to_string())
        }
        ExperienceLevelMatch::Under => {
            concerns.push("Below minimum experience requirement".to_string())
        }
        ExperienceLevelMatch::Meets => {}
    }

    if assessment.location_match {
        strengths.push("Location compatible".to_string());
    } else {
        concerns.push("Location may require relocation".to_string());
    }

    if !assessment.missing_critical_skills.is_empty() {
        let listed: Vec<&str> = assessment
            .missing_critical_skills
            .iter()
            .take(3)
            .map(String::as_str)
            .collect();
        concerns.push(format!("Missing critical skills: {}", listed.join(", ")));
    }

    if weighted_score >= 85.0 {
        strengths.push("Excellent overall candidate".to_string());
    } else if weighted_score >= 70.0 {
        strengths.push("Good candidate match".to_string());
    } else if weighted_score < 50.0 {
        concerns.push("Significant gaps in requirements".to_string());
    }

    (strengths, concerns)
}
