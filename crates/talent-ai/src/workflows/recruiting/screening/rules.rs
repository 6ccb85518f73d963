use super::super::domain::{CandidateRecord, JobRequirements};
use super::config::ScreeningCriteria;
use super::matcher::{partial_ratio, SkillMatch, SkillMatcher};
use super::{ExperienceLevelMatch, ScoreComponent, ScoreFactor};

const LOCATION_FUZZY_THRESHOLD: u8 = 80;
const EDUCATION_FUZZY_THRESHOLD: u8 = 70;

/// Intermediate scoring output consumed by the decision policy.
pub(crate) struct Assessment {
    pub components: Vec<ScoreComponent>,
    pub skill_matches: Vec<SkillMatch>,
    pub missing_critical_skills: Vec<String>,
    pub experience_level: ExperienceLevelMatch,
    pub location_match: bool,
    pub education_match: bool,
}

impl Assessment {
    pub fn score(&self, factor: ScoreFactor) -> f64 {
        self.components
            .iter()
            .find(|component| component.factor == factor)
            .map(|component| component.score)
            .unwrap_or(0.0)
    }
}

pub(crate) fn assess_candidate(
    candidate: &CandidateRecord,
    job: &JobRequirements,
    criteria: &ScreeningCriteria,
    matcher: &SkillMatcher,
) -> Assessment {
    let required: Vec<&String> = job
        .required_skills
        .iter()
        .filter(|skill| !skill.trim().is_empty())
        .collect();
    let preferred: Vec<&String> = job
        .preferred_skills
        .iter()
        .filter(|skill| !skill.trim().is_empty())
        .collect();

    let required_matches: Vec<SkillMatch> = required
        .iter()
        .map(|skill| matcher.match_skill(skill, &candidate.skills))
        .collect();
    let preferred_matches: Vec<SkillMatch> = preferred
        .iter()
        .map(|skill| matcher.match_skill(skill, &candidate.skills))
        .collect();

    let missing_critical_skills: Vec<String> = required_matches
        .iter()
        .filter(|matched| !matched.found)
        .map(|matched| matched.skill.clone())
        .collect();

    let mut components = Vec::with_capacity(5);

    let required_score = skill_score(&required_matches);
    components.push(ScoreComponent {
        factor: ScoreFactor::RequiredSkills,
        score: required_score,
        weight: criteria.required_skills_weight,
        notes: format!(
            "{} of {} required skills matched",
            required_matches.len() - missing_critical_skills.len(),
            required_matches.len()
        ),
    });

    let preferred_found = preferred_matches.iter().filter(|m| m.found).count();
    components.push(ScoreComponent {
        factor: ScoreFactor::PreferredSkills,
        score: skill_score(&preferred_matches),
        weight: criteria.preferred_skills_weight,
        notes: format!(
            "{preferred_found} of {} preferred skills matched",
            preferred_matches.len()
        ),
    });

    let years = candidate.experience_years.unwrap_or(0.0);
    let (experience, experience_level) = experience_score(
        years,
        job.min_experience_years,
        job.preferred_experience_years,
    );
    components.push(ScoreComponent {
        factor: ScoreFactor::Experience,
        score: experience,
        weight: criteria.experience_weight,
        notes: format!(
            "{years} years against {} minimum / {} preferred",
            job.min_experience_years, job.preferred_experience_years
        ),
    });

    let (location, location_match, location_notes) =
        location_score(candidate.location.as_deref(), job, criteria);
    components.push(ScoreComponent {
        factor: ScoreFactor::Location,
        score: location,
        weight: criteria.location_weight,
        notes: location_notes,
    });

    let (education, education_match) = education_score(&candidate.education, job, criteria);
    components.push(ScoreComponent {
        factor: ScoreFactor::Education,
        score: education,
        weight: criteria.education_weight,
        notes: if education_match {
            "education requirement satisfied".to_string()
        } else {
            "education requirement not met".to_string()
        },
    });

    let mut skill_matches = required_matches;
    skill_matches.extend(preferred_matches);

    Assessment {
        components,
        skill_matches,
        missing_critical_skills,
        experience_level,
        location_match,
        education_match,
    }
}

/// Mean matcher confidence scaled to 0..=100; an empty list imposes no penalty.
pub(crate) fn skill_score(matches: &[SkillMatch]) -> f64 {
    if matches.is_empty() {
        return 100.0;
    }
    let total: f64 = matches.iter().map(|matched| matched.confidence * 100.0).sum();
    total / matches.len() as f64
}

pub(crate) fn experience_score(
    years: f64,
    min_required: f64,
    preferred: f64,
) -> (f64, ExperienceLevelMatch) {
    if years < min_required {
        let score = if min_required > 0.0 {
            (years / min_required * 60.0).clamp(0.0, 100.0)
        } else {
            60.0
        };
        (score, ExperienceLevelMatch::Under)
    } else if years >= preferred {
        let score = (80.0 + (years - preferred) * 2.0).min(100.0);
        (score, ExperienceLevelMatch::Exceeds)
    } else {
        let score = if preferred > min_required {
            60.0 + (years - min_required) / (preferred - min_required) * 40.0
        } else {
            80.0
        };
        (score, ExperienceLevelMatch::Meets)
    }
}

pub(crate) fn location_score(
    candidate_location: Option<&str>,
    job: &JobRequirements,
    criteria: &ScreeningCriteria,
) -> (f64, bool, String) {
    let candidate = non_blank(candidate_location).map(str::to_lowercase);
    let job_location = non_blank(job.location.as_deref()).map(str::to_lowercase);

    let remote_candidate = candidate
        .as_deref()
        .map(|location| location.contains("remote"))
        .unwrap_or(false);
    if job.remote_allowed || remote_candidate {
        return (100.0, true, "remote work allowed".to_string());
    }

    if let (Some(candidate), Some(job_location)) = (candidate.as_deref(), job_location.as_deref())
    {
        if candidate.contains(job_location) {
            return (100.0, true, "located in the job location".to_string());
        }
    }

    if let Some(candidate) = candidate.as_deref() {
        let preferred = criteria
            .preferred_locations
            .iter()
            .filter_map(|location| non_blank(Some(location.as_str())))
            .find(|location| candidate.contains(&location.to_lowercase()));
        if let Some(preferred) = preferred {
            return (90.0, true, format!("in preferred location {preferred}"));
        }
    }

    match (candidate.as_deref(), job_location.as_deref()) {
        (Some(candidate), Some(job_location)) => {
            let similarity = partial_ratio(job_location, candidate);
            if similarity >= LOCATION_FUZZY_THRESHOLD {
                (
                    f64::from(similarity),
                    true,
                    format!("location similar to job location ({similarity})"),
                )
            } else {
                (30.0, false, "location does not match".to_string())
            }
        }
        _ => (50.0, false, "location unknown".to_string()),
    }
}

pub(crate) fn education_score(
    candidate_education: &[String],
    job: &JobRequirements,
    criteria: &ScreeningCriteria,
) -> (f64, bool) {
    let requirements: Vec<String> = job
        .education_requirements
        .iter()
        .filter_map(|requirement| non_blank(Some(requirement.as_str())))
        .map(str::to_lowercase)
        .collect();

    if !criteria.education_required || requirements.is_empty() {
        return (100.0, true);
    }

    let entries: Vec<String> = candidate_education
        .iter()
        .filter_map(|entry| non_blank(Some(entry.as_str())))
        .map(str::to_lowercase)
        .collect();
    if entries.is_empty() {
        return (0.0, false);
    }

    let best = requirements
        .iter()
        .flat_map(|requirement| {
            entries
                .iter()
                .map(move |entry| partial_ratio(requirement, entry))
        })
        .max()
        .unwrap_or(0);

    if best >= EDUCATION_FUZZY_THRESHOLD {
        (f64::from(best), true)
    } else {
        (30.0, false)
    }
}

/// Returns `(overall, weighted)`. Education joins the unweighted mean only when required.
pub(crate) fn aggregate(components: &[ScoreComponent], criteria: &ScreeningCriteria) -> (f64, f64) {
    let counted: Vec<f64> = components
        .iter()
        .filter(|component| {
            component.factor != ScoreFactor::Education || criteria.education_required
        })
        .map(|component| component.score)
        .collect();
    let overall = if counted.is_empty() {
        0.0
    } else {
        counted.iter().sum::<f64>() / counted.len() as f64
    };

    let total_weight: f64 = components.iter().map(|component| component.weight).sum();
    let weighted = if total_weight > 0.0 {
        components
            .iter()
            .map(|component| component.score * component.weight)
            .sum::<f64>()
            / total_weight
    } else {
        overall
    };

    (overall, weighted)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
