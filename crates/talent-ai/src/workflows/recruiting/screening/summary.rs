use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ExperienceLevelMatch, ScreeningResult};

const TOP_MISSING_SKILLS: usize = 5;
const TOP_LOCATIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationCount {
    pub city: String,
    pub count: usize,
}

/// Aggregate view of one screening batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningSummary {
    pub total_candidates: usize,
    pub passed: usize,
    pub shortlisted: usize,
    pub rejected: usize,
    pub average_score: f64,
    pub highest_score: f64,
    pub lowest_score: f64,
    pub most_common_missing_skills: Vec<String>,
    pub experience_distribution: BTreeMap<ExperienceLevelMatch, usize>,
    pub location_distribution: Vec<LocationCount>,
    pub error_count: usize,
}

impl ScreeningSummary {
    pub fn from_results(results: &[ScreeningResult], error_count: usize) -> Self {
        let total_candidates = results.len();
        let passed = results.iter().filter(|r| r.passes_screening).count();
        let shortlisted = results
            .iter()
            .filter(|r| r.recommended_for_shortlist)
            .count();
        // Shortlisted candidates move on even when they miss the pass threshold.
        let rejected = results
            .iter()
            .filter(|r| !r.passes_screening && !r.recommended_for_shortlist)
            .count();

        let scores: Vec<f64> = results.iter().map(|r| r.weighted_score).collect();
        let (average_score, highest_score, lowest_score) = if scores.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            (
                scores.iter().sum::<f64>() / scores.len() as f64,
                scores.iter().copied().fold(f64::MIN, f64::max),
                scores.iter().copied().fold(f64::MAX, f64::min),
            )
        };

        let mut experience_distribution = BTreeMap::new();
        for level in results.iter().filter_map(|r| r.experience_level_match) {
            *experience_distribution.entry(level).or_insert(0) += 1;
        }

        Self {
            total_candidates,
            passed,
            shortlisted,
            rejected,
            average_score,
            highest_score,
            lowest_score,
            most_common_missing_skills: ranked(
                results
                    .iter()
                    .flat_map(|r| r.missing_critical_skills.iter().cloned()),
            )
            .into_iter()
            .take(TOP_MISSING_SKILLS)
            .map(|(skill, _)| skill)
            .collect(),
            experience_distribution,
            location_distribution: ranked(results.iter().filter_map(|r| {
                r.candidate_location
                    .as_deref()
                    .and_then(|location| location.split(',').next())
                    .map(str::trim)
                    .filter(|city| !city.is_empty())
                    .map(str::to_string)
            }))
            .into_iter()
            .take(TOP_LOCATIONS)
            .map(|(city, count)| LocationCount { city, count })
            .collect(),
            error_count,
        }
    }

    /// Operator guidance derived from pass rates, skill gaps, and errors.
    pub fn recommendations(&self) -> Vec<String> {
        let mut recommendations = Vec::new();

        if self.total_candidates > 0 {
            let total = self.total_candidates as f64;
            let pass_rate = self.passed as f64 / total * 100.0;
            if pass_rate < 20.0 {
                recommendations
                    .push("Consider adjusting screening criteria - pass rate is very low".into());
            } else if pass_rate > 80.0 {
                recommendations
                    .push("Consider raising screening standards - pass rate is very high".into());
            }

            if (self.shortlisted as f64 / total * 100.0) < 10.0 {
                recommendations
                    .push("Consider lowering shortlist threshold or expanding sourcing".into());
            }
        }

        if !self.most_common_missing_skills.is_empty() {
            let focus: Vec<&str> = self
                .most_common_missing_skills
                .iter()
                .take(3)
                .map(String::as_str)
                .collect();
            recommendations.push(format!(
                "Focus sourcing on candidates with {} skills",
                focus.join(", ")
            ));
        }

        let assessed: usize = self.experience_distribution.values().sum();
        let under = self
            .experience_distribution
            .get(&ExperienceLevelMatch::Under)
            .copied()
            .unwrap_or(0);
        if assessed > 0 && under as f64 / assessed as f64 > 0.5 {
            recommendations.push(
                "Many candidates are under-experienced - consider junior-friendly roles or training programs"
                    .into(),
            );
        }

        if self.error_count > 0 {
            recommendations.push("Review data quality - errors encountered during processing".into());
        }

        if recommendations.is_empty() {
            recommendations
                .push("Screening process completed successfully with good candidate quality".into());
        }

        recommendations
    }
}

/// Count occurrences, highest first; ties keep first-seen order.
fn ranked(values: impl Iterator<Item = String>) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(seen, _)| *seen == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}
