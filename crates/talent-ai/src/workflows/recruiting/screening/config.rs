use serde::{Deserialize, Serialize};

/// Weights and thresholds applied to every candidate in one screening run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreeningCriteria {
    pub required_skills_weight: f64,
    pub preferred_skills_weight: f64,
    pub experience_weight: f64,
    pub location_weight: f64,
    pub education_weight: f64,
    pub education_required: bool,
    /// Locations scored just below an on-site match.
    pub preferred_locations: Vec<String>,
    pub pass_threshold: f64,
    pub shortlist_threshold: f64,
}

impl Default for ScreeningCriteria {
    fn default() -> Self {
        Self {
            required_skills_weight: 0.4,
            preferred_skills_weight: 0.2,
            experience_weight: 0.3,
            location_weight: 0.1,
            education_weight: 0.0,
            education_required: false,
            preferred_locations: Vec::new(),
            pass_threshold: 60.0,
            shortlist_threshold: 75.0,
        }
    }
}

impl ScreeningCriteria {
    pub fn validate(&self) -> Result<(), CriteriaError> {
        for (factor, weight) in self.weights() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(CriteriaError::InvalidWeight {
                    factor,
                    value: weight,
                });
            }
        }
        if self.total_weight() <= 0.0 {
            return Err(CriteriaError::NoWeightApplied);
        }
        for (name, value) in [
            ("pass_threshold", self.pass_threshold),
            ("shortlist_threshold", self.shortlist_threshold),
        ] {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(CriteriaError::InvalidThreshold { name, value });
            }
        }
        Ok(())
    }

    /// True when a candidate could be shortlisted without passing.
    pub fn thresholds_inverted(&self) -> bool {
        self.shortlist_threshold < self.pass_threshold
    }

    pub fn total_weight(&self) -> f64 {
        self.weights().iter().map(|(_, weight)| weight).sum()
    }

    fn weights(&self) -> [(&'static str, f64); 5] {
        [
            ("required_skills", self.required_skills_weight),
            ("preferred_skills", self.preferred_skills_weight),
            ("experience", self.experience_weight),
            ("location", self.location_weight),
            ("education", self.education_weight),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CriteriaError {
    #[error("{factor} weight must be a non-negative number (got {value})")]
    InvalidWeight { factor: &'static str, value: f64 },
    #[error("at least one screening weight must be positive")]
    NoWeightApplied,
    #[error("{name} must be between 0 and 100 (got {value})")]
    InvalidThreshold { name: &'static str, value: f64 },
}
