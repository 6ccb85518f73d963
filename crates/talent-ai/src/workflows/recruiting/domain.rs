use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier assigned by the channel a candidate was sourced from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(pub String);

impl CandidateId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a candidate record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceChannel {
    Linkedin,
    Indeed,
    Database,
    Github,
    Referral,
    DirectApply,
}

impl SourceChannel {
    pub fn label(&self) -> &'static str {
        match self {
            SourceChannel::Linkedin => "linkedin",
            SourceChannel::Indeed => "indeed",
            SourceChannel::Database => "database",
            SourceChannel::Github => "github",
            SourceChannel::Referral => "referral",
            SourceChannel::DirectApply => "direct_apply",
        }
    }
}

impl fmt::Display for SourceChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Candidate lifecycle. Ordering follows the pipeline; the last three are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    #[default]
    Sourced,
    Screened,
    Shortlisted,
    Contacted,
    Responded,
    Interviewed,
    Hired,
    Rejected,
}

impl CandidateStatus {
    /// Position in the lifecycle. Terminal statuses share the last rank.
    pub fn rank(&self) -> u8 {
        match self {
            CandidateStatus::Sourced => 0,
            CandidateStatus::Screened => 1,
            CandidateStatus::Shortlisted => 2,
            CandidateStatus::Contacted => 3,
            CandidateStatus::Responded => 4,
            CandidateStatus::Interviewed | CandidateStatus::Hired | CandidateStatus::Rejected => 5,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.rank() == 5
    }

    pub fn label(&self) -> &'static str {
        match self {
            CandidateStatus::Sourced => "sourced",
            CandidateStatus::Screened => "screened",
            CandidateStatus::Shortlisted => "shortlisted",
            CandidateStatus::Contacted => "contacted",
            CandidateStatus::Responded => "responded",
            CandidateStatus::Interviewed => "interviewed",
            CandidateStatus::Hired => "hired",
            CandidateStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusTransitionError {
    #[error("candidate {id} cannot move back from {from} to {to}")]
    Regression {
        id: CandidateId,
        from: CandidateStatus,
        to: CandidateStatus,
    },
    #[error("candidate {id} is already {from}; {to} is not reachable")]
    Terminal {
        id: CandidateId,
        from: CandidateStatus,
        to: CandidateStatus,
    },
}

/// Display name for profiles that arrive without one.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Normalized candidate profile shared by every pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: CandidateId,
    pub source: SourceChannel,
    /// The channel's own id, kept when `id` had to be qualified to stay unique in a run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<CandidateId>,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub current_title: Option<String>,
    #[serde(default)]
    pub current_company: Option<String>,
    #[serde(default)]
    pub profile_url: Option<String>,
    #[serde(default)]
    pub experience_years: Option<f64>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub education: Vec<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub status: CandidateStatus,
    #[serde(default)]
    pub notes: Vec<String>,
}

impl CandidateRecord {
    pub fn new(id: impl Into<String>, source: SourceChannel, name: impl Into<String>) -> Self {
        Self {
            id: CandidateId(id.into()),
            source,
            source_ref: None,
            name: name.into(),
            email: None,
            phone: None,
            location: None,
            current_title: None,
            current_company: None,
            profile_url: None,
            experience_years: None,
            skills: Vec::new(),
            education: Vec::new(),
            certifications: Vec::new(),
            status: CandidateStatus::Sourced,
            notes: Vec::new(),
        }
    }

    /// Move forward in the lifecycle. Returns `false` when the status is unchanged.
    pub fn advance(
        &mut self,
        next: CandidateStatus,
        note: Option<String>,
    ) -> Result<bool, StatusTransitionError> {
        if next == self.status {
            return Ok(false);
        }
        if self.status.is_terminal() {
            return Err(StatusTransitionError::Terminal {
                id: self.id.clone(),
                from: self.status,
                to: next,
            });
        }
        if next.rank() < self.status.rank() {
            return Err(StatusTransitionError::Regression {
                id: self.id.clone(),
                from: self.status,
                to: next,
            });
        }

        self.status = next;
        if let Some(note) = note {
            self.notes.push(note);
        }
        Ok(true)
    }

    /// Id the owning repository knows this candidate by.
    pub fn source_id(&self) -> &CandidateId {
        self.source_ref.as_ref().unwrap_or(&self.id)
    }

    /// Re-key as `channel:id`, keeping the channel's id for status write-back.
    pub fn qualify_id(&mut self) {
        let qualified = CandidateId(format!("{}:{}", self.source.label(), self.source_id()));
        let original = std::mem::replace(&mut self.id, qualified);
        self.source_ref.get_or_insert(original);
    }

    pub fn has_name(&self) -> bool {
        let name = self.name.trim();
        !name.is_empty() && name != UNKNOWN_NAME
    }

    /// Key used to collapse the same person surfacing on several channels.
    ///
    /// Email wins, then the name with whitespace removed; profiles with neither have no key.
    pub fn dedupe_key(&self) -> Option<String> {
        if let Some(email) = self.email.as_deref().map(str::trim) {
            if !email.is_empty() {
                return Some(email.to_ascii_lowercase());
            }
        }
        if !self.has_name() {
            return None;
        }
        let name: String = self
            .name
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        (!name.is_empty()).then_some(name)
    }

    pub fn has_email(&self) -> bool {
        self.email
            .as_deref()
            .map(|email| email.contains('@'))
            .unwrap_or(false)
    }
}

/// Opening the pipeline recruits for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequirements {
    pub job_id: String,
    pub title: String,
    #[serde(default)]
    pub company: String,
    /// Free text handed to the classifier; never interpreted here.
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub preferred_skills: Vec<String>,
    #[serde(default)]
    pub min_experience_years: f64,
    #[serde(default)]
    pub preferred_experience_years: f64,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub remote_allowed: bool,
    #[serde(default)]
    pub education_requirements: Vec<String>,
}

impl JobRequirements {
    pub fn validate(&self) -> Result<(), JobRequirementsError> {
        if self.title.trim().is_empty() {
            return Err(JobRequirementsError::MissingTitle);
        }
        if !self
            .required_skills
            .iter()
            .any(|skill| !skill.trim().is_empty())
        {
            return Err(JobRequirementsError::NoRequiredSkills);
        }
        for (field, value) in [
            ("min_experience_years", self.min_experience_years),
            ("preferred_experience_years", self.preferred_experience_years),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(JobRequirementsError::InvalidExperience { field, value });
            }
        }
        Ok(())
    }

    pub fn context(&self) -> JobContext {
        JobContext {
            job_id: self.job_id.clone(),
            title: self.title.clone(),
            company: self.company.clone(),
            description: self.description.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum JobRequirementsError {
    #[error("job title must not be empty")]
    MissingTitle,
    #[error("job must list at least one required skill")]
    NoRequiredSkills,
    #[error("{field} must be a non-negative number (got {value})")]
    InvalidExperience { field: &'static str, value: f64 },
}

/// The slice of a job the classifier and follow-up router need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobContext {
    pub job_id: String,
    pub title: String,
    pub company: String,
    pub description: String,
}
