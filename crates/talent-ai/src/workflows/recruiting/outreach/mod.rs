//! First-contact messages to shortlisted candidates through a pluggable dispatch adapter.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::RecruitingConfig;

use super::context::RunContext;
use super::domain::{CandidateId, CandidateRecord, CandidateStatus, JobRequirements, UNKNOWN_NAME};
use super::stage::{AuditKind, StageError, StageKind, StageProgress, StageState, StageWorker};

/// Outbound transport seam (SMTP, webhook, CRM). Only success or the error is observed.
pub trait MessageDispatch: Send + Sync {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DispatchError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("message rejected: {0}")]
    Rejected(String),
    #[error("dispatch transport unavailable: {0}")]
    Transport(String),
    #[error("dispatch timed out after {0} ms")]
    Timeout(u64),
}

/// A message accepted by [`InMemoryOutbox`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Dispatch adapter that keeps messages in memory, rejecting a configured set of recipients.
#[derive(Debug, Default)]
pub struct InMemoryOutbox {
    sent: Mutex<Vec<SentMessage>>,
    rejected_recipients: HashSet<String>,
}

impl InMemoryOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting<I, S>(recipients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            sent: Mutex::new(Vec::new()),
            rejected_recipients: recipients
                .into_iter()
                .map(|recipient| recipient.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

impl MessageDispatch for InMemoryOutbox {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DispatchError> {
        if self.rejected_recipients.contains(&to.to_lowercase()) {
            return Err(DispatchError::Rejected(format!("recipient {to} refused delivery")));
        }
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| DispatchError::Transport("outbox lock poisoned".to_string()))?;
        sent.push(SentMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OutreachError {
    #[error("candidate {0} has no usable email address")]
    MissingEmail(CandidateId),
}

/// Signature and company used in first-contact messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecruiterProfile {
    pub name: String,
    pub email: String,
    pub company: String,
}

impl From<&RecruitingConfig> for RecruiterProfile {
    fn from(config: &RecruitingConfig) -> Self {
        Self {
            name: config.recruiter_name.clone(),
            email: config.recruiter_email.clone(),
            company: config.company_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutreachDraft {
    pub message_id: String,
    pub candidate_id: CandidateId,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl OutreachDraft {
    pub fn compose(
        message_id: impl Into<String>,
        candidate: &CandidateRecord,
        job: &JobRequirements,
        recruiter: &RecruiterProfile,
    ) -> Result<Self, OutreachError> {
        let to = candidate
            .email
            .as_deref()
            .map(str::trim)
            .filter(|_| candidate.has_email())
            .ok_or_else(|| OutreachError::MissingEmail(candidate.id.clone()))?;

        let company = if job.company.trim().is_empty() {
            recruiter.company.as_str()
        } else {
            job.company.as_str()
        };
        let first_name = candidate
            .name
            .split_whitespace()
            .next()
            .filter(|name| *name != UNKNOWN_NAME)
            .unwrap_or("there");
        let background = match candidate.current_title.as_deref() {
            Some(title) => format!(" and your work as {title}"),
            None => String::new(),
        };

        let body = format!(
            "Hi {first_name},\n\n\
             I came across your profile{background} and think you could be a strong fit for the \
             {title} role at {company}.\n\n\
             Would you be open to a short conversation about it this week?\n\n\
             Best regards,\n{recruiter_name}\n{recruiter_email}",
            title = job.title,
            recruiter_name = recruiter.name,
            recruiter_email = recruiter.email,
        );

        Ok(Self {
            message_id: message_id.into(),
            candidate_id: candidate.id.clone(),
            to: to.to_string(),
            subject: format!("{} opportunity at {company}", job.title),
            body,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Sent,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutreachRecord {
    pub candidate_id: CandidateId,
    pub status: DeliveryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft: Option<OutreachDraft>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutreachMetrics {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
    pub delivery_rate: f64,
}

impl OutreachMetrics {
    pub fn from_records(records: &[OutreachRecord]) -> Self {
        let count = |status: DeliveryStatus| records.iter().filter(|r| r.status == status).count();
        let sent = count(DeliveryStatus::Sent);
        let total = records.len();
        Self {
            total,
            sent,
            failed: count(DeliveryStatus::Failed),
            skipped: count(DeliveryStatus::Skipped),
            delivery_rate: if total == 0 {
                0.0
            } else {
                sent as f64 / total as f64 * 100.0
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutreachOutput {
    pub messages: Vec<OutreachRecord>,
    pub metrics: OutreachMetrics,
    /// Candidates whose message was dispatched, in input order.
    pub contacted: Vec<CandidateRecord>,
}

/// Sends one message per processing pass.
pub struct OutreachWorker {
    dispatch: Arc<dyn MessageDispatch>,
    job: JobRequirements,
    recruiter: RecruiterProfile,
    pending: VecDeque<CandidateRecord>,
    received: usize,
    sequence: usize,
    messages: Vec<OutreachRecord>,
    contacted: Vec<CandidateRecord>,
}

impl OutreachWorker {
    pub fn new(
        dispatch: Arc<dyn MessageDispatch>,
        job: JobRequirements,
        recruiter: RecruiterProfile,
        candidates: Vec<CandidateRecord>,
    ) -> Self {
        Self {
            dispatch,
            job,
            recruiter,
            received: candidates.len(),
            pending: candidates.into(),
            sequence: 0,
            messages: Vec::new(),
            contacted: Vec::new(),
        }
    }
}

impl StageWorker for OutreachWorker {
    type Output = OutreachOutput;

    fn kind(&self) -> StageKind {
        StageKind::Outreach
    }

    fn initialize(&mut self, ctx: &mut RunContext) -> Result<(), StageError> {
        ctx.audit(
            StageKind::Outreach,
            StageState::Initializing,
            AuditKind::Progress,
            format!("{} shortlisted candidates queued for outreach", self.received),
        );
        Ok(())
    }

    fn has_pending_work(&self) -> bool {
        !self.pending.is_empty()
    }

    fn process_next(&mut self, ctx: &mut RunContext) {
        let Some(candidate) = self.pending.pop_front() else {
            return;
        };
        self.sequence += 1;
        let message_id = format!("{}-msg-{:03}", ctx.run_id(), self.sequence);
        let at = ctx.now();

        let draft = match OutreachDraft::compose(message_id, &candidate, &self.job, &self.recruiter) {
            Ok(draft) => draft,
            Err(err) => {
                ctx.record_error(StageKind::Outreach, Some(candidate.id.as_str()), err.to_string());
                self.messages.push(OutreachRecord {
                    candidate_id: candidate.id.clone(),
                    status: DeliveryStatus::Skipped,
                    draft: None,
                    error: Some(err.to_string()),
                    at,
                });
                return;
            }
        };

        match self.dispatch.send(&draft.to, &draft.subject, &draft.body) {
            Ok(()) => {
                let note = format!("outreach sent ({})", draft.message_id);
                if ctx.advance_candidate(
                    StageKind::Outreach,
                    &candidate.id,
                    CandidateStatus::Contacted,
                    Some(note),
                ) {
                    if let Some(record) = ctx.roster().get(&candidate.id) {
                        self.contacted.push(record.clone());
                    }
                }
                self.messages.push(OutreachRecord {
                    candidate_id: candidate.id,
                    status: DeliveryStatus::Sent,
                    draft: Some(draft),
                    error: None,
                    at,
                });
            }
            Err(err) => {
                warn!(candidate = %candidate.id, error = %err, "outreach dispatch failed");
                ctx.record_error(
                    StageKind::Outreach,
                    Some(candidate.id.as_str()),
                    format!("dispatch failed: {err}"),
                );
                self.messages.push(OutreachRecord {
                    candidate_id: candidate.id,
                    status: DeliveryStatus::Failed,
                    draft: Some(draft),
                    error: Some(err.to_string()),
                    at,
                });
            }
        }
    }

    fn progress(&self) -> StageProgress {
        StageProgress {
            items_in: self.received,
            items_out: self.contacted.len(),
        }
    }

    fn finalize(self, _ctx: &mut RunContext) -> OutreachOutput {
        OutreachOutput {
            metrics: OutreachMetrics::from_records(&self.messages),
            messages: self.messages,
            contacted: self.contacted,
        }
    }
}
