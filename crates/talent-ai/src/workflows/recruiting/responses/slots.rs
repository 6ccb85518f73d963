use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};

use super::super::domain::CandidateId;
use super::classifier::InterviewType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewSlot {
    pub slot_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub interviewer: String,
    pub interview_type: InterviewType,
    pub available: bool,
}

/// How the pool is filled at the start of response management.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotGenerationRule {
    pub horizon_days: u64,
    pub daily_hours: Vec<u32>,
    pub duration_minutes: i64,
    pub interviewer: String,
    /// Slots at this hour are phone screens, the rest video interviews.
    pub phone_screen_hour: u32,
}

impl Default for SlotGenerationRule {
    fn default() -> Self {
        Self {
            horizon_days: 14,
            daily_hours: vec![10, 14, 16],
            duration_minutes: 60,
            interviewer: "Recruiting Team".to_string(),
            phone_screen_hour: 10,
        }
    }
}

impl SlotGenerationRule {
    pub fn with_interviewer(mut self, interviewer: impl Into<String>) -> Self {
        self.interviewer = interviewer.into();
        self
    }

    /// Business-day slots over the horizon, starting the day after `today`.
    pub fn generate(&self, today: NaiveDate) -> Vec<InterviewSlot> {
        let mut slots = Vec::new();
        for offset in 1..=self.horizon_days {
            let Some(date) = today.checked_add_days(Days::new(offset)) else {
                break;
            };
            if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                continue;
            }
            for &hour in &self.daily_hours {
                let Some(naive) = date.and_hms_opt(hour, 0, 0) else {
                    continue;
                };
                let start = Utc.from_utc_datetime(&naive);
                slots.push(InterviewSlot {
                    slot_id: format!("slot-{}-{hour:02}", date.format("%Y%m%d")),
                    start,
                    end: start + Duration::minutes(self.duration_minutes),
                    interviewer: self.interviewer.clone(),
                    interview_type: if hour == self.phone_screen_hour {
                        InterviewType::PhoneScreen
                    } else {
                        InterviewType::VideoInterview
                    },
                    available: true,
                });
            }
        }
        slots
    }
}

/// Open interview slots for one run. A slot leaves the pool exactly once, when allocated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotPool {
    slots: Vec<InterviewSlot>,
}

impl SlotPool {
    pub fn new(slots: Vec<InterviewSlot>) -> Self {
        Self {
            slots: slots.into_iter().filter(|slot| slot.available).collect(),
        }
    }

    pub fn generate(rule: &SlotGenerationRule, today: NaiveDate) -> Self {
        Self::new(rule.generate(today))
    }

    /// First open slot of the requested type, else the first open slot of any type.
    ///
    /// The availability hint is accepted for adapters that parse it; allocation order does not
    /// depend on it.
    pub fn allocate(
        &mut self,
        interview_type: InterviewType,
        _availability_hint: Option<&str>,
    ) -> Option<InterviewSlot> {
        let index = self
            .slots
            .iter()
            .position(|slot| slot.interview_type == interview_type)
            .or_else(|| (!self.slots.is_empty()).then_some(0))?;

        let mut slot = self.slots.remove(index);
        slot.available = false;
        Some(slot)
    }

    pub fn remaining(&self) -> &[InterviewSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledInterview {
    pub interview_id: String,
    pub candidate_id: CandidateId,
    pub candidate_name: String,
    pub candidate_email: String,
    pub slot_id: String,
    pub interview_type: InterviewType,
    pub scheduled_time: DateTime<Utc>,
    pub duration_minutes: i64,
    pub interviewer: String,
    pub interviewer_email: String,
    pub meeting_details: String,
    pub meeting_instructions: String,
    pub job_id: String,
    pub job_title: String,
}

pub(crate) fn meeting_details(interview_type: InterviewType) -> (&'static str, &'static str) {
    match interview_type {
        InterviewType::VideoInterview => (
            "Video call link will be sent with the calendar invite",
            "Please join the video call 5 minutes early to test your connection. Ensure you have \
             a quiet environment and good lighting. Have your resume handy and be prepared to \
             discuss your experience.",
        ),
        InterviewType::PhoneScreen => (
            "Phone interview, number will be provided",
            "Please ensure you're in a quiet location with good phone reception. Have your resume \
             available for reference during our conversation.",
        ),
        InterviewType::TechnicalInterview
        | InterviewType::OnSiteInterview
        | InterviewType::PanelInterview => (
            "Location to be confirmed",
            "Additional details will be provided closer to the interview date.",
        ),
    }
}
