use serde::Serialize;
use serde_json::{Map, Value};

use super::super::domain::{CandidateRecord, SourceChannel, UNKNOWN_NAME};

/// A raw record that could not become a candidate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("{channel} record is not a JSON object")]
    NotAnObject { channel: SourceChannel },
    #[error("{channel} record has no source_id or id")]
    MissingIdentifier { channel: SourceChannel },
    #[error("{channel} record is malformed: {reason}")]
    Malformed {
        channel: SourceChannel,
        reason: String,
    },
}

/// Map a channel-specific payload onto a candidate, defaulting anything missing.
pub fn candidate_from_raw(
    value: &Value,
    channel: SourceChannel,
) -> Result<CandidateRecord, NormalizeError> {
    let object = value
        .as_object()
        .ok_or(NormalizeError::NotAnObject { channel })?;

    let id = identifier(object).ok_or(NormalizeError::MissingIdentifier { channel })?;
    let name = text(object, "name").unwrap_or_else(|| UNKNOWN_NAME.to_string());
    let mut record = CandidateRecord::new(id, channel, name);

    match channel {
        SourceChannel::Linkedin => {
            record.email = object
                .get("contact_info")
                .and_then(Value::as_object)
                .and_then(|contact| text(contact, "email"));
            record.profile_url = text(object, "profile_url");
            record.location = text(object, "location");
            record.current_title = text(object, "headline");
            record.current_company = text(object, "current_company");
            record.skills = list(object, "skills");
        }
        SourceChannel::Indeed => {
            record.current_title = text(object, "title");
            record.current_company = text(object, "company");
            record.location = text(object, "location");
            record.email = text(object, "contact_email");
            record.skills = list(object, "skills");
        }
        SourceChannel::Database
        | SourceChannel::Github
        | SourceChannel::Referral
        | SourceChannel::DirectApply => {
            record.email = text(object, "email");
            record.phone = text(object, "phone");
            record.location = text(object, "location");
            record.current_title = text(object, "current_title");
            record.current_company = text(object, "current_company");
            record.profile_url = text(object, "profile_url");
            record.skills = list(object, "skills");
            record.education = list(object, "education");
            record.certifications = list(object, "certifications");
            record.experience_years = experience(object, channel)?;
        }
    }

    Ok(record)
}

/// How much of the profile the channel supplied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileCompleteness {
    pub required_missing: Vec<&'static str>,
    pub important_missing: Vec<&'static str>,
    pub optional_missing: Vec<&'static str>,
    pub score: f64,
}

impl ProfileCompleteness {
    pub fn is_contactable(&self) -> bool {
        self.required_missing.is_empty()
    }
}

pub fn completeness(record: &CandidateRecord) -> ProfileCompleteness {
    fn present(value: &Option<String>) -> bool {
        value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
    }

    let named = record.has_name();
    let required = [("name", named), ("email", present(&record.email))];
    let important = [
        ("current_title", present(&record.current_title)),
        ("location", present(&record.location)),
        ("skills", !record.skills.is_empty()),
    ];
    let optional = [
        ("phone", present(&record.phone)),
        ("profile_url", present(&record.profile_url)),
        ("current_company", present(&record.current_company)),
    ];

    let missing = |fields: &[(&'static str, bool)]| -> Vec<&'static str> {
        fields
            .iter()
            .filter(|(_, present)| !present)
            .map(|(field, _)| *field)
            .collect()
    };

    let required_missing = missing(&required);
    let important_missing = missing(&important);
    let optional_missing = missing(&optional);
    let total = (required.len() + important.len() + optional.len()) as f64;
    let absent = (required_missing.len() + important_missing.len() + optional_missing.len()) as f64;

    ProfileCompleteness {
        required_missing,
        important_missing,
        optional_missing,
        score: (total - absent) / total * 100.0,
    }
}

fn identifier(object: &Map<String, Value>) -> Option<String> {
    ["source_id", "id"]
        .iter()
        .filter_map(|key| object.get(*key))
        .find_map(|value| match value {
            Value::String(raw) if !raw.trim().is_empty() => Some(raw.trim().to_string()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        })
}

fn text(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(raw) => {
            let trimmed = raw.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Accepts an array of strings or a comma/semicolon separated string.
fn list(object: &Map<String, Value>, key: &str) -> Vec<String> {
    match object.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(raw)) => raw
            .split([',', ';'])
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn experience(
    object: &Map<String, Value>,
    channel: SourceChannel,
) -> Result<Option<f64>, NormalizeError> {
    match object.get("experience_years") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => Ok(number.as_f64()),
        Some(Value::String(raw)) if raw.trim().is_empty() => Ok(None),
        Some(Value::String(raw)) => {
            raw.trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| NormalizeError::Malformed {
                    channel,
                    reason: format!("experience_years '{raw}' is not a number"),
                })
        }
        Some(other) => Err(NormalizeError::Malformed {
            channel,
            reason: format!("experience_years has unexpected type: {other}"),
        }),
    }
}
