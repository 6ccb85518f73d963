use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Mutex;

use serde::{Deserialize, Deserializer};

use super::super::domain::{
    CandidateId, CandidateRecord, CandidateStatus, JobRequirements, SourceChannel, UNKNOWN_NAME,
};
use super::memory::StatusUpdate;
use super::normalizer::NormalizeError;
use super::{rank_by_skill_overlap, CandidateRepository, RepositoryError, SourcedRecord};

#[derive(Debug)]
pub enum CandidateImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for CandidateImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CandidateImportError::Io(err) => write!(f, "failed to read candidate export: {err}"),
            CandidateImportError::Csv(err) => write!(f, "invalid candidate CSV header: {err}"),
        }
    }
}

impl std::error::Error for CandidateImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CandidateImportError::Io(err) => Some(err),
            CandidateImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for CandidateImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CandidateImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Candidate repository backed by a CSV export from an applicant tracking system.
///
/// Rows that fail to parse are kept as per-row errors so a single bad line does not
/// invalidate the export.
#[derive(Debug)]
pub struct CsvCandidateRepository {
    channel: SourceChannel,
    rows: Vec<SourcedRecord>,
    updates: Mutex<Vec<StatusUpdate>>,
}

impl CsvCandidateRepository {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CandidateImportError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CandidateImportError> {
        let channel = SourceChannel::Database;
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        csv_reader.headers()?;

        let rows = csv_reader
            .deserialize::<CandidateRow>()
            .enumerate()
            .map(|(index, row)| {
                row.map_err(|err| NormalizeError::Malformed {
                    channel,
                    reason: format!("row {}: {err}", index + 2),
                })
                .and_then(|row| row.into_record(channel))
            })
            .collect();

        Ok(Self {
            channel,
            rows,
            updates: Mutex::new(Vec::new()),
        })
    }

    pub fn channel(&self) -> SourceChannel {
        self.channel
    }

    pub fn status_updates(&self) -> Vec<StatusUpdate> {
        self.updates
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl CandidateRepository for CsvCandidateRepository {
    fn query(
        &self,
        job: &JobRequirements,
        max_results: usize,
    ) -> Result<Vec<SourcedRecord>, RepositoryError> {
        let mut records: Vec<CandidateRecord> =
            self.rows.iter().filter_map(|row| row.clone().ok()).collect();
        rank_by_skill_overlap(&mut records, job);
        records.truncate(max_results);

        let mut results: Vec<SourcedRecord> = records.into_iter().map(Ok).collect();
        results.extend(self.rows.iter().filter_map(|row| row.clone().err()).map(Err));
        Ok(results)
    }

    fn update_status(
        &self,
        id: &CandidateId,
        status: CandidateStatus,
        notes: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let known = self
            .rows
            .iter()
            .any(|row| matches!(row, Ok(record) if &record.id == id));
        if !known {
            return Err(RepositoryError::NotFound);
        }
        let mut guard = self
            .updates
            .lock()
            .map_err(|_| RepositoryError::Unavailable("status log lock poisoned".to_string()))?;
        guard.push(StatusUpdate {
            id: id.clone(),
            status,
            notes: notes.map(str::to_string),
        });
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct CandidateRow {
    #[serde(rename = "Id", default, deserialize_with = "empty_string_as_none")]
    id: Option<String>,
    #[serde(rename = "Name", default, deserialize_with = "empty_string_as_none")]
    name: Option<String>,
    #[serde(rename = "Email", default, deserialize_with = "empty_string_as_none")]
    email: Option<String>,
    #[serde(rename = "Phone", default, deserialize_with = "empty_string_as_none")]
    phone: Option<String>,
    #[serde(rename = "Location", default, deserialize_with = "empty_string_as_none")]
    location: Option<String>,
    #[serde(rename = "Title", default, deserialize_with = "empty_string_as_none")]
    title: Option<String>,
    #[serde(rename = "Company", default, deserialize_with = "empty_string_as_none")]
    company: Option<String>,
    #[serde(rename = "Experience Years", default, deserialize_with = "empty_string_as_none")]
    experience_years: Option<String>,
    #[serde(rename = "Skills", default, deserialize_with = "empty_string_as_none")]
    skills: Option<String>,
    #[serde(rename = "Education", default, deserialize_with = "empty_string_as_none")]
    education: Option<String>,
}

impl CandidateRow {
    fn into_record(self, channel: SourceChannel) -> Result<CandidateRecord, NormalizeError> {
        let id = self
            .id
            .ok_or(NormalizeError::MissingIdentifier { channel })?;
        let experience_years = self
            .experience_years
            .map(|raw| {
                raw.parse::<f64>().map_err(|_| NormalizeError::Malformed {
                    channel,
                    reason: format!("candidate {id}: experience '{raw}' is not a number"),
                })
            })
            .transpose()?;

        let mut record =
            CandidateRecord::new(id, channel, self.name.unwrap_or_else(|| UNKNOWN_NAME.to_string()));
        record.email = self.email;
        record.phone = self.phone;
        record.location = self.location;
        record.current_title = self.title;
        record.current_company = self.company;
        record.experience_years = experience_years;
        record.skills = split_list(self.skills);
        record.education = split_list(self.education);
        Ok(record)
    }
}

fn split_list(raw: Option<String>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(';')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
