use chrono::{DateTime, NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use talent_ai::error::AppError;
use talent_ai::workflows::recruiting::{DispatchError, MessageDispatch};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Dispatch adapter that records outgoing mail in the log instead of sending it.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct LoggingDispatch;

impl MessageDispatch for LoggingDispatch {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DispatchError> {
        if !to.contains('@') {
            return Err(DispatchError::Rejected(format!("'{to}' is not an email address")));
        }
        info!(%to, %subject, body_len = body.len(), "outreach message queued");
        Ok(())
    }
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// 09:00 UTC on the given day, the instant used for reproducible CLI runs.
pub(crate) fn morning_of(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(9, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn logging_dispatch_rejects_non_addresses() {
        assert!(LoggingDispatch.send("ada@example.com", "Hi", "Body").is_ok());
        assert!(matches!(
            LoggingDispatch.send("ada", "Hi", "Body"),
            Err(DispatchError::Rejected(_))
        ));
    }

    #[test]
    fn parse_date_reports_bad_input() {
        assert!(parse_date("2026-03-06").is_ok());
        let err = parse_date("03/06/2026").expect_err("format rejected");
        assert!(err.contains("YYYY-MM-DD"));
    }

    #[test]
    fn morning_of_pins_nine_utc() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 6).expect("valid date");
        let instant = morning_of(date);
        assert_eq!(instant.date_naive(), date);
        assert_eq!(instant.hour(), 9);
    }
}
