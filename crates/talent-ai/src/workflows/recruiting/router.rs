use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::clock::{Clock, SystemClock};

use super::domain::{CandidateRecord, JobRequirements, SourceChannel};
use super::outreach::MessageDispatch;
use super::pipeline::{PipelineCoordinator, PipelineSettings};
use super::responses::{InMemoryReplySource, InboundReply, KeywordClassifier};
use super::screening::{ScreeningCriteria, ScreeningEngine};
use super::sourcing::{InMemoryCandidateRepository, SourceRegistry};

/// Shared state behind the recruiting endpoints.
pub struct RecruitingService {
    settings: PipelineSettings,
    dispatch: Arc<dyn MessageDispatch>,
    clock: Arc<dyn Clock>,
}

impl RecruitingService {
    pub fn new(settings: PipelineSettings, dispatch: Arc<dyn MessageDispatch>) -> Self {
        Self {
            settings,
            dispatch,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct ScreeningRequest {
    pub candidate: CandidateRecord,
    pub job: JobRequirements,
    #[serde(default)]
    pub criteria: Option<ScreeningCriteria>,
}

/// A self-contained pipeline run: raw channel payloads plus the replies to feed back.
#[derive(Debug, Deserialize)]
pub struct PipelineRunRequest {
    pub job: JobRequirements,
    #[serde(default)]
    pub criteria: Option<ScreeningCriteria>,
    #[serde(default)]
    pub channels: BTreeMap<SourceChannel, Vec<Value>>,
    #[serde(default)]
    pub replies: Vec<InboundReply>,
}

impl PipelineRunRequest {
    pub fn sources(&self) -> SourceRegistry {
        self.channels
            .iter()
            .fold(SourceRegistry::default(), |registry, (channel, records)| {
                registry.with(
                    *channel,
                    Arc::new(InMemoryCandidateRepository::from_raw(*channel, records)),
                )
            })
    }
}

/// Router builder exposing screening and full pipeline runs.
pub fn recruiting_router(service: Arc<RecruitingService>) -> Router {
    Router::new()
        .route("/api/v1/recruiting/screenings", post(screen_handler))
        .route("/api/v1/recruiting/pipeline/runs", post(pipeline_handler))
        .with_state(service)
}

pub(crate) async fn screen_handler(
    axum::Json(request): axum::Json<ScreeningRequest>,
) -> Response {
    if let Err(error) = request.job.validate() {
        return unprocessable(error.to_string());
    }
    let engine = match ScreeningEngine::new(request.criteria.unwrap_or_default()) {
        Ok(engine) => engine,
        Err(error) => return unprocessable(error.to_string()),
    };

    let result = engine.screen(&request.candidate, &request.job);
    (StatusCode::OK, axum::Json(result)).into_response()
}

pub(crate) async fn pipeline_handler(
    State(service): State<Arc<RecruitingService>>,
    axum::Json(request): axum::Json<PipelineRunRequest>,
) -> Response {
    let coordinator = PipelineCoordinator::new(
        request.sources(),
        Arc::clone(&service.dispatch),
        Arc::new(KeywordClassifier),
        Arc::new(InMemoryReplySource::new(request.replies.clone())),
    )
    .with_clock(Arc::clone(&service.clock))
    .with_settings(service.settings.clone());

    match coordinator.run(&request.job, request.criteria.unwrap_or_default()) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => unprocessable(error.to_string()),
    }
}

fn unprocessable(message: String) -> Response {
    let payload = json!({ "error": message });
    (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
}
