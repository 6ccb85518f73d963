use super::common::*;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::workflows::recruiting::outreach::InMemoryOutbox;
use crate::workflows::recruiting::pipeline::PipelineSettings;
use crate::workflows::recruiting::router::{
    recruiting_router, PipelineRunRequest, RecruitingService, ScreeningRequest,
};
use crate::workflows::recruiting::screening::ScreeningCriteria;

fn service() -> Arc<RecruitingService> {
    Arc::new(
        RecruitingService::new(PipelineSettings::default(), Arc::new(InMemoryOutbox::new()))
            .with_clock(clock()),
    )
}

fn run_payload() -> Value {
    json!({
        "job": serde_json::to_value(job()).expect("job serializes"),
        "channels": {
            "database": [
                {
                    "id": "db-1",
                    "name": "Ada Lovelace",
                    "email": "ada@example.com",
                    "location": "Austin, TX",
                    "skills": ["Python", "SQL", "AWS"],
                    "experience_years": 7
                },
                {
                    "id": "db-2",
                    "name": "Grace Hopper",
                    "email": "grace@example.com",
                    "location": "Austin, TX",
                    "skills": "Python, Postgres, AWS",
                    "experience_years": "6"
                },
                { "name": "No Identifier" }
            ]
        },
        "replies": [
            {
                "from_email": "grace@example.com",
                "subject": "Re: Data Engineer",
                "content": "Interested! A phone call on Tuesday works."
            }
        ]
    })
}

#[tokio::test]
async fn screen_handler_scores_a_single_candidate() {
    let request = ScreeningRequest {
        candidate: ada(),
        job: job(),
        criteria: None,
    };

    let response =
        crate::workflows::recruiting::router::screen_handler(axum::Json(request)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["candidate_id"], "db-1");
    assert_eq!(payload["recommended_for_shortlist"], true);
    assert_eq!(payload["experience_level_match"], "exceeds");
}

#[tokio::test]
async fn screen_handler_rejects_invalid_criteria() {
    let request = ScreeningRequest {
        candidate: ada(),
        job: job(),
        criteria: Some(ScreeningCriteria {
            pass_threshold: 140.0,
            ..ScreeningCriteria::default()
        }),
    };

    let response =
        crate::workflows::recruiting::router::screen_handler(axum::Json(request)).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .is_some_and(|message| message.contains("pass_threshold")));
}

#[tokio::test]
async fn pipeline_handler_rejects_jobs_without_title() {
    let mut job = job();
    job.title = String::new();
    let request: PipelineRunRequest = serde_json::from_value(json!({
        "job": serde_json::to_value(job).expect("job serializes"),
    }))
    .expect("request parses");

    let response =
        crate::workflows::recruiting::router::pipeline_handler(State(service()), axum::Json(request))
            .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn pipeline_route_runs_all_stages() {
    let router = recruiting_router(service());

    let response = router
        .oneshot(
            axum::http::Request::post("/api/v1/recruiting/pipeline/runs")
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    serde_json::to_vec(&run_payload()).unwrap(),
                ))
                .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;

    assert_eq!(payload["stages"].as_array().map(Vec::len), Some(4));
    assert_eq!(payload["candidates"].as_array().map(Vec::len), Some(2));
    assert_eq!(payload["channels"]["database"]["rejected"], 1);
    assert_eq!(payload["screening_summary"]["shortlisted"], 2);
    assert_eq!(payload["outreach_metrics"]["sent"], 2);

    let interviews = payload["scheduled_interviews"]
        .as_array()
        .expect("scheduled interviews");
    assert_eq!(interviews.len(), 1);
    assert_eq!(interviews[0]["candidate_id"], "db-2");
    assert_eq!(interviews[0]["interview_type"], "phone_screen");
    assert_eq!(interviews[0]["slot_id"], "slot-20260309-10");
}

#[tokio::test]
async fn screening_route_accepts_json() {
    let router = recruiting_router(service());
    let body = json!({
        "candidate": serde_json::to_value(alan()).expect("candidate serializes"),
        "job": serde_json::to_value(job()).expect("job serializes"),
    });

    let response = router
        .oneshot(
            axum::http::Request::post("/api/v1/recruiting/screenings")
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["passes_screening"], false);
    assert_eq!(payload["auto_fail"]["reason"], "insufficient_experience");
}
